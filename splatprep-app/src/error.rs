//! Error types for file resolution and orchestration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised before or around the core operations.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("PLY path cannot be empty")]
    EmptyPath,

    #[error("No PLY file selected")]
    NoSelection,

    #[error("PLY file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Could not resolve PLY file: {0}")]
    Unresolved(String),

    #[error("PLY file not found. Searched in:\n{}", format_searched(.0))]
    NotFoundIn(Vec<PathBuf>),

    #[error("File must be a .ply Gaussian splat: {}", .0.display())]
    NotPly(PathBuf),

    #[error("Point cloud error: {0}")]
    Data(#[from] splatprep_data::DataError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_searched(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n")
}
