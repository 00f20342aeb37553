//! Error types for point-cloud loading, writing and filtering.

use thiserror::Error;

/// Errors that can occur while reading, transforming or writing a point cloud.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The structured record could not be parsed.
    #[error("PLY format error: {0}")]
    Format(String),

    /// The record parsed but breaks a column invariant.
    #[error("Schema error: {0}")]
    Schema(String),

    /// No codec is available for reading or writing records.
    #[error("Point cloud support unavailable: {0}")]
    Unsupported(String),

    #[error("Mask length {mask} does not match point count {points}")]
    MaskLength { mask: usize, points: usize },
}

impl DataError {
    /// True for errors raised because the input does not match the record schema.
    pub fn is_format(&self) -> bool {
        matches!(self, DataError::Format(_) | DataError::Schema(_))
    }
}
