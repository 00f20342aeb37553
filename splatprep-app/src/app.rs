//! Command dispatch and logging setup.

use crate::catalog::{FileCatalog, NO_FILES};
use crate::cli::Command;
use crate::config::LoggingConfig;
use crate::error::AppError;
use crate::pipeline::{CameraInput, CameraMatrices, Pipeline};
use crate::report;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Owns the catalog and pipeline for one invocation.
pub struct App {
    catalog: FileCatalog,
    pipeline: Pipeline,
}

impl App {
    pub fn new(catalog: FileCatalog, pipeline: Pipeline) -> Self {
        Self { catalog, pipeline }
    }

    /// Run `command` and write its JSON result to `out`.
    pub fn run<W: Write>(&self, command: Command, out: &mut W) -> Result<(), AppError> {
        match command {
            Command::List => {
                let mut files = self.catalog.list();
                if files.is_empty() {
                    files.push(NO_FILES.to_string());
                }
                emit(out, &files)
            }
            Command::Load { selection, view } => {
                let result = self
                    .pipeline
                    .load_selection(&self.catalog, &selection, &view.options())?;
                emit(out, &result)
            }
            Command::Open { path, view } => {
                let result = self
                    .pipeline
                    .load_path(&self.catalog, &path, &view.options())?;
                emit(out, &result)
            }
            Command::Process {
                path,
                view,
                camera,
                keep_camera,
            } => {
                let upstream = match camera {
                    Some(file) => read_camera(&file)?,
                    None => CameraMatrices::default(),
                };
                let camera = CameraInput {
                    override_camera: !keep_camera,
                    upstream,
                };
                let result = self.pipeline.process(&path, &view.options(), &camera)?;
                emit(out, &result)
            }
            Command::Preview { path, camera } => {
                let camera = match camera {
                    Some(file) => read_camera(&file)?,
                    None => CameraMatrices::default(),
                };
                let summary =
                    report::preview(&path, self.catalog.folders().output_dir(), camera)?;
                emit(out, &summary)
            }
            Command::Inspect { path } => emit(out, &report::inspect(&path)?),
        }
    }
}

fn read_camera(path: &Path) -> Result<CameraMatrices, AppError> {
    debug!("Reading camera matrices from {}", path.display());
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn emit<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<(), AppError> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Install the global subscriber. Logs go to stderr so stdout stays machine readable.
pub fn init_logging(config: &LoggingConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::config::FolderConfig;
    use clap::Parser;

    fn run(args: &[&str], folders: FolderConfig) -> Result<serde_json::Value, AppError> {
        let cli = Cli::try_parse_from(args).unwrap();
        let app = App::new(FileCatalog::new(folders), Pipeline::new());
        let mut out = Vec::new();
        app.run(cli.command, &mut out)?;
        Ok(serde_json::from_slice(&out).unwrap())
    }

    #[test]
    fn test_list_empty_reports_placeholder() {
        let value = run(&["splatprep", "list"], FolderConfig::default()).unwrap();
        assert_eq!(value, serde_json::json!([NO_FILES]));
    }

    #[test]
    fn test_process_with_camera_file() {
        let root = tempfile::tempdir().unwrap();
        let ply = root.path().join("scene.ply");
        fs::write(&ply, b"ply").unwrap();
        let camera = root.path().join("camera.json");
        fs::write(
            &camera,
            r#"{"intrinsics": [[100, 0, 50], [0, 100, 40], [0, 0, 1]]}"#,
        )
        .unwrap();

        let value = run(
            &[
                "splatprep",
                "process",
                ply.to_str().unwrap(),
                "--camera",
                camera.to_str().unwrap(),
                "--keep-camera",
            ],
            FolderConfig::default(),
        )
        .unwrap();
        assert_eq!(value["intrinsics"][1][2], 40.0);
        assert_eq!(value["extrinsics"][3][3], 1.0);
        assert_eq!(value["ply_path"], ply.to_str().unwrap());
    }

    #[test]
    fn test_bad_camera_file_is_json_error() {
        let root = tempfile::tempdir().unwrap();
        let ply = root.path().join("scene.ply");
        fs::write(&ply, b"ply").unwrap();
        let camera = root.path().join("camera.json");
        fs::write(&camera, r#"{"intrinsics": [[1, 2]]}"#).unwrap();

        let err = run(
            &[
                "splatprep",
                "preview",
                ply.to_str().unwrap(),
                "--camera",
                camera.to_str().unwrap(),
            ],
            FolderConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Json(_)));
    }
}
