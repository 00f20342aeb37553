//! Process-wide configuration built once at startup.

use std::path::{Path, PathBuf};

/// Default horizontal FOV in degrees.
pub const DEFAULT_FOV_DEGREES: f64 = 50.0;
/// Default target splat scale for auto resolution.
pub const DEFAULT_TARGET_SCALE: f64 = 10.0;
/// Default image size when auto resolution is off.
pub const DEFAULT_IMAGE_SIZE: u32 = 512;
/// Default minimum opacity (post-sigmoid) kept by the filter.
pub const DEFAULT_OPACITY_THRESHOLD: f64 = 0.1;

/// Input and output base folders that PLY selections are resolved against.
#[derive(Debug, Clone, Default)]
pub struct FolderConfig {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

impl FolderConfig {
    pub fn new(input_dir: Option<PathBuf>, output_dir: Option<PathBuf>) -> Self {
        Self {
            input_dir,
            output_dir,
        }
    }

    pub fn input_dir(&self) -> Option<&Path> {
        self.input_dir.as_deref()
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    /// `3d` subfolder of the input folder.
    pub fn input_3d_dir(&self) -> Option<PathBuf> {
        self.input_dir.as_ref().map(|dir| dir.join("3d"))
    }
}

/// Logging configuration.
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
