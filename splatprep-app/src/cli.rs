use crate::config::{
    DEFAULT_FOV_DEGREES, DEFAULT_IMAGE_SIZE, DEFAULT_OPACITY_THRESHOLD, DEFAULT_TARGET_SCALE,
    FolderConfig,
};
use crate::pipeline::ViewOptions;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CliError {
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("{value} is outside {min}..={max}")]
    OutOfRange { value: f64, min: f64, max: f64 },
}

#[derive(Parser, Debug)]
#[command(name = "splatprep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
/// Pick, filter and annotate Gaussian splat PLY files for a splat viewer.
/// Results are printed to stdout as JSON, logs go to stderr.
pub struct Cli {
    /// Base folder for input files
    #[arg(long, global = true, env = "SPLATPREP_INPUT_DIR")]
    pub input_dir: Option<PathBuf>,

    /// Base folder for generated files
    #[arg(long, global = true, env = "SPLATPREP_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn folders(&self) -> FolderConfig {
        FolderConfig::new(self.input_dir.clone(), self.output_dir.clone())
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List PLY files in the input, input/3d and output folders
    List,

    /// Load a file by the label printed by `list`
    Load {
        selection: String,
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Load a file by path, searched across the configured folders
    Open {
        path: String,
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Process a PLY path produced by an upstream step
    Process {
        path: String,
        #[command(flatten)]
        view: ViewArgs,
        /// JSON file with upstream "extrinsics" (4x4) and/or "intrinsics" (3x3), row-major
        #[arg(long)]
        camera: Option<PathBuf>,
        /// Keep upstream camera matrices instead of deriving them from --fov
        #[arg(long)]
        keep_camera: bool,
    },

    /// Summarise a file for the viewer
    Preview {
        path: PathBuf,
        /// JSON file with camera matrices to pass through
        #[arg(long)]
        camera: Option<PathBuf>,
    },

    /// Print the fields, size and opacity statistics of a file
    Inspect { path: PathBuf },
}

#[derive(Args, Debug, Clone)]
pub struct ViewArgs {
    /// Horizontal field of view in degrees (10-180)
    #[arg(long, default_value_t = DEFAULT_FOV_DEGREES, value_parser = parse_fov)]
    pub fov: f64,

    /// Use --width/--height instead of the FOV-based resolution
    #[arg(long)]
    pub no_auto_resolution: bool,

    /// Target gaussian scale in the viewer (1-50)
    #[arg(long, default_value_t = DEFAULT_TARGET_SCALE, value_parser = parse_scale)]
    pub target_scale: f64,

    /// Image width when auto resolution is off
    #[arg(long, default_value_t = DEFAULT_IMAGE_SIZE, value_parser = clap::value_parser!(u32).range(64..=8192))]
    pub width: u32,

    /// Image height when auto resolution is off
    #[arg(long, default_value_t = DEFAULT_IMAGE_SIZE, value_parser = clap::value_parser!(u32).range(64..=8192))]
    pub height: u32,

    /// Drop low-opacity gaussians into a sibling file
    #[arg(long)]
    pub opacity_filter: bool,

    /// Minimum opacity (0-1) kept by --opacity-filter
    #[arg(long, default_value_t = DEFAULT_OPACITY_THRESHOLD, value_parser = parse_threshold)]
    pub opacity_threshold: f64,
}

impl ViewArgs {
    pub fn options(&self) -> ViewOptions {
        let options = ViewOptions::default().with_fov(self.fov);
        let options = if self.no_auto_resolution {
            options.with_size(self.width, self.height)
        } else {
            options.with_target_scale(self.target_scale)
        };
        if self.opacity_filter {
            options.with_opacity_filter(self.opacity_threshold)
        } else {
            options
        }
    }
}

fn parse_in_range(arg: &str, min: f64, max: f64) -> Result<f64, CliError> {
    let value: f64 = arg
        .trim()
        .parse()
        .map_err(|_| CliError::NotANumber(arg.to_string()))?;
    if !(min..=max).contains(&value) {
        return Err(CliError::OutOfRange { value, min, max });
    }
    Ok(value)
}

fn parse_fov(arg: &str) -> Result<f64, CliError> {
    parse_in_range(arg, 10.0, 180.0)
}

fn parse_scale(arg: &str) -> Result<f64, CliError> {
    parse_in_range(arg, 1.0, 50.0)
}

fn parse_threshold(arg: &str) -> Result<f64, CliError> {
    parse_in_range(arg, 0.0, 1.0)
}
