//! Splatprep
//!
//! Prepares Gaussian splat PLY files for a splat viewer:
//! - Lists and resolves files in the configured input/output folders
//! - Optionally drops low-opacity gaussians into a filtered copy
//! - Recommends an image resolution for the chosen FOV
//! - Emits default camera extrinsics and intrinsics

mod app;
mod catalog;
mod cli;
mod config;
mod error;
mod pipeline;
mod report;

use app::App;
use catalog::FileCatalog;
use clap::Parser;
use cli::Cli;
use config::LoggingConfig;
use pipeline::Pipeline;

fn main() {
    let cli = Cli::parse();
    app::init_logging(&LoggingConfig {
        level: cli.log_level.clone(),
    });

    let app = App::new(FileCatalog::new(cli.folders()), Pipeline::new());
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = app.run(cli.command, &mut stdout) {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}
