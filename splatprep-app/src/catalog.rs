//! Finding PLY files in the configured folders.
//!
//! Selections are labelled with the folder they came from, e.g. `[input/3d] room.ply`,
//! so they can be mapped back to a path later.

use crate::config::FolderConfig;
use crate::error::AppError;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// Placeholder offered when no PLY files exist.
pub const NO_FILES: &str = "No PLY files found";

const INPUT_LABEL: &str = "[input] ";
const INPUT_3D_LABEL: &str = "[input/3d] ";
const OUTPUT_LABEL: &str = "[output] ";

/// True for names ending in `.ply`, any case.
pub fn is_ply(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("ply"))
        .unwrap_or(false)
}

/// Modification time of `path`, used by callers to notice a changed input.
pub fn change_token(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Lists and resolves PLY files across the configured folders.
pub struct FileCatalog {
    folders: FolderConfig,
}

impl FileCatalog {
    pub fn new(folders: FolderConfig) -> Self {
        Self { folders }
    }

    pub fn folders(&self) -> &FolderConfig {
        &self.folders
    }

    /// Labelled PLY files from the input, input/3d and output folders, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut labels = Vec::new();
        if let Some(dir) = self.folders.input_dir() {
            labels.extend(ply_files_in(dir).map(|name| format!("{INPUT_LABEL}{name}")));
        }
        if let Some(dir) = self.folders.input_3d_dir() {
            labels.extend(ply_files_in(&dir).map(|name| format!("{INPUT_3D_LABEL}{name}")));
        }
        if let Some(dir) = self.folders.output_dir() {
            labels.extend(ply_files_in(dir).map(|name| format!("{OUTPUT_LABEL}{name}")));
        }
        labels.sort();
        debug!("Found {} PLY files", labels.len());
        labels
    }

    /// Map a label produced by [`FileCatalog::list`] back to a path.
    ///
    /// Unlabelled names are looked up in the input folder, then the output folder,
    /// and only returned if they exist. Labelled paths are returned unchecked.
    pub fn resolve_selection(&self, selection: &str) -> Option<PathBuf> {
        if selection.is_empty() || selection == NO_FILES {
            return None;
        }

        if let Some(name) = selection.strip_prefix(INPUT_3D_LABEL) {
            return self.folders.input_3d_dir().map(|dir| dir.join(name));
        }
        if let Some(name) = selection.strip_prefix(INPUT_LABEL) {
            return self.folders.input_dir().map(|dir| dir.join(name));
        }
        if let Some(name) = selection.strip_prefix(OUTPUT_LABEL) {
            return self.folders.output_dir().map(|dir| dir.join(name));
        }

        [self.folders.input_dir(), self.folders.output_dir()]
            .into_iter()
            .flatten()
            .map(|dir| dir.join(selection))
            .find(|candidate| candidate.exists())
    }

    /// Resolve a typed path: absolute, then relative to the output folder, the
    /// input folder, input/3d, and finally the working directory.
    ///
    /// Surrounding whitespace and double quotes are ignored.
    pub fn resolve_path(&self, text: &str) -> Result<PathBuf, AppError> {
        let candidate = text.trim().trim_matches('"');
        if candidate.is_empty() {
            return Err(AppError::EmptyPath);
        }

        let raw = PathBuf::from(candidate);
        if raw.is_absolute() && raw.exists() {
            return Ok(raw);
        }

        let mut searched = vec![raw.clone()];
        if let Some(dir) = self.folders.output_dir() {
            searched.push(dir.join(candidate));
        }
        if let Some(dir) = self.folders.input_dir() {
            searched.push(dir.join(candidate));
        }
        if let Some(dir) = self.folders.input_3d_dir() {
            searched.push(dir.join(candidate));
        }
        searched.push(raw);

        if let Some(found) = searched[1..].iter().find(|p| p.exists()) {
            return Ok(found.clone());
        }

        searched.pop();
        warn!("PLY file not found: {}", candidate);
        Err(AppError::NotFoundIn(searched))
    }
}

fn ply_files_in(dir: &Path) -> impl Iterator<Item = String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => Some(entries),
        Err(e) => {
            debug!("Skipping {}: {}", dir.display(), e);
            None
        }
    };
    entries
        .into_iter()
        .flatten()
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_ply(path))
        .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
}
