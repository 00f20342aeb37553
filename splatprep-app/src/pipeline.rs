//! Orchestration: resolve a PLY file, pick a resolution, optionally filter it and
//! attach camera matrices for the viewer.

use crate::catalog::{FileCatalog, NO_FILES, is_ply};
use crate::config::{DEFAULT_FOV_DEGREES, DEFAULT_IMAGE_SIZE, DEFAULT_TARGET_SCALE};
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use splatprep_camera::{
    Extrinsics, Intrinsics, default_extrinsics, intrinsics_from_fov, recommend_resolution,
};
use splatprep_data::SplatFilter;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Viewer parameters shared by every loader.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewOptions {
    pub fov_degrees: f64,
    pub auto_resolution: bool,
    pub target_scale: f64,
    pub width: u32,
    pub height: u32,
    /// Minimum post-sigmoid opacity; `None` disables the filter.
    pub opacity_threshold: Option<f64>,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            fov_degrees: DEFAULT_FOV_DEGREES,
            auto_resolution: true,
            target_scale: DEFAULT_TARGET_SCALE,
            width: DEFAULT_IMAGE_SIZE,
            height: DEFAULT_IMAGE_SIZE,
            opacity_threshold: None,
        }
    }
}

impl ViewOptions {
    pub fn with_fov(mut self, fov_degrees: f64) -> Self {
        self.fov_degrees = fov_degrees;
        self
    }

    /// Fixed image size; turns auto resolution off.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.auto_resolution = false;
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_target_scale(mut self, target_scale: f64) -> Self {
        self.auto_resolution = true;
        self.target_scale = target_scale;
        self
    }

    pub fn with_opacity_filter(mut self, threshold: f64) -> Self {
        self.opacity_threshold = Some(threshold);
        self
    }

    /// Image size after applying auto resolution.
    pub fn resolution(&self) -> (u32, u32) {
        if self.auto_resolution {
            let (width, height) = recommend_resolution(self.fov_degrees, self.target_scale);
            info!(
                "Auto-resolution for FOV {}° @ scale {}: {}x{}",
                self.fov_degrees, self.target_scale, width, height
            );
            (width, height)
        } else {
            (self.width, self.height)
        }
    }
}

/// Upstream camera matrices, row-major.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraMatrices {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extrinsics: Option<[[f64; 4]; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intrinsics: Option<[[f64; 3]; 3]>,
}

/// How `process` treats upstream camera matrices.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraInput {
    /// Ignore upstream matrices and derive them from the view options.
    pub override_camera: bool,
    pub upstream: CameraMatrices,
}

impl Default for CameraInput {
    fn default() -> Self {
        Self {
            override_camera: true,
            upstream: CameraMatrices::default(),
        }
    }
}

/// What the viewer receives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewResult {
    pub ply_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub extrinsics: [[f64; 4]; 4],
    pub intrinsics: [[f64; 3]; 3],
}

/// Runs the loaders. The opacity filter is probed once at construction.
pub struct Pipeline {
    filter: Option<SplatFilter>,
}

impl Pipeline {
    pub fn new() -> Self {
        let filter = match SplatFilter::new() {
            Ok(filter) => Some(filter),
            Err(e) => {
                warn!("{}; opacity filter disabled", e);
                None
            }
        };
        Self { filter }
    }

    pub fn with_filter(filter: Option<SplatFilter>) -> Self {
        Self { filter }
    }

    /// Core wrapper: `path` is already resolved and exists.
    pub fn prepare(&self, path: &Path, options: &ViewOptions) -> ViewResult {
        let (width, height) = options.resolution();
        let ply_path = self.filtered(path, options);

        let extrinsics = default_extrinsics();
        let intrinsics = intrinsics_from_fov(width, height, options.fov_degrees);
        info!(
            "Camera: FOV={}°, size={}x{}",
            options.fov_degrees, width, height
        );

        view_result(ply_path, width, height, extrinsics, intrinsics)
    }

    /// Load a selection from [`FileCatalog::list`].
    pub fn load_selection(
        &self,
        catalog: &FileCatalog,
        selection: &str,
        options: &ViewOptions,
    ) -> Result<ViewResult, AppError> {
        if selection.is_empty() || selection == NO_FILES {
            return Err(AppError::NoSelection);
        }
        let resolved = catalog
            .resolve_selection(selection)
            .ok_or_else(|| AppError::Unresolved(selection.to_string()))?;
        if !resolved.exists() {
            return Err(AppError::NotFound(resolved));
        }

        info!("Selected: {}", selection);
        info!("Resolved path: {}", resolved.display());
        Ok(self.prepare(&resolved, options))
    }

    /// Load a typed path, searched across the configured folders.
    pub fn load_path(
        &self,
        catalog: &FileCatalog,
        text: &str,
        options: &ViewOptions,
    ) -> Result<ViewResult, AppError> {
        let resolved = catalog.resolve_path(text)?;
        if !is_ply(&resolved) {
            return Err(AppError::NotPly(resolved));
        }

        info!("Using PLY file: {}", resolved.display());
        Ok(self.prepare(&resolved, options))
    }

    /// Process a path handed over by an upstream step, optionally keeping its camera.
    pub fn process(
        &self,
        text: &str,
        options: &ViewOptions,
        camera: &CameraInput,
    ) -> Result<ViewResult, AppError> {
        let trimmed = text.trim().trim_matches('"');
        if trimmed.is_empty() {
            return Err(AppError::EmptyPath);
        }
        let resolved = PathBuf::from(trimmed);
        if !resolved.exists() {
            return Err(AppError::NotFound(resolved));
        }
        if !is_ply(&resolved) {
            return Err(AppError::NotPly(resolved));
        }
        info!("Input PLY: {}", resolved.display());

        let (width, height, extrinsics, intrinsics) = if camera.override_camera {
            let (width, height) = options.resolution();
            info!(
                "Override camera: FOV={}°, size={}x{}",
                options.fov_degrees, width, height
            );
            (
                width,
                height,
                default_extrinsics(),
                intrinsics_from_fov(width, height, options.fov_degrees),
            )
        } else {
            let (width, height) = (options.width, options.height);
            let extrinsics = match camera.upstream.extrinsics {
                Some(rows) => {
                    info!("Using input extrinsics");
                    Extrinsics::from_rows(rows)
                }
                None => {
                    info!("Using default extrinsics (no input provided)");
                    default_extrinsics()
                }
            };
            let intrinsics = match camera.upstream.intrinsics {
                Some(rows) => {
                    info!("Using input intrinsics");
                    Intrinsics::from_rows(rows)
                }
                None => {
                    info!("Using default intrinsics (no input provided)");
                    intrinsics_from_fov(width, height, options.fov_degrees)
                }
            };
            (width, height, extrinsics, intrinsics)
        };

        let ply_path = self.filtered(&resolved, options);
        Ok(view_result(ply_path, width, height, extrinsics, intrinsics))
    }

    fn filtered(&self, path: &Path, options: &ViewOptions) -> PathBuf {
        let Some(threshold) = options.opacity_threshold else {
            return path.to_path_buf();
        };
        match &self.filter {
            Some(filter) => {
                let result = filter.filter(path, threshold);
                info!("Filtered PLY saved to: {}", result.display());
                result
            }
            None => {
                warn!("Opacity filter unavailable, using original file");
                path.to_path_buf()
            }
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn view_result(
    ply_path: PathBuf,
    width: u32,
    height: u32,
    extrinsics: Extrinsics,
    intrinsics: Intrinsics,
) -> ViewResult {
    ViewResult {
        ply_path,
        width,
        height,
        extrinsics: extrinsics.to_rows(),
        intrinsics: intrinsics.to_rows(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FolderConfig;
    use splatprep_data::{Column, ColumnData, PointCloud, write_point_cloud};
    use std::fs;
    use tempfile::TempDir;

    fn scene(dir: &Path, name: &str, opacity: Vec<f32>) -> PathBuf {
        let n = opacity.len();
        let cloud = PointCloud::new(vec![
            Column::new("x", ColumnData::F32(vec![1.0; n])),
            Column::new("y", ColumnData::F32(vec![2.0; n])),
            Column::new("z", ColumnData::F32(vec![3.0; n])),
            Column::new("opacity", ColumnData::F32(opacity)),
        ])
        .unwrap();
        let path = dir.join(name);
        write_point_cloud(&cloud, &path).unwrap();
        path
    }

    fn workspace() -> (TempDir, FileCatalog) {
        let root = tempfile::tempdir().unwrap();
        let input = root.path().join("input");
        let output = root.path().join("output");
        fs::create_dir_all(&input).unwrap();
        fs::create_dir_all(&output).unwrap();
        let catalog = FileCatalog::new(FolderConfig::new(Some(input), Some(output)));
        (root, catalog)
    }

    #[test]
    fn test_prepare_defaults() {
        let (root, _) = workspace();
        let path = scene(root.path(), "a.ply", vec![0.0, 1.0]);

        let result = Pipeline::new().prepare(&path, &ViewOptions::default());
        assert_eq!(result.ply_path, path);
        assert_eq!((result.width, result.height), recommend_resolution(50.0, 10.0));
        assert_eq!(result.extrinsics, default_extrinsics().to_rows());
        assert_eq!(result.intrinsics[0][2], result.width as f64 / 2.0);
    }

    #[test]
    fn test_prepare_fixed_size_with_filter() {
        let (root, _) = workspace();
        let path = scene(root.path(), "b.ply", vec![-5.0, 0.0, 5.0]);
        let options = ViewOptions::default()
            .with_size(640, 480)
            .with_opacity_filter(0.5);

        let result = Pipeline::new().prepare(&path, &options);
        assert_eq!(result.ply_path, root.path().join("b_opacity0.50.ply"));
        assert!(result.ply_path.exists());
        assert_eq!((result.width, result.height), (640, 480));
        assert_eq!(result.intrinsics[1][2], 240.0);
    }

    #[test]
    fn test_filter_unavailable_keeps_original() {
        let (root, _) = workspace();
        let path = scene(root.path(), "c.ply", vec![-5.0, 5.0]);
        let options = ViewOptions::default().with_opacity_filter(0.5);

        let result = Pipeline::with_filter(None).prepare(&path, &options);
        assert_eq!(result.ply_path, path);
    }

    #[test]
    fn test_load_selection() {
        let (_root, catalog) = workspace();
        let input = catalog.folders().input_dir().unwrap().to_path_buf();
        let path = scene(&input, "room.ply", vec![1.0]);
        let pipeline = Pipeline::new();

        let result = pipeline
            .load_selection(&catalog, "[input] room.ply", &ViewOptions::default())
            .unwrap();
        assert_eq!(result.ply_path, path);

        assert!(matches!(
            pipeline.load_selection(&catalog, NO_FILES, &ViewOptions::default()),
            Err(AppError::NoSelection)
        ));
        assert!(matches!(
            pipeline.load_selection(&catalog, "[output] gone.ply", &ViewOptions::default()),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            pipeline.load_selection(&catalog, "nowhere.ply", &ViewOptions::default()),
            Err(AppError::Unresolved(_))
        ));
    }

    #[test]
    fn test_load_path_rejects_other_extensions() {
        let (_root, catalog) = workspace();
        let output = catalog.folders().output_dir().unwrap().to_path_buf();
        fs::write(output.join("scene.splat"), b"").unwrap();

        let err = Pipeline::new()
            .load_path(&catalog, "scene.splat", &ViewOptions::default())
            .unwrap_err();
        assert!(matches!(err, AppError::NotPly(_)));
    }

    #[test]
    fn test_process_keeps_upstream_camera() {
        let (root, _) = workspace();
        let path = scene(root.path(), "d.ply", vec![1.0]);
        let upstream = CameraMatrices {
            extrinsics: Some([
                [1.0, 0.0, 0.0, 0.5],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, -1.0],
                [0.0, 0.0, 0.0, 1.0],
            ]),
            intrinsics: None,
        };
        let camera = CameraInput {
            override_camera: false,
            upstream: upstream.clone(),
        };
        let options = ViewOptions::default().with_size(800, 600);

        let result = Pipeline::new()
            .process(path.to_str().unwrap(), &options, &camera)
            .unwrap();
        assert_eq!(Some(result.extrinsics), upstream.extrinsics);
        assert_eq!(
            result.intrinsics,
            intrinsics_from_fov(800, 600, DEFAULT_FOV_DEGREES).to_rows()
        );
    }

    #[test]
    fn test_process_override_ignores_upstream() {
        let (root, _) = workspace();
        let path = scene(root.path(), "e.ply", vec![1.0]);
        let camera = CameraInput {
            override_camera: true,
            upstream: CameraMatrices {
                extrinsics: Some([[2.0; 4]; 4]),
                intrinsics: Some([[3.0; 3]; 3]),
            },
        };
        let options = ViewOptions::default().with_fov(90.0);

        let result = Pipeline::new()
            .process(&format!("\"{}\"", path.display()), &options, &camera)
            .unwrap();
        assert_eq!(result.extrinsics, default_extrinsics().to_rows());
        assert_eq!((result.width, result.height), recommend_resolution(90.0, 10.0));
    }

    #[test]
    fn test_process_validation() {
        let (root, _) = workspace();
        let pipeline = Pipeline::new();
        let camera = CameraInput::default();
        let options = ViewOptions::default();

        assert!(matches!(
            pipeline.process("  ", &options, &camera),
            Err(AppError::EmptyPath)
        ));
        let missing = root.path().join("missing.ply");
        assert!(matches!(
            pipeline.process(missing.to_str().unwrap(), &options, &camera),
            Err(AppError::NotFound(_))
        ));
        let text = root.path().join("notes.txt");
        fs::write(&text, b"").unwrap();
        assert!(matches!(
            pipeline.process(text.to_str().unwrap(), &options, &camera),
            Err(AppError::NotPly(_))
        ));
    }

    #[test]
    fn test_camera_matrices_json() {
        let parsed: CameraMatrices =
            serde_json::from_str(r#"{"intrinsics": [[500, 0, 256], [0, 500, 256], [0, 0, 1]]}"#)
                .unwrap();
        assert!(parsed.extrinsics.is_none());
        assert_eq!(parsed.intrinsics.unwrap()[0][2], 256.0);
    }
}
