//! Summaries of PLY files for the viewer and for humans.

use crate::catalog::change_token;
use crate::error::AppError;
use crate::pipeline::CameraMatrices;
use serde::Serialize;
use splatprep_data::{OPACITY_FIELD, read_point_cloud, sigmoid};
use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;
use tracing::info;

/// What the viewer needs to fetch and frame a file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewSummary {
    /// Path relative to the output folder when inside it, otherwise the file name.
    pub ply_file: String,
    pub filename: String,
    pub file_size_mb: f64,
    /// Modification time in seconds since the Unix epoch, for cache invalidation.
    pub modified: Option<u64>,
    #[serde(flatten)]
    pub camera: CameraMatrices,
}

pub fn preview(
    path: &Path,
    output_dir: Option<&Path>,
    camera: CameraMatrices,
) -> Result<PreviewSummary, AppError> {
    if path.as_os_str().is_empty() {
        return Err(AppError::EmptyPath);
    }
    if !path.exists() {
        return Err(AppError::NotFound(path.to_path_buf()));
    }

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ply_file = output_dir
        .and_then(|dir| path.strip_prefix(dir).ok())
        .map(|relative| relative.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.clone());

    let size = fs::metadata(path)?.len() as f64 / (1024.0 * 1024.0);
    info!("Loading PLY: {} ({:.2} MB)", filename, size);

    Ok(PreviewSummary {
        ply_file,
        filename,
        file_size_mb: (size * 100.0).round() / 100.0,
        modified: change_token(path)
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map(|elapsed| elapsed.as_secs()),
        camera,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary {
    pub name: String,
    pub kind: &'static str,
}

/// Post-sigmoid opacity statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpacitySummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectReport {
    pub points: usize,
    pub fields: Vec<FieldSummary>,
    /// `[min, max]` corners of the positions.
    pub bounds: Option<[[f32; 3]; 2]>,
    pub opacity: Option<OpacitySummary>,
}

pub fn inspect(path: &Path) -> Result<InspectReport, AppError> {
    let cloud = read_point_cloud(path)?;

    let fields = cloud
        .columns()
        .iter()
        .map(|c| FieldSummary {
            name: c.name.clone(),
            kind: c.data.kind().name(),
        })
        .collect();
    let bounds = cloud
        .bounds()
        .map(|(min, max)| [min.to_array(), max.to_array()]);
    let opacity = cloud.column(OPACITY_FIELD).and_then(|column| {
        let values: Vec<f64> = column.data.to_f64_vec().into_iter().map(sigmoid).collect();
        if values.is_empty() {
            return None;
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Some(OpacitySummary { min, max, mean })
    });

    Ok(InspectReport {
        points: cloud.len(),
        fields,
        bounds,
        opacity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use splatprep_data::{Column, ColumnData, PointCloud, write_point_cloud};

    #[test]
    fn test_preview_relative_to_output() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("scenes");
        fs::create_dir(&nested).unwrap();
        let path = nested.join("room.ply");
        fs::write(&path, vec![0u8; 3 * 1024 * 1024]).unwrap();

        let summary = preview(&path, Some(root.path()), CameraMatrices::default()).unwrap();
        assert_eq!(summary.filename, "room.ply");
        assert_eq!(Path::new(&summary.ply_file), Path::new("scenes/room.ply"));
        assert_eq!(summary.file_size_mb, 3.0);
        assert!(summary.modified.is_some());

        let outside = preview(&path, None, CameraMatrices::default()).unwrap();
        assert_eq!(outside.ply_file, "room.ply");
    }

    #[test]
    fn test_preview_missing_file() {
        let err = preview(Path::new("/nope/room.ply"), None, CameraMatrices::default()).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_inspect() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("s.ply");
        let cloud = PointCloud::new(vec![
            Column::new("x", ColumnData::F32(vec![0.0, 2.0])),
            Column::new("y", ColumnData::F32(vec![-1.0, 1.0])),
            Column::new("z", ColumnData::F32(vec![0.0, 0.0])),
            Column::new("opacity", ColumnData::F32(vec![0.0, 0.0])),
        ])
        .unwrap();
        write_point_cloud(&cloud, &path).unwrap();

        let report = inspect(&path).unwrap();
        assert_eq!(report.points, 2);
        assert_eq!(report.fields[3].kind, "float");
        assert_eq!(report.bounds, Some([[0.0, -1.0, 0.0], [2.0, 1.0, 0.0]]));
        assert_eq!(
            report.opacity,
            Some(OpacitySummary {
                min: 0.5,
                max: 0.5,
                mean: 0.5
            })
        );
    }

    #[test]
    fn test_inspect_unparseable() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("bad.ply");
        fs::write(&path, b"garbage").unwrap();
        assert!(matches!(inspect(&path), Err(AppError::Data(_))));
    }
}
