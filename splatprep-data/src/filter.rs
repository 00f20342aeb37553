//! Opacity filtering of Gaussian splat records.
//!
//! Stored opacities are logits. A splat is kept when `sigmoid(opacity) >= threshold`.
//! Filtering is an optional step for callers, so [`SplatFilter::filter`] never fails:
//! every problem is logged and resolves to the unfiltered source path.

use crate::codec::{CloudCodec, default_codec};
use crate::error::DataError;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Field holding the opacity logit.
pub const OPACITY_FIELD: &str = "opacity";

/// Logistic sigmoid.
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Per-point keep flags: `sigmoid(logit) >= threshold`.
pub fn opacity_mask(logits: &[f64], threshold: f64) -> Vec<bool> {
    logits.iter().map(|&x| sigmoid(x) >= threshold).collect()
}

/// Sibling path `{stem}_opacity{threshold:.2}.ply` next to `source`.
pub fn filtered_path(source: &Path, threshold: f64) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = format!("{}_opacity{:.2}.ply", stem, threshold);
    match source.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// What a filtering pass did.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    /// The record has no opacity field.
    NoOpacityField,
    /// Every point passed; nothing written.
    AllKept { total: usize },
    /// No point passed; nothing written.
    NoneKept { total: usize },
    /// A filtered copy was written to `path`.
    Filtered {
        path: PathBuf,
        kept: usize,
        total: usize,
    },
}

impl FilterOutcome {
    /// Path callers should use after this outcome.
    pub fn resolve(&self, source: &Path) -> PathBuf {
        match self {
            FilterOutcome::Filtered { path, .. } => path.clone(),
            _ => source.to_path_buf(),
        }
    }
}

/// Drops low-opacity splats from point-cloud files.
pub struct SplatFilter {
    codec: Box<dyn CloudCodec>,
}

impl SplatFilter {
    /// Filter using the codec compiled into this build.
    ///
    /// Fails with [`DataError::Unsupported`] when no codec is available.
    pub fn new() -> Result<Self, DataError> {
        let codec = default_codec()?;
        debug!("Splat filter using '{}' codec", codec.name());
        Ok(Self { codec })
    }

    pub fn with_codec(codec: impl CloudCodec + 'static) -> Self {
        Self {
            codec: Box::new(codec),
        }
    }

    /// Filter `source` and return the path to use: the filtered copy, or `source`
    /// itself when filtering had no effect or failed.
    pub fn filter(&self, source: &Path, threshold: f64) -> PathBuf {
        match self.try_filter(source, threshold) {
            Ok(outcome) => outcome.resolve(source),
            Err(e) => {
                error!("Error filtering {}: {}", source.display(), e);
                source.to_path_buf()
            }
        }
    }

    /// Filter `source`, reporting errors instead of falling back.
    #[tracing::instrument(skip_all, fields(path = %source.display(), threshold = threshold))]
    pub fn try_filter(&self, source: &Path, threshold: f64) -> Result<FilterOutcome, DataError> {
        let cloud = self.codec.read(source)?;
        info!("PLY fields: {:?}", cloud.field_names());

        let Some(opacity) = cloud.column(OPACITY_FIELD) else {
            warn!(
                "No '{}' field found in {:?}, skipping filter",
                OPACITY_FIELD,
                cloud.field_names()
            );
            return Ok(FilterOutcome::NoOpacityField);
        };

        let logits = opacity.data.to_f64_vec();
        if let Some((min, max)) = opacity_range(&logits) {
            info!("Opacity range after sigmoid: [{:.4}, {:.4}]", min, max);
        }

        let mask = opacity_mask(&logits, threshold);
        let total = mask.len();
        let kept = mask.iter().filter(|keep| **keep).count();
        let percent = if total > 0 {
            100.0 * kept as f64 / total as f64
        } else {
            0.0
        };
        info!(
            "Opacity filter: threshold={:.3}, kept {}/{} gaussians ({:.1}%)",
            threshold, kept, total, percent
        );

        if kept == 0 {
            warn!("All gaussians filtered out! Using original file");
            return Ok(FilterOutcome::NoneKept { total });
        }
        if kept == total {
            info!("All gaussians passed filter, using original file");
            return Ok(FilterOutcome::AllKept { total });
        }

        let filtered = cloud.select_rows(&mask)?;
        if let Some((min, max)) = filtered.bounds() {
            debug!("Filtered bounds: min={:?} max={:?}", min, max);
        }

        let path = filtered_path(source, threshold);
        self.codec.write(&filtered, &path)?;
        info!("Saved filtered PLY: {}", path.display());

        Ok(FilterOutcome::Filtered { path, kept, total })
    }
}

fn opacity_range(logits: &[f64]) -> Option<(f64, f64)> {
    let mut values = logits.iter().map(|&x| sigmoid(x));
    let first = values.next()?;
    Some(values.fold((first, first), |(min, max), v| (min.min(v), max.max(v))))
}
