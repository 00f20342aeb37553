//! Codec seam between the columnar record and a concrete file format.

use crate::cloud::PointCloud;
use crate::error::DataError;
use std::path::Path;

/// Reads and writes whole point-cloud files.
pub trait CloudCodec: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    fn read(&self, path: &Path) -> Result<PointCloud, DataError>;

    fn write(&self, cloud: &PointCloud, path: &Path) -> Result<(), DataError>;
}

/// Codec compiled into this build, or [`DataError::Unsupported`] when none is.
#[cfg(feature = "ply")]
pub fn default_codec() -> Result<Box<dyn CloudCodec>, DataError> {
    Ok(Box::new(crate::ply::PlyCodec))
}

/// Codec compiled into this build, or [`DataError::Unsupported`] when none is.
#[cfg(not(feature = "ply"))]
pub fn default_codec() -> Result<Box<dyn CloudCodec>, DataError> {
    Err(DataError::Unsupported(
        "built without the `ply` feature".to_string(),
    ))
}
