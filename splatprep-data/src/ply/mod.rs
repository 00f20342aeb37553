//! PLY file loading and writing

mod reader;
mod writer;

pub use reader::{read_point_cloud, read_point_cloud_from};
pub use writer::{write_point_cloud, write_point_cloud_to};

use crate::cloud::{PointCloud, ScalarKind};
use crate::codec::CloudCodec;
use crate::error::DataError;
use ply_rs::ply::ScalarType;
use std::path::Path;

/// Name of the element that holds one row per splat.
pub const VERTEX_ELEMENT: &str = "vertex";

/// [`CloudCodec`] backed by `ply-rs`. Writes binary little endian.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlyCodec;

impl CloudCodec for PlyCodec {
    fn name(&self) -> &'static str {
        "ply"
    }

    fn read(&self, path: &Path) -> Result<PointCloud, DataError> {
        read_point_cloud(path)
    }

    fn write(&self, cloud: &PointCloud, path: &Path) -> Result<(), DataError> {
        write_point_cloud(cloud, path).map(|_| ())
    }
}

fn scalar_kind(scalar: &ScalarType) -> ScalarKind {
    match scalar {
        ScalarType::Char => ScalarKind::I8,
        ScalarType::UChar => ScalarKind::U8,
        ScalarType::Short => ScalarKind::I16,
        ScalarType::UShort => ScalarKind::U16,
        ScalarType::Int => ScalarKind::I32,
        ScalarType::UInt => ScalarKind::U32,
        ScalarType::Float => ScalarKind::F32,
        ScalarType::Double => ScalarKind::F64,
    }
}

fn scalar_type(kind: ScalarKind) -> ScalarType {
    match kind {
        ScalarKind::I8 => ScalarType::Char,
        ScalarKind::U8 => ScalarType::UChar,
        ScalarKind::I16 => ScalarType::Short,
        ScalarKind::U16 => ScalarType::UShort,
        ScalarKind::I32 => ScalarType::Int,
        ScalarKind::U32 => ScalarType::UInt,
        ScalarKind::F32 => ScalarType::Float,
        ScalarKind::F64 => ScalarType::Double,
    }
}
