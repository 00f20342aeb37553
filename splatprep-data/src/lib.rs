//! Splatprep Data Crate
//!
//! Columnar point-cloud records, PLY reading/writing and opacity filtering for
//! Gaussian splat files. Records keep every field of the source file so a
//! filtered copy differs from its source only in which rows it contains.

pub mod cloud;
pub mod codec;
pub mod error;
pub mod filter;
#[cfg(feature = "ply")]
pub mod ply;

pub use cloud::{Column, ColumnData, PointCloud, ScalarKind};
pub use codec::{CloudCodec, default_codec};
pub use error::DataError;
pub use filter::{FilterOutcome, OPACITY_FIELD, SplatFilter, filtered_path, opacity_mask, sigmoid};
#[cfg(feature = "ply")]
pub use ply::{PlyCodec, read_point_cloud, write_point_cloud};
