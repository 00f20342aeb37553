//! Splatprep Camera Crate
//!
//! Camera parameters handed to splat viewers alongside a point-cloud file:
//! default extrinsics, pinhole intrinsics derived from a horizontal FOV, and an
//! empirical image resolution recommendation for a given FOV.

pub mod matrices;
pub mod resolution;

pub use matrices::{Extrinsics, Intrinsics, default_extrinsics, intrinsics_from_fov};
pub use resolution::{recommend_resolution, reference_product};
