//! Camera extrinsics and pinhole intrinsics.
//!
//! glam matrices are column-major; everything that leaves this module as plain
//! arrays is row-major.

use glam::{DMat3, DMat4, DVec3};

/// Camera pose as a 4x4 rigid transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extrinsics(pub DMat4);

impl Extrinsics {
    pub fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        Self(DMat4::from_cols_array_2d(&rows).transpose())
    }

    pub fn to_rows(&self) -> [[f64; 4]; 4] {
        self.0.transpose().to_cols_array_2d()
    }

    /// Camera position in world space.
    pub fn translation(&self) -> DVec3 {
        self.0.w_axis.truncate()
    }
}

impl Default for Extrinsics {
    fn default() -> Self {
        default_extrinsics()
    }
}

/// Pinhole projection `[[fx, 0, cx], [0, fy, cy], [0, 0, 1]]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intrinsics(pub DMat3);

impl Intrinsics {
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self::from_rows([[fx, 0.0, cx], [0.0, fy, cy], [0.0, 0.0, 1.0]])
    }

    pub fn from_rows(rows: [[f64; 3]; 3]) -> Self {
        Self(DMat3::from_cols_array_2d(&rows).transpose())
    }

    pub fn to_rows(&self) -> [[f64; 3]; 3] {
        self.0.transpose().to_cols_array_2d()
    }

    pub fn fx(&self) -> f64 {
        self.0.x_axis.x
    }

    pub fn fy(&self) -> f64 {
        self.0.y_axis.y
    }

    pub fn cx(&self) -> f64 {
        self.0.z_axis.x
    }

    pub fn cy(&self) -> f64 {
        self.0.z_axis.y
    }

    /// Horizontal FOV in degrees implied by `fx` for an image `width` pixels wide.
    pub fn horizontal_fov_degrees(&self, width: u32) -> f64 {
        (2.0 * (width as f64 / (2.0 * self.fx())).atan()).to_degrees()
    }
}

/// Identity pose: camera at the world origin, no rotation.
pub fn default_extrinsics() -> Extrinsics {
    Extrinsics(DMat4::IDENTITY)
}

/// Square-pixel pinhole intrinsics for a horizontal FOV in degrees.
///
/// The FOV is not range checked; 0 and 180 degrees are singular.
pub fn intrinsics_from_fov(width: u32, height: u32, fov_degrees: f64) -> Intrinsics {
    let width = width as f64;
    let height = height as f64;
    let fx = width / (2.0 * (fov_degrees.to_radians() / 2.0).tan());
    Intrinsics::new(fx, fx, width / 2.0, height / 2.0)
}
