//! FOV-driven image resolution recommendation.
//!
//! The anchors and calibration factor are empirical: they were tuned so that
//! splats render at a comfortable on-screen size in the viewer, not derived from
//! a projection model. Keep them as they are.

use tracing::debug;

/// Smallest accepted horizontal FOV in degrees.
pub const MIN_FOV_DEGREES: f64 = 10.0;
/// Largest accepted horizontal FOV in degrees.
pub const MAX_FOV_DEGREES: f64 = 180.0;

/// `(fov_degrees, product)` anchors, increasing in FOV.
pub const REFERENCE_POINTS: [(f64, f64); 7] = [
    (10.0, 61440.0),
    (30.0, 15360.0),
    (50.0, 10240.0),
    (100.0, 4096.0),
    (120.0, 2560.0),
    (150.0, 1920.0),
    (180.0, 1600.0),
];

pub const CALIBRATION_FACTOR: f64 = 0.8;

pub const MIN_RESOLUTION: u32 = 256;
pub const MAX_RESOLUTION: u32 = 8192;

/// Resolutions are multiples of this for buffer alignment.
pub const RESOLUTION_ALIGNMENT: u32 = 16;

/// Piecewise-linear interpolation of the reference table at `fov_degrees`.
///
/// Values outside the table take the nearest end anchor.
pub fn reference_product(fov_degrees: f64) -> f64 {
    let fov = fov_degrees.clamp(MIN_FOV_DEGREES, MAX_FOV_DEGREES);
    let (first_fov, first_product) = REFERENCE_POINTS[0];
    let (last_fov, last_product) = REFERENCE_POINTS[REFERENCE_POINTS.len() - 1];

    if fov <= first_fov {
        return first_product;
    }
    if fov >= last_fov {
        return last_product;
    }

    for pair in REFERENCE_POINTS.windows(2) {
        let (fov1, prod1) = pair[0];
        let (fov2, prod2) = pair[1];
        if fov1 <= fov && fov <= fov2 {
            let t = (fov - fov1) / (fov2 - fov1);
            return prod1 + t * (prod2 - prod1);
        }
    }

    // NaN falls through every comparison
    last_product
}

/// Recommended square `(width, height)` for a horizontal FOV and target splat scale.
///
/// Output is always within [`MIN_RESOLUTION`, `MAX_RESOLUTION`] and a multiple of
/// [`RESOLUTION_ALIGNMENT`]. Alignment rounds up, so the defaults (50°, scale 10)
/// land on 832 rather than the 816 that rounding to the nearest multiple gives.
pub fn recommend_resolution(fov_degrees: f64, target_scale: f64) -> (u32, u32) {
    let product = reference_product(fov_degrees);
    let base = product / 10.0;
    let target = base * (10.0 / target_scale) * CALIBRATION_FACTOR;

    // float-to-int casts saturate, and NaN becomes 0
    let rounded = (target + 0.5) as i64;
    let clamped = rounded.clamp(MIN_RESOLUTION as i64, MAX_RESOLUTION as i64) as u32;
    let resolution = clamped.div_ceil(RESOLUTION_ALIGNMENT) * RESOLUTION_ALIGNMENT;

    debug!(
        "Recommended resolution for FOV {}° @ scale {}: {}x{}",
        fov_degrees, target_scale, resolution, resolution
    );
    (resolution, resolution)
}
