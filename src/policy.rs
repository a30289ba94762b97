//! Preset-independent parts of the render property.

use crate::transfer_function::OpacityCurve;
use crate::volume::VolumeGeometry;

/// Smallest opacity unit distance handed to the renderer.
pub const MIN_UNIT_DISTANCE: f64 = 0.5;

/// Opacity as a function of gradient magnitude.
///
/// Flat and noisy regions (magnitude below 50) contribute nothing, strong
/// transitions keep their full scalar opacity. The curve works on raw
/// gradient magnitude and does not depend on the rescale.
pub fn gradient_opacity() -> OpacityCurve {
    OpacityCurve::new()
        .with_point(0.0, 0.0)
        .with_point(50.0, 0.0)
        .with_point(110.0, 0.3)
        .with_point(400.0, 1.0)
}

/// Half the voxel diagonal, never below [`MIN_UNIT_DISTANCE`].
///
/// Opacity curves are defined per this distance, so coarse volumes do not
/// look denser than fine ones at the same curve values.
pub fn unit_distance(geometry: &VolumeGeometry) -> f64 {
    let (sx, sy, sz) = geometry.spacing;
    let diagonal = sz.mul_add(sz, sx.mul_add(sx, sy * sy)).sqrt();
    // NaN spacing falls through `max` onto the floor
    (0.5 * diagonal).max(MIN_UNIT_DISTANCE)
}
