use crate::enums::Orientation;
use crate::rescale::RescaleParameters;

use ndarray::Array3;
use ndarray::Axis;
use rayon::prelude::*;

/// Physical layout of a volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeGeometry {
    /// Voxel size in millimeters as (x, y, z).
    pub spacing: (f64, f64, f64),
    /// Patient position of the first voxel.
    pub origin: (f64, f64, f64),
}

impl Default for VolumeGeometry {
    fn default() -> Self {
        Self::new((1.0, 1.0, 1.0))
    }
}

impl VolumeGeometry {
    pub fn new(spacing: (f64, f64, f64)) -> Self {
        Self {
            spacing,
            origin: (0.0, 0.0, 0.0),
        }
    }

    pub fn with_origin(mut self, origin: (f64, f64, f64)) -> Self {
        self.origin = origin;
        self
    }

    /// Spacing along the axis an orientation looks down.
    pub fn depth_spacing(&self, orientation: Orientation) -> f64 {
        match orientation {
            Orientation::Axial => self.spacing.2,
            Orientation::Coronal => self.spacing.1,
            Orientation::Sagittal => self.spacing.0,
        }
    }
}

/// A scalar volume in its stored (not rescaled) domain.
#[derive(Debug, Clone)]
pub struct Volume {
    /// Stored values indexed (z, y, x).
    pub data: Array3<f32>,
    pub geometry: VolumeGeometry,
    pub rescale: RescaleParameters,
}

impl Volume {
    pub fn new(data: Array3<f32>, geometry: VolumeGeometry, rescale: RescaleParameters) -> Self {
        Self {
            data,
            geometry,
            rescale,
        }
    }

    /// Get the dimensions of the volume (depth, height, width)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Index extent as `[x0, x1, y0, y1, z0, z1]`, inclusive.
    pub fn extent(&self) -> [usize; 6] {
        let (depth, height, width) = self.dim();
        [
            0,
            width.saturating_sub(1),
            0,
            height.saturating_sub(1),
            0,
            depth.saturating_sub(1),
        ]
    }

    /// Minimum and maximum stored value, `None` for an empty volume.
    pub fn scalar_range(&self) -> Option<(f32, f32)> {
        let data = self.data.as_slice()?;
        data.par_iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold_with(None, |acc: Option<(f32, f32)>, v| match acc {
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                None => Some((v, v)),
            })
            .reduce(
                || None,
                |a, b| match (a, b) {
                    (Some(a), Some(b)) => Some((a.0.min(b.0), a.1.max(b.1))),
                    (a, None) => a,
                    (None, b) => b,
                },
            )
    }

    /// Number of slices an orientation steps through.
    pub fn depth_along(&self, orientation: Orientation) -> usize {
        self.data.len_of(Self::axis(orientation))
    }

    pub(crate) fn axis(orientation: Orientation) -> Axis {
        match orientation {
            Orientation::Axial => Axis(0),
            Orientation::Coronal => Axis(1),
            Orientation::Sagittal => Axis(2),
        }
    }

    /// Image size (width, height) of a projection at voxel resolution.
    pub fn projection_dimensions(&self, orientation: Orientation) -> (u32, u32) {
        let (depth, height, width) = self.dim();
        let (w, h) = match orientation {
            // Looking down Z-axis: X is width, Y is height
            Orientation::Axial => (width, height),
            // Looking down Y-axis: X is width, Z is height
            Orientation::Coronal => (width, depth),
            // Looking down X-axis: Y is width, Z is height
            Orientation::Sagittal => (height, depth),
        };
        (w as u32, h as u32)
    }

    /// Image size (width, height) of a projection with square pixels, scaled
    /// so the finest in-plane spacing keeps one pixel per voxel.
    pub fn isotropic_dimensions(&self, orientation: Orientation) -> (u32, u32) {
        let (sx, sy, sz) = self.geometry.spacing;
        let (w, h) = self.projection_dimensions(orientation);
        let (sw, sh) = match orientation {
            Orientation::Axial => (sx, sy),
            Orientation::Coronal => (sx, sz),
            Orientation::Sagittal => (sy, sz),
        };
        let min_spacing = sw.min(sh);
        if min_spacing.is_nan() || min_spacing <= 0.0 || !sw.is_finite() || !sh.is_finite() {
            return (w, h);
        }
        let inv_min_spacing = 1.0 / min_spacing;
        let scale = |n: u32, s: f64| ((n as f64 * s * inv_min_spacing).round() as u32).max(1);
        (scale(w, sw), scale(h, sh))
    }
}
