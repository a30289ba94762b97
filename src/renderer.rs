//! CPU composite projection of a volume through a [`VolumeProperty`].
//!
//! Rays run along one volume axis at voxel resolution. Samples are
//! composited front to back with opacity corrected for step length, so
//! the result only depends on physical distance and not on slice count.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgba, RgbaImage};
use ndarray::{Array3, Zip};
use rayon::prelude::*;
use thiserror::Error;

use crate::enums::Orientation;
use crate::property::VolumeProperty;
use crate::transfer_function::Rgb;
use crate::volume::Volume;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Cannot render an empty volume")]
    EmptyVolume,

    #[error("Projection buffer does not fit a {width}x{height} image")]
    ImageBuffer { width: u32, height: u32 },

    #[error("Failed to save image: {0}")]
    Save(#[from] image::ImageError),
}

/// Accumulated opacity beyond which a ray stops.
const OPACITY_CUTOFF: f64 = 0.99;
const AMBIENT: f64 = 0.3;
const DIFFUSE: f64 = 0.7;

/// Per-voxel gradient (x, y, z) in scalar units per millimeter, from
/// central differences (one-sided on the border).
pub fn gradients(volume: &Volume) -> Array3<[f32; 3]> {
    let data = volume.data();
    let (depth, height, width) = data.dim();
    let spacing = |s: f64| if s > 0.0 && s.is_finite() { s as f32 } else { 1.0 };
    let (sx, sy, sz) = volume.geometry.spacing;
    let (sx, sy, sz) = (spacing(sx), spacing(sy), spacing(sz));

    let mut out = Array3::from_elem(data.raw_dim(), [0.0f32; 3]);
    Zip::indexed(&mut out).par_for_each(|(z, y, x), g| {
        let diff = |i: usize, len: usize, s: f32, at: &dyn Fn(usize) -> f32| {
            let lo = i.saturating_sub(1);
            let hi = (i + 1).min(len - 1);
            if hi == lo {
                0.0
            } else {
                (at(hi) - at(lo)) / ((hi - lo) as f32 * s)
            }
        };
        *g = [
            diff(x, width, sx, &|i: usize| data[[z, y, i]]),
            diff(y, height, sy, &|i: usize| data[[z, i, x]]),
            diff(z, depth, sz, &|i: usize| data[[i, y, x]]),
        ];
    });
    out
}

/// Map an image pixel and a ray step to a voxel index (z, y, x).
#[inline]
fn voxel(orientation: Orientation, u: usize, v: usize, k: usize) -> [usize; 3] {
    match orientation {
        Orientation::Axial => [k, v, u],
        Orientation::Coronal => [v, k, u],
        Orientation::Sagittal => [v, u, k],
    }
}

#[inline]
fn to_u8(c: f64) -> u8 {
    (c * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Render a composite projection looking down `orientation`'s axis,
/// resampled to square pixels.
pub fn render(
    volume: &Volume,
    property: &VolumeProperty,
    orientation: Orientation,
    background: Rgb,
) -> Result<RgbaImage, RenderError> {
    if volume.is_empty() {
        return Err(RenderError::EmptyVolume);
    }
    let data = volume.data();
    let grads = gradients(volume);
    let (width, height) = volume.projection_dimensions(orientation);
    let samples = volume.depth_along(orientation);
    let axis = match orientation {
        Orientation::Axial => 2,
        Orientation::Coronal => 1,
        Orientation::Sagittal => 0,
    };

    let step = volume.geometry.depth_spacing(orientation);
    let step = if step > 0.0 && step.is_finite() { step } else { 1.0 };
    let exponent = step / property.unit_distance;

    let shade = |g: &[f32; 3]| -> f64 {
        if !property.shade {
            return 1.0;
        }
        let magnitude = f64::from(g[0].hypot(g[1]).hypot(g[2]));
        if magnitude == 0.0 {
            return 1.0;
        }
        let facing = (f64::from(g[axis]) / magnitude).abs();
        DIFFUSE.mul_add(facing, AMBIENT)
    };

    let trace = |u: usize, v: usize| -> Rgba<u8> {
        let mut color = Rgb::BLACK;
        let mut alpha = 0.0f64;
        for k in 0..samples {
            let index = voxel(orientation, u, v, k);
            let scalar = f64::from(data[index]);
            if !scalar.is_finite() {
                continue;
            }
            let mut opacity = property.scalar_opacity.value(scalar);
            if opacity <= 0.0 {
                continue;
            }
            let g = &grads[index];
            let magnitude = f64::from(g[0].hypot(g[1]).hypot(g[2]));
            if !magnitude.is_finite() {
                continue;
            }
            opacity *= property.gradient_opacity.value(magnitude);
            if opacity <= 0.0 {
                continue;
            }
            let opacity = 1.0 - (1.0 - opacity).powf(exponent);
            let sample = property.color.value(scalar);
            let weight = (1.0 - alpha) * opacity * shade(g);
            color.r += weight * sample.r;
            color.g += weight * sample.g;
            color.b += weight * sample.b;
            alpha += (1.0 - alpha) * opacity;
            if alpha >= OPACITY_CUTOFF {
                break;
            }
        }
        let rest = 1.0 - alpha;
        Rgba([
            to_u8(rest.mul_add(background.r, color.r)),
            to_u8(rest.mul_add(background.g, color.g)),
            to_u8(rest.mul_add(background.b, color.b)),
            u8::MAX,
        ])
    };

    let pixel_data: Vec<u8> = (0..height as usize)
        .into_par_iter()
        .flat_map_iter(|v| {
            (0..width as usize)
                .flat_map(|u| trace(u, v).0)
                .collect::<Vec<u8>>()
        })
        .collect();

    let image: RgbaImage = ImageBuffer::from_raw(width, height, pixel_data)
        .ok_or(RenderError::ImageBuffer { width, height })?;

    let (iso_width, iso_height) = volume.isotropic_dimensions(orientation);
    if (iso_width, iso_height) == (width, height) {
        return Ok(image);
    }
    let filter = if property.linear_interpolation {
        FilterType::Triangle
    } else {
        FilterType::Nearest
    };
    tracing::debug!("Resampling {width}x{height} projection to {iso_width}x{iso_height}");
    Ok(imageops::resize(&image, iso_width, iso_height, filter))
}

/// Render and write the projection as an image file.
pub fn render_to_file(
    volume: &Volume,
    property: &VolumeProperty,
    orientation: Orientation,
    background: Rgb,
    path: impl AsRef<Path>,
) -> Result<(), RenderError> {
    let image = render(volume, property, orientation, background)?;
    image.save(path.as_ref())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::Preset;
    use crate::rescale::RescaleParameters;
    use crate::volume::VolumeGeometry;

    const BACKGROUND: Rgb = Rgb::new(0.1, 0.1, 0.12);

    /// Air everywhere with a dense cube (HU 1000) in the middle.
    fn phantom(spacing: (f64, f64, f64)) -> Volume {
        let data = Array3::from_shape_fn((8, 8, 8), |(z, y, x)| {
            if (2..6).contains(&z) && (2..6).contains(&y) && (2..6).contains(&x) {
                2024.0
            } else {
                0.0
            }
        });
        Volume::new(
            data,
            VolumeGeometry::new(spacing),
            RescaleParameters::new(1.0, -1024.0),
        )
    }

    fn property(volume: &Volume, preset: Preset) -> VolumeProperty {
        VolumeProperty::assemble(preset, &volume.rescale, &volume.geometry)
    }

    #[test]
    fn gradient_uses_central_differences() {
        let data = Array3::from_shape_fn((1, 1, 4), |(_, _, x)| (x * 10) as f32);
        let volume = Volume::new(
            data,
            VolumeGeometry::new((2.0, 1.0, 1.0)),
            RescaleParameters::identity(),
        );
        let g = gradients(&volume);
        assert_eq!(g[[0, 0, 0]], [5.0, 0.0, 0.0]);
        assert_eq!(g[[0, 0, 1]], [5.0, 0.0, 0.0]);
        assert_eq!(g[[0, 0, 3]], [5.0, 0.0, 0.0]);
    }

    #[test]
    fn bone_shows_through_air() {
        let volume = phantom((1.0, 1.0, 1.0));
        let image = render(
            &volume,
            &property(&volume, Preset::BoneOnly),
            Orientation::Axial,
            BACKGROUND,
        )
        .expect("render");

        assert_eq!(image.dimensions(), (8, 8));
        assert_eq!(image.get_pixel(0, 0), &Rgba([26, 26, 31, 255]));
        let center = image.get_pixel(4, 4);
        assert!(center[0] > 100, "center pixel {center:?}");
    }

    #[test]
    fn non_finite_voxels_are_skipped() {
        let mut data = phantom((1.0, 1.0, 1.0)).data().clone();
        data[[3, 3, 3]] = f32::NAN;
        data[[0, 1, 1]] = f32::INFINITY;
        data[[7, 6, 6]] = f32::NEG_INFINITY;
        let volume = Volume::new(
            data,
            VolumeGeometry::new((1.0, 1.0, 1.0)),
            RescaleParameters::new(1.0, -1024.0),
        );

        for preset in Preset::ALL {
            let image = render(
                &volume,
                &property(&volume, preset),
                Orientation::Axial,
                BACKGROUND,
            )
            .expect("render");
            assert_eq!(image.dimensions(), (8, 8));
            if preset == Preset::BoneOnly {
                assert_eq!(image.get_pixel(0, 0), &Rgba([26, 26, 31, 255]));
            }
        }
    }

    #[test]
    fn empty_volume_is_rejected() {
        let volume = Volume::new(
            Array3::zeros((0, 0, 0)),
            VolumeGeometry::default(),
            RescaleParameters::identity(),
        );
        let property = property(&volume, Preset::Soft);
        assert!(matches!(
            render(&volume, &property, Orientation::Axial, BACKGROUND),
            Err(RenderError::EmptyVolume)
        ));
    }

    #[test]
    fn thick_slices_are_resampled() {
        let volume = phantom((0.5, 0.5, 1.0));
        let image = render(
            &volume,
            &property(&volume, Preset::Cinematic),
            Orientation::Coronal,
            BACKGROUND,
        )
        .expect("render");
        assert_eq!(image.dimensions(), (8, 16));
    }
}
