//! # DICOM-volume-presets library
//!
//! This crate turns CT window and tissue presets into the color and
//! opacity transfer functions a volume renderer consumes.

//!
//! Presets are defined in Hounsfield Units. CT series usually store raw
//! values that map to HU through RescaleSlope and RescaleIntercept, so
//! every landmark is converted into the volume's stored scalar domain
//! before it is placed on a curve. Five presets are available:
//!  - `soft`, `bone`, `lung`: grayscale ramps over the classic windows
//!  - `bone-only`: everything below trabecular bone is transparent
//!  - `cinematic`: stylized amber tissue and white bone
//!
//! Around the presets the crate carries what is needed to look at a
//! series: a loader that picks the largest series in a directory and
//! stacks its slices into a volume, and a CPU renderer that composites
//! the volume along one of the medical axes:
//!  - Axial
//!  - Coronal
//!  - Sagittal
//!
//! Missing or degenerate metadata, degenerate windows and unknown preset
//! names never fail: each falls back to a fixed default and is logged
//! through `tracing`.
//!
//! # Examples
//!
//! ## Building the curves for a preset
//!
//! ```
//! # use dicom_volume_presets::{PresetRequest, RescaleParameters, select};
//! let rescale = RescaleParameters::new(1.0, -1024.0);
//! let selection = select(&PresetRequest::new("soft", false));
//! let curves = selection.preset.build(&rescale);
//! assert_eq!(curves.color.range(), Some((864.0, 1264.0)));
//! ```
//!
//! ## Rendering a DICOM directory
//!
//! ```no_run
//! # use dicom_volume_presets::{Orientation, Preset, SortBy, VolumeLoader, VolumeProperty};
//! # use dicom_volume_presets::transfer_function::Rgb;
//! # use dicom_volume_presets::renderer;
//! let volume = VolumeLoader::load_from_directory("dicom", SortBy::ImagePositionPatient)
//!     .expect("should have loaded a series from directory");
//! let property = VolumeProperty::assemble(Preset::Bone, &volume.rescale, &volume.geometry);
//! renderer::render_to_file(
//!     &volume,
//!     &property,
//!     Orientation::Coronal,
//!     Rgb::new(0.1, 0.1, 0.12),
//!     "bone.png",
//! )
//! .expect("should have rendered the volume");
//! ```

pub mod config;
pub mod enums;
pub mod policy;
pub mod presets;
pub mod property;
pub mod renderer;
pub mod rescale;
pub mod selector;
pub mod transfer_function;
pub mod volume;
pub mod volume_loader;
pub mod window;

#[cfg(test)]
mod test_log;

pub use config::RenderConfig;
pub use enums::{Orientation, ScalarDomain, SortBy};
pub use presets::Preset;
pub use property::{SharedProperty, VolumeProperty};
pub use rescale::{RescaleIssue, RescaleParameters};
pub use selector::{PresetRequest, Selection, UnknownPreset, select};
pub use transfer_function::{ColorCurve, OpacityCurve, TransferFunctions};
pub use volume::{Volume, VolumeGeometry};
pub use volume_loader::{VolumeLoader, VolumeLoaderError};
pub use window::WindowLevel;
