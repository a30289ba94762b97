//! A CLI tool for rendering a CT series from a DICOM directory
//! with a transfer function preset.
use std::path::PathBuf;

use clap::Parser;
use dicom_volume_presets::{
    Orientation, PresetRequest, RenderConfig, ScalarDomain, SortBy, VolumeLoader, VolumeProperty,
    renderer,
};
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

/// Render a DICOM series with a CT preset
#[derive(Debug, Parser)]
struct App {
    /// Directory holding the DICOM files of the series
    dicom_dir: PathBuf,

    /// Preset: soft, bone, lung, bone-only or cinematic
    #[arg(short = 'p', long = "preset", default_value = "soft")]
    preset: String,

    /// Show bone only, whatever preset is given
    #[arg(long = "bone-only")]
    bone_only: bool,

    /// Treat stored values as Hounsfield Units and ignore the rescale tags
    #[arg(long = "hu-scalars")]
    hu_scalars: bool,

    /// Axis to look down
    #[arg(long = "orientation", value_enum, default_value_t = Orientation::Coronal)]
    orientation: Orientation,

    /// Slice ordering
    #[arg(long = "sort-by", value_enum, default_value_t = SortBy::ImagePositionPatient)]
    sort_by: SortBy,

    /// Path to the output image
    #[arg(short = 'o', long = "out", default_value = "render.png")]
    output: PathBuf,

    /// Print more information about the volume and the transfer functions
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

/// Where a run failed, each with its own exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Load,
    Render,
    Save,
}

impl Stage {
    fn exit_code(self) -> i32 {
        match self {
            Stage::Load => -1,
            Stage::Render => -2,
            Stage::Save => -3,
        }
    }
}

fn main() {
    let App {
        dicom_dir,
        preset,
        bone_only,
        hu_scalars,
        orientation,
        sort_by,
        output,
        verbose,
    } = App::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(if verbose {
            LevelFilter::DEBUG.into()
        } else {
            LevelFilter::INFO.into()
        })
        .from_env_lossy();
    if let Err(e) = tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(filter)
            .finish(),
    ) {
        eprintln!("[ERROR] Could not set up global logging subscriber: {e}");
    }

    let config = RenderConfig {
        preset: PresetRequest::new(preset, bone_only),
        scalar_domain: if hu_scalars {
            ScalarDomain::Hounsfield
        } else {
            ScalarDomain::Stored
        },
        orientation,
        sort_by,
        ..RenderConfig::default()
    };

    let volume =
        VolumeLoader::load_from_directory(&dicom_dir, config.sort_by).unwrap_or_else(|e| {
            error!("Failed to read DICOM series from {}: {e}", dicom_dir.display());
            std::process::exit(Stage::Load.exit_code());
        });

    let [x0, x1, y0, y1, z0, z1] = volume.extent();
    let (sx, sy, sz) = volume.geometry.spacing;
    let (ox, oy, oz) = volume.geometry.origin;
    info!("Loaded DICOM volume from: {}", dicom_dir.display());
    info!("Extent: [{x0}, {x1}] x [{y0}, {y1}] x [{z0}, {z1}]");
    info!("Spacing: ({sx}, {sy}, {sz})");
    info!("Origin: ({ox}, {oy}, {oz})");
    if let Some((lo, hi)) = volume.scalar_range() {
        info!("Scalar range: [{lo}, {hi}]");
    }

    let rescale = config.effective_rescale(volume.rescale);
    info!(
        "RescaleSlope={}, RescaleIntercept={}, scalar domain={:?}",
        rescale.slope(),
        rescale.intercept(),
        config.scalar_domain
    );

    let property = VolumeProperty::from_request(&config.preset, &rescale, &volume.geometry);
    info!(
        "Preset {} (opacity unit distance {})",
        property.preset, property.unit_distance
    );
    if let Some((lo, hi)) = property.scalar_opacity.range() {
        info!(
            "Opacity curve spans scalars [{lo}, {hi}] = HU [{}, {}]",
            rescale.to_hu(lo),
            rescale.to_hu(hi)
        );
    }

    let image = renderer::render(&volume, &property, config.orientation, config.background)
        .unwrap_or_else(|e| {
            error!("Failed to render volume: {e}");
            std::process::exit(Stage::Render.exit_code());
        });

    image.save(&output).unwrap_or_else(|e| {
        error!("Failed to save image to {}: {e}", output.display());
        std::process::exit(Stage::Save.exit_code());
    });

    info!("Image saved to {}", output.display());
}

#[cfg(test)]
mod tests {
    use crate::{App, Stage};
    use clap::{CommandFactory, Parser};

    #[test]
    fn verify_cli() {
        App::command().debug_assert();
    }

    #[test]
    fn stages_exit_with_distinct_codes() {
        let codes = [Stage::Load, Stage::Render, Stage::Save].map(Stage::exit_code);
        assert_eq!(codes, [-1, -2, -3]);
    }

    #[test]
    fn defaults() {
        let app = App::parse_from(["dicom-volume-presets", "scans"]);
        assert_eq!(app.preset, "soft");
        assert!(!app.bone_only);
        assert_eq!(app.output.to_str(), Some("render.png"));
    }

    #[test]
    fn value_enums_parse() {
        let app = App::parse_from([
            "dicom-volume-presets",
            "scans",
            "--orientation",
            "sagittal",
            "--sort-by",
            "instance-number",
            "--bone-only",
        ]);
        assert_eq!(app.orientation, super::Orientation::Sagittal);
        assert_eq!(app.sort_by, super::SortBy::InstanceNumber);
        assert!(app.bone_only);
    }
}
