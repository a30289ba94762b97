use crate::{
    enums::SortBy,
    rescale::RescaleParameters,
    volume::{Volume, VolumeGeometry},
};

use dicom::{
    core::Tag,
    object::{FileDicomObject, InMemDicomObject, open_file},
    pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder, VoiLutOption},
};
use dicom_dictionary_std::tags;
use ndarray::{Array2, Array3, s};
use rayon::prelude::*;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VolumeLoaderError {
    #[error("No valid DICOM images found")]
    NoValidImages,

    #[error("Inconsistent image dimensions")]
    InconsistentDimensions,

    #[error("Missing spacing information")]
    MissingSpacing,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DICOM error: {0}")]
    Dicom(#[from] dicom::object::ReadError),
}

type DicomFile = FileDicomObject<InMemDicomObject>;

/// Identity of one series within a directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SeriesKey {
    pub study_instance_uid: String,
    pub series_instance_uid: String,
}

impl SeriesKey {
    pub fn of(dicom_object: &InMemDicomObject) -> Self {
        Self {
            study_instance_uid: read_string(dicom_object, tags::STUDY_INSTANCE_UID),
            series_instance_uid: read_string(dicom_object, tags::SERIES_INSTANCE_UID),
        }
    }
}

fn read_string(dicom_object: &InMemDicomObject, tag: Tag) -> String {
    dicom_object
        .element(tag)
        .ok()
        .and_then(|e| e.to_str().ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn read_f64(dicom_object: &InMemDicomObject, tag: Tag) -> Option<f64> {
    dicom_object.element(tag).ok()?.to_float64().ok()
}

fn read_multi_f64(dicom_object: &InMemDicomObject, tag: Tag) -> Option<Vec<f64>> {
    dicom_object.element(tag).ok()?.to_multi_float64().ok()
}

/// RescaleSlope and RescaleIntercept, defaulted and logged when absent.
pub fn read_rescale(dicom_object: &InMemDicomObject) -> RescaleParameters {
    RescaleParameters::from_metadata(
        read_f64(dicom_object, tags::RESCALE_SLOPE),
        read_f64(dicom_object, tags::RESCALE_INTERCEPT),
    )
}

/// Group objects by study and series, logging what was found.
pub fn group_series<T>(
    items: Vec<T>,
    key: impl Fn(&T) -> SeriesKey,
) -> BTreeMap<SeriesKey, Vec<T>> {
    let mut series: BTreeMap<SeriesKey, Vec<T>> = BTreeMap::new();
    for item in items {
        series.entry(key(&item)).or_default().push(item);
    }
    for (key, members) in &series {
        tracing::info!(
            "Study {} series {}: {} files",
            key.study_instance_uid,
            key.series_instance_uid,
            members.len()
        );
    }
    series
}

/// The series with the most members; the first in key order on ties.
pub fn select_largest_series<T>(
    series: BTreeMap<SeriesKey, Vec<T>>,
) -> Option<(SeriesKey, Vec<T>)> {
    series
        .into_iter()
        .fold(None, |best: Option<(SeriesKey, Vec<T>)>, candidate| match best {
            Some(best) if best.1.len() >= candidate.1.len() => Some(best),
            _ => Some(candidate),
        })
}

struct Slice<'a> {
    order: Option<f64>,
    position: Option<Vec<f64>>,
    image: Array2<f32>,
    object: &'a DicomFile,
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Load a volume from DICOM objects of one series
    ///
    /// # Arguments
    ///
    /// * `dicom_objects` - Slice of DICOM file objects
    /// * `sort_by` - Method to sort the slices
    ///
    /// # Errors
    ///
    /// Returns error if no valid images found, dimensions are inconsistent
    /// or no spacing can be derived
    pub fn load_from_dicom_objects(
        dicom_objects: &[DicomFile],
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let mut slices: Vec<_> = dicom_objects
            .par_iter()
            .filter_map(|dicom_object| Self::extract_slice(dicom_object, sort_by))
            .collect();

        if slices.is_empty() {
            return Err(VolumeLoaderError::NoValidImages);
        }

        Self::sort_slices(&mut slices, sort_by);
        Self::validate_dimensions(&slices)?;

        let first = slices[0].object;
        let spacing = Self::get_spacing(&slices).ok_or(VolumeLoaderError::MissingSpacing)?;
        let origin = slices[0]
            .position
            .as_deref()
            .and_then(|p| Some((*p.first()?, *p.get(1)?, *p.get(2)?)))
            .unwrap_or_default();
        let rescale = read_rescale(first);
        let volume_array = Self::build_volume_array(&slices);

        Ok(Volume::new(
            volume_array,
            VolumeGeometry::new(spacing).with_origin(origin),
            rescale,
        ))
    }

    /// Load a volume from file paths
    pub fn load_from_file_paths(
        paths: &[impl AsRef<Path>],
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let objects: Result<Vec<_>, _> =
            paths.iter().map(|path| open_file(path.as_ref())).collect();

        Self::load_from_dicom_objects(&objects?, sort_by)
    }

    /// Load the largest series found among the regular files of a directory.
    /// Files that do not parse as DICOM are skipped.
    pub fn load_from_directory(
        path: impl AsRef<Path>,
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let paths: Vec<PathBuf> = fs::read_dir(path.as_ref())?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();

        if paths.is_empty() {
            return Err(VolumeLoaderError::NoValidImages);
        }

        let objects: Vec<DicomFile> = paths
            .par_iter()
            .filter_map(|path| match open_file(path) {
                Ok(object) => Some(object),
                Err(e) => {
                    tracing::debug!("Skipping {}: {e}", path.display());
                    None
                }
            })
            .collect();

        let series = group_series(objects, |object| SeriesKey::of(object));
        let (key, objects) =
            select_largest_series(series).ok_or(VolumeLoaderError::NoValidImages)?;
        tracing::info!(
            "Reading series {} ({} files)",
            key.series_instance_uid,
            objects.len()
        );

        Self::load_from_dicom_objects(&objects, sort_by)
    }

    fn extract_slice(dicom_object: &DicomFile, sort_by: SortBy) -> Option<Slice<'_>> {
        let order = Self::get_sort_order(dicom_object, sort_by)?;
        let image = Self::decode_image(dicom_object)?;
        Some(Slice {
            order,
            position: read_multi_f64(dicom_object, tags::IMAGE_POSITION_PATIENT),
            image,
            object: dicom_object,
        })
    }

    fn get_sort_order(dicom_object: &DicomFile, sort_by: SortBy) -> Option<Option<f64>> {
        match sort_by {
            SortBy::ImagePositionPatient => {
                let pos = read_multi_f64(dicom_object, tags::IMAGE_POSITION_PATIENT)?;
                Some(pos.get(2).copied())
            }
            SortBy::TablePosition => Some(read_f64(dicom_object, tags::TABLE_POSITION)),
            SortBy::InstanceNumber => {
                let num = dicom_object
                    .element(tags::INSTANCE_NUMBER)
                    .ok()?
                    .to_int::<i32>()
                    .ok()
                    .map(f64::from);
                Some(num)
            }
            SortBy::None => Some(Some(0.0)),
        }
    }

    /// Decode the first frame as raw stored values, leaving the rescale to
    /// the transfer functions.
    fn decode_image(dicom_object: &DicomFile) -> Option<Array2<f32>> {
        let pixel_data = match dicom_object.decode_pixel_data() {
            Ok(pixel_data) => pixel_data,
            Err(e) => {
                tracing::warn!("Could not decode pixel data: {e}");
                return None;
            }
        };
        let options = ConvertOptions::new()
            .with_modality_lut(ModalityLutOption::None)
            .with_voi_lut(VoiLutOption::Identity);
        pixel_data
            .to_ndarray_with_options::<f32>(&options)
            .ok()
            .map(|arr| arr.slice_move(s![0, .., .., 0]))
    }

    fn sort_slices(slices: &mut [Slice<'_>], sort_by: SortBy) {
        if !matches!(sort_by, SortBy::None) {
            slices.sort_by(|a, b| {
                a.order
                    .partial_cmp(&b.order)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        // superior slice first
        if matches!(sort_by, SortBy::ImagePositionPatient) {
            slices.reverse();
        }
    }

    fn validate_dimensions(slices: &[Slice<'_>]) -> Result<(), VolumeLoaderError> {
        let first_dim = slices[0].image.dim();
        if slices.iter().any(|slice| slice.image.dim() != first_dim) {
            return Err(VolumeLoaderError::InconsistentDimensions);
        }
        Ok(())
    }

    fn build_volume_array(slices: &[Slice<'_>]) -> Array3<f32> {
        let (height, width) = slices[0].image.dim();
        let depth = slices.len();
        let mut volume = Array3::<f32>::zeros((depth, height, width));

        for (i, slice) in slices.iter().enumerate() {
            volume.slice_mut(s![i, .., ..]).assign(&slice.image);
        }

        volume
    }

    /// In-plane spacing from PixelSpacing (row, column). Slice spacing from
    /// the distance between the first two positions, else SliceThickness.
    fn get_spacing(slices: &[Slice<'_>]) -> Option<(f64, f64, f64)> {
        let (row_spacing, column_spacing) = slices.iter().find_map(|slice| {
            let pixel_spacing = read_multi_f64(slice.object, tags::PIXEL_SPACING)?;
            Some((*pixel_spacing.first()?, *pixel_spacing.get(1)?))
        })?;

        let between_positions = match slices {
            [a, b, ..] => a
                .position
                .as_deref()
                .zip(b.position.as_deref())
                .map(|(a, b)| {
                    a.iter()
                        .zip(b)
                        .map(|(a, b)| (a - b) * (a - b))
                        .sum::<f64>()
                        .sqrt()
                })
                .filter(|d| *d > 0.0),
            _ => None,
        };

        let slice_spacing = between_positions.or_else(|| {
            slices
                .iter()
                .find_map(|slice| read_f64(slice.object, tags::SLICE_THICKNESS))
        })?;

        Some((column_spacing, row_spacing, slice_spacing))
    }
}
