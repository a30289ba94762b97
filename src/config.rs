//! Settings for one load-and-render run.

use crate::enums::{Orientation, ScalarDomain, SortBy};
use crate::rescale::RescaleParameters;
use crate::selector::PresetRequest;
use crate::transfer_function::Rgb;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub preset: PresetRequest,
    pub scalar_domain: ScalarDomain,
    pub orientation: Orientation,
    pub sort_by: SortBy,
    pub background: Rgb,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            preset: PresetRequest::default(),
            scalar_domain: ScalarDomain::Stored,
            orientation: Orientation::Coronal,
            sort_by: SortBy::ImagePositionPatient,
            background: Rgb::new(0.1, 0.1, 0.12),
        }
    }
}

impl RenderConfig {
    /// The rescale to build curves with, given what the volume carries.
    pub fn effective_rescale(&self, from_volume: RescaleParameters) -> RescaleParameters {
        match self.scalar_domain {
            ScalarDomain::Stored => from_volume,
            ScalarDomain::Hounsfield => RescaleParameters::identity(),
        }
    }
}
