//! Assembly of everything the renderer reads for one configuration.
//!
//! A property is always rebuilt as a whole and moved into place. Readers
//! holding the previous [`Arc`] keep a consistent snapshot until they drop
//! it, so a rebuild never mutates curves that a render is walking.

use std::sync::{Arc, PoisonError, RwLock};

use crate::policy;
use crate::presets::Preset;
use crate::rescale::RescaleParameters;
use crate::selector::{self, PresetRequest};
use crate::transfer_function::{ColorCurve, OpacityCurve, TransferFunctions};
use crate::volume::VolumeGeometry;

/// Render-time description of how scalars become color and opacity.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeProperty {
    pub preset: Preset,
    pub color: ColorCurve,
    pub scalar_opacity: OpacityCurve,
    pub gradient_opacity: OpacityCurve,
    /// Distance over which `scalar_opacity` values accumulate as given.
    pub unit_distance: f64,
    pub linear_interpolation: bool,
    pub shade: bool,
}

impl VolumeProperty {
    /// Build a fresh property for `preset`.
    pub fn assemble(
        preset: Preset,
        rescale: &RescaleParameters,
        geometry: &VolumeGeometry,
    ) -> Self {
        let TransferFunctions { color, opacity } = preset.build(rescale);
        let unit_distance = policy::unit_distance(geometry);
        tracing::debug!(
            "Assembled {preset} property: {} color points, {} opacity points, unit distance {unit_distance}",
            color.len(),
            opacity.len(),
        );
        Self {
            preset,
            color,
            scalar_opacity: opacity,
            gradient_opacity: policy::gradient_opacity(),
            unit_distance,
            linear_interpolation: true,
            shade: true,
        }
    }

    /// Select a preset from a request and assemble it.
    pub fn from_request(
        request: &PresetRequest,
        rescale: &RescaleParameters,
        geometry: &VolumeGeometry,
    ) -> Self {
        let selection = selector::select(request);
        Self::assemble(selection.preset, rescale, geometry)
    }

    /// Replace both preset curves with newly built ones.
    pub fn set_transfer_functions(&mut self, preset: Preset, tf: TransferFunctions) {
        self.preset = preset;
        self.color = tf.color;
        self.scalar_opacity = tf.opacity;
    }
}

/// Holder shared between whoever reconfigures and whoever renders.
#[derive(Debug, Clone)]
pub struct SharedProperty {
    current: Arc<RwLock<Arc<VolumeProperty>>>,
}

impl SharedProperty {
    pub fn new(property: VolumeProperty) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(property))),
        }
    }

    /// Snapshot of the property in effect right now.
    pub fn load(&self) -> Arc<VolumeProperty> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Swap in a fully built property.
    pub fn store(&self, property: VolumeProperty) {
        let next = Arc::new(property);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = next;
    }

    /// Build the curves for `preset` off to the side, then swap. The write
    /// lock is held from reading the current property to the swap, so a
    /// concurrent [`Self::store`] is never lost. Readers keep the snapshot
    /// they already hold.
    pub fn rebuild(&self, preset: Preset, rescale: &RescaleParameters) {
        let tf = preset.build(rescale);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = VolumeProperty::clone(&guard);
        next.set_transfer_functions(preset, tf);
        *guard = Arc::new(next);
    }
}
