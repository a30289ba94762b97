//! CT visualization presets and the transfer function builders behind them.
//!
//! Every landmark below is in Hounsfield Units. Builders convert each one
//! to the stored scalar domain with the volume's [`RescaleParameters`]
//! before inserting it, and always return freshly built curves.

use std::fmt;

use crate::rescale::RescaleParameters;
use crate::transfer_function::{ColorCurve, OpacityCurve, Rgb, TransferFunctions};
use crate::window::WindowLevel;

/// The closed set of visualization presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Preset {
    #[default]
    Soft,
    Bone,
    Lung,
    BoneOnly,
    Cinematic,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::Soft,
        Preset::Bone,
        Preset::Lung,
        Preset::BoneOnly,
        Preset::Cinematic,
    ];

    /// Canonical lower-case token.
    pub fn name(self) -> &'static str {
        match self {
            Preset::Soft => "soft",
            Preset::Bone => "bone",
            Preset::Lung => "lung",
            Preset::BoneOnly => "bone-only",
            Preset::Cinematic => "cinematic",
        }
    }

    /// Window used by the grayscale presets, `None` for the others.
    pub fn window(self) -> Option<WindowLevel> {
        let (center, width) = match self {
            Preset::Soft => SOFT_WINDOW,
            Preset::Bone => BONE_WINDOW,
            Preset::Lung => LUNG_WINDOW,
            Preset::BoneOnly | Preset::Cinematic => return None,
        };
        Some(WindowLevel::new(center, width))
    }

    /// Build this preset's curves with the compiled-in landmark tables.
    pub fn build(self, rescale: &RescaleParameters) -> TransferFunctions {
        match self.window() {
            Some(window) => windowed_grayscale(window, rescale),
            None if self == Preset::BoneOnly => bone_only(&BoneOnlyLandmarks::DEFAULT, rescale),
            None => cinematic(&CinematicLandmarks::DEFAULT, rescale),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// (center, width) of the soft tissue window.
pub const SOFT_WINDOW: (f64, f64) = (40.0, 400.0);
pub const BONE_WINDOW: (f64, f64) = (300.0, 1500.0);
pub const LUNG_WINDOW: (f64, f64) = (-600.0, 1500.0);

/// HU below the window floor where opacity reaches zero.
const WINDOW_FLOOR_SHOULDER: f64 = 200.0;
/// HU above the window ceiling where opacity saturates.
const WINDOW_CEILING_SHOULDER: f64 = 500.0;

/// Grayscale ramp across a window with soft opacity shoulders on both ends.
pub fn windowed_grayscale(window: WindowLevel, rescale: &RescaleParameters) -> TransferFunctions {
    let hu = |v: f64| rescale.to_scalar(v);
    let b = window.bounds();

    let color = ColorCurve::new()
        .with_point(hu(b.low), Rgb::BLACK)
        .with_point(hu(b.mid1), Rgb::gray(0.5))
        .with_point(hu(b.mid2), Rgb::gray(0.8))
        .with_point(hu(b.high), Rgb::WHITE);

    let opacity = OpacityCurve::new()
        .with_point(hu(b.low - WINDOW_FLOOR_SHOULDER), 0.00)
        .with_point(hu(b.low), 0.02)
        .with_point(hu(b.mid1), 0.10)
        .with_point(hu(b.mid2), 0.35)
        .with_point(hu(b.high), 0.80)
        .with_point(hu(b.high + WINDOW_CEILING_SHOULDER), 0.95);

    TransferFunctions { color, opacity }
}

/// One HU landmark with the color and opacity assigned to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub hu: f64,
    pub color: Rgb,
    pub opacity: f64,
}

impl Landmark {
    pub const fn new(hu: f64, color: Rgb, opacity: f64) -> Self {
        Self { hu, color, opacity }
    }
}

/// Landmarks of the bone-only preset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneOnlyLandmarks {
    /// Fully transparent below this density.
    pub floor: Landmark,
    pub ramp_start: Landmark,
    pub cortical: Landmark,
    pub dense: Landmark,
    pub ceiling: Landmark,
}

impl BoneOnlyLandmarks {
    pub const DEFAULT: BoneOnlyLandmarks = BoneOnlyLandmarks {
        floor: Landmark::new(180.0, Rgb::new(0.88, 0.78, 0.62), 0.00),
        ramp_start: Landmark::new(250.0, Rgb::new(0.92, 0.84, 0.70), 0.02),
        cortical: Landmark::new(700.0, Rgb::new(0.96, 0.92, 0.84), 0.45),
        dense: Landmark::new(1500.0, Rgb::WHITE, 0.90),
        ceiling: Landmark::new(3000.0, Rgb::WHITE, 0.97),
    };

    pub fn as_array(&self) -> [Landmark; 5] {
        [
            self.floor,
            self.ramp_start,
            self.cortical,
            self.dense,
            self.ceiling,
        ]
    }
}

impl Default for BoneOnlyLandmarks {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Landmarks of the cinematic skull preset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CinematicLandmarks {
    pub air: Landmark,
    pub fat: Landmark,
    pub water: Landmark,
    pub soft_high: Landmark,
    pub trabecular: Landmark,
    pub cortical: Landmark,
    pub teeth: Landmark,
    pub ceiling: Landmark,
}

impl CinematicLandmarks {
    pub const DEFAULT: CinematicLandmarks = CinematicLandmarks {
        air: Landmark::new(-1000.0, Rgb::BLACK, 0.00),
        fat: Landmark::new(-100.0, Rgb::new(0.55, 0.25, 0.12), 0.00),
        water: Landmark::new(0.0, Rgb::new(0.78, 0.45, 0.25), 0.05),
        soft_high: Landmark::new(150.0, Rgb::new(0.88, 0.62, 0.38), 0.12),
        trabecular: Landmark::new(300.0, Rgb::new(0.93, 0.84, 0.68), 0.35),
        cortical: Landmark::new(700.0, Rgb::new(0.97, 0.94, 0.86), 0.80),
        teeth: Landmark::new(1500.0, Rgb::WHITE, 0.95),
        ceiling: Landmark::new(3000.0, Rgb::WHITE, 0.98),
    };

    pub fn as_array(&self) -> [Landmark; 8] {
        [
            self.air,
            self.fat,
            self.water,
            self.soft_high,
            self.trabecular,
            self.cortical,
            self.teeth,
            self.ceiling,
        ]
    }
}

impl Default for CinematicLandmarks {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn from_landmarks(landmarks: &[Landmark], rescale: &RescaleParameters) -> TransferFunctions {
    let mut tf = TransferFunctions::default();
    for landmark in landmarks {
        let position = rescale.to_scalar(landmark.hu);
        tf.color.add_point(position, landmark.color);
        tf.opacity.add_point(position, landmark.opacity);
    }
    tf
}

/// Only trabecular and denser bone is visible; soft tissue is removed by
/// opacity alone, so the color ramp starts at the floor landmark.
pub fn bone_only(landmarks: &BoneOnlyLandmarks, rescale: &RescaleParameters) -> TransferFunctions {
    from_landmarks(&landmarks.as_array(), rescale)
}

/// Stylized amber-tissue to white-bone rendering. Not for diagnosis.
pub fn cinematic(landmarks: &CinematicLandmarks, rescale: &RescaleParameters) -> TransferFunctions {
    from_landmarks(&landmarks.as_array(), rescale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer_function::{Blend, ControlPoint};
    use proptest::prelude::*;

    fn ct() -> RescaleParameters {
        RescaleParameters::new(1.0, -1024.0)
    }

    fn strictly_increasing<V>(points: &[ControlPoint<V>]) -> bool {
        points.windows(2).all(|w| w[0].position < w[1].position)
    }

    fn assert_well_formed(tf: &TransferFunctions) {
        assert!(strictly_increasing(tf.color.points()));
        assert!(strictly_increasing(tf.opacity.points()));
        for p in tf.opacity.points() {
            assert!((0.0..=1.0).contains(&p.value));
        }
        for p in tf.color.points() {
            assert_eq!(p.value, p.value.clamp_unit());
        }
    }

    #[test]
    fn soft_window_lands_on_shifted_scalars() {
        let tf = Preset::Soft.build(&ct());
        let color: Vec<_> = tf.color.points().iter().map(|p| p.position).collect();
        assert_eq!(color, vec![864.0, 964.0, 1164.0, 1264.0]);

        let opacity: Vec<_> = tf
            .opacity
            .points()
            .iter()
            .map(|p| (p.position, p.value))
            .collect();
        assert_eq!(
            opacity,
            vec![
                (664.0, 0.00),
                (864.0, 0.02),
                (964.0, 0.10),
                (1164.0, 0.35),
                (1264.0, 0.80),
                (1764.0, 0.95),
            ]
        );
    }

    #[test]
    fn windowed_presets_use_their_windows() {
        let identity = RescaleParameters::identity();
        let bone = Preset::Bone.build(&identity);
        assert_eq!(bone.color.range(), Some((-450.0, 1050.0)));
        let lung = Preset::Lung.build(&identity);
        assert_eq!(lung.color.range(), Some((-1350.0, 150.0)));
    }

    #[test]
    fn bone_only_floor_is_transparent() {
        let tf = Preset::BoneOnly.build(&ct());
        let floor = tf.opacity.points()[0];
        assert_eq!(floor.position, 180.0 + 1024.0);
        assert_eq!(floor.value, 0.0);
        assert!(
            tf.opacity
                .points()
                .windows(2)
                .all(|w| w[0].value < w[1].value)
        );
        assert_eq!(tf.color.len(), 5);
        assert_eq!(tf.color.points()[4].value, Rgb::WHITE);
        assert_eq!(tf.opacity.value(0.0), 0.0);
    }

    #[test]
    fn cinematic_hides_air_and_fat() {
        let landmarks = CinematicLandmarks::DEFAULT;
        let rescale = ct();
        let tf = Preset::Cinematic.build(&rescale);
        assert_eq!(tf.opacity.value(rescale.to_scalar(landmarks.air.hu)), 0.0);
        assert_eq!(tf.opacity.value(rescale.to_scalar(landmarks.fat.hu)), 0.0);
        assert!(tf.opacity.value(rescale.to_scalar(landmarks.teeth.hu)) >= 0.90);

        let from_water = &tf.opacity.points()[2..];
        assert!(from_water.windows(2).all(|w| w[0].value < w[1].value));
    }

    #[test]
    fn landmark_tables_can_be_substituted() {
        let landmarks = BoneOnlyLandmarks {
            floor: Landmark::new(150.0, Rgb::gray(0.9), 0.0),
            ..BoneOnlyLandmarks::DEFAULT
        };
        let tf = bone_only(&landmarks, &RescaleParameters::identity());
        assert_eq!(tf.opacity.points()[0].position, 150.0);
    }

    #[test]
    fn negative_slope_still_yields_increasing_positions() {
        let rescale = RescaleParameters::new(-1.0, 0.0);
        for preset in Preset::ALL {
            assert_well_formed(&preset.build(&rescale));
        }
    }

    #[test]
    fn rebuild_does_not_carry_stale_points() {
        let rescale = ct();
        let soft = Preset::Soft.build(&rescale);
        let _ = Preset::Cinematic.build(&rescale);
        assert_eq!(Preset::Soft.build(&rescale), soft);
    }

    proptest! {
        #[test]
        fn every_preset_builds_well_formed_curves(
            slope in prop_oneof![-4.0f64..-0.05, 0.05f64..4.0, Just(0.0)],
            intercept in -2048.0f64..2048.0,
        ) {
            let rescale = RescaleParameters::new(slope, intercept);
            for preset in Preset::ALL {
                let tf = preset.build(&rescale);
                prop_assert!(strictly_increasing(tf.color.points()));
                prop_assert!(strictly_increasing(tf.opacity.points()));
                prop_assert!(tf.opacity.points().iter().all(|p| (0.0..=1.0).contains(&p.value)));
                prop_assert!(tf.color.points().iter().all(|p| p.value == p.value.clamp_unit()));
            }
        }
    }
}
