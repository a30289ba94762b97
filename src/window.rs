//! Window/level math shared by the windowed presets.

/// Narrowest window accepted; anything smaller collapses the ramp.
pub const MIN_WINDOW_WIDTH: f64 = 1.0;

/// A window center and width in Hounsfield Units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowLevel {
    center: f64,
    width: f64,
}

/// The four landmarks of a simple windowed ramp, in Hounsfield Units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowBounds {
    pub low: f64,
    pub mid1: f64,
    pub mid2: f64,
    pub high: f64,
}

impl WindowLevel {
    /// Create a window, flooring the width at [`MIN_WINDOW_WIDTH`].
    pub fn new(center: f64, width: f64) -> Self {
        // `f64::max` also maps a NaN width onto the floor
        let clamped = width.max(MIN_WINDOW_WIDTH);
        if width.is_nan() || width < MIN_WINDOW_WIDTH {
            tracing::warn!(
                "Degenerate window width {width} (center {center}), using {MIN_WINDOW_WIDTH}"
            );
        }
        Self {
            center,
            width: clamped,
        }
    }

    pub fn center(&self) -> f64 {
        self.center
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn bounds(&self) -> WindowBounds {
        let low = self.center - self.width / 2.0;
        WindowBounds {
            low,
            mid1: self.width.mul_add(0.25, low),
            mid2: self.width.mul_add(0.75, low),
            high: self.center + self.width / 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn soft_tissue_bounds() {
        let bounds = WindowLevel::new(40.0, 400.0).bounds();
        assert_eq!(
            bounds,
            WindowBounds {
                low: -160.0,
                mid1: -60.0,
                mid2: 140.0,
                high: 240.0,
            }
        );
    }

    #[test]
    fn width_is_floored() {
        assert_eq!(WindowLevel::new(0.0, 0.0).width(), 1.0);
        assert_eq!(WindowLevel::new(0.0, -250.0).width(), 1.0);
        assert_eq!(WindowLevel::new(0.0, f64::NAN).width(), 1.0);
        assert_eq!(WindowLevel::new(0.0, 0.5).width(), 1.0);
    }

    proptest! {
        #[test]
        fn bounds_are_strictly_increasing(
            center in -3000.0f64..3000.0,
            width in -5000.0f64..5000.0,
        ) {
            let b = WindowLevel::new(center, width).bounds();
            prop_assert!(b.low < b.mid1);
            prop_assert!(b.mid1 < b.mid2);
            prop_assert!(b.mid2 < b.high);
        }
    }
}
