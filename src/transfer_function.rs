//! Piecewise-linear transfer functions over the scalar domain.
//!
//! A curve is an ordered list of control points with strictly increasing
//! positions. Adding a point at an existing position replaces the old
//! value, anything else is inserted in order, so a curve built from
//! landmarks that a negative rescale slope reverses is still well formed.

/// Values that can be blended between two control points.
pub trait Blend: Copy {
    fn blend(self, other: Self, t: f64) -> Self;
    fn clamp_unit(self) -> Self;
    fn zero() -> Self;
}

impl Blend for f64 {
    #[inline]
    fn blend(self, other: Self, t: f64) -> Self {
        (other - self).mul_add(t, self)
    }

    fn clamp_unit(self) -> Self {
        if self.is_nan() { 0.0 } else { self.clamp(0.0, 1.0) }
    }

    fn zero() -> Self {
        0.0
    }
}

/// A color with components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(level: f64) -> Self {
        Self::new(level, level, level)
    }
}

impl Blend for Rgb {
    #[inline]
    fn blend(self, other: Self, t: f64) -> Self {
        Rgb::new(
            self.r.blend(other.r, t),
            self.g.blend(other.g, t),
            self.b.blend(other.b, t),
        )
    }

    fn clamp_unit(self) -> Self {
        Rgb::new(self.r.clamp_unit(), self.g.clamp_unit(), self.b.clamp_unit())
    }

    fn zero() -> Self {
        Rgb::BLACK
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint<V> {
    pub position: f64,
    pub value: V,
}

/// An ordered sequence of control points.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve<V> {
    points: Vec<ControlPoint<V>>,
}

/// Scalar to color.
pub type ColorCurve = Curve<Rgb>;
/// Scalar (or gradient magnitude) to opacity.
pub type OpacityCurve = Curve<f64>;

impl<V> Default for Curve<V> {
    fn default() -> Self {
        Self { points: Vec::new() }
    }
}

impl<V: Blend> Curve<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a point, keeping positions strictly increasing. Values are
    /// clamped to [0, 1]; non-finite positions are ignored.
    pub fn add_point(&mut self, position: f64, value: V) {
        if !position.is_finite() {
            tracing::warn!("Ignoring control point at non-finite position {position}");
            return;
        }
        let point = ControlPoint {
            position,
            value: value.clamp_unit(),
        };
        match self
            .points
            .binary_search_by(|p| p.position.total_cmp(&position))
        {
            Ok(index) => self.points[index] = point,
            Err(index) => self.points.insert(index, point),
        }
    }

    /// Builder form of [`Self::add_point`].
    pub fn with_point(mut self, position: f64, value: V) -> Self {
        self.add_point(position, value);
        self
    }

    pub fn points(&self) -> &[ControlPoint<V>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The covered position range, if any point exists.
    pub fn range(&self) -> Option<(f64, f64)> {
        Some((self.points.first()?.position, self.points.last()?.position))
    }

    /// Evaluate at `x`: constant outside the end points, linear between.
    /// NaN evaluates to zero.
    pub fn value(&self, x: f64) -> V {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) if !x.is_nan() => (first, last),
            _ => return V::zero(),
        };
        if x <= first.position {
            return first.value;
        }
        if x >= last.position {
            return last.value;
        }
        let upper = self.points.partition_point(|p| p.position <= x);
        let a = &self.points[upper - 1];
        let b = &self.points[upper];
        let t = (x - a.position) / (b.position - a.position);
        a.value.blend(b.value, t)
    }
}

impl ColorCurve {
    /// Convenience mirror of the usual `AddRGBPoint` call shape.
    pub fn add_rgb_point(&mut self, position: f64, r: f64, g: f64, b: f64) {
        self.add_point(position, Rgb::new(r, g, b));
    }
}

/// The color and scalar-opacity curves produced by one preset build.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransferFunctions {
    pub color: ColorCurve,
    pub opacity: OpacityCurve,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_stay_sorted_and_unique() {
        let mut curve = OpacityCurve::new();
        curve.add_point(10.0, 0.5);
        curve.add_point(-5.0, 0.0);
        curve.add_point(3.0, 0.2);
        curve.add_point(10.0, 0.9);

        let positions: Vec<_> = curve.points().iter().map(|p| p.position).collect();
        assert_eq!(positions, vec![-5.0, 3.0, 10.0]);
        assert_eq!(curve.points()[2].value, 0.9);
    }

    #[test]
    fn values_are_clamped() {
        let curve = ColorCurve::new().with_point(0.0, Rgb::new(-1.0, 0.5, 3.0));
        assert_eq!(curve.points()[0].value, Rgb::new(0.0, 0.5, 1.0));

        let curve = OpacityCurve::new().with_point(0.0, f64::NAN);
        assert_eq!(curve.points()[0].value, 0.0);
    }

    #[test]
    fn non_finite_positions_are_dropped() {
        let curve = OpacityCurve::new()
            .with_point(f64::INFINITY, 1.0)
            .with_point(f64::NAN, 1.0);
        assert!(curve.is_empty());
        assert_eq!(curve.range(), None);
    }

    #[test]
    fn evaluation_interpolates_and_clamps() {
        let curve = OpacityCurve::new()
            .with_point(0.0, 0.0)
            .with_point(100.0, 1.0)
            .with_point(200.0, 0.5);
        assert_eq!(curve.value(-50.0), 0.0);
        assert_eq!(curve.value(50.0), 0.5);
        assert_eq!(curve.value(100.0), 1.0);
        assert_eq!(curve.value(150.0), 0.75);
        assert_eq!(curve.value(500.0), 0.5);
        assert_eq!(OpacityCurve::new().value(1.0), 0.0);
    }

    #[test]
    fn evaluation_is_total_over_non_finite_input() {
        let curve = OpacityCurve::new()
            .with_point(0.0, 0.2)
            .with_point(100.0, 1.0);
        assert_eq!(curve.value(f64::NAN), 0.0);
        assert_eq!(curve.value(f64::NEG_INFINITY), 0.2);
        assert_eq!(curve.value(f64::INFINITY), 1.0);

        let single = ColorCurve::new().with_point(5.0, Rgb::WHITE);
        assert_eq!(single.value(f64::NAN), Rgb::BLACK);
    }

    #[test]
    fn color_evaluation_blends_channels() {
        let mut curve = ColorCurve::new();
        curve.add_rgb_point(0.0, 0.0, 0.0, 0.0);
        curve.add_rgb_point(10.0, 1.0, 0.5, 0.0);
        assert_eq!(curve.value(5.0), Rgb::new(0.5, 0.25, 0.0));
    }
}
