//! Conversion between Hounsfield Units and the volume's stored scalar domain.
//!
//! CT slices store raw values that map to Hounsfield Units through
//! `HU = scalar * slope + intercept` (RescaleSlope / RescaleIntercept).
//! Transfer functions are specified in HU, so every landmark is pushed
//! through [`RescaleParameters::to_scalar`] before it lands on a curve.

use std::fmt;

/// Where a set of rescale parameters came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RescaleProvenance {
    /// Both tags were present in the metadata.
    #[default]
    Tagged,
    /// At least one tag was absent and replaced by its default.
    Defaulted {
        slope_missing: bool,
        intercept_missing: bool,
    },
    /// Scalars are known to already be Hounsfield Units.
    AssumedHounsfield,
}

/// A condition that forced a fallback while resolving rescale parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RescaleIssue {
    /// RescaleSlope absent, 1.0 used.
    MissingSlope,
    /// RescaleIntercept absent, 0.0 used.
    MissingIntercept,
    /// RescaleSlope is zero or not finite, 1.0 used for division.
    DegenerateSlope,
    /// RescaleIntercept is not finite, 0.0 used.
    DegenerateIntercept,
}

impl fmt::Display for RescaleIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RescaleIssue::MissingSlope => write!(f, "RescaleSlope missing, defaulting to 1.0"),
            RescaleIssue::MissingIntercept => {
                write!(f, "RescaleIntercept missing, defaulting to 0.0")
            }
            RescaleIssue::DegenerateSlope => {
                write!(f, "RescaleSlope is degenerate, substituting 1.0")
            }
            RescaleIssue::DegenerateIntercept => {
                write!(f, "RescaleIntercept is not finite, substituting 0.0")
            }
        }
    }
}

/// Linear rescale of one loaded volume.
///
/// The slope is kept as read so that a degenerate value stays visible in
/// diagnostics; arithmetic always goes through [`Self::effective_slope`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RescaleParameters {
    slope: f64,
    intercept: f64,
    provenance: RescaleProvenance,
}

impl Default for RescaleParameters {
    fn default() -> Self {
        Self::identity()
    }
}

impl RescaleParameters {
    /// Parameters known from metadata. A degenerate slope or intercept is
    /// accepted, substituted on use and logged here.
    pub fn new(slope: f64, intercept: f64) -> Self {
        let params = Self {
            slope,
            intercept,
            provenance: RescaleProvenance::Tagged,
        };
        for issue in params.issues() {
            tracing::warn!("{issue}");
        }
        params
    }

    /// Slope 1, intercept 0, for volumes whose scalars already are HU.
    pub fn identity() -> Self {
        Self {
            slope: 1.0,
            intercept: 0.0,
            provenance: RescaleProvenance::AssumedHounsfield,
        }
    }

    /// Resolve parameters from optionally present metadata values,
    /// logging every fallback that had to be taken.
    pub fn from_metadata(slope: Option<f64>, intercept: Option<f64>) -> Self {
        let provenance = if slope.is_none() || intercept.is_none() {
            RescaleProvenance::Defaulted {
                slope_missing: slope.is_none(),
                intercept_missing: intercept.is_none(),
            }
        } else {
            RescaleProvenance::Tagged
        };
        let params = Self {
            slope: slope.unwrap_or(1.0),
            intercept: intercept.unwrap_or(0.0),
            provenance,
        };
        for issue in params.issues() {
            tracing::warn!("{issue}");
        }
        params
    }

    /// The slope as read from metadata, possibly zero.
    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn intercept(&self) -> f64 {
        if self.intercept.is_finite() {
            self.intercept
        } else {
            0.0
        }
    }

    pub fn provenance(&self) -> RescaleProvenance {
        self.provenance
    }

    /// The slope used for arithmetic: 1.0 whenever the stored one is
    /// zero or not finite.
    pub fn effective_slope(&self) -> f64 {
        if self.is_degenerate() { 1.0 } else { self.slope }
    }

    pub fn is_degenerate(&self) -> bool {
        self.slope == 0.0 || !self.slope.is_finite()
    }

    /// All fallbacks applied to these parameters.
    pub fn issues(&self) -> Vec<RescaleIssue> {
        let mut issues = Vec::new();
        if let RescaleProvenance::Defaulted {
            slope_missing,
            intercept_missing,
        } = self.provenance
        {
            if slope_missing {
                issues.push(RescaleIssue::MissingSlope);
            }
            if intercept_missing {
                issues.push(RescaleIssue::MissingIntercept);
            }
        }
        if self.is_degenerate() {
            issues.push(RescaleIssue::DegenerateSlope);
        }
        if !self.intercept.is_finite() {
            issues.push(RescaleIssue::DegenerateIntercept);
        }
        issues
    }

    /// Hounsfield Units to stored scalar.
    #[inline]
    pub fn to_scalar(&self, hu: f64) -> f64 {
        (hu - self.intercept()) / self.effective_slope()
    }

    /// Stored scalar to Hounsfield Units.
    #[inline]
    pub fn to_hu(&self, scalar: f64) -> f64 {
        scalar.mul_add(self.effective_slope(), self.intercept())
    }
}
