//! Staged-rollout fractions

use crate::error::TrackError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Proportion of eligible users receiving a release, always within `[0, 1]`
///
/// Zero means the track is not a staged rollout.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct UserFraction(f64);

impl UserFraction {
    /// Not a staged rollout
    pub const ZERO: Self = Self(0.0);

    /// Create a fraction
    ///
    /// # Errors
    /// - `TrackError::FractionOutOfRange` for values outside `[0, 1]` or NaN
    #[inline]
    pub fn new(value: f64) -> Result<Self, TrackError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(TrackError::FractionOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Convert an operator-supplied percentage (0–100)
    ///
    /// # Errors
    /// - `TrackError::PercentageOutOfRange` above 100
    #[inline]
    pub fn from_percentage(percentage: u32) -> Result<Self, TrackError> {
        if percentage > 100 {
            return Err(TrackError::PercentageOutOfRange(percentage));
        }
        Ok(Self(f64::from(percentage) / 100.0))
    }

    /// Raw fraction
    #[inline]
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Whether this fraction marks a staged rollout
    #[inline]
    #[must_use]
    pub fn is_staged(self) -> bool {
        self.0 > 0.0
    }

    /// Fraction as a percentage, rounded to two decimals for display
    #[inline]
    #[must_use]
    pub fn as_percentage(self) -> f64 {
        (self.0 * 10_000.0).round() / 100.0
    }
}

impl TryFrom<f64> for UserFraction {
    type Error = TrackError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserFraction> for f64 {
    fn from(fraction: UserFraction) -> Self {
        fraction.0
    }
}

impl Display for UserFraction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage())
    }
}
