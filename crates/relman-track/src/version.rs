//! Version codes
//!
//! Provides [`VersionCode`], the integer identity the publishing service
//! assigns to each uploaded build.

use crate::error::TrackError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Integer identifying one build of an application
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct VersionCode(i64);

impl VersionCode {
    /// Create a version code, rejecting zero and negative values
    ///
    /// # Errors
    /// - `TrackError::NonPositiveVersionCode` if `value <= 0`
    #[inline]
    pub fn new(value: i64) -> Result<Self, TrackError> {
        if value <= 0 {
            return Err(TrackError::NonPositiveVersionCode(value));
        }
        Ok(Self(value))
    }

    /// Raw integer value
    #[inline]
    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl Display for VersionCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VersionCode {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<i64>()
            .map_err(|_| TrackError::InvalidVersionCode(s.to_string()))?;
        Self::new(value)
    }
}

impl TryFrom<i64> for VersionCode {
    type Error = TrackError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VersionCode> for i64 {
    fn from(code: VersionCode) -> Self {
        code.0
    }
}
