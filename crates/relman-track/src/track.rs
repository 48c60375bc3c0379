//! Tracks and track names
//!
//! A [`Track`] is a named distribution channel: an ordered list of version
//! codes, a rollout fraction and the release history the service reported.
//! Tracks are plain values; nothing here talks to the service.

use crate::error::TrackError;
use crate::fraction::UserFraction;
use crate::release::Release;
use crate::version::VersionCode;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Name of a distribution track
///
/// Free-form and service-defined. The five lifecycle names have
/// constructors because the reconciliation engine reasons about them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackName(String);

impl TrackName {
    /// `internal` track name
    pub const INTERNAL: &'static str = "internal";
    /// `alpha` track name
    pub const ALPHA: &'static str = "alpha";
    /// `beta` track name
    pub const BETA: &'static str = "beta";
    /// `production` track name
    pub const PRODUCTION: &'static str = "production";
    /// `rollout` track name
    pub const ROLLOUT: &'static str = "rollout";

    /// Tracks taking part in the promotion/rollout lifecycle
    pub const LIFECYCLE: [&'static str; 5] = [
        Self::INTERNAL,
        Self::ALPHA,
        Self::BETA,
        Self::PRODUCTION,
        Self::ROLLOUT,
    ];

    /// Create a track name
    ///
    /// # Errors
    /// - `TrackError::EmptyTrackName` for blank input
    #[inline]
    pub fn new(name: impl Into<String>) -> Result<Self, TrackError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(TrackError::EmptyTrackName);
        }
        if trimmed.len() == name.len() {
            Ok(Self(name))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    /// `internal`
    #[inline]
    #[must_use]
    pub fn internal() -> Self {
        Self(Self::INTERNAL.to_string())
    }

    /// `alpha`
    #[inline]
    #[must_use]
    pub fn alpha() -> Self {
        Self(Self::ALPHA.to_string())
    }

    /// `beta`
    #[inline]
    #[must_use]
    pub fn beta() -> Self {
        Self(Self::BETA.to_string())
    }

    /// `production`
    #[inline]
    #[must_use]
    pub fn production() -> Self {
        Self(Self::PRODUCTION.to_string())
    }

    /// `rollout`
    #[inline]
    #[must_use]
    pub fn rollout() -> Self {
        Self(Self::ROLLOUT.to_string())
    }

    /// Name as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Tracks any operator may promote to (`internal`, `alpha`, `beta`)
    #[inline]
    #[must_use]
    pub fn is_standard(&self) -> bool {
        matches!(self.0.as_str(), Self::INTERNAL | Self::ALPHA | Self::BETA)
    }

    /// Whether this track is one of the five lifecycle tracks
    #[inline]
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        Self::LIFECYCLE.contains(&self.0.as_str())
    }
}

impl Display for TrackName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TrackName {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TrackName {
    type Error = TrackError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl From<TrackName> for String {
    fn from(name: TrackName) -> Self {
        name.0
    }
}

impl AsRef<str> for TrackName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A named track as reported by the publishing service
///
/// A version code appears at most once per track; deserialization rejects
/// duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TrackRecord")]
pub struct Track {
    name: TrackName,
    #[serde(default)]
    version_codes: Vec<VersionCode>,
    #[serde(default)]
    user_fraction: UserFraction,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    releases: Vec<Release>,
}

/// Unchecked wire form of [`Track`]
#[derive(Deserialize)]
struct TrackRecord {
    name: TrackName,
    #[serde(default)]
    version_codes: Vec<VersionCode>,
    #[serde(default)]
    user_fraction: UserFraction,
    #[serde(default)]
    releases: Vec<Release>,
}

impl TryFrom<TrackRecord> for Track {
    type Error = TrackError;

    fn try_from(record: TrackRecord) -> Result<Self, Self::Error> {
        for (index, code) in record.version_codes.iter().enumerate() {
            if record.version_codes[..index].contains(code) {
                return Err(TrackError::DuplicateVersionCode {
                    track: record.name.to_string(),
                    code: code.get(),
                });
            }
        }

        Ok(Self {
            name: record.name,
            version_codes: record.version_codes,
            user_fraction: record.user_fraction,
            releases: record.releases,
        })
    }
}

impl Track {
    /// Empty track: no version codes, zero fraction, no history
    #[inline]
    #[must_use]
    pub fn new(name: TrackName) -> Self {
        Self {
            name,
            version_codes: Vec::new(),
            user_fraction: UserFraction::ZERO,
            releases: Vec::new(),
        }
    }

    /// With version codes (in the given order)
    #[inline]
    #[must_use]
    pub fn with_version_codes(mut self, codes: impl IntoIterator<Item = VersionCode>) -> Self {
        self.version_codes = codes.into_iter().collect();
        self
    }

    /// With rollout fraction
    #[inline]
    #[must_use]
    pub fn with_user_fraction(mut self, fraction: UserFraction) -> Self {
        self.user_fraction = fraction;
        self
    }

    /// With an additional release history entry
    #[inline]
    #[must_use]
    pub fn with_release(mut self, release: Release) -> Self {
        self.releases.push(release);
        self
    }

    /// Track name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &TrackName {
        &self.name
    }

    /// Version codes in service order
    #[inline]
    #[must_use]
    pub fn version_codes(&self) -> &[VersionCode] {
        &self.version_codes
    }

    /// Rollout fraction
    #[inline]
    #[must_use]
    pub fn user_fraction(&self) -> UserFraction {
        self.user_fraction
    }

    /// Release history
    #[inline]
    #[must_use]
    pub fn releases(&self) -> &[Release] {
        &self.releases
    }

    /// Whether the track holds the given build
    #[inline]
    #[must_use]
    pub fn contains(&self, code: VersionCode) -> bool {
        self.version_codes.contains(&code)
    }

    /// Whether the track holds no builds
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.version_codes.is_empty()
    }

    /// Remove and return every version code. The fraction is kept.
    #[inline]
    pub fn take_version_codes(&mut self) -> Vec<VersionCode> {
        std::mem::take(&mut self.version_codes)
    }

    /// Remove `code` wherever it appears; returns whether anything was removed
    pub fn remove_version_code(&mut self, code: VersionCode) -> bool {
        let before = self.version_codes.len();
        self.version_codes.retain(|candidate| *candidate != code);
        self.version_codes.len() != before
    }

    /// Append `code`. Exclusivity is the caller's concern.
    #[inline]
    pub fn push_version_code(&mut self, code: VersionCode) {
        self.version_codes.push(code);
    }

    /// Replace the rollout fraction
    #[inline]
    pub fn set_user_fraction(&mut self, fraction: UserFraction) {
        self.user_fraction = fraction;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vc(value: i64) -> VersionCode {
        VersionCode::new(value).unwrap()
    }

    #[test]
    fn track_name_rejects_blank() {
        assert_eq!(TrackName::new("  ").unwrap_err(), TrackError::EmptyTrackName);
        assert_eq!(TrackName::new(" beta ").unwrap(), TrackName::beta());
    }

    #[test]
    fn standard_tracks() {
        assert!(TrackName::internal().is_standard());
        assert!(TrackName::alpha().is_standard());
        assert!(TrackName::beta().is_standard());
        assert!(!TrackName::production().is_standard());
        assert!(!TrackName::rollout().is_standard());
        assert!(!TrackName::new("qa").unwrap().is_standard());
    }

    #[test]
    fn lifecycle_tracks() {
        assert!(TrackName::production().is_lifecycle());
        assert!(!TrackName::new("wear:beta").unwrap().is_lifecycle());
    }

    #[test]
    fn take_keeps_fraction() {
        let mut track = Track::new(TrackName::rollout())
            .with_version_codes([vc(1), vc(2)])
            .with_user_fraction(UserFraction::from_percentage(20).unwrap());

        let removed = track.take_version_codes();

        assert_eq!(removed, vec![vc(1), vc(2)]);
        assert!(track.is_empty());
        assert_eq!(track.user_fraction().value(), 0.2);
    }

    #[test]
    fn remove_version_code_reports_change() {
        let mut track = Track::new(TrackName::beta()).with_version_codes([vc(3), vc(4)]);

        assert!(track.remove_version_code(vc(3)));
        assert!(!track.remove_version_code(vc(3)));
        assert_eq!(track.version_codes(), &[vc(4)]);
    }

    #[test]
    fn push_appends_in_order() {
        let mut track = Track::new(TrackName::alpha()).with_version_codes([vc(8)]);
        track.push_version_code(vc(9));
        assert_eq!(track.version_codes(), &[vc(8), vc(9)]);
    }

    #[test]
    fn deserialize_minimal_track() {
        let track: Track = serde_json::from_str(r#"{"name":"production"}"#).unwrap();
        assert_eq!(track, Track::new(TrackName::production()));
    }

    #[test]
    fn deserialize_rejects_duplicate_codes() {
        let err = serde_json::from_str::<Track>(r#"{"name":"beta","version_codes":[4,5,4]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("version code 4 appears twice in track beta"));
    }

    #[test]
    fn deserialize_rejects_invalid_values() {
        assert!(serde_json::from_str::<Track>(r#"{"name":"beta","version_codes":[0]}"#).is_err());
        assert!(serde_json::from_str::<Track>(r#"{"name":"  "}"#).is_err());
    }
}
