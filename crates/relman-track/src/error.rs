//! Validation errors for track model values

/// Errors raised while constructing track model values
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrackError {
    /// Text could not be read as a version code
    #[error("invalid version code: '{0}'")]
    InvalidVersionCode(String),

    /// Version codes start at 1
    #[error("version code must be positive, got {0}")]
    NonPositiveVersionCode(i64),

    /// Fraction outside `[0, 1]` (or NaN)
    #[error("user fraction must be within [0, 1], got {0}")]
    FractionOutOfRange(f64),

    /// Percentage above 100
    #[error("user percentage must be within 0..=100, got {0}")]
    PercentageOutOfRange(u32),

    /// Same version code listed twice in one track
    #[error("version code {code} appears twice in track {track}")]
    DuplicateVersionCode { track: String, code: i64 },

    /// Track names cannot be blank
    #[error("track name cannot be empty")]
    EmptyTrackName,
}
