//! Error types for the engine
//!
//! Four families reach the operator:
//! - Input errors (malformed arguments, operation never starts)
//! - Permission errors (privileged command from a regular operator)
//! - Transport errors (a remote call failed, operation aborted uncommitted)
//! - Not-found results (query or artifact lookup came back empty)
//!
//! Every [`EngineError`] renders one operator-facing message through
//! [`EngineError::user_message`].

use crate::types::ArtifactCoordinates;
use relman_track::{TrackError, TrackName, VersionCode};
use std::fmt::{self, Display, Formatter};

/// Failure reported by the publishing transport
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Application unknown to the service
    #[error("application not found: {0}")]
    UnknownApplication(String),

    /// Edit handle no longer valid (committed or expired)
    #[error("edit not open: {0}")]
    UnknownEdit(String),

    /// Service refused the request
    #[error("rejected by service: {0}")]
    Rejected(String),

    /// Service could not be reached
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// Failure reported by the artifact locator/fetcher
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Nothing published at these coordinates
    #[error("artifact not found: {0}")]
    NotFound(ArtifactCoordinates),

    /// Repository answered with an unexpected status
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// Repository could not be reached or the download broke off
    #[error("artifact repository unavailable: {0}")]
    Unavailable(String),

    /// Coordinates do not form a valid location
    #[error("invalid artifact location: {0}")]
    InvalidLocation(String),
}

/// Malformed command arguments
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    /// Version code not a positive integer
    #[error("invalid version code '{0}'")]
    VersionCode(String),

    /// Percentage not an integer in 0..=100
    #[error("invalid user percentage '{0}'")]
    Percentage(String),

    /// Track name blank
    #[error("invalid track name '{0}'")]
    TrackName(String),

    /// Application id blank or containing whitespace
    #[error("invalid application id '{0}'")]
    AppId(String),
}

impl InputError {
    /// Operator-facing text
    #[must_use]
    pub fn user_message(&self) -> String {
        let subject = match self {
            Self::VersionCode(_) => "version code",
            Self::Percentage(_) => "user percentage",
            Self::TrackName(_) => "track",
            Self::AppId(_) => "application",
        };
        format!("Sorry, I don't understand that {subject}.")
    }
}

impl From<TrackError> for InputError {
    fn from(error: TrackError) -> Self {
        match error {
            TrackError::InvalidVersionCode(raw) => Self::VersionCode(raw),
            TrackError::NonPositiveVersionCode(value) => Self::VersionCode(value.to_string()),
            TrackError::FractionOutOfRange(value) => Self::Percentage(value.to_string()),
            TrackError::PercentageOutOfRange(value) => Self::Percentage(value.to_string()),
            TrackError::DuplicateVersionCode { code, .. } => Self::VersionCode(code.to_string()),
            TrackError::EmptyTrackName => Self::TrackName(String::new()),
        }
    }
}

/// Transport step that failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Opening the edit
    OpenEdit,
    /// Listing tracks
    ListTracks,
    /// Uploading the build
    UploadBuild,
    /// Writing one track
    WriteTrack(TrackName),
    /// Committing the edit
    Commit,
}

impl Display for Step {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenEdit => f.write_str("insert the edit"),
            Self::ListTracks => f.write_str("list the tracks"),
            Self::UploadBuild => f.write_str("upload the build"),
            Self::WriteTrack(_) => f.write_str("update the track"),
            Self::Commit => f.write_str("commit the edit"),
        }
    }
}

/// Classification used for logging and outcome reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input
    Input,
    /// Operator lacks privilege
    Permission,
    /// Remote call failed
    Transport,
    /// Nothing matched
    NotFound,
}

/// Main engine error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// Malformed command arguments
    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    /// Privileged command from a regular operator
    #[error("permission denied: {action} requires a privileged operator")]
    Permission { action: String },

    /// Remote call failed at `step`
    #[error("cannot {step}: {source}")]
    Transport {
        step: Step,
        #[source]
        source: TransportError,
    },

    /// Artifact could not be fetched
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// No release anywhere ships the version code
    #[error("no release notes for version code {version_code}")]
    ReleaseNotesNotFound { version_code: VersionCode },
}

impl EngineError {
    /// Transport failure at a step
    #[inline]
    pub fn transport(step: Step, source: TransportError) -> Self {
        Self::Transport { step, source }
    }

    /// Permission failure for a command
    #[inline]
    pub fn permission(action: impl Into<String>) -> Self {
        Self::Permission {
            action: action.into(),
        }
    }

    /// Classify error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Input(_) => ErrorKind::Input,
            Self::Permission { .. } => ErrorKind::Permission,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Fetch(FetchError::NotFound(_)) | Self::ReleaseNotesNotFound { .. } => {
                ErrorKind::NotFound
            }
            Self::Fetch(_) => ErrorKind::Transport,
        }
    }

    /// Whether the error stopped the command before any remote call
    #[inline]
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self.kind(), ErrorKind::Input | ErrorKind::Permission)
    }

    /// Operator-facing text
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Input(error) => error.user_message(),
            Self::Permission { .. } => "Sorry, only privileged operators can do that.".to_string(),
            Self::Transport { step, source } => format!("Sorry, I cannot {step}: {source}"),
            Self::Fetch(FetchError::NotFound(coords)) => format!(
                "Sorry, I cannot find *{}* with version *{}*.",
                coords.artifact_id, coords.version
            ),
            Self::Fetch(error) => format!("Sorry, I cannot download the build: {error}"),
            Self::ReleaseNotesNotFound { version_code } => {
                format!("Sorry, I cannot find release notes for version code *{version_code}*.")
            }
        }
    }
}
