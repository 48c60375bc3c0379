//! Commands accepted by the orchestrator
//!
//! The command source produces a closed [`Command`] value; the orchestrator
//! matches it exhaustively. Text parsing never happens past this point.

use crate::types::AppId;
use relman_track::{TrackName, VersionCode};
use serde::Serialize;

/// A parsed operator intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Upload a build and place it on `internal`
    Deploy { artifact_id: String, version: String },
    /// Remove a version code from every track
    Halt {
        app_id: AppId,
        version_code: VersionCode,
    },
    /// Move a version code to a track
    Promote {
        app_id: AppId,
        version_code: VersionCode,
        track: TrackName,
    },
    /// Start or adjust a staged rollout
    Rollout {
        app_id: AppId,
        version_code: VersionCode,
        percentage: u32,
    },
    /// List tracks and their version codes
    ShowTracks { app_id: AppId },
    /// List release notes shipped with a version code
    ShowReleaseNotes {
        app_id: AppId,
        version_code: VersionCode,
    },
    /// Liveness check
    Ping,
    /// Unrecognised request
    Help,
}

impl Command {
    /// Short name for logs and permission messages
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Deploy { .. } => "deploy",
            Self::Halt { .. } => "halt",
            Self::Promote { .. } => "promote",
            Self::Rollout { .. } => "rollout",
            Self::ShowTracks { .. } => "show tracks",
            Self::ShowReleaseNotes { .. } => "show release notes",
            Self::Ping => "ping",
            Self::Help => "help",
        }
    }

    /// Promotions beyond `internal`/`alpha`/`beta` and every rollout
    #[must_use]
    pub fn requires_privilege(&self) -> bool {
        match self {
            Self::Promote { track, .. } => !track.is_standard(),
            Self::Rollout { .. } => true,
            _ => false,
        }
    }

    /// Whether the command mutates tracks
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Deploy { .. } | Self::Halt { .. } | Self::Promote { .. } | Self::Rollout { .. }
        )
    }
}

/// A command together with who issued it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    /// The command
    pub command: Command,
    /// Issuer holds operator privilege
    pub privileged: bool,
    /// Issuer identity, for logs
    pub issuer: Option<String>,
}

impl CommandRequest {
    /// Request from an anonymous, unprivileged issuer
    #[inline]
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            command,
            privileged: false,
            issuer: None,
        }
    }

    /// Mark issuer as privileged
    #[inline]
    #[must_use]
    pub fn privileged(mut self, privileged: bool) -> Self {
        self.privileged = privileged;
        self
    }

    /// With issuer identity
    #[inline]
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }
}
