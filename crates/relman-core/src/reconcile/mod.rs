//! Reconciliation operations
//!
//! Deploy, Halt, Promote and Rollout. Each one opens an edit, snapshots the
//! tracks once, applies primitive mutations from [`primitives`] and commits.
//! The first failure returns immediately; the edit is dropped uncommitted.

mod operations;
pub mod primitives;

pub use operations::{deploy, halt, promote, rollout};

use crate::edit::CommitSummary;
use relman_track::{TrackName, UserFraction, VersionCode};

/// What a reconciliation operation did
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// Build uploaded and placed on `internal`
    Deployed {
        version_code: VersionCode,
        summary: CommitSummary,
    },
    /// Version code removed everywhere
    Halted {
        version_code: VersionCode,
        removed_from: Vec<TrackName>,
        summary: CommitSummary,
    },
    /// Version code moved to `track`
    Promoted {
        version_code: VersionCode,
        track: TrackName,
        summary: CommitSummary,
    },
    /// Version code moved to `rollout` at `fraction`
    RolloutStarted {
        version_code: VersionCode,
        fraction: UserFraction,
        summary: CommitSummary,
    },
    /// Fraction of an in-progress rollout changed
    RolloutAdjusted {
        version_code: VersionCode,
        fraction: UserFraction,
        summary: CommitSummary,
    },
    /// Promotion target already held the version code; nothing written or committed
    AlreadyPresent {
        version_code: VersionCode,
        track: TrackName,
    },
}

impl ReconcileOutcome {
    /// Commit details, when the operation committed
    #[must_use]
    pub fn summary(&self) -> Option<&CommitSummary> {
        match self {
            Self::Deployed { summary, .. }
            | Self::Halted { summary, .. }
            | Self::Promoted { summary, .. }
            | Self::RolloutStarted { summary, .. }
            | Self::RolloutAdjusted { summary, .. } => Some(summary),
            Self::AlreadyPresent { .. } => None,
        }
    }

    /// Whether an edit was committed
    #[inline]
    #[must_use]
    pub fn committed(&self) -> bool {
        self.summary().is_some()
    }
}
