//! Relman Core - release-track reconciliation engine
//!
//! Turns release commands into the exact sequence of reads and writes
//! against a transactional publishing service:
//! - Opens one edit per command and snapshots its tracks
//! - Runs Deploy / Halt / Promote / Rollout as track mutations
//! - Commits once at the end, or drops the edit on the first failure
//! - Reports every step to the operator through a [`Notifier`]
//!
//! # Example
//!
//! ```rust,ignore
//! use relman_core::{Command, CommandRequest, EngineConfig, ReleaseOrchestrator};
//!
//! # async fn example(transport: Arc<dyn PublishingTransport>, fetcher: Arc<dyn ArtifactFetcher>, notifier: Arc<dyn Notifier>) {
//! let orchestrator = ReleaseOrchestrator::new(EngineConfig::default(), transport, fetcher, notifier);
//!
//! let request = CommandRequest::new(Command::Ping);
//! let outcome = orchestrator.handle(request).await;
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod command;
pub mod edit;
pub mod error;
pub mod locks;
pub mod memory;
pub mod orchestrator;
pub mod query;
pub mod reconcile;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use command::{Command, CommandRequest};
pub use edit::{CommitSummary, EditTransaction, EngineContext};
pub use error::{EngineError, ErrorKind, FetchError, InputError, Step, TransportError};
pub use locks::AppLocks;
pub use memory::{CallKind, InMemoryPublisher, CALL_LOG_LIMIT, PublishedApp, PublishedState, TransportCall};
pub use orchestrator::{CommandOutcome, ReleaseOrchestrator};
pub use query::{ReleaseNoteEntry, TrackSummaries, TrackSummary};
pub use reconcile::ReconcileOutcome;
pub use transport::{ArtifactFetcher, Notifier, PublishingTransport};
pub use types::{AppId, ArtifactCoordinates, BuildArtifact, EditHandle, EditId, EngineConfig};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the engine
    pub use crate::{
        AppId, ArtifactFetcher, Command, CommandOutcome, CommandRequest, EngineConfig,
        EngineError, Notifier, PublishingTransport, ReleaseOrchestrator,
    };
    pub use relman_track::{Track, TrackName, TrackSet, UserFraction, VersionCode};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
