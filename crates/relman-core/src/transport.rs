//! Collaborator contracts
//!
//! The engine never talks to the network itself. It drives three traits:
//! - [`PublishingTransport`]: transactional reads/writes on the distribution service
//! - [`ArtifactFetcher`]: locates and downloads builds
//! - [`Notifier`]: fire-and-forget progress text for the operator

use crate::error::{FetchError, TransportError};
use crate::types::{AppId, ArtifactCoordinates, BuildArtifact, EditHandle};
use async_trait::async_trait;
use relman_track::{Track, VersionCode};

/// Transactional access to the distribution service
///
/// Mutations made through an edit stay invisible until [`commit`] succeeds.
/// Uncommitted edits are disposed of by the service.
///
/// [`commit`]: PublishingTransport::commit
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PublishingTransport: Send + Sync {
    /// Open a new edit for `app_id`
    async fn open_edit(&self, app_id: &AppId) -> Result<EditHandle, TransportError>;

    /// Every track as seen inside the edit, in service order
    async fn list_tracks(&self, edit: &EditHandle) -> Result<Vec<Track>, TransportError>;

    /// Replace the remote state of one track wholesale
    async fn write_track(&self, edit: &EditHandle, track: &Track) -> Result<(), TransportError>;

    /// Upload a build, returning the version code the service assigned
    async fn upload_build(
        &self,
        edit: &EditHandle,
        build: &BuildArtifact,
    ) -> Result<VersionCode, TransportError>;

    /// Publish every mutation made in the edit
    async fn commit(&self, edit: &EditHandle) -> Result<(), TransportError>;
}

/// Locates and downloads builds
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    /// Fetch the build at `coordinates`
    async fn fetch(&self, coordinates: &ArtifactCoordinates) -> Result<BuildArtifact, FetchError>;
}

/// Progress and result channel back to the operator
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message; delivery failures are the notifier's concern
    async fn report(&self, message: &str);
}
