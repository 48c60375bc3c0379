//! Edit transactions
//!
//! An [`EditTransaction`] wraps one open edit. It is the only path through
//! which operations reach the transport, so every remote call is logged and
//! every failure is tagged with the [`Step`] it happened at.
//!
//! There is no rollback: dropping the transaction without calling
//! [`EditTransaction::commit`] leaves the edit for the service to discard.
//! `commit` consumes the transaction, so it can run at most once.

use crate::error::{EngineError, Step};
use crate::transport::{ArtifactFetcher, Notifier, PublishingTransport};
use crate::types::{AppId, BuildArtifact, EditHandle, EditId};
use relman_track::{Track, TrackSet, VersionCode};

/// Collaborators for one operation call
///
/// Passed explicitly into every operation; nothing in the engine holds a
/// global connection.
#[derive(Clone, Copy)]
pub struct EngineContext<'a> {
    /// Publishing service
    pub transport: &'a dyn PublishingTransport,
    /// Artifact repository
    pub fetcher: &'a dyn ArtifactFetcher,
    /// Operator channel
    pub notifier: &'a dyn Notifier,
}

impl<'a> EngineContext<'a> {
    /// Create context
    #[inline]
    #[must_use]
    pub fn new(
        transport: &'a dyn PublishingTransport,
        fetcher: &'a dyn ArtifactFetcher,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            transport,
            fetcher,
            notifier,
        }
    }

    /// Send one progress message
    #[inline]
    pub async fn report(&self, message: &str) {
        self.notifier.report(message).await;
    }
}

impl std::fmt::Debug for EngineContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineContext").finish_non_exhaustive()
    }
}

/// Result of a successful commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    /// Application the edit belonged to
    pub app_id: AppId,
    /// Committed edit
    pub edit_id: EditId,
    /// Number of track writes in the edit
    pub writes: usize,
}

/// One open, uncommitted change-set for one application
#[derive(Debug)]
pub struct EditTransaction<'a> {
    ctx: EngineContext<'a>,
    handle: EditHandle,
    writes: usize,
}

impl<'a> EditTransaction<'a> {
    /// Open an edit for `app_id`
    ///
    /// # Errors
    /// - `EngineError::Transport` at `Step::OpenEdit`
    pub async fn open(ctx: EngineContext<'a>, app_id: &AppId) -> Result<Self, EngineError> {
        let handle = ctx
            .transport
            .open_edit(app_id)
            .await
            .map_err(|source| EngineError::transport(Step::OpenEdit, source))?;

        tracing::debug!(app_id = %handle.app_id, edit_id = %handle.edit_id, "opened edit");

        Ok(Self {
            ctx,
            handle,
            writes: 0,
        })
    }

    /// Snapshot every track in the edit
    ///
    /// # Errors
    /// - `EngineError::Transport` at `Step::ListTracks`
    pub async fn list_tracks(&self) -> Result<TrackSet, EngineError> {
        let tracks = self
            .ctx
            .transport
            .list_tracks(&self.handle)
            .await
            .map_err(|source| EngineError::transport(Step::ListTracks, source))?;

        tracing::debug!(edit_id = %self.handle.edit_id, tracks = tracks.len(), "listed tracks");
        Ok(TrackSet::from_tracks(tracks))
    }

    /// Write the full state of `track`
    ///
    /// # Errors
    /// - `EngineError::Transport` at `Step::WriteTrack`
    pub async fn write_track(&mut self, track: &Track) -> Result<(), EngineError> {
        tracing::debug!(
            edit_id = %self.handle.edit_id,
            track = %track.name(),
            version_codes = ?track.version_codes(),
            user_fraction = track.user_fraction().value(),
            "writing track"
        );

        self.ctx
            .transport
            .write_track(&self.handle, track)
            .await
            .map_err(|source| EngineError::transport(Step::WriteTrack(track.name().clone()), source))?;

        self.writes += 1;
        Ok(())
    }

    /// Upload a build into the edit
    ///
    /// # Errors
    /// - `EngineError::Transport` at `Step::UploadBuild`
    pub async fn upload_build(&self, build: &BuildArtifact) -> Result<VersionCode, EngineError> {
        let version_code = self
            .ctx
            .transport
            .upload_build(&self.handle, build)
            .await
            .map_err(|source| EngineError::transport(Step::UploadBuild, source))?;

        tracing::debug!(
            edit_id = %self.handle.edit_id,
            bytes = build.len(),
            %version_code,
            "uploaded build"
        );
        Ok(version_code)
    }

    /// Publish the edit
    ///
    /// # Errors
    /// - `EngineError::Transport` at `Step::Commit`
    pub async fn commit(self) -> Result<CommitSummary, EngineError> {
        self.ctx
            .transport
            .commit(&self.handle)
            .await
            .map_err(|source| EngineError::transport(Step::Commit, source))?;

        tracing::info!(
            app_id = %self.handle.app_id,
            edit_id = %self.handle.edit_id,
            writes = self.writes,
            "committed edit"
        );

        Ok(CommitSummary {
            app_id: self.handle.app_id,
            edit_id: self.handle.edit_id,
            writes: self.writes,
        })
    }

    /// Send one progress message
    #[inline]
    pub async fn report(&self, message: &str) {
        self.ctx.report(message).await;
    }

    /// Edit handle
    #[inline]
    #[must_use]
    pub fn handle(&self) -> &EditHandle {
        &self.handle
    }

    /// Target application
    #[inline]
    #[must_use]
    pub fn app_id(&self) -> &AppId {
        &self.handle.app_id
    }

    /// Track writes issued so far
    #[inline]
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes
    }
}
