//! In-memory publishing service
//!
//! [`InMemoryPublisher`] behaves like the real service where the engine can
//! observe it:
//! - Each edit starts from a private copy of the committed tracks
//! - Writes replace one track wholesale inside the edit
//! - Commit publishes the edit atomically and closes it
//! - Opening an edit discards any uncommitted edit of the same application
//! - Uploads assign increasing version codes per application
//!
//! The most recent [`CALL_LOG_LIMIT`] calls are recorded, and faults can be
//! injected on the Nth call of a kind. The committed state converts to and from [`PublishedState`] for
//! persistence.

use crate::error::TransportError;
use crate::transport::PublishingTransport;
use crate::types::{AppId, BuildArtifact, EditHandle, EditId};
use async_trait::async_trait;
use parking_lot::Mutex;
use relman_track::{Track, TrackName, TrackSet, VersionCode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use ulid::Ulid;

/// Calls kept in the log; older ones are dropped first
pub const CALL_LOG_LIMIT: usize = 1024;

/// Kind of transport call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    OpenEdit,
    ListTracks,
    WriteTrack,
    UploadBuild,
    Commit,
}

/// One recorded transport call
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    OpenEdit { app_id: AppId },
    ListTracks { edit_id: EditId },
    WriteTrack { edit_id: EditId, track: Track },
    UploadBuild { edit_id: EditId, bytes: usize },
    Commit { edit_id: EditId },
}

impl TransportCall {
    /// Kind of this call
    #[must_use]
    pub fn kind(&self) -> CallKind {
        match self {
            Self::OpenEdit { .. } => CallKind::OpenEdit,
            Self::ListTracks { .. } => CallKind::ListTracks,
            Self::WriteTrack { .. } => CallKind::WriteTrack,
            Self::UploadBuild { .. } => CallKind::UploadBuild,
            Self::Commit { .. } => CallKind::Commit,
        }
    }
}

/// Committed state of one application
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishedApp {
    /// Committed tracks, in service order
    #[serde(default)]
    pub tracks: Vec<Track>,
    /// Highest version code handed out so far
    #[serde(default)]
    pub last_version_code: i64,
}

/// Committed state of every application
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishedState {
    /// Applications keyed by id
    #[serde(default)]
    pub apps: BTreeMap<AppId, PublishedApp>,
}

#[derive(Debug)]
struct PendingEdit {
    app_id: AppId,
    tracks: Vec<Track>,
}

#[derive(Debug)]
struct Fault {
    kind: CallKind,
    nth: usize,
    error: TransportError,
}

#[derive(Debug, Default)]
struct Inner {
    apps: BTreeMap<AppId, PublishedApp>,
    edits: HashMap<EditId, PendingEdit>,
    calls: VecDeque<TransportCall>,
    counts: HashMap<CallKind, usize>,
    faults: Vec<Fault>,
}

impl Inner {
    /// Record a call and return the injected fault for it, if any
    fn record(&mut self, call: TransportCall) -> Result<(), TransportError> {
        let kind = call.kind();
        if self.calls.len() == CALL_LOG_LIMIT {
            self.calls.pop_front();
        }
        self.calls.push_back(call);

        let count = self.counts.entry(kind).or_insert(0);
        *count += 1;
        let count = *count;

        match self
            .faults
            .iter()
            .position(|f| f.kind == kind && f.nth == count)
        {
            Some(index) => {
                let fault = self.faults.swap_remove(index);
                tracing::debug!(?kind, nth = count, error = %fault.error, "injected transport fault");
                Err(fault.error)
            }
            None => Ok(()),
        }
    }

    fn edit_mut(&mut self, edit: &EditHandle) -> Result<&mut PendingEdit, TransportError> {
        self.edits
            .get_mut(&edit.edit_id)
            .filter(|pending| pending.app_id == edit.app_id)
            .ok_or_else(|| TransportError::UnknownEdit(edit.edit_id.to_string()))
    }
}

/// Publishing transport backed by process memory
#[derive(Debug, Default)]
pub struct InMemoryPublisher {
    inner: Mutex<Inner>,
}

impl InMemoryPublisher {
    /// Create publisher with no applications
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore committed state
    #[must_use]
    pub fn from_state(state: PublishedState) -> Self {
        Self {
            inner: Mutex::new(Inner {
                apps: state.apps,
                ..Inner::default()
            }),
        }
    }

    /// With an application and its committed tracks
    #[must_use]
    pub fn with_app(self, app_id: AppId, tracks: Vec<Track>) -> Self {
        self.insert_app(app_id, tracks);
        self
    }

    /// Register or replace an application
    ///
    /// The version code counter starts above the highest code on any track.
    pub fn insert_app(&self, app_id: AppId, tracks: Vec<Track>) {
        let last_version_code = tracks
            .iter()
            .flat_map(|t| t.version_codes())
            .map(|code| code.get())
            .max()
            .unwrap_or(0);

        self.inner.lock().apps.insert(
            app_id,
            PublishedApp {
                tracks,
                last_version_code,
            },
        );
    }

    /// Register `app_id` with empty lifecycle tracks unless it is already known
    ///
    /// Returns whether the application was added.
    pub fn register_app(&self, app_id: AppId) -> bool {
        let mut inner = self.inner.lock();
        if inner.apps.contains_key(&app_id) {
            return false;
        }

        let tracks = [
            TrackName::internal(),
            TrackName::alpha(),
            TrackName::beta(),
            TrackName::production(),
        ]
        .into_iter()
        .map(Track::new)
        .collect();

        tracing::info!(%app_id, "registered application");
        inner.apps.insert(
            app_id,
            PublishedApp {
                tracks,
                last_version_code: 0,
            },
        );
        true
    }

    /// Committed tracks of `app_id`
    #[must_use]
    pub fn tracks(&self, app_id: &AppId) -> Option<TrackSet> {
        self.inner
            .lock()
            .apps
            .get(app_id)
            .map(|app| TrackSet::from_tracks(app.tracks.clone()))
    }

    /// Snapshot of all committed state
    #[must_use]
    pub fn state(&self) -> PublishedState {
        PublishedState {
            apps: self.inner.lock().apps.clone(),
        }
    }

    /// Fail the `nth` (1-based) call of `kind` with `error`
    ///
    /// Counts include calls already made.
    pub fn fail_on(&self, kind: CallKind, nth: usize, error: TransportError) {
        self.inner.lock().faults.push(Fault { kind, nth, error });
    }

    /// Recorded calls, oldest first
    #[must_use]
    pub fn calls(&self) -> Vec<TransportCall> {
        self.inner.lock().calls.iter().cloned().collect()
    }

    /// Number of calls of `kind` made so far
    #[must_use]
    pub fn count(&self, kind: CallKind) -> usize {
        self.inner.lock().counts.get(&kind).copied().unwrap_or(0)
    }

    /// Forget recorded calls and counters; pending faults stay
    pub fn clear_calls(&self) {
        let mut inner = self.inner.lock();
        inner.calls.clear();
        inner.counts.clear();
    }

    /// Edits opened and not yet committed
    #[must_use]
    pub fn open_edits(&self) -> usize {
        self.inner.lock().edits.len()
    }
}

#[async_trait]
impl PublishingTransport for InMemoryPublisher {
    async fn open_edit(&self, app_id: &AppId) -> Result<EditHandle, TransportError> {
        let mut inner = self.inner.lock();
        inner.record(TransportCall::OpenEdit {
            app_id: app_id.clone(),
        })?;

        let tracks = inner
            .apps
            .get(app_id)
            .map(|app| app.tracks.clone())
            .ok_or_else(|| TransportError::UnknownApplication(app_id.to_string()))?;

        let before = inner.edits.len();
        inner.edits.retain(|_, pending| pending.app_id != *app_id);
        let discarded = before - inner.edits.len();
        if discarded > 0 {
            tracing::debug!(%app_id, discarded, "discarded uncommitted edits");
        }

        let edit_id = EditId::new(Ulid::new().to_string());
        inner.edits.insert(
            edit_id.clone(),
            PendingEdit {
                app_id: app_id.clone(),
                tracks,
            },
        );

        Ok(EditHandle::new(app_id.clone(), edit_id))
    }

    async fn list_tracks(&self, edit: &EditHandle) -> Result<Vec<Track>, TransportError> {
        let mut inner = self.inner.lock();
        inner.record(TransportCall::ListTracks {
            edit_id: edit.edit_id.clone(),
        })?;

        Ok(inner.edit_mut(edit)?.tracks.clone())
    }

    async fn write_track(&self, edit: &EditHandle, track: &Track) -> Result<(), TransportError> {
        let mut inner = self.inner.lock();
        inner.record(TransportCall::WriteTrack {
            edit_id: edit.edit_id.clone(),
            track: track.clone(),
        })?;

        let pending = inner.edit_mut(edit)?;
        match pending.tracks.iter_mut().find(|t| t.name() == track.name()) {
            Some(existing) => *existing = track.clone(),
            None => pending.tracks.push(track.clone()),
        }
        Ok(())
    }

    async fn upload_build(
        &self,
        edit: &EditHandle,
        build: &BuildArtifact,
    ) -> Result<VersionCode, TransportError> {
        let mut inner = self.inner.lock();
        inner.record(TransportCall::UploadBuild {
            edit_id: edit.edit_id.clone(),
            bytes: build.len(),
        })?;

        inner.edit_mut(edit)?;
        if build.is_empty() {
            return Err(TransportError::Rejected("build is empty".to_string()));
        }

        let app = inner
            .apps
            .get_mut(&edit.app_id)
            .ok_or_else(|| TransportError::UnknownApplication(edit.app_id.to_string()))?;
        app.last_version_code += 1;

        VersionCode::new(app.last_version_code)
            .map_err(|e| TransportError::Rejected(e.to_string()))
    }

    async fn commit(&self, edit: &EditHandle) -> Result<(), TransportError> {
        let mut inner = self.inner.lock();
        inner.record(TransportCall::Commit {
            edit_id: edit.edit_id.clone(),
        })?;

        inner.edit_mut(edit)?;
        let pending = inner
            .edits
            .remove(&edit.edit_id)
            .ok_or_else(|| TransportError::UnknownEdit(edit.edit_id.to_string()))?;

        let app = inner.apps.entry(pending.app_id).or_default();
        app.tracks = pending.tracks;
        Ok(())
    }
}
