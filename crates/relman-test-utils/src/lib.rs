//! Testing utilities for the relman workspace
//!
//! Shared collaborators, fixtures, and orchestrator setup.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use relman_core::{
    AppId, ArtifactCoordinates, ArtifactFetcher, BuildArtifact, Command, CommandRequest,
    EngineConfig, FetchError, InMemoryPublisher, Notifier, ReleaseOrchestrator,
};
use relman_track::{Release, Track, TrackName, UserFraction, VersionCode};
use std::collections::HashMap;
use std::sync::Arc;

pub const TEST_PREFIX: &str = "com.example";
pub const TEST_APP: &str = "wallet";

/// Notifier that keeps every message
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.messages.lock().last().cloned()
    }

    pub fn contains(&self, message: &str) -> bool {
        self.messages.lock().iter().any(|m| m == message)
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn report(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

/// Fetcher serving builds from a fixed table
#[derive(Debug, Default)]
pub struct StaticFetcher {
    builds: Mutex<HashMap<ArtifactCoordinates, Vec<u8>>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_build(self, artifact_id: &str, version: &str, bytes: Vec<u8>) -> Self {
        self.builds
            .lock()
            .insert(ArtifactCoordinates::new(artifact_id, version), bytes);
        self
    }
}

#[async_trait]
impl ArtifactFetcher for StaticFetcher {
    async fn fetch(&self, coordinates: &ArtifactCoordinates) -> Result<BuildArtifact, FetchError> {
        self.builds
            .lock()
            .get(coordinates)
            .map(|bytes| BuildArtifact::new(coordinates.clone(), bytes.clone()))
            .ok_or_else(|| FetchError::NotFound(coordinates.clone()))
    }
}

pub fn vc(value: i64) -> VersionCode {
    VersionCode::new(value).unwrap()
}

pub fn short_app() -> AppId {
    AppId::new(TEST_APP).unwrap()
}

pub fn qualified_app() -> AppId {
    AppId::new(format!("{TEST_PREFIX}.{TEST_APP}")).unwrap()
}

pub fn track(name: &str, codes: &[i64]) -> Track {
    Track::new(TrackName::new(name).unwrap()).with_version_codes(codes.iter().map(|&c| vc(c)))
}

pub fn staged_track(name: &str, codes: &[i64], percentage: u32) -> Track {
    track(name, codes).with_user_fraction(UserFraction::from_percentage(percentage).unwrap())
}

pub fn release(name: &str, codes: &[i64], notes: &[(&str, &str)]) -> Release {
    notes.iter().fold(
        Release::new(codes.iter().map(|&c| vc(c))).with_name(name),
        |release, (language, text)| release.with_note(*language, *text),
    )
}

pub fn publisher_with(tracks: Vec<Track>) -> Arc<InMemoryPublisher> {
    Arc::new(InMemoryPublisher::new().with_app(qualified_app(), tracks))
}

/// Everything a flow test needs, wired together
pub struct Harness {
    pub orchestrator: ReleaseOrchestrator,
    pub publisher: Arc<InMemoryPublisher>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self::with_fetcher(tracks, StaticFetcher::new())
    }

    pub fn with_fetcher(tracks: Vec<Track>, fetcher: StaticFetcher) -> Self {
        let publisher = publisher_with(tracks);
        let notifier = Arc::new(RecordingNotifier::new());
        let orchestrator = ReleaseOrchestrator::new(
            EngineConfig::new().with_app_id_prefix(TEST_PREFIX),
            publisher.clone(),
            Arc::new(fetcher),
            notifier.clone(),
        );
        Self {
            orchestrator,
            publisher,
            notifier,
        }
    }

    /// Committed version codes of `name`, empty if the track does not exist
    pub fn codes(&self, name: &str) -> Vec<VersionCode> {
        self.publisher
            .tracks(&qualified_app())
            .and_then(|set| {
                set.get(&TrackName::new(name).unwrap())
                    .map(|t| t.version_codes().to_vec())
            })
            .unwrap_or_default()
    }

    pub fn fraction(&self, name: &str) -> Option<UserFraction> {
        self.publisher.tracks(&qualified_app()).and_then(|set| {
            set.get(&TrackName::new(name).unwrap())
                .map(Track::user_fraction)
        })
    }
}

pub fn request(command: Command) -> CommandRequest {
    CommandRequest::new(command).with_issuer("U-OPERATOR")
}

pub fn privileged(command: Command) -> CommandRequest {
    CommandRequest::new(command)
        .privileged(true)
        .with_issuer("U-RELEASE-MANAGER")
}

pub fn promote(code: i64, track: &str) -> Command {
    Command::Promote {
        app_id: short_app(),
        version_code: vc(code),
        track: TrackName::new(track).unwrap(),
    }
}

pub fn rollout(code: i64, percentage: u32) -> Command {
    Command::Rollout {
        app_id: short_app(),
        version_code: vc(code),
        percentage,
    }
}

pub fn halt(code: i64) -> Command {
    Command::Halt {
        app_id: short_app(),
        version_code: vc(code),
    }
}

pub fn deploy(version: &str) -> Command {
    Command::Deploy {
        artifact_id: TEST_APP.to_string(),
        version: version.to_string(),
    }
}
