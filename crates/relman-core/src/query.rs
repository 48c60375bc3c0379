//! Read-only queries
//!
//! Queries open an edit to get a consistent snapshot and never commit it.

use crate::edit::{EditTransaction, EngineContext};
use crate::error::EngineError;
use crate::types::AppId;
use relman_track::{Track, TrackName, UserFraction, VersionCode};
use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// One track as shown to the operator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSummary {
    /// Track name
    pub name: TrackName,
    /// Version codes on the track
    pub version_codes: Vec<VersionCode>,
    /// Fraction, only while a staged rollout is in progress
    pub rollout: Option<UserFraction>,
}

impl From<&Track> for TrackSummary {
    fn from(track: &Track) -> Self {
        let fraction = track.user_fraction();
        Self {
            name: track.name().clone(),
            version_codes: track.version_codes().to_vec(),
            rollout: fraction.is_staged().then_some(fraction),
        }
    }
}

impl Display for TrackSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Track *{}* contains version codes *[", self.name)?;
        for (i, code) in self.version_codes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{code}")?;
        }
        f.write_str("]*")?;

        if let Some(fraction) = self.rollout {
            write!(f, " at *{fraction}*")?;
        }
        f.write_str(".")
    }
}

/// Lazy sequence of track summaries, in service order
#[derive(Debug)]
pub struct TrackSummaries {
    tracks: std::vec::IntoIter<Track>,
}

impl Iterator for TrackSummaries {
    type Item = TrackSummary;

    fn next(&mut self) -> Option<Self::Item> {
        self.tracks.next().as_ref().map(TrackSummary::from)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.tracks.size_hint()
    }
}

impl ExactSizeIterator for TrackSummaries {}

/// One localized note of a release that ships a version code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseNoteEntry {
    /// Track holding the release
    pub track: TrackName,
    /// Release name, if the service gave one
    pub release_name: Option<String>,
    /// Language tag (e.g. `en-US`)
    pub language: String,
    /// Note text
    pub text: String,
}

impl Display for ReleaseNoteEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.release_name {
            Some(name) => write!(
                f,
                "Release *{name}* in track *{}* ({}): {}",
                self.track, self.language, self.text
            ),
            None => write!(
                f,
                "Release in track *{}* ({}): {}",
                self.track, self.language, self.text
            ),
        }
    }
}

/// Summaries of every track of `app_id`
///
/// # Errors
/// - `EngineError::Transport` if the edit cannot be opened or listed
pub async fn show_tracks(
    ctx: EngineContext<'_>,
    app_id: &AppId,
) -> Result<TrackSummaries, EngineError> {
    ctx.report(&format!("Ok, showing tracks for *{app_id}* ...")).await;

    let edit = EditTransaction::open(ctx, app_id).await?;
    let snapshot = edit.list_tracks().await?;

    tracing::info!(%app_id, tracks = snapshot.len(), "showing tracks");
    Ok(TrackSummaries {
        tracks: snapshot.into_iter(),
    })
}

/// Every localized note of every release shipping `version_code`
///
/// # Errors
/// - `EngineError::Transport` if the edit cannot be opened or listed
/// - `EngineError::ReleaseNotesNotFound` if no release ships the code
pub async fn show_release_notes(
    ctx: EngineContext<'_>,
    app_id: &AppId,
    version_code: VersionCode,
) -> Result<Vec<ReleaseNoteEntry>, EngineError> {
    ctx.report(&format!(
        "Ok, showing release notes for *{app_id}* with version code *{version_code}* ..."
    ))
    .await;

    let edit = EditTransaction::open(ctx, app_id).await?;
    let snapshot = edit.list_tracks().await?;

    let mut matched = false;
    let mut entries = Vec::new();
    for track in &snapshot {
        for release in track.releases().iter().filter(|r| r.contains(version_code)) {
            matched = true;
            entries.extend(release.release_notes.iter().map(|note| ReleaseNoteEntry {
                track: track.name().clone(),
                release_name: release.name.clone(),
                language: note.language.clone(),
                text: note.text.clone(),
            }));
        }
    }

    if !matched {
        tracing::info!(%app_id, %version_code, "no release ships version code");
        return Err(EngineError::ReleaseNotesNotFound { version_code });
    }

    tracing::info!(%app_id, %version_code, notes = entries.len(), "showing release notes");
    Ok(entries)
}
