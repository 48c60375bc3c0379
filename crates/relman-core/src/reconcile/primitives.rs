//! Primitive track mutations
//!
//! Each primitive changes tracks in memory, reports what it did, and writes
//! the result back. A write always carries the whole track, never a delta.

use crate::edit::EditTransaction;
use crate::error::EngineError;
use relman_track::{Track, TrackSet, UserFraction, VersionCode};

/// Empty `track` of version codes and write it back. Fraction untouched.
///
/// # Errors
/// - `EngineError::Transport` if the write fails
pub async fn clear_track(edit: &mut EditTransaction<'_>, track: &mut Track) -> Result<(), EngineError> {
    for code in track.take_version_codes() {
        edit.report(&format!(
            "Removing version code *{code}* from track *{}*.",
            track.name()
        ))
        .await;
    }

    edit.write_track(track).await
}

/// Remove `code` from every snapshot track and write every track back
///
/// Tracks that never held `code` are still written.
///
/// # Errors
/// - `EngineError::Transport` on the first failed write; later tracks are not written
pub async fn purge_version_from_all_tracks(
    edit: &mut EditTransaction<'_>,
    tracks: &mut TrackSet,
    code: VersionCode,
) -> Result<(), EngineError> {
    for track in tracks.iter_mut() {
        if track.remove_version_code(code) {
            edit.report(&format!(
                "Removing version code *{code}* from track *{}*.",
                track.name()
            ))
            .await;
        }

        edit.write_track(track).await?;
    }

    Ok(())
}

/// Set `fraction`, append `code` and write `track` back
///
/// # Errors
/// - `EngineError::Transport` if the write fails
pub async fn add_version_to_track(
    edit: &mut EditTransaction<'_>,
    track: &mut Track,
    code: VersionCode,
    fraction: UserFraction,
) -> Result<(), EngineError> {
    edit.report(&format!(
        "Adding version code *{code}* to track *{}*.",
        track.name()
    ))
    .await;

    track.set_user_fraction(fraction);
    track.push_version_code(code);

    edit.write_track(track).await
}

/// Replace the fraction of `track` and write it back
///
/// # Errors
/// - `EngineError::Transport` if the write fails
pub async fn set_fraction(
    edit: &mut EditTransaction<'_>,
    track: &mut Track,
    fraction: UserFraction,
) -> Result<(), EngineError> {
    edit.report(&format!(
        "Changing user fraction for track *{}* to *{fraction}*.",
        track.name()
    ))
    .await;

    track.set_user_fraction(fraction);

    edit.write_track(track).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::EngineContext;
    use crate::error::{Step, TransportError};
    use crate::memory::{CallKind, InMemoryPublisher};
    use crate::transport::{ArtifactFetcher, Notifier};
    use crate::types::{AppId, ArtifactCoordinates, BuildArtifact};
    use crate::FetchError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use relman_track::TrackName;

    #[derive(Default)]
    struct Transcript(Mutex<Vec<String>>);

    #[async_trait]
    impl Notifier for Transcript {
        async fn report(&self, message: &str) {
            self.0.lock().push(message.to_string());
        }
    }

    struct NoArtifacts;

    #[async_trait]
    impl ArtifactFetcher for NoArtifacts {
        async fn fetch(
            &self,
            coordinates: &ArtifactCoordinates,
        ) -> Result<BuildArtifact, FetchError> {
            Err(FetchError::NotFound(coordinates.clone()))
        }
    }

    fn vc(value: i64) -> VersionCode {
        VersionCode::new(value).unwrap()
    }

    fn app() -> AppId {
        AppId::new("com.example.wallet").unwrap()
    }

    fn publisher() -> InMemoryPublisher {
        InMemoryPublisher::new().with_app(
            app(),
            vec![
                Track::new(TrackName::internal()).with_version_codes([vc(3), vc(5)]),
                Track::new(TrackName::beta()).with_version_codes([vc(5)]),
                Track::new(TrackName::production()),
            ],
        )
    }

    #[tokio::test]
    async fn clear_track_reports_each_code() {
        let publisher = publisher();
        let notifier = Transcript::default();
        let ctx = EngineContext::new(&publisher, &NoArtifacts, &notifier);
        let mut edit = EditTransaction::open(ctx, &app()).await.unwrap();
        let mut internal = edit.list_tracks().await.unwrap().resolve(&TrackName::internal());

        clear_track(&mut edit, &mut internal).await.unwrap();

        assert!(internal.is_empty());
        assert_eq!(
            *notifier.0.lock(),
            vec![
                "Removing version code *3* from track *internal*.",
                "Removing version code *5* from track *internal*.",
            ]
        );
        assert_eq!(publisher.count(CallKind::WriteTrack), 1);
    }

    #[tokio::test]
    async fn purge_writes_every_track() {
        let publisher = publisher();
        let notifier = Transcript::default();
        let ctx = EngineContext::new(&publisher, &NoArtifacts, &notifier);
        let mut edit = EditTransaction::open(ctx, &app()).await.unwrap();
        let mut tracks = edit.list_tracks().await.unwrap();

        purge_version_from_all_tracks(&mut edit, &mut tracks, vc(5)).await.unwrap();

        assert!(tracks.tracks_containing(vc(5)).is_empty());
        assert_eq!(notifier.0.lock().len(), 2);
        assert_eq!(publisher.count(CallKind::WriteTrack), 3);
    }

    #[tokio::test]
    async fn purge_stops_at_failed_write() {
        let publisher = publisher();
        publisher.fail_on(
            CallKind::WriteTrack,
            2,
            TransportError::Unavailable("connection reset".into()),
        );
        let notifier = Transcript::default();
        let ctx = EngineContext::new(&publisher, &NoArtifacts, &notifier);
        let mut edit = EditTransaction::open(ctx, &app()).await.unwrap();
        let mut tracks = edit.list_tracks().await.unwrap();

        let err = purge_version_from_all_tracks(&mut edit, &mut tracks, vc(5))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Transport { step: Step::WriteTrack(ref name), .. } if *name == TrackName::beta()
        ));
        assert_eq!(publisher.count(CallKind::WriteTrack), 2);
    }

    #[tokio::test]
    async fn add_and_set_fraction_write_whole_track() {
        let publisher = publisher();
        let notifier = Transcript::default();
        let ctx = EngineContext::new(&publisher, &NoArtifacts, &notifier);
        let mut edit = EditTransaction::open(ctx, &app()).await.unwrap();
        let mut production = edit.list_tracks().await.unwrap().resolve(&TrackName::production());

        add_version_to_track(&mut edit, &mut production, vc(7), UserFraction::from_percentage(10).unwrap())
            .await
            .unwrap();
        set_fraction(&mut edit, &mut production, UserFraction::from_percentage(50).unwrap())
            .await
            .unwrap();

        assert_eq!(production.version_codes(), [vc(7)]);
        assert_eq!(production.user_fraction(), UserFraction::from_percentage(50).unwrap());
        assert_eq!(
            *notifier.0.lock(),
            vec![
                "Adding version code *7* to track *production*.",
                "Changing user fraction for track *production* to *50%*.",
            ]
        );
    }
}
