use super::primitives::{add_version_to_track, clear_track, purge_version_from_all_tracks, set_fraction};
use super::ReconcileOutcome;
use crate::edit::{EditTransaction, EngineContext};
use crate::error::{EngineError, InputError};
use crate::types::{AppId, ArtifactCoordinates};
use relman_track::{Track, TrackName, TrackSet, UserFraction, VersionCode};

/// Upload a new build and make it the only build on `internal`
///
/// # Workflow
/// 1. Fetch the build (nothing is opened if this fails)
/// 2. Open edit, snapshot tracks
/// 3. Upload to obtain a version code
/// 4. Clear `internal`, add the new version code at fraction 0
/// 5. Commit
///
/// # Errors
/// - `EngineError::Fetch` if the artifact cannot be fetched
/// - `EngineError::Transport` at the first failing remote call
pub async fn deploy(
    ctx: EngineContext<'_>,
    app_id: &AppId,
    coordinates: &ArtifactCoordinates,
) -> Result<ReconcileOutcome, EngineError> {
    ctx.report(&format!(
        "Ok, deploying *{}* with version *{}* ...",
        coordinates.artifact_id, coordinates.version
    ))
    .await;
    tracing::info!(%app_id, artifact = %coordinates, "deploying build");

    let build = ctx.fetcher.fetch(coordinates).await?;

    let mut edit = EditTransaction::open(ctx, app_id).await?;
    let snapshot = edit.list_tracks().await?;

    let version_code = edit.upload_build(&build).await?;
    edit.report(&format!("Uploaded build as version code *{version_code}*."))
        .await;

    // Drop the lower versions from internal, then place the new one.
    let mut internal = snapshot.resolve(&TrackName::internal());
    clear_track(&mut edit, &mut internal).await?;
    add_version_to_track(&mut edit, &mut internal, version_code, UserFraction::ZERO).await?;

    let summary = edit.commit().await?;
    Ok(ReconcileOutcome::Deployed {
        version_code,
        summary,
    })
}

/// Remove a version code from every track, unpublishing it everywhere
///
/// # Errors
/// - `EngineError::Transport` at the first failing remote call
pub async fn halt(
    ctx: EngineContext<'_>,
    app_id: &AppId,
    version_code: VersionCode,
) -> Result<ReconcileOutcome, EngineError> {
    ctx.report(&format!(
        "Ok, halting *{app_id}* with version code *{version_code}* ..."
    ))
    .await;
    tracing::info!(%app_id, %version_code, "halting version");

    let mut edit = EditTransaction::open(ctx, app_id).await?;
    let mut snapshot = edit.list_tracks().await?;

    let removed_from = snapshot
        .tracks_containing(version_code)
        .into_iter()
        .cloned()
        .collect();

    purge_version_from_all_tracks(&mut edit, &mut snapshot, version_code).await?;

    let summary = edit.commit().await?;
    Ok(ReconcileOutcome::Halted {
        version_code,
        removed_from,
        summary,
    })
}

/// Move a version code onto `track`, evicting whatever the track held
///
/// A version code already on the target yields
/// [`ReconcileOutcome::AlreadyPresent`] without writing or committing.
///
/// # Errors
/// - `EngineError::Transport` at the first failing remote call
pub async fn promote(
    ctx: EngineContext<'_>,
    app_id: &AppId,
    version_code: VersionCode,
    track: &TrackName,
) -> Result<ReconcileOutcome, EngineError> {
    ctx.report(&format!(
        "Ok, promoting *{app_id}* with version code *{version_code}* to track *{track}* ..."
    ))
    .await;
    tracing::info!(%app_id, %version_code, %track, "promoting version");

    let mut edit = EditTransaction::open(ctx, app_id).await?;
    let mut snapshot = edit.list_tracks().await?;
    let mut target = snapshot.resolve(track);

    if target.contains(version_code) {
        edit.report(&format!(
            "Version code *{version_code}* already exists in track *{track}*."
        ))
        .await;
        tracing::info!(%app_id, %version_code, %track, "version already on target, edit dropped");
        return Ok(ReconcileOutcome::AlreadyPresent {
            version_code,
            track: track.clone(),
        });
    }

    move_to_track(&mut edit, &mut snapshot, &mut target, version_code, UserFraction::ZERO).await?;

    let summary = edit.commit().await?;
    Ok(ReconcileOutcome::Promoted {
        version_code,
        track: track.clone(),
        summary,
    })
}

/// Start a staged rollout of a version code, or change its fraction
///
/// # Errors
/// - `EngineError::Input` if `percentage` exceeds 100 (nothing is opened)
/// - `EngineError::Transport` at the first failing remote call
pub async fn rollout(
    ctx: EngineContext<'_>,
    app_id: &AppId,
    version_code: VersionCode,
    percentage: u32,
) -> Result<ReconcileOutcome, EngineError> {
    let fraction = UserFraction::from_percentage(percentage).map_err(InputError::from)?;

    ctx.report(&format!(
        "Ok, rolling out *{app_id}* with version code *{version_code}* to *{percentage}%* ..."
    ))
    .await;
    tracing::info!(%app_id, %version_code, percentage, "rolling out version");

    let mut edit = EditTransaction::open(ctx, app_id).await?;
    let mut snapshot = edit.list_tracks().await?;
    let mut rollout = snapshot.resolve(&TrackName::rollout());

    if rollout.contains(version_code) {
        set_fraction(&mut edit, &mut rollout, fraction).await?;

        let summary = edit.commit().await?;
        return Ok(ReconcileOutcome::RolloutAdjusted {
            version_code,
            fraction,
            summary,
        });
    }

    move_to_track(&mut edit, &mut snapshot, &mut rollout, version_code, fraction).await?;

    let summary = edit.commit().await?;
    Ok(ReconcileOutcome::RolloutStarted {
        version_code,
        fraction,
        summary,
    })
}

/// Clear `target`, purge `code` from the snapshot, then add it to `target`
///
/// The cleared target is copied into the snapshot before the purge so the
/// purge writes the cleared state rather than the stale one.
async fn move_to_track(
    edit: &mut EditTransaction<'_>,
    snapshot: &mut TrackSet,
    target: &mut Track,
    code: VersionCode,
    fraction: UserFraction,
) -> Result<(), EngineError> {
    clear_track(edit, target).await?;
    snapshot.sync(target);

    purge_version_from_all_tracks(edit, snapshot, code).await?;

    add_version_to_track(edit, target, code, fraction).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Step, TransportError};
    use crate::transport::{ArtifactFetcher, MockPublishingTransport, Notifier};
    use crate::types::{BuildArtifact, EditHandle, EditId};
    use crate::FetchError;
    use async_trait::async_trait;
    use mockall::predicate::always;
    use mockall::Sequence;

    struct Silent;

    #[async_trait]
    impl Notifier for Silent {
        async fn report(&self, _message: &str) {}
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

    fn expect_open_and_list(mock: &mut MockPublishingTransport, seq: &mut Sequence, tracks: Vec<Track>) {
        mock.expect_open_edit()
            .times(1)
            .in_sequence(seq)
            .returning(|app_id| Ok(EditHandle::new(app_id.clone(), EditId::new("edit-1"))));
        mock.expect_list_tracks()
            .times(1)
            .in_sequence(seq)
            .returning(move |_| Ok(tracks.clone()));
    }

    #[tokio::test]
    async fn promote_stops_at_first_failed_write() {
        let mut mock = MockPublishingTransport::new();
        let mut seq = Sequence::new();
        expect_open_and_list(
            &mut mock,
            &mut seq,
            vec![
                Track::new(TrackName::internal()).with_version_codes([vc(5)]),
                Track::new(TrackName::beta()).with_version_codes([vc(4)]),
            ],
        );
        mock.expect_write_track()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(TransportError::Unavailable("connection reset".into())));
        mock.expect_commit().never();
        mock.expect_upload_build().never();

        let ctx = EngineContext::new(&mock, &NoArtifacts, &Silent);
        let err = promote(ctx, &app(), vc(5), &TrackName::beta()).await.unwrap_err();

        assert_eq!(
            err,
            EngineError::transport(
                Step::WriteTrack(TrackName::beta()),
                TransportError::Unavailable("connection reset".into())
            )
        );
    }

    #[tokio::test]
    async fn promote_writes_in_clear_purge_add_order() {
        let mut mock = MockPublishingTransport::new();
        let mut seq = Sequence::new();
        expect_open_and_list(
            &mut mock,
            &mut seq,
            vec![
                Track::new(TrackName::internal()).with_version_codes([vc(5)]),
                Track::new(TrackName::beta()),
            ],
        );

        // Clear beta.
        mock.expect_write_track()
            .withf(|_, track| track.name() == &TrackName::beta() && track.is_empty())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        // Purge writes every snapshot track.
        mock.expect_write_track()
            .withf(|_, track| track.name() == &TrackName::internal() && track.is_empty())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        mock.expect_write_track()
            .withf(|_, track| track.name() == &TrackName::beta() && track.is_empty())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        // Add to beta.
        mock.expect_write_track()
            .withf(|_, track| track.name() == &TrackName::beta() && track.version_codes() == [vc(5)])
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        mock.expect_commit()
            .with(always())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let ctx = EngineContext::new(&mock, &NoArtifacts, &Silent);
        let outcome = promote(ctx, &app(), vc(5), &TrackName::beta()).await.unwrap();

        assert_eq!(outcome.summary().map(|s| s.writes), Some(4));
    }

    #[tokio::test]
    async fn promote_already_present_never_writes_or_commits() {
        let mut mock = MockPublishingTransport::new();
        let mut seq = Sequence::new();
        expect_open_and_list(
            &mut mock,
            &mut seq,
            vec![Track::new(TrackName::beta()).with_version_codes([vc(5)])],
        );
        mock.expect_write_track().never();
        mock.expect_commit().never();

        let ctx = EngineContext::new(&mock, &NoArtifacts, &Silent);
        let outcome = promote(ctx, &app(), vc(5), &TrackName::beta()).await.unwrap();

        assert!(matches!(outcome, ReconcileOutcome::AlreadyPresent { .. }));
        assert!(!outcome.committed());
    }

    #[tokio::test]
    async fn deploy_fetch_failure_never_opens_edit() {
        let mut mock = MockPublishingTransport::new();
        mock.expect_open_edit().never();

        let ctx = EngineContext::new(&mock, &NoArtifacts, &Silent);
        let err = deploy(ctx, &app(), &ArtifactCoordinates::new("wallet", "1.0.0"))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Fetch(FetchError::NotFound(_))));
    }

    #[tokio::test]
    async fn rollout_out_of_range_never_opens_edit() {
        let mut mock = MockPublishingTransport::new();
        mock.expect_open_edit().never();

        let ctx = EngineContext::new(&mock, &NoArtifacts, &Silent);
        let err = rollout(ctx, &app(), vc(5), 101).await.unwrap_err();

        assert_eq!(err, EngineError::Input(InputError::Percentage("101".into())));
    }
}
