//! Command orchestration
//!
//! [`ReleaseOrchestrator`] is the boundary between a command source and the
//! engine. For each request it:
//! 1. Checks operator privilege
//! 2. Qualifies the application id with the configured prefix
//! 3. Serializes per application (when enabled)
//! 4. Runs the operation and reports its lines
//! 5. Turns any failure into exactly one operator message
//!
//! No error escapes [`ReleaseOrchestrator::handle`].

use crate::command::{Command, CommandRequest};
use crate::edit::EngineContext;
use crate::error::{EngineError, ErrorKind};
use crate::locks::AppLocks;
use crate::query::{self, ReleaseNoteEntry, TrackSummary};
use crate::reconcile::{self, ReconcileOutcome};
use crate::transport::{ArtifactFetcher, Notifier, PublishingTransport};
use crate::types::{AppId, ArtifactCoordinates, EngineConfig};
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

const DONE: &str = "Done.";

/// Result of handling one request
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// Answered a ping
    Pong,
    /// Request not understood
    Help,
    /// Reconciliation ran
    Reconciled(ReconcileOutcome),
    /// Track summaries shown
    Tracks(Vec<TrackSummary>),
    /// Release notes shown
    ReleaseNotes(Vec<ReleaseNoteEntry>),
    /// Request failed; `message` was sent to the operator
    Failed { kind: ErrorKind, message: String },
}

impl CommandOutcome {
    /// Whether the request succeeded
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Failure classification, if the request failed
    #[inline]
    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Runs commands against the publishing service
pub struct ReleaseOrchestrator {
    config: EngineConfig,
    transport: Arc<dyn PublishingTransport>,
    fetcher: Arc<dyn ArtifactFetcher>,
    notifier: Arc<dyn Notifier>,
    locks: AppLocks,
}

impl ReleaseOrchestrator {
    /// Create orchestrator
    #[must_use]
    pub fn new(
        config: EngineConfig,
        transport: Arc<dyn PublishingTransport>,
        fetcher: Arc<dyn ArtifactFetcher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            transport,
            fetcher,
            notifier,
            locks: AppLocks::new(),
        }
    }

    /// Engine configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Per-application lock table
    #[inline]
    #[must_use]
    pub fn locks(&self) -> &AppLocks {
        &self.locks
    }

    /// Handle one request end to end
    pub async fn handle(&self, request: CommandRequest) -> CommandOutcome {
        let command = request.command.name();
        tracing::info!(
            command,
            issuer = request.issuer.as_deref().unwrap_or("-"),
            privileged = request.privileged,
            "handling command"
        );

        match self.dispatch(request).await {
            Ok(outcome) => {
                tracing::debug!(command, ?outcome, "command finished");
                outcome
            }
            Err(error) => {
                if error.is_rejection() {
                    tracing::warn!(command, %error, "command rejected");
                } else {
                    tracing::error!(command, %error, "command aborted");
                }

                let message = error.user_message();
                self.notifier.report(&message).await;
                CommandOutcome::Failed {
                    kind: error.kind(),
                    message,
                }
            }
        }
    }

    async fn dispatch(&self, request: CommandRequest) -> Result<CommandOutcome, EngineError> {
        let CommandRequest {
            command,
            privileged,
            ..
        } = request;

        if command.requires_privilege() && !privileged {
            return Err(EngineError::permission(command.name()));
        }

        match command {
            Command::Ping => {
                self.notifier.report("Pong.").await;
                Ok(CommandOutcome::Pong)
            }
            Command::Help => {
                self.notifier.report("Sorry, I don't understand.").await;
                Ok(CommandOutcome::Help)
            }
            Command::Deploy {
                artifact_id,
                version,
            } => {
                let app_id = self.config.qualify(&AppId::new(artifact_id.as_str())?);
                let coordinates = ArtifactCoordinates::new(artifact_id, version);

                let _guard = self.serialize(&app_id).await;
                let outcome = reconcile::deploy(self.context(), &app_id, &coordinates).await?;
                self.finish(outcome).await
            }
            Command::Halt {
                app_id,
                version_code,
            } => {
                let app_id = self.config.qualify(&app_id);

                let _guard = self.serialize(&app_id).await;
                let outcome = reconcile::halt(self.context(), &app_id, version_code).await?;
                self.finish(outcome).await
            }
            Command::Promote {
                app_id,
                version_code,
                track,
            } => {
                let app_id = self.config.qualify(&app_id);

                let _guard = self.serialize(&app_id).await;
                let outcome =
                    reconcile::promote(self.context(), &app_id, version_code, &track).await?;
                self.finish(outcome).await
            }
            Command::Rollout {
                app_id,
                version_code,
                percentage,
            } => {
                let app_id = self.config.qualify(&app_id);

                let _guard = self.serialize(&app_id).await;
                let outcome =
                    reconcile::rollout(self.context(), &app_id, version_code, percentage).await?;
                self.finish(outcome).await
            }
            Command::ShowTracks { app_id } => {
                let app_id = self.config.qualify(&app_id);

                let _guard = self.serialize(&app_id).await;
                let mut shown = Vec::new();
                for summary in query::show_tracks(self.context(), &app_id).await? {
                    self.notifier.report(&summary.to_string()).await;
                    shown.push(summary);
                }

                self.notifier.report(DONE).await;
                Ok(CommandOutcome::Tracks(shown))
            }
            Command::ShowReleaseNotes {
                app_id,
                version_code,
            } => {
                let app_id = self.config.qualify(&app_id);

                let _guard = self.serialize(&app_id).await;
                let entries =
                    query::show_release_notes(self.context(), &app_id, version_code).await?;
                for entry in &entries {
                    self.notifier.report(&entry.to_string()).await;
                }

                self.notifier.report(DONE).await;
                Ok(CommandOutcome::ReleaseNotes(entries))
            }
        }
    }

    /// Report completion of a committed reconciliation
    async fn finish(&self, outcome: ReconcileOutcome) -> Result<CommandOutcome, EngineError> {
        if outcome.committed() {
            self.notifier.report(DONE).await;
        }
        Ok(CommandOutcome::Reconciled(outcome))
    }

    async fn serialize(&self, app_id: &AppId) -> Option<OwnedMutexGuard<()>> {
        if self.config.serialize_per_app {
            Some(self.locks.acquire(app_id).await)
        } else {
            None
        }
    }

    fn context(&self) -> EngineContext<'_> {
        EngineContext::new(
            self.transport.as_ref(),
            self.fetcher.as_ref(),
            self.notifier.as_ref(),
        )
    }
}

impl std::fmt::Debug for ReleaseOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleaseOrchestrator")
            .field("config", &self.config)
            .field("locked_apps", &self.locks.len())
            .finish_non_exhaustive()
    }
}
