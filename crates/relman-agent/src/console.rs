//! Line-oriented console
//!
//! Each input line is treated as a chat message in the bot channel from the
//! console user. The in-memory publisher stands in for the publishing
//! service; its committed state is persisted as JSON after every command
//! that can change tracks.

use crate::config::AgentConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use relman_chat::{ChatCommandSource, ChatConfig, ChatMessage};
use relman_core::{
    AppId, ArtifactCoordinates, ArtifactFetcher, BuildArtifact, CommandOutcome, ErrorKind, FetchError,
    InMemoryPublisher, Notifier, PublishedState, ReleaseOrchestrator,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Prints operator messages on stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutNotifier;

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn report(&self, message: &str) {
        println!("{message}");
    }
}

/// Fetcher for setups without an artifact repository
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRepository;

#[async_trait]
impl ArtifactFetcher for NoRepository {
    async fn fetch(&self, _coordinates: &ArtifactCoordinates) -> Result<BuildArtifact, FetchError> {
        Err(FetchError::Unavailable(
            "no artifact repository configured".to_string(),
        ))
    }
}

/// `text` addressed to the bot, adding the mention when it is missing
#[must_use]
pub fn addressed(chat: &ChatConfig, text: &str) -> String {
    let mention = chat.mention();
    let text = text.trim();
    if text.starts_with(&mention) {
        text.to_string()
    } else {
        format!("{mention} {text}")
    }
}

/// Load publisher state; a missing file is an empty state
///
/// # Errors
/// - if the file exists but cannot be read or parsed
pub fn load_state(path: &Path) -> Result<PublishedState> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "no state file, starting empty");
        return Ok(PublishedState::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading state file {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing state file {}", path.display()))
}

/// Write publisher state, replacing the file only once fully written
///
/// # Errors
/// - if the file cannot be written
pub fn save_state(path: &Path, state: &PublishedState) -> Result<()> {
    let content = serde_json::to_string_pretty(state).context("serializing state")?;
    let staging = path.with_extension("tmp");

    std::fs::write(&staging, content)
        .with_context(|| format!("writing state file {}", staging.display()))?;
    std::fs::rename(&staging, path)
        .with_context(|| format!("replacing state file {}", path.display()))
}

/// Console session over an in-memory publisher
pub struct Console {
    chat: ChatConfig,
    source: ChatCommandSource,
    user: String,
    orchestrator: ReleaseOrchestrator,
    publisher: Arc<InMemoryPublisher>,
    notifier: Arc<dyn Notifier>,
    state_path: Option<PathBuf>,
}

impl Console {
    /// Create console
    ///
    /// # Errors
    /// - if the chat configuration is incomplete or invalid
    pub fn new(
        config: &AgentConfig,
        publisher: Arc<InMemoryPublisher>,
        fetcher: Arc<dyn ArtifactFetcher>,
        notifier: Arc<dyn Notifier>,
        user: impl Into<String>,
    ) -> Result<Self> {
        config.validate_chat()?;
        let source = ChatCommandSource::new(config.chat.clone())?;
        let orchestrator = ReleaseOrchestrator::new(
            config.engine.clone(),
            publisher.clone(),
            fetcher,
            notifier.clone(),
        );

        Ok(Self {
            chat: config.chat.clone(),
            source,
            user: user.into(),
            orchestrator,
            publisher,
            notifier,
            state_path: None,
        })
    }

    /// Persist state to `path` after every command
    #[must_use]
    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_path = Some(path.into());
        self
    }

    /// Register an application by short name, qualified like chat commands
    ///
    /// Returns whether it was new. Known applications keep their tracks.
    ///
    /// # Errors
    /// - if the name is not a valid application id or state cannot be written
    pub fn register_app(&self, name: &str) -> Result<bool> {
        let app_id =
            AppId::new(name.trim()).with_context(|| format!("invalid application id '{name}'"))?;
        let app_id = self.orchestrator.config().qualify(&app_id);

        let added = self.publisher.register_app(app_id);
        if added {
            self.save()?;
        }
        Ok(added)
    }

    /// Handle one input line; blank lines are skipped
    ///
    /// State is saved after commands that can change tracks.
    ///
    /// # Errors
    /// - if the state file cannot be written
    pub async fn handle_line(&self, line: &str) -> Result<Option<CommandOutcome>> {
        if line.trim().is_empty() {
            return Ok(None);
        }

        let message = ChatMessage::new(self.chat.bot_channel_id.clone(), addressed(&self.chat, line))
            .from_user(self.user.clone());

        let mut mutation = false;
        let outcome = match self.source.accept(&message) {
            None => return Ok(None),
            Some(Ok(request)) => {
                mutation = request.command.is_mutation();
                self.orchestrator.handle(request).await
            }
            Some(Err(error)) => {
                let message = error.user_message();
                self.notifier.report(&message).await;
                CommandOutcome::Failed {
                    kind: ErrorKind::Input,
                    message,
                }
            }
        };

        if mutation {
            self.save()?;
        }
        Ok(Some(outcome))
    }

    /// Handle every line of `input`, returning how many were commands
    ///
    /// # Errors
    /// - if reading input or writing state fails
    pub async fn run<R: AsyncBufRead + Unpin>(&self, input: R) -> Result<usize> {
        let mut lines = input.lines();
        let mut handled = 0;

        while let Some(line) = lines.next_line().await.context("reading console input")? {
            if self.handle_line(&line).await?.is_some() {
                handled += 1;
            }
        }

        tracing::info!(handled, "console input closed");
        Ok(handled)
    }

    /// Write committed state to the state file, if one is set
    ///
    /// # Errors
    /// - if the file cannot be written
    pub fn save(&self) -> Result<()> {
        match &self.state_path {
            Some(path) => save_state(path, &self.publisher.state()),
            None => Ok(()),
        }
    }

    /// The orchestrator behind the console
    #[must_use]
    pub fn orchestrator(&self) -> &ReleaseOrchestrator {
        &self.orchestrator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addressed_adds_mention_once() {
        let chat = ChatConfig::new("C", "U-BOT");
        assert_eq!(addressed(&chat, "ping"), "<@U-BOT> ping");
        assert_eq!(addressed(&chat, "<@U-BOT> ping"), "<@U-BOT> ping");
    }

    #[test]
    fn missing_state_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let state = load_state(&dir.path().join("state.json")).unwrap();
        assert!(state.apps.is_empty());
    }
}
