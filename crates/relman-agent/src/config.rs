//! Agent configuration
//!
//! Precedence (highest to lowest):
//! 1. Environment variables
//! 2. Config file (TOML)
//! 3. Default values

use relman_chat::{ChatConfig, ChatConfigError};
use relman_core::EngineConfig;
use relman_maven::MavenConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Configuration failure
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file unreadable
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`AgentConfig`]
    #[error("cannot parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Required value absent after merging
    #[error("missing required setting {0}")]
    Missing(&'static str),

    /// Privileged-user pattern does not compile
    #[error("invalid privileged user pattern '{0}'")]
    InvalidPattern(String),
}

/// Complete agent configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Engine settings
    pub engine: EngineConfig,
    /// Chat command source settings
    pub chat: ChatConfig,
    /// Artifact repository settings
    pub maven: MavenConfig,
    /// Log output format
    pub log_format: LogFormat,
}

impl AgentConfig {
    /// Load from an optional file, then apply process environment overrides
    ///
    /// # Errors
    /// - `ConfigError::Read` / `ConfigError::Parse` for a bad config file
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };

        config.apply_env_overrides(|name| std::env::var(name).ok());
        tracing::debug!(engine = ?config.engine, chat_channel = %config.chat.bot_channel_id, "loaded configuration");
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// - `ConfigError::Read` / `ConfigError::Parse`
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override settings from variables found by `lookup`; empty values are ignored
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());

        if let Some(prefix) = var("ANDROID_APP_ID_PREFIX") {
            self.engine.app_id_prefix = Some(prefix);
        }
        if let Some(channel) = var("SLACK_BOT_CHANNEL_ID") {
            self.chat.bot_channel_id = channel;
        }
        if let Some(user) = var("SLACK_BOT_USER_ID") {
            self.chat.bot_user_id = user;
        }
        if let Some(pattern) = var("SLACK_GOD_USER_ID") {
            self.chat.privileged_users = pattern;
        }
        if let Some(repository) = var("MAVEN_REPOSITORY") {
            self.maven.repository = repository;
        }
        if let Some(group) = var("MAVEN_GROUP_ID") {
            self.maven.group_id = group;
        }
        if let Some(user) = var("MAVEN_ACCOUNT_NAME") {
            self.maven.username = Some(user);
        }
        if let Some(password) = var("MAVEN_ACCOUNT_PASSWORD") {
            self.maven.password = Some(password);
        }
        if let Some(format) = var("RELMAN_LOG_FORMAT") {
            if format.eq_ignore_ascii_case("json") {
                self.log_format = LogFormat::Json;
            }
        }
    }

    /// Check what the command source needs
    ///
    /// # Errors
    /// - `ConfigError::Missing` naming the environment variable to set
    /// - `ConfigError::InvalidPattern` for a bad privileged-user pattern
    pub fn validate_chat(&self) -> Result<(), ConfigError> {
        self.chat.validate().map(drop).map_err(|error| match error {
            ChatConfigError::Missing("bot_channel_id") => ConfigError::Missing("SLACK_BOT_CHANNEL_ID"),
            ChatConfigError::Missing(_) => ConfigError::Missing("SLACK_BOT_USER_ID"),
            ChatConfigError::InvalidPattern { pattern, .. } => ConfigError::InvalidPattern(pattern),
        })
    }

    /// Whether an artifact repository is configured
    #[must_use]
    pub fn has_repository(&self) -> bool {
        !self.maven.repository.is_empty()
    }
}
