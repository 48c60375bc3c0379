//! Chat configuration

use crate::error::ChatConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Where the bot listens and who counts as privileged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Only messages in this channel are considered
    pub bot_channel_id: String,
    /// Messages must start with a mention of this user
    pub bot_user_id: String,
    /// Regular expression matched against the sender's user id
    pub privileged_users: String,
}

impl ChatConfig {
    /// Create config for a channel and bot user
    #[must_use]
    pub fn new(bot_channel_id: impl Into<String>, bot_user_id: impl Into<String>) -> Self {
        Self {
            bot_channel_id: bot_channel_id.into(),
            bot_user_id: bot_user_id.into(),
            privileged_users: String::new(),
        }
    }

    /// With privileged-user pattern
    #[inline]
    #[must_use]
    pub fn with_privileged_users(mut self, pattern: impl Into<String>) -> Self {
        self.privileged_users = pattern.into();
        self
    }

    /// Mention prefix the bot answers to, e.g. `<@U123>`
    #[must_use]
    pub fn mention(&self) -> String {
        format!("<@{}>", self.bot_user_id)
    }

    /// Check required settings and compile the privileged-user pattern
    ///
    /// An empty pattern matches nobody.
    ///
    /// # Errors
    /// - `ChatConfigError::Missing` for an empty channel or bot user id
    /// - `ChatConfigError::InvalidPattern` if the pattern does not compile
    pub fn validate(&self) -> Result<Option<Regex>, ChatConfigError> {
        if self.bot_channel_id.is_empty() {
            return Err(ChatConfigError::Missing("bot_channel_id"));
        }
        if self.bot_user_id.is_empty() {
            return Err(ChatConfigError::Missing("bot_user_id"));
        }
        if self.privileged_users.is_empty() {
            return Ok(None);
        }

        Regex::new(&self.privileged_users)
            .map(Some)
            .map_err(|source| ChatConfigError::InvalidPattern {
                pattern: self.privileged_users.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_channel_rejected() {
        let err = ChatConfig::new("", "U-BOT").validate().unwrap_err();
        assert!(matches!(err, ChatConfigError::Missing("bot_channel_id")));
    }

    #[test]
    fn invalid_pattern_rejected() {
        let err = ChatConfig::new("C", "U")
            .with_privileged_users("U-(")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ChatConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn empty_pattern_matches_nobody() {
        assert!(ChatConfig::new("C", "U").validate().unwrap().is_none());
    }

    #[test]
    fn mention_format() {
        assert_eq!(ChatConfig::new("C", "U42").mention(), "<@U42>");
    }
}
