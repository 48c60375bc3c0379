use crate::config::ChatConfig;
use crate::error::ChatConfigError;
use crate::message::ChatMessage;
use crate::parser::parse_command;
use regex::Regex;
use relman_core::{CommandRequest, InputError};

/// Filters chat traffic and turns addressed messages into requests
#[derive(Debug, Clone)]
pub struct ChatCommandSource {
    channel: String,
    mention: String,
    privileged: Option<Regex>,
}

impl ChatCommandSource {
    /// Create source from validated configuration
    ///
    /// # Errors
    /// - `ChatConfigError` if the configuration is incomplete or the pattern is invalid
    pub fn new(config: ChatConfig) -> Result<Self, ChatConfigError> {
        let privileged = config.validate()?;
        Ok(Self {
            mention: config.mention(),
            channel: config.bot_channel_id,
            privileged,
        })
    }

    /// Whether `user` may run privileged commands
    #[must_use]
    pub fn is_privileged(&self, user: Option<&str>) -> bool {
        self.privileged
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(user.unwrap_or_default()))
    }

    /// Handle one message
    ///
    /// Returns `None` for messages the bot should ignore, otherwise the
    /// parsed request or the input error to report back.
    #[must_use]
    pub fn accept(&self, message: &ChatMessage) -> Option<Result<CommandRequest, InputError>> {
        tracing::debug!("{message}");

        if message.channel != self.channel || !message.text.starts_with(&self.mention) {
            return None;
        }

        let user = message.user.as_deref();
        let parsed = parse_command(&message.text).map(|command| {
            let request = CommandRequest::new(command).privileged(self.is_privileged(user));
            match user {
                Some(user) => request.with_issuer(user),
                None => request,
            }
        });

        if let Err(error) = &parsed {
            tracing::warn!(%error, user = user.unwrap_or("-"), "unparseable command");
        }
        Some(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relman_core::Command;

    fn source() -> ChatCommandSource {
        ChatCommandSource::new(
            ChatConfig::new("C-RELEASES", "U-BOT").with_privileged_users("^U-(LEAD|OPS)$"),
        )
        .unwrap()
    }

    #[test]
    fn ignores_other_channels() {
        let message = ChatMessage::new("C-RANDOM", "<@U-BOT> ping").from_user("U-LEAD");
        assert!(source().accept(&message).is_none());
    }

    #[test]
    fn ignores_unaddressed_messages() {
        let message = ChatMessage::new("C-RELEASES", "ping <@U-BOT>").from_user("U-LEAD");
        assert!(source().accept(&message).is_none());
    }

    #[test]
    fn privileged_flag_follows_pattern() {
        let source = source();
        let lead = ChatMessage::new("C-RELEASES", "<@U-BOT> ping").from_user("U-LEAD");
        let dev = ChatMessage::new("C-RELEASES", "<@U-BOT> ping").from_user("U-DEV");

        let lead = source.accept(&lead).unwrap().unwrap();
        let dev = source.accept(&dev).unwrap().unwrap();

        assert!(lead.privileged);
        assert_eq!(lead.issuer.as_deref(), Some("U-LEAD"));
        assert!(!dev.privileged);
        assert_eq!(dev.command, Command::Ping);
    }

    #[test]
    fn anonymous_sender_never_privileged() {
        let message = ChatMessage::new("C-RELEASES", "<@U-BOT> ping");
        let request = source().accept(&message).unwrap().unwrap();
        assert!(!request.privileged);
        assert!(request.issuer.is_none());
    }

    #[test]
    fn input_errors_are_returned() {
        let message = ChatMessage::new("C-RELEASES", "<@U-BOT> halt wallet v2").from_user("U-DEV");
        let err = source().accept(&message).unwrap().unwrap_err();
        assert_eq!(err.user_message(), "Sorry, I don't understand that version code.");
    }
}
