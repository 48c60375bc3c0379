use std::fmt::{self, Display, Formatter};

/// One inbound chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Channel the message was posted in
    pub channel: String,
    /// Sender, absent for bot and system messages
    pub user: Option<String>,
    /// Raw message text
    pub text: String,
}

impl ChatMessage {
    /// Message without a sender
    #[must_use]
    pub fn new(channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            user: None,
            text: text.into(),
        }
    }

    /// With sender
    #[inline]
    #[must_use]
    pub fn from_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

impl Display for ChatMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.user {
            Some(user) => write!(f, "#{} {user}: {}", self.channel, self.text),
            None => write!(f, "#{} {}", self.channel, self.text),
        }
    }
}
