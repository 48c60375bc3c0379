//! Relman Chat - command source for chat operators
//!
//! Turns chat messages into [`CommandRequest`](relman_core::CommandRequest)s:
//! - Ignores messages outside the bot channel or not addressed to the bot
//! - Parses the command grammar (`promote wallet 42 to beta`, ...)
//! - Marks the request privileged when the sender matches the configured pattern
//!
//! # Example
//!
//! ```rust
//! use relman_chat::{ChatCommandSource, ChatConfig, ChatMessage};
//!
//! let config = ChatConfig::new("C-RELEASES", "U-BOT").with_privileged_users("^U-LEAD$");
//! let source = ChatCommandSource::new(config).unwrap();
//!
//! let message = ChatMessage::new("C-RELEASES", "<@U-BOT> ping").from_user("U-LEAD");
//! let request = source.accept(&message).unwrap().unwrap();
//! assert!(request.privileged);
//! ```

mod config;
mod error;
mod message;
mod parser;
mod source;

pub use config::ChatConfig;
pub use error::ChatConfigError;
pub use message::ChatMessage;
pub use parser::parse_command;
pub use source::ChatCommandSource;
