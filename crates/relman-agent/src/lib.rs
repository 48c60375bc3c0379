//! Relman Agent - chat-driven release manager
//!
//! Wires the command source, engine and artifact fetcher together:
//! - [`config`]: TOML file plus environment overrides
//! - [`logging`]: tracing subscriber setup
//! - [`console`]: line-oriented session over an in-memory publisher

pub mod config;
pub mod console;
pub mod logging;

pub use config::{AgentConfig, ConfigError, LogFormat};
pub use console::{Console, NoRepository, StdoutNotifier};
