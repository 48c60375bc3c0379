//! Chat configuration errors

/// Invalid chat configuration
#[derive(Debug, thiserror::Error)]
pub enum ChatConfigError {
    /// Required setting empty
    #[error("missing chat setting: {0}")]
    Missing(&'static str),

    /// Privileged-user pattern does not compile
    #[error("invalid privileged user pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
