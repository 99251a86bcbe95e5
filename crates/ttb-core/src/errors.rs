use std::time::Duration;

/// Core error type for the bot.
///
/// Adapter crates map their specific failures into this type so the handlers
/// can render them consistently. No variant is fatal to the process: a failed
/// message never affects other messages or chats.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    /// Bad user input (overlong text, malformed command arguments).
    /// User-visible and recoverable; the message carries the usage hint.
    #[error("{0}")]
    Validation(String),

    /// Translation or social API failure/timeout. User-visible, recoverable,
    /// no automatic retry.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Self-clearing once the rate window rolls.
    #[error("rate limit exceeded")]
    RateLimited { retry_after: Option<Duration> },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
