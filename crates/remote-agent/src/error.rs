//! Agent error types.

use thiserror::Error;

/// Result type alias using AgentError.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors that can occur inside the power-command agent.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The host OS is not Windows, Linux, or macOS. Command resolution
    /// fails before any process is spawned.
    #[error("Unsupported platform")]
    UnsupportedPlatform,

    /// The spawned OS process exited non-zero or failed to spawn. The
    /// captured text is surfaced verbatim to the caller.
    #[error("{0}")]
    CommandExecution(String),

    /// Configuration error from the figment layer.
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// HTTP server failed to bind or crashed.
    #[error("HTTP server error: {0}")]
    Http(#[from] hyper::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
