//! Error types for the GRID dashboard core.

use thiserror::Error;

/// Result type alias for dashboard operations.
pub type GridResult<T> = Result<T, GridError>;

/// Errors surfaced by the dashboard tools and the chat client.
///
/// Every variant ends up as an inline, user-visible message; none is fatal to the process.
#[derive(Error, Debug)]
pub enum GridError {
    /// Validation: a required tool input was left empty.
    #[error("ERROR: {0}")]
    MissingInput(String),

    /// Validation: the password policy enables no character class.
    #[error("Error: Select at least one character set.")]
    EmptyCharset,

    #[error("Unknown tool identifier: {0}")]
    UnknownTool(String),

    /// Configuration: the chat credential is absent from the environment.
    #[error("API key not found. Please ensure {0} is configured in your environment.")]
    MissingCredential(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for GridError {
    fn from(err: reqwest::Error) -> Self {
        GridError::Transport(err.to_string())
    }
}
