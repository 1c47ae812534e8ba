// src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Failures talking to the bot-hosting backend. Tools turn these into
/// plain `Error ...` strings before the model sees them.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session already exists: {0}")]
    AlreadyExists(String),
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Model returned {status}: {body}")]
    Model { status: u16, body: String },

    #[error("Model returned no candidates")]
    EmptyResponse,

    #[error("Agent exceeded {0} tool iterations")]
    TooManyIterations(usize),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
