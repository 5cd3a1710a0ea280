//! Error types for Sibyl.

use thiserror::Error;

/// Primary error type for all Sibyl operations.
///
/// Collaborator failures (dispatch, completion, speech services) are terminal
/// at this layer: nothing here retries. If retry is wanted, the hosting
/// runtime layers it on top.
#[derive(Error, Debug)]
pub enum SibylError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Dispatch failed: {0}")]
    Dispatch(String),

    #[error("Completion failed: {0}")]
    Completion(String),

    #[error("Transcription failed: {0}")]
    Stt(String),

    #[error("Speech synthesis failed: {0}")]
    Tts(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl SibylError {
    /// Create an API error from a status code and message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SibylError>;
