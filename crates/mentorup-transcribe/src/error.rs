//! Errors for the transcription service client.

use thiserror::Error;

pub type TranscribeResult<T> = Result<T, TranscribeError>;

#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("transcription service returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
