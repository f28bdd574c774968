//! Worker error types (spec §7 `TranscodeError`/`TranscribeError`/
//! `MetadataError`/`StorageError`/`InternalError`).

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("media error: {0}")]
    Media(#[from] mentorup_media::MediaError),

    #[error("storage error: {0}")]
    Storage(#[from] mentorup_storage::StorageError),

    #[error("metadata error: {0}")]
    Metadata(#[from] mentorup_metadata::MetadataError),

    #[error("transcribe error: {0}")]
    Transcribe(#[from] mentorup_transcribe::TranscribeError),

    #[error("bus error: {0}")]
    Bus(#[from] mentorup_bus::QueueError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl WorkerError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
