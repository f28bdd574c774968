//! API error taxonomy and its JSON wire shape (spec §7).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Request payload fails schema or identifier-length/trim-range checks.
    #[error("{0}")]
    Validation(String),

    /// Missing/expired/invalid token, or policy denial.
    #[error("{0}")]
    Auth { status: StatusCode, message: String },

    /// Ingestion attempted while an upload is already in progress.
    #[error("{0}")]
    Conflict(String),

    #[error("metadata error: {0}")]
    Metadata(#[from] mentorup_metadata::MetadataError),

    #[error("storage error: {0}")]
    Storage(#[from] mentorup_storage::StorageError),

    #[error("media error: {0}")]
    Media(#[from] mentorup_media::MediaError),

    #[error("bus error: {0}")]
    Bus(#[from] mentorup_bus::QueueError),

    #[error("scratch file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn auth(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Auth { status, message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::auth(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::auth(StatusCode::FORBIDDEN, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_tag, message) = match self {
            ApiError::Validation(message) => (StatusCode::BAD_REQUEST, "ValidationError", message),
            ApiError::Auth { status, message } => (status, "AuthError", message),
            ApiError::Conflict(message) => (StatusCode::BAD_REQUEST, "ConflictError", message),
            ApiError::Metadata(e) => {
                error!(error = %e, "metadata service call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Exception", e.to_string())
            }
            ApiError::Storage(e) => {
                error!(error = %e, "object store call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Exception", e.to_string())
            }
            ApiError::Media(e) => {
                error!(error = %e, "media toolkit call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Exception", e.to_string())
            }
            ApiError::Bus(e) => {
                error!(error = %e, "message bus call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Exception", e.to_string())
            }
            ApiError::Io(e) => {
                error!(error = %e, "scratch file I/O failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Exception", e.to_string())
            }
            ApiError::Internal(message) => {
                error!(error = %message, "unhandled internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Exception", message)
            }
        };

        (status, axum::Json(ErrorBody { error: error_tag, message })).into_response()
    }
}
