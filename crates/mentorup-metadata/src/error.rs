//! Errors for the GraphQL metadata client (spec §4.3, §7).

use thiserror::Error;

/// Result type for metadata operations.
pub type MetadataResult<T> = Result<T, MetadataError>;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("metadata service returned {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body was well-formed JSON but carried a GraphQL `errors` array.
    #[error("metadata service reported errors: {0}")]
    GraphQl(String),

    #[error("malformed metadata response: {0}")]
    InvalidResponse(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MetadataError {
    /// Network errors and 5xx are worth a retry; 4xx and malformed payloads are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MetadataError::Network(_))
            || matches!(self, MetadataError::Http { status, .. } if *status >= 500)
    }
}
