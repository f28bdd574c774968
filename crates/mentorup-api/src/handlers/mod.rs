//! HTTP handlers for the `/upload/*` surface (spec §6).

pub mod answer;
pub mod ping;
pub mod thumbnail;
pub mod transfer;

use axum::http::HeaderMap;
use serde::Serialize;

use crate::error::ApiError;

/// `{data: ...}` response envelope every handler answers with on success.
#[derive(Serialize)]
pub struct DataEnvelope<T: Serialize> {
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> axum::Json<DataEnvelope<T>> {
    axum::Json(DataEnvelope { data })
}

/// mentor/question identifier length bound (spec §6 "Identifier constraints").
pub fn validate_identifier(name: &str, value: &str) -> Result<(), ApiError> {
    if !(5..=60).contains(&value.chars().count()) {
        return Err(ApiError::Validation(format!(
            "{name} must be 5-60 characters, got {}",
            value.chars().count()
        )));
    }
    Ok(())
}

/// trim bounds validation: `start >= 0`, `end > 0`, `end > start` (spec §6).
pub fn validate_trim(start: f64, end: f64) -> Result<(), ApiError> {
    if start < 0.0 {
        return Err(ApiError::Validation("trim.start must be >= 0".into()));
    }
    if end <= 0.0 {
        return Err(ApiError::Validation("trim.end must be > 0".into()));
    }
    if end <= start {
        return Err(ApiError::Validation("trim.end must be > trim.start".into()));
    }
    Ok(())
}

/// Reconstructs the scheme+host the dispatcher's original `request.url_root`
/// represented, from the `Host` header. Assumes plain HTTP; `ApiConfig::
/// status_url`'s `STATUS_URL_FORCE_HTTPS` rewrite upgrades it when configured.
pub fn url_root(headers: &HeaderMap) -> String {
    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_length_bounds() {
        assert!(validate_identifier("mentor", "short").is_ok());
        assert!(validate_identifier("mentor", "abcd").is_err());
        assert!(validate_identifier("mentor", &"a".repeat(61)).is_err());
    }

    #[test]
    fn trim_bounds_reject_non_positive_and_inverted_ranges() {
        assert!(validate_trim(0.0, 5.0).is_ok());
        assert!(validate_trim(-1.0, 5.0).is_err());
        assert!(validate_trim(0.0, 0.0).is_err());
        assert!(validate_trim(5.0, 1.0).is_err());
    }

    #[test]
    fn url_root_falls_back_to_localhost_without_host_header() {
        let headers = HeaderMap::new();
        assert_eq!(url_root(&headers), "http://localhost");
    }

    #[test]
    fn url_root_reads_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::HOST, "api.example.com".parse().unwrap());
        assert_eq!(url_root(&headers), "http://api.example.com");
    }
}
