//! Bearer-token authorization (spec §4.4, §10.5).
//!
//! Grounded on `original_source/mentor_upload_api/.../authorization_decorator.py`:
//! a symmetric HS256 JWT carries `{id, role, mentorIds}`; `manage-content`
//! passes for `role ∈ {ADMIN, CONTENT_MANAGER}`, `edit-mentor` additionally
//! passes when the target mentor is in the token's `mentorIds`.

use axum::http::HeaderMap;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthPayload {
    pub id: String,
    pub role: String,
    #[serde(rename = "mentorIds")]
    pub mentor_ids: Vec<String>,
}

impl AuthPayload {
    pub fn can_manage_content(&self) -> bool {
        matches!(self.role.as_str(), "ADMIN" | "CONTENT_MANAGER")
    }

    pub fn can_edit_mentor(&self, mentor: &str) -> bool {
        self.can_manage_content() || self.mentor_ids.iter().any(|m| m == mentor)
    }
}

/// Decodes and validates the bearer token in `Authorization`, per
/// `parse_payload_from_auth_header_jwt`.
pub fn authenticate(headers: &HeaderMap, jwt_secret: &str) -> Result<AuthPayload, ApiError> {
    let header_value = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !header_value.to_lowercase().starts_with("bearer") {
        return Err(ApiError::unauthorized("no authentication token provided"));
    }
    let token = header_value
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| ApiError::unauthorized("no authentication token provided"))?;

    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;

    let decoded = decode::<AuthPayload>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| ApiError::unauthorized(format!("access token invalid: {e}")))?;

    Ok(decoded.claims)
}

/// `manage-content` policy: admin or content-manager role.
pub fn require_manage_content(headers: &HeaderMap, jwt_secret: &str) -> Result<AuthPayload, ApiError> {
    let payload = authenticate(headers, jwt_secret)?;
    if !payload.can_manage_content() {
        return Err(ApiError::forbidden("requires admin or content-manager role"));
    }
    Ok(payload)
}

/// `edit-mentor` policy: requester's `mentorIds` contains `mentor`, or
/// `manage-content` already passes.
pub fn require_edit_mentor(headers: &HeaderMap, jwt_secret: &str, mentor: &str) -> Result<AuthPayload, ApiError> {
    let payload = authenticate(headers, jwt_secret)?;
    if !payload.can_edit_mentor(mentor) {
        return Err(ApiError::forbidden("not authorized to edit this mentor"));
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(role: &str, mentor_ids: &[&str]) -> AuthPayload {
        AuthPayload {
            id: "u1".into(),
            role: role.into(),
            mentor_ids: mentor_ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn admin_can_manage_content() {
        assert!(payload("ADMIN", &[]).can_manage_content());
        assert!(payload("CONTENT_MANAGER", &[]).can_manage_content());
        assert!(!payload("MENTOR", &[]).can_manage_content());
    }

    #[test]
    fn edit_mentor_allows_own_mentor_or_content_manager() {
        assert!(payload("MENTOR", &["m1"]).can_edit_mentor("m1"));
        assert!(!payload("MENTOR", &["m1"]).can_edit_mentor("m2"));
        assert!(payload("ADMIN", &[]).can_edit_mentor("m2"));
    }
}
