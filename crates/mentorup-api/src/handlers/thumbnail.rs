//! `POST /upload/thumbnail` (spec §6).
//!
//! Grounded on `original_source/.../blueprints/upload/thumbnail.py`: a
//! multipart body carrying a `body` JSON part (`{mentor}`) and a `thumbnail`
//! file part, stored under the ISO8601-compact timestamped key (spec §10.5).

use axum::extract::State;
use axum::http::HeaderMap;
use axum_extra::extract::Multipart;
use serde::{Deserialize, Serialize};

use mentorup_storage::operations::CONTENT_TYPE_PNG;

use crate::auth::require_edit_mentor;
use crate::error::{ApiError, ApiResult};
use crate::handlers::{ok, validate_identifier, DataEnvelope};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct ThumbnailBody {
    mentor: String,
}

#[derive(Serialize)]
pub struct ThumbnailResponse {
    pub thumbnail: String,
}

pub async fn upload_thumbnail(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<axum::Json<DataEnvelope<ThumbnailResponse>>> {
    let mut body: Option<ThumbnailBody> = None;
    let mut thumbnail_bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("invalid multipart body: {e}")))?
    {
        match field.name() {
            Some("body") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(format!("invalid body part: {e}")))?;
                body = Some(
                    serde_json::from_str(&text)
                        .map_err(|e| ApiError::Validation(format!("invalid body JSON: {e}")))?,
                );
            }
            Some("thumbnail") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("invalid thumbnail part: {e}")))?;
                thumbnail_bytes = Some(bytes.to_vec());
            }
            _ => {}
        }
    }

    let body = body.ok_or_else(|| ApiError::Validation("missing required param body".into()))?;
    let thumbnail_bytes =
        thumbnail_bytes.ok_or_else(|| ApiError::Validation("missing thumbnail file part".into()))?;
    validate_identifier("mentor", &body.mentor)?;

    require_edit_mentor(&headers, &state.config.jwt_secret, &body.mentor)?;

    let timestamp = crate::util::utc_compact_timestamp();
    let key = state.layout.thumbnail_key(&body.mentor, &timestamp);
    state.storage.put_bytes(&key, thumbnail_bytes, CONTENT_TYPE_PNG).await?;

    let url = state.layout.public_url(&key);
    state.metadata.mentor_thumbnail_update(&body.mentor, &url).await?;

    Ok(ok(ThumbnailResponse { thumbnail: url }))
}
