//! `POST /upload/transfer` and `POST /upload/transfer/mentor` (spec §6, §4.7).
//!
//! Grounded on `original_source/.../blueprints/upload/transfer.py`: these
//! just validate the body and hand off to the background orchestrator: here,
//! published onto `mentorup-bus`'s single-consumer trigger streams instead of
//! a Celery `apply_async` call.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use mentorup_bus::{MENTOR_IMPORT_STREAM, TRANSFER_STREAM};
use mentorup_models::{MentorImportJobMessage, TransferJobMessage};
use serde::{Deserialize, Serialize};

use crate::auth::require_edit_mentor;
use crate::error::ApiResult;
use crate::handlers::{ok, url_root, validate_identifier, DataEnvelope};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub mentor: String,
    pub question: String,
}

#[derive(Serialize)]
pub struct TransferResponse {
    pub id: String,
    #[serde(rename = "statusUrl")]
    pub status_url: String,
}

pub async fn transfer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<TransferRequest>,
) -> ApiResult<Json<DataEnvelope<TransferResponse>>> {
    validate_identifier("mentor", &req.mentor)?;
    validate_identifier("question", &req.question)?;
    require_edit_mentor(&headers, &state.config.jwt_secret, &req.mentor)?;

    let message_id = state
        .bus
        .publish_json(
            TRANSFER_STREAM,
            &TransferJobMessage {
                mentor: req.mentor.clone(),
                question: req.question.clone(),
            },
        )
        .await?;

    let status_url = state.config.status_url(
        &url_root(&headers),
        &format!("upload/transfer/status/{message_id}"),
    );
    Ok(ok(TransferResponse { id: message_id, status_url }))
}

#[derive(Debug, Deserialize)]
pub struct MentorImportRequest {
    pub mentor: String,
    #[serde(rename = "mentorExportJson")]
    pub mentor_export_json: serde_json::Value,
    #[serde(rename = "replacedMentorDataChanges")]
    pub replaced_mentor_data_changes: serde_json::Value,
}

#[derive(Serialize)]
pub struct MentorImportResponse {
    #[serde(rename = "statusUrl")]
    pub status_url: String,
}

pub async fn transfer_mentor(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<MentorImportRequest>,
) -> ApiResult<Json<DataEnvelope<MentorImportResponse>>> {
    validate_identifier("mentor", &req.mentor)?;
    require_edit_mentor(&headers, &state.config.jwt_secret, &req.mentor)?;

    let message_id = state
        .bus
        .publish_json(
            MENTOR_IMPORT_STREAM,
            &MentorImportJobMessage {
                mentor: req.mentor.clone(),
                mentor_export_json: req.mentor_export_json,
                replaced_mentor_data_changes: req.replaced_mentor_data_changes,
            },
        )
        .await?;

    let status_url = state.config.status_url(
        &url_root(&headers),
        &format!("upload/transfer/mentor/status/{message_id}"),
    );
    Ok(ok(MentorImportResponse { status_url }))
}
