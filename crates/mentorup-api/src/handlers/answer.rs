//! `/upload/answer*` — the job dispatcher (C4, spec §4.4) and the
//! task/answer coordinator's HTTP-facing slice (C6, spec §4.6).
//!
//! Grounded on `original_source/.../blueprints/upload/answer_queue.py` (the
//! 9-step dispatch algorithm) and `trim.py`/the cancel protocol described in
//! spec §4.6.

use std::path::{Path, PathBuf};

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use axum_extra::extract::Multipart;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mentorup_models::{
    AnswerMedia, AnswerPatch, JobMessage, MediaTag, MediaType, TaskEntry, TaskName, TaskPatch,
    TaskRef, TaskStatus, TrimRange,
};
use mentorup_storage::operations::AnswerArtifact;

use crate::auth::require_edit_mentor;
use crate::error::{ApiError, ApiResult};
use crate::handlers::{ok, url_root, validate_identifier, validate_trim, DataEnvelope};
use crate::state::AppState;

/// Deletes its tracked scratch files on drop, win or lose — the dispatcher's
/// own instance of spec §5/§9's "scoped resources" rule.
struct ScratchFiles(Vec<PathBuf>);

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        for path in &self.0 {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[derive(Debug, Deserialize)]
struct TrimBody {
    start: f64,
    end: f64,
}

#[derive(Debug, Deserialize)]
struct UploadAnswerBody {
    mentor: String,
    question: String,
    #[serde(default)]
    trim: Option<TrimBody>,
    #[serde(default, rename = "hasEditedTranscript")]
    has_edited_transcript: bool,
}

fn task_ref(entry: &TaskEntry) -> TaskRef {
    TaskRef {
        task_id: entry.task_id.clone(),
        task_name: entry.task_name,
        status: entry.status,
    }
}

#[derive(Serialize)]
pub struct UploadAnswerResponse {
    #[serde(rename = "transcodeWebTask")]
    transcode_web_task: TaskRef,
    #[serde(rename = "transcodeMobileTask")]
    transcode_mobile_task: TaskRef,
    #[serde(skip_serializing_if = "Option::is_none", rename = "transcribeTask")]
    transcribe_task: Option<TaskRef>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "trimUploadTask")]
    trim_upload_task: Option<TaskRef>,
    #[serde(rename = "statusUrl")]
    status_url: String,
}

/// `POST /upload/answer` — ingestion (spec §4.4 steps 1-9).
pub async fn upload_answer(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<Json<DataEnvelope<UploadAnswerResponse>>> {
    let mut body: Option<UploadAnswerBody> = None;
    let mut video_bytes: Option<Vec<u8>> = None;
    let mut video_ext = ".mp4".to_string();

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
            Some("video") => {
                if let Some(name) = field.file_name() {
                    if let Some(ext) = Path::new(name).extension().and_then(|e| e.to_str()) {
                        video_ext = format!(".{ext}");
                    }
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("invalid video part: {e}")))?;
                video_bytes = Some(bytes.to_vec());
            }
            _ => {}
        }
    }

    let body = body.ok_or_else(|| ApiError::Validation("missing required param body".into()))?;
    let video_bytes =
        video_bytes.ok_or_else(|| ApiError::Validation("missing video file part".into()))?;

    validate_identifier("mentor", &body.mentor)?;
    validate_identifier("question", &body.question)?;
    if let Some(trim) = &body.trim {
        validate_trim(trim.start, trim.end)?;
    }

    require_edit_mentor(&headers, &state.config.jwt_secret, &body.mentor)?;

    // Step 1: reject concurrent ingestion for the same answer (spec §4.4, §4.6).
    if state.metadata.is_upload_in_progress(&body.mentor, &body.question).await? {
        return Err(ApiError::Conflict("upload already in progress".into()));
    }

    // Step 2: persist the incoming file under a process-local scratch path.
    tokio::fs::create_dir_all(&state.config.upload_root).await?;
    let mut scratch = ScratchFiles(Vec::new());
    let original_path = Path::new(&state.config.upload_root)
        .join(format!("{}-{}-{}{}", Uuid::new_v4(), body.mentor, body.question, video_ext));
    tokio::fs::write(&original_path, &video_bytes).await?;
    scratch.0.push(original_path.clone());

    // Step 3: probe duration, reject if < 1000ms.
    let duration_secs = mentorup_media::probe_duration(&original_path).await?;
    if duration_secs * 1000.0 < 1000.0 {
        return Err(ApiError::Validation("video duration must be at least 1000ms".into()));
    }

    // Step 4: optional ingestion-time trim.
    let mut current_path = original_path.clone();
    if let Some(trim) = &body.trim {
        let trimmed_path = Path::new(&state.config.upload_root)
            .join(format!("{}-trim.mp4", Uuid::new_v4()));
        mentorup_media::trim(&current_path, &trimmed_path, trim.start, trim.end).await?;
        scratch.0.push(trimmed_path.clone());
        current_path = trimmed_path;
    }

    // Step 5: atomic replace.
    let keys = state.layout.all_answer_keys(&body.mentor, &body.question);
    state.storage.delete_many(&keys).await?;
    let original_key = state.layout.answer_key(&body.mentor, &body.question, AnswerArtifact::Original);
    state
        .storage
        .put(&original_key, &current_path, AnswerArtifact::Original.content_type())
        .await?;

    // Step 6: mint task ids.
    let trim_upload_entry = body.trim.as_ref().map(|_| {
        let mut entry = TaskEntry::new(TaskName::TrimUpload, Uuid::new_v4().to_string());
        entry.status = TaskStatus::Done; // ran synchronously above
        entry
    });
    let transcode_web_entry = TaskEntry::new(TaskName::TranscodingWeb, Uuid::new_v4().to_string());
    let transcode_mobile_entry = TaskEntry::new(TaskName::TranscodingMobile, Uuid::new_v4().to_string());
    let transcribe_entry = (!body.has_edited_transcript)
        .then(|| TaskEntry::new(TaskName::Transcribing, Uuid::new_v4().to_string()));

    let mut task_list = vec![transcode_web_entry.clone(), transcode_mobile_entry.clone()];
    if let Some(entry) = &transcribe_entry {
        task_list.push(entry.clone());
    }
    if let Some(entry) = &trim_upload_entry {
        task_list.push(entry.clone());
    }

    // Step 7: reset transcript, install the original media entry, install the task list.
    let original_media = AnswerMedia::new(MediaType::Video, MediaTag::Original, state.layout.public_url(&original_key));
    let answer_patch = AnswerPatch::default().transcript("").media(vec![original_media]);
    state
        .metadata
        .upload_task_create(&body.mentor, &body.question, answer_patch, task_list)
        .await?;

    // Step 8: fan-out publish.
    let job_message = JobMessage {
        mentor: body.mentor.clone(),
        question: body.question.clone(),
        video: original_key,
        transcode_web_task: task_ref(&transcode_web_entry),
        transcode_mobile_task: task_ref(&transcode_mobile_entry),
        transcribe_task: transcribe_entry.as_ref().map(task_ref),
        trim_upload_task: trim_upload_entry.as_ref().map(task_ref),
        trim: None,
    };
    state.bus.publish(&job_message).await?;

    // Step 9: respond.
    let status_url = state.config.status_url(
        &url_root(&headers),
        &format!("upload/answer/status/{}/{}", body.mentor, body.question),
    );
    Ok(ok(UploadAnswerResponse {
        transcode_web_task: job_message.transcode_web_task,
        transcode_mobile_task: job_message.transcode_mobile_task,
        transcribe_task: job_message.transcribe_task,
        trim_upload_task: job_message.trim_upload_task,
        status_url,
    }))
}

#[derive(Debug, Deserialize)]
pub struct TrimExistingUploadRequest {
    pub mentor: String,
    pub question: String,
    pub trim: TrimBody,
}

#[derive(Serialize)]
pub struct TrimExistingUploadResponse {
    #[serde(rename = "taskList")]
    task_list: Vec<TaskRef>,
    #[serde(rename = "statusUrl")]
    status_url: String,
}

/// `POST /upload/answer/trim_existing_upload` (spec §6, §4.5 `trim-upload`).
pub async fn trim_existing_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<TrimExistingUploadRequest>,
) -> ApiResult<Json<DataEnvelope<TrimExistingUploadResponse>>> {
    validate_identifier("mentor", &req.mentor)?;
    validate_identifier("question", &req.question)?;
    validate_trim(req.trim.start, req.trim.end)?;
    require_edit_mentor(&headers, &state.config.jwt_secret, &req.mentor)?;

    if state.metadata.is_upload_in_progress(&req.mentor, &req.question).await? {
        return Err(ApiError::Conflict("upload already in progress".into()));
    }

    let trim_entry = TaskEntry::new(TaskName::TrimUpload, Uuid::new_v4().to_string());
    let answer_patch = AnswerPatch::default();
    state
        .metadata
        .upload_task_create(&req.mentor, &req.question, answer_patch, vec![trim_entry.clone()])
        .await?;

    let original_key = state.layout.answer_key(&req.mentor, &req.question, AnswerArtifact::Original);
    // `transcode_web_task`/`transcode_mobile_task` are inert terminal
    // placeholders here: this request doesn't re-derive those artifacts, it
    // only asks `trim-upload` to re-cut the ones already stored.
    let placeholder = |name: TaskName| TaskRef {
        task_id: Uuid::new_v4().to_string(),
        task_name: name,
        status: TaskStatus::Done,
    };
    let job_message = JobMessage {
        mentor: req.mentor.clone(),
        question: req.question.clone(),
        video: original_key,
        transcode_web_task: placeholder(TaskName::TranscodingWeb),
        transcode_mobile_task: placeholder(TaskName::TranscodingMobile),
        transcribe_task: None,
        trim_upload_task: Some(task_ref(&trim_entry)),
        trim: Some(TrimRange { start: req.trim.start, end: req.trim.end }),
    };
    state.bus.publish(&job_message).await?;

    let status_url = state.config.status_url(
        &url_root(&headers),
        &format!("upload/answer/status/{}/{}", req.mentor, req.question),
    );
    Ok(ok(TrimExistingUploadResponse {
        task_list: vec![task_ref(&trim_entry)],
        status_url,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RegenVttRequest {
    pub mentor: String,
    pub question: String,
}

#[derive(Serialize)]
pub struct RegenVttResponse {
    regen_vtt: bool,
}

/// `POST /upload/answer/regen_vtt` (spec §6, S7). Re-synthesizes `en.vtt`
/// from the Answer's current transcript and the stored `web.mp4`'s duration,
/// without touching the transcript itself or re-running transcription.
pub async fn regen_vtt(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegenVttRequest>,
) -> ApiResult<Json<DataEnvelope<RegenVttResponse>>> {
    validate_identifier("mentor", &req.mentor)?;
    validate_identifier("question", &req.question)?;
    require_edit_mentor(&headers, &state.config.jwt_secret, &req.mentor)?;

    let (transcript, _media, _has_edited_transcript) = state
        .metadata
        .fetch_answer_transcript_and_media(&req.mentor, &req.question)
        .await?;

    let web_key = state.layout.answer_key(&req.mentor, &req.question, AnswerArtifact::Web);
    let scratch_dir = tempfile::Builder::new()
        .prefix("regen-vtt-")
        .tempdir_in(&state.config.upload_root)?;
    let web_path = scratch_dir.path().join("web.mp4");
    state.storage.get(&web_key, &web_path).await?;

    let vtt_path = scratch_dir.path().join("en.vtt");
    mentorup_media::transcript_to_vtt(&web_path, &vtt_path, &transcript).await?;

    let vtt_key = state.layout.answer_key(&req.mentor, &req.question, AnswerArtifact::Vtt);
    state.storage.put(&vtt_key, &vtt_path, AnswerArtifact::Vtt.content_type()).await?;

    let media = AnswerMedia::new(MediaType::Subtitles, MediaTag::En, state.layout.public_url(&vtt_key));
    state
        .metadata
        .media_update(&req.mentor, &req.question, vec![media])
        .await?;

    Ok(ok(RegenVttResponse { regen_vtt: true }))
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub mentor: String,
    pub question: String,
    pub task_ids_to_cancel: Vec<String>,
}

#[derive(Serialize)]
pub struct CancelResponse {
    id: String,
    #[serde(rename = "cancelledIds")]
    cancelled_ids: Vec<String>,
}

/// `POST /upload/answer/cancel` (spec §4.6, S5): flips each listed TaskEntry
/// to `CANCELLING` if its current status permits the transition; entries
/// already terminal, or that don't exist, are silently skipped.
pub async fn cancel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CancelRequest>,
) -> ApiResult<Json<DataEnvelope<CancelResponse>>> {
    validate_identifier("mentor", &req.mentor)?;
    validate_identifier("question", &req.question)?;
    require_edit_mentor(&headers, &state.config.jwt_secret, &req.mentor)?;

    let task = state
        .metadata
        .fetch_task(&req.mentor, &req.question)
        .await?
        .ok_or_else(|| ApiError::Validation("no upload in progress for this answer".into()))?;

    let mut cancelled_ids = Vec::new();
    for task_id in &req.task_ids_to_cancel {
        let Some(entry) = task.entry(task_id) else { continue };
        if !entry.status.can_transition_to(TaskStatus::Cancelling) {
            continue;
        }
        state
            .metadata
            .upload_task_status_update(
                &req.mentor,
                &req.question,
                TaskPatch::new(task_id).status(TaskStatus::Cancelling),
            )
            .await?;
        cancelled_ids.push(task_id.clone());
    }

    Ok(ok(CancelResponse { id: Uuid::new_v4().to_string(), cancelled_ids }))
}
