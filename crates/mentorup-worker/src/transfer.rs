//! C7 answer-transfer background worker (spec §4.7).
//!
//! Consumes `TransferJobMessage` from its own single-consumer stream: for one
//! `(mentor, question)`, downloads every `needs_transfer` media entry from
//! its current (often externally-hosted) URL and re-uploads it under the
//! canonical object key, then clears `needs_transfer` and points `url` at the
//! owned copy.
//!
//! Grounded on `original_source/state-machine/answer-transfer.py`. Also used
//! by `mentor_import`, which drives the same per-media transfer for each
//! answer a bulk import reports as pending (spec §4.7 "mentor import").

use mentorup_models::{AnswerMedia, MediaTag, TransferJobMessage};
use mentorup_storage::operations::AnswerArtifact;
use tracing::info;

use crate::error::{WorkerError, WorkerResult};
use crate::stage::WorkerContext;

fn artifact_for_tag(tag: MediaTag) -> AnswerArtifact {
    match tag {
        MediaTag::Original => AnswerArtifact::Original,
        MediaTag::Web => AnswerArtifact::Web,
        MediaTag::Mobile => AnswerArtifact::Mobile,
        MediaTag::En => AnswerArtifact::Vtt,
    }
}

/// Downloads `entry`'s current URL and re-uploads it under `(mentor,
/// question)`'s canonical key for its role, returning the media entry with
/// `needs_transfer` cleared and `url` pointed at the owned copy.
pub async fn transfer_one(
    ctx: &WorkerContext,
    mentor: &str,
    question: &str,
    entry: &AnswerMedia,
) -> WorkerResult<AnswerMedia> {
    let artifact = artifact_for_tag(entry.tag);
    let key = ctx.layout.answer_key(mentor, question, artifact);

    let response = ctx
        .http
        .get(&entry.url)
        .send()
        .await
        .map_err(|e| WorkerError::internal(format!("fetching {}: {e}", entry.url)))?
        .error_for_status()
        .map_err(|e| WorkerError::internal(format!("fetching {}: {e}", entry.url)))?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| WorkerError::internal(format!("reading body of {}: {e}", entry.url)))?;

    ctx.storage.put_bytes(&key, bytes.to_vec(), artifact.content_type()).await?;

    let mut media = AnswerMedia::new(entry.media_type, entry.tag, ctx.layout.public_url(&key));
    media.needs_transfer = false;
    Ok(media)
}

pub async fn run(ctx: &WorkerContext, msg: &TransferJobMessage) -> WorkerResult<()> {
    let (_transcript, media, _has_edited_transcript) = ctx
        .metadata
        .fetch_answer_transcript_and_media(&msg.mentor, &msg.question)
        .await?;

    let mut transferred = Vec::new();
    for entry in media.iter().filter(|m| m.needs_transfer) {
        transferred.push(transfer_one(ctx, &msg.mentor, &msg.question, entry).await?);
    }

    if transferred.is_empty() {
        info!(mentor = %msg.mentor, question = %msg.question, "no media needed transfer");
        return Ok(());
    }

    ctx.metadata
        .media_update(&msg.mentor, &msg.question, transferred)
        .await?;
    Ok(())
}
