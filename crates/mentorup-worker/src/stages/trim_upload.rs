//! `trim-upload` stage (spec §4.5), existing-answer trim.
//!
//! Grounded on `original_source/state-machine/trim.py`. Distinct from the
//! dispatcher's ingestion-time trim (which runs synchronously and marks its
//! `trim-upload` `TaskEntry` `DONE` before publishing): here the entry
//! arrives `QUEUED` and `JobMessage::trim` carries the cut bounds. Downloads
//! the existing `web.mp4`/`mobile.mp4`, trims each to `[start, end)`, and
//! re-uploads in place. If a VTT exists and the answer's transcript hasn't
//! been hand-edited, the VTT and transcript are cut by cue timestamps too;
//! otherwise the existing VTT entry is carried through unchanged.

use mentorup_models::{
    AnswerMedia, AnswerPatch, JobMessage, MediaTag, MediaType, TaskName, TaskPatch, TaskStatus,
};
use mentorup_storage::operations::AnswerArtifact;

use crate::error::{WorkerError, WorkerResult};
use crate::logging::TaskLogger;
use crate::stage::{mark_failed, mark_in_progress, should_proceed, ScopedWorkDir, WorkerContext};

pub async fn run(ctx: &WorkerContext, msg: &JobMessage) -> WorkerResult<()> {
    let Some(task_ref) = msg.task_for_stage(TaskName::TrimUpload) else {
        return Ok(());
    };
    if task_ref.status.is_terminal() {
        return Ok(());
    }
    let task_id = task_ref.task_id.clone();
    let logger = TaskLogger::new(&task_id, TaskName::TrimUpload.as_str());
    let _span = logger.create_span().entered();

    let Some(range) = msg.trim else {
        logger.log_error("trim-upload task is QUEUED but the message carries no trim range");
        mark_failed(&ctx.metadata, &msg.mentor, &msg.question, &task_id).await;
        return Err(WorkerError::internal("missing trim range for trim-upload task"));
    };

    if !should_proceed(&ctx.metadata, &msg.mentor, &msg.question, &task_id).await? {
        logger.log_progress("observed CANCELLING, skipping work");
        return Ok(());
    }

    logger.log_start("marking IN_PROGRESS");
    mark_in_progress(&ctx.metadata, &msg.mentor, &msg.question, &task_id).await?;

    let work_dir = match ScopedWorkDir::new(&ctx.config.work_dir, &task_id) {
        Ok(d) => d,
        Err(e) => {
            mark_failed(&ctx.metadata, &msg.mentor, &msg.question, &task_id).await;
            return Err(e.into());
        }
    };

    let result: WorkerResult<(Vec<AnswerMedia>, Option<String>)> = async {
        let (_transcript, media, has_edited_transcript) = ctx
            .metadata
            .fetch_answer_transcript_and_media(&msg.mentor, &msg.question)
            .await?;

        let mut new_media = Vec::new();

        let web_key = ctx.layout.answer_key(&msg.mentor, &msg.question, AnswerArtifact::Web);
        let web_src = work_dir.join("web_src.mp4");
        ctx.storage.get(&web_key, &web_src).await?;
        let web_dst = work_dir.join("web_trimmed.mp4");
        mentorup_media::trim(&web_src, &web_dst, range.start, range.end).await?;
        ctx.storage.put(&web_key, &web_dst, AnswerArtifact::Web.content_type()).await?;
        new_media.push(AnswerMedia::new(MediaType::Video, MediaTag::Web, ctx.layout.public_url(&web_key)));

        let mobile_key = ctx.layout.answer_key(&msg.mentor, &msg.question, AnswerArtifact::Mobile);
        let mobile_src = work_dir.join("mobile_src.mp4");
        ctx.storage.get(&mobile_key, &mobile_src).await?;
        let mobile_dst = work_dir.join("mobile_trimmed.mp4");
        mentorup_media::trim(&mobile_src, &mobile_dst, range.start, range.end).await?;
        ctx.storage.put(&mobile_key, &mobile_dst, AnswerArtifact::Mobile.content_type()).await?;
        new_media.push(AnswerMedia::new(MediaType::Video, MediaTag::Mobile, ctx.layout.public_url(&mobile_key)));

        let mut new_transcript = None;
        let existing_vtt = media
            .iter()
            .find(|m| m.media_type == MediaType::Subtitles && m.tag == MediaTag::En);

        if let Some(existing_vtt) = existing_vtt {
            if has_edited_transcript {
                new_media.push(existing_vtt.clone());
            } else {
                let vtt_key = ctx.layout.answer_key(&msg.mentor, &msg.question, AnswerArtifact::Vtt);
                let vtt_bytes = ctx.storage.get_bytes(&vtt_key).await?;
                let vtt_text = String::from_utf8_lossy(&vtt_bytes).into_owned();
                let (trimmed_vtt, trimmed_transcript) =
                    mentorup_media::trim_vtt_and_transcript(&vtt_text, range.start, range.end);

                let vtt_path = work_dir.join("en.vtt");
                tokio::fs::write(&vtt_path, &trimmed_vtt).await?;
                ctx.storage.put(&vtt_key, &vtt_path, AnswerArtifact::Vtt.content_type()).await?;
                new_media.push(AnswerMedia::new(MediaType::Subtitles, MediaTag::En, ctx.layout.public_url(&vtt_key)));
                new_transcript = Some(trimmed_transcript);
            }
        }

        Ok((new_media, new_transcript))
    }
    .await;

    match result {
        Ok((media, transcript)) => {
            logger.log_completion("marking DONE");
            let mut answer_patch = AnswerPatch::default().media(media);
            if let Some(transcript) = transcript {
                answer_patch = answer_patch.transcript(transcript);
            }
            let task_patch = TaskPatch::new(&task_id).status(TaskStatus::Done);
            ctx.metadata
                .upload_answer_and_task_update(&msg.mentor, &msg.question, answer_patch, task_patch)
                .await?;
            Ok(())
        }
        Err(e) => {
            logger.log_error(&e.to_string());
            mark_failed(&ctx.metadata, &msg.mentor, &msg.question, &task_id).await;
            Err(e)
        }
    }
}
