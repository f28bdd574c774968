//! `transcribing` stage (spec §4.5).
//!
//! Grounded on `original_source/state-machine/answer-transcribe.py`: the
//! `"_IDLE_"` question short-circuits straight to DONE with an empty
//! transcript; otherwise extract the answer's audio, submit it for
//! transcription requesting subtitles, and commit transcript + VTT media in
//! one combined Answer/Task update.
//!
//! This stage doesn't fit the plain `run_stage` media-only return shape since
//! it also patches the Answer's `transcript`/`has_edited_transcript`, so it
//! drives the shared shell helpers directly instead of going through
//! `run_stage`.

use mentorup_models::{
    AnswerMedia, AnswerPatch, JobMessage, MediaTag, MediaType, TaskName, TaskPatch, TaskStatus,
    IDLE_QUESTION_NAME,
};
use mentorup_storage::operations::AnswerArtifact;

use crate::error::WorkerResult;
use crate::logging::TaskLogger;
use crate::stage::{download_original, mark_failed, mark_in_progress, should_proceed, ScopedWorkDir, WorkerContext};

pub async fn run(ctx: &WorkerContext, msg: &JobMessage) -> WorkerResult<()> {
    let Some(task_ref) = msg.task_for_stage(TaskName::Transcribing) else {
        return Ok(());
    };
    let task_id = task_ref.task_id.clone();
    let logger = TaskLogger::new(&task_id, TaskName::Transcribing.as_str());
    let _span = logger.create_span().entered();

    if !should_proceed(&ctx.metadata, &msg.mentor, &msg.question, &task_id).await? {
        logger.log_progress("observed CANCELLING, skipping work");
        return Ok(());
    }

    logger.log_start("marking IN_PROGRESS");
    mark_in_progress(&ctx.metadata, &msg.mentor, &msg.question, &task_id).await?;

    let question_name = match ctx.metadata.fetch_question_name(&msg.question).await {
        Ok(name) => name,
        Err(e) => {
            logger.log_error(&e.to_string());
            mark_failed(&ctx.metadata, &msg.mentor, &msg.question, &task_id).await;
            return Err(e.into());
        }
    };

    if question_name == IDLE_QUESTION_NAME {
        logger.log_progress("idle question, finalizing with an empty transcript");
        let answer_patch = AnswerPatch::default().transcript("").has_edited_transcript(false);
        let task_patch = TaskPatch::new(&task_id).status(TaskStatus::Done);
        ctx.metadata
            .upload_answer_and_task_update(&msg.mentor, &msg.question, answer_patch, task_patch)
            .await?;
        return Ok(());
    }

    let work_dir = match ScopedWorkDir::new(&ctx.config.work_dir, &task_id) {
        Ok(d) => d,
        Err(e) => {
            mark_failed(&ctx.metadata, &msg.mentor, &msg.question, &task_id).await;
            return Err(e.into());
        }
    };

    let original_path = work_dir.join("original.mp4");
    let result: WorkerResult<(String, Option<AnswerMedia>)> = async {
        download_original(&ctx.storage, &ctx.layout, &msg.mentor, &msg.question, &original_path).await?;

        let audio_path = work_dir.join("audio.mp3");
        mentorup_media::extract_audio(&original_path, Some(&audio_path)).await?;

        let job = ctx.transcribe.transcribe(&audio_path).await?;

        let vtt_media = if job.subtitles.is_empty() {
            None
        } else {
            let vtt_path = work_dir.join("en.vtt");
            tokio::fs::write(&vtt_path, &job.subtitles).await?;
            let key = ctx.layout.answer_key(&msg.mentor, &msg.question, AnswerArtifact::Vtt);
            ctx.storage.put(&key, &vtt_path, AnswerArtifact::Vtt.content_type()).await?;
            Some(AnswerMedia::new(MediaType::Subtitles, MediaTag::En, ctx.layout.public_url(&key)))
        };

        Ok((job.transcript, vtt_media))
    }
    .await;

    match result {
        Ok((transcript, vtt_media)) => {
            logger.log_completion("marking DONE");
            let mut answer_patch = AnswerPatch::default()
                .transcript(transcript)
                .has_edited_transcript(false);
            if let Some(media) = vtt_media {
                answer_patch = answer_patch.media(vec![media]);
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
