//! `transcode-mobile` stage (spec §4.5), symmetric to `transcode-web`.
//!
//! Grounded on `original_source/state-machine/answer-transcode-mobile.py`.

use std::path::PathBuf;

use mentorup_models::{AnswerMedia, JobMessage, MediaTag, MediaType, TaskName};
use mentorup_storage::operations::AnswerArtifact;

use crate::error::WorkerResult;
use crate::stage::{run_stage, WorkerContext};

pub async fn run(ctx: &WorkerContext, msg: &JobMessage) -> WorkerResult<()> {
    let layout = ctx.layout.clone();
    let storage = ctx.storage.clone();
    let mentor = msg.mentor.clone();
    let question = msg.question.clone();

    run_stage(ctx, TaskName::TranscodingMobile, msg, move |work_dir, original| async move {
        let dst: PathBuf = work_dir.join("mobile.mp4");
        mentorup_media::encode_mobile(&original, &dst).await?;

        let key = layout.answer_key(&mentor, &question, AnswerArtifact::Mobile);
        storage.put(&key, &dst, AnswerArtifact::Mobile.content_type()).await?;

        Ok(Some(vec![AnswerMedia::new(
            MediaType::Video,
            MediaTag::Mobile,
            layout.public_url(&key),
        )]))
    })
    .await
}
