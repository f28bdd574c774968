//! C7 mentor-import background worker (spec §4.7).
//!
//! Consumes `MentorImportJobMessage` from its own single-consumer stream and
//! drives the full `ImportTask` lifecycle: create the aggregate, apply the
//! GraphQL-side import, then transfer each pending answer's media into owned
//! storage, recording a per-question sub-status throughout so a caller can
//! poll progress and see exactly which answers failed.
//!
//! Grounded on `original_source/state-machine/mentor-import.py`.

use mentorup_models::{AnswerMigrationEntry, ImportStageStatus, MentorImportJobMessage};
use tracing::{info, warn};

use crate::error::WorkerResult;
use crate::stage::WorkerContext;
use crate::transfer::transfer_one;

pub async fn run(ctx: &WorkerContext, msg: &MentorImportJobMessage) -> WorkerResult<()> {
    let mut task = ctx.metadata.import_task_create(&msg.mentor).await?;

    task.graphql_update = ImportStageStatus::InProgress;
    ctx.metadata.import_task_update(&task).await?;

    let pending = match ctx
        .metadata
        .mentor_import(
            &msg.mentor,
            msg.mentor_export_json.clone(),
            msg.replaced_mentor_data_changes.clone(),
        )
        .await
    {
        Ok(pending) => pending,
        Err(e) => {
            task.graphql_update = ImportStageStatus::Failed;
            ctx.metadata.import_task_update(&task).await.ok();
            return Err(e.into());
        }
    };

    task.graphql_update = ImportStageStatus::Done;
    task.per_answer = pending
        .iter()
        .map(|p| AnswerMigrationEntry::queued(p.question_id.clone()))
        .collect();
    task.s3_video_migration = ImportStageStatus::InProgress;
    ctx.metadata.import_task_update(&task).await?;

    let mut any_failed = false;
    for answer in &pending {
        let mut transferred = Vec::with_capacity(answer.media.len());
        let mut failure = None;
        for entry in &answer.media {
            match transfer_one(ctx, &msg.mentor, &answer.question_id, entry).await {
                Ok(media) => transferred.push(media),
                Err(e) => {
                    failure = Some(e.to_string());
                    break;
                }
            }
        }

        let question_entry = task
            .per_answer
            .iter_mut()
            .find(|e| e.question_id == answer.question_id)
            .expect("per_answer was just populated from the same pending list");

        match failure {
            None => {
                if !transferred.is_empty() {
                    ctx.metadata
                        .media_update(&msg.mentor, &answer.question_id, transferred)
                        .await?;
                }
                question_entry.status = ImportStageStatus::Done;
                info!(mentor = %msg.mentor, question = %answer.question_id, "answer migration done");
            }
            Some(err) => {
                any_failed = true;
                question_entry.status = ImportStageStatus::Failed;
                question_entry.error_message = Some(err.clone());
                warn!(mentor = %msg.mentor, question = %answer.question_id, error = %err, "answer migration failed");
            }
        }

        ctx.metadata.import_task_update(&task).await?;
    }

    task.s3_video_migration = if any_failed {
        ImportStageStatus::Failed
    } else {
        ImportStageStatus::Done
    };
    ctx.metadata.import_task_update(&task).await?;

    Ok(())
}
