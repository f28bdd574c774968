//! Shared stage-worker shell (spec §4.5):
//!
//! ```text
//! fetch current UploadTask
//! if my TaskEntry.status starts with "CANCEL": ack and exit
//! upload_task_status_update(my_task_id, IN_PROGRESS)
//! download original.mp4 to a scoped temp dir
//! <do the work>
//! upload_task_status_update(my_task_id, DONE, media?)
//! on any exception: upload_task_status_update(my_task_id, FAILED); re-raise
//! on all exit paths: scoped delete of temp dir
//! ```
//!
//! Grounded on `original_source/state-machine/answer-transcode-web.py`'s
//! common shape, shared across all four stages in that file and its
//! siblings (`answer-transcode-mobile.py`, `answer-transcribe.py`,
//! `trim.py`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mentorup_bus::JobBus;
use mentorup_metadata::MetadataClient;
use mentorup_models::{AnswerMedia, JobMessage, TaskName, TaskPatch, TaskStatus};
use mentorup_storage::operations::{AnswerArtifact, StorageLayout};
use mentorup_storage::S3Client;
use mentorup_transcribe::TranscribeClient;
use tracing::warn;

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::logging::TaskLogger;

/// Process-wide handles shared by every stage loop (spec §9 "Global clients").
#[derive(Clone)]
pub struct WorkerContext {
    pub metadata: Arc<MetadataClient>,
    pub storage: Arc<S3Client>,
    pub transcribe: Arc<TranscribeClient>,
    pub bus: Arc<JobBus>,
    pub layout: Arc<StorageLayout>,
    pub config: WorkerConfig,
    /// Plain HTTP client used only by the transfer worker to fetch media from
    /// externally-hosted URLs ahead of re-upload (spec §4.7).
    pub http: Arc<reqwest::Client>,
}

/// A scoped working directory, removed on drop regardless of the exit path
/// (spec §5 "Resource lifecycle", §9 "Scoped resources").
pub struct ScopedWorkDir {
    dir: tempfile::TempDir,
}

impl ScopedWorkDir {
    pub fn new(root: &str, task_id: &str) -> std::io::Result<Self> {
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("{task_id}-"))
            .tempdir_in(root)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// Returns `true` iff the caller should proceed with IN_PROGRESS work;
/// `false` means the entry is already `CANCELLING`/`CANCELLED` and the
/// caller must ack and return without doing any work.
pub async fn should_proceed(
    metadata: &MetadataClient,
    mentor: &str,
    question: &str,
    task_id: &str,
) -> WorkerResult<bool> {
    let Some(task) = metadata.fetch_task(mentor, question).await? else {
        warn!(mentor, question, task_id, "no UploadTask document found, proceeding anyway");
        return Ok(true);
    };
    match task.entry(task_id) {
        Some(entry) => Ok(!entry.status.is_cancelling_or_cancelled()),
        None => {
            warn!(mentor, question, task_id, "task_id absent from UploadTask, proceeding anyway");
            Ok(true)
        }
    }
}

/// Marks `task_id` `IN_PROGRESS`.
pub async fn mark_in_progress(metadata: &MetadataClient, mentor: &str, question: &str, task_id: &str) -> WorkerResult<()> {
    metadata
        .upload_task_status_update(mentor, question, TaskPatch::new(task_id).status(TaskStatus::InProgress))
        .await?;
    Ok(())
}

/// Marks `task_id` `FAILED`. Never itself returns an error to the caller:
/// a failure to report failure must not mask the original error.
pub async fn mark_failed(metadata: &MetadataClient, mentor: &str, question: &str, task_id: &str) {
    if let Err(e) = metadata
        .upload_task_status_update(mentor, question, TaskPatch::new(task_id).status(TaskStatus::Failed))
        .await
    {
        warn!(mentor, question, task_id, error = %e, "failed to report FAILED status");
    }
}

/// Downloads `videos/{mentor}/{question}/original.mp4` into `dest`.
pub async fn download_original(
    storage: &S3Client,
    layout: &StorageLayout,
    mentor: &str,
    question: &str,
    dest: &Path,
) -> WorkerResult<()> {
    let key = layout.answer_key(mentor, question, AnswerArtifact::Original);
    storage.get(&key, dest).await?;
    Ok(())
}

/// Runs `work` through the common shell for `stage`'s `TaskRef` on `msg`, if
/// present. Returns `Ok(())` whether or not the stage had work to do; stage
/// failures are reported to the metadata service and returned as `Err` so
/// the caller's consumer loop can log/ack per spec §7's propagation policy
/// (retry/DLQ is left to the host runtime).
pub async fn run_stage<F, Fut>(ctx: &WorkerContext, stage: TaskName, msg: &JobMessage, work: F) -> WorkerResult<()>
where
    F: FnOnce(PathBuf, PathBuf) -> Fut,
    Fut: std::future::Future<Output = WorkerResult<Option<Vec<AnswerMedia>>>>,
{
    let Some(task_ref) = msg.task_for_stage(stage) else {
        return Ok(());
    };
    let task_id = task_ref.task_id.clone();
    let logger = TaskLogger::new(&task_id, stage.as_str());
    let _span = logger.create_span().entered();

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

    let original_path = work_dir.join("original.mp4");
    let result = async {
        download_original(&ctx.storage, &ctx.layout, &msg.mentor, &msg.question, &original_path).await?;
        work(work_dir.path().to_path_buf(), original_path.clone()).await
    }
    .await;

    match result {
        Ok(media) => {
            logger.log_completion("marking DONE");
            let mut patch = TaskPatch::new(&task_id).status(TaskStatus::Done);
            if let Some(media) = media {
                patch = patch.media(media);
            }
            ctx.metadata
                .upload_task_status_update(&msg.mentor, &msg.question, patch)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_work_dir_is_removed_on_drop() {
        let root = std::env::temp_dir().join(format!("mentorup-worker-test-{}", std::process::id()));
        let dir_path = {
            let dir = ScopedWorkDir::new(root.to_str().unwrap(), "task-1").unwrap();
            let path = dir.path().to_path_buf();
            assert!(path.exists());
            path
        };
        assert!(!dir_path.exists());
        let _ = std::fs::remove_dir_all(&root);
    }
}
