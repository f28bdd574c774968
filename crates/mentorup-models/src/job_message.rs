//! The fan-out payload published to the message bus (spec §6).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::task::{TaskName, TaskStatus};

/// A task reference as carried inside a `JobMessage`; mirrors one `TaskEntry`
/// at the moment the dispatcher minted it (always `QUEUED`, except
/// `trim-upload` when it stands in for the ingestion-time trim, which the
/// dispatcher marks `DONE` immediately since it ran synchronously).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TaskRef {
    pub task_id: String,
    pub task_name: TaskName,
    pub status: TaskStatus,
}

/// Closed interval in seconds a `trim-upload` task should cut an existing
/// answer's media down to. Absent for ingestion-time trim, where the
/// dispatcher already performed the cut synchronously before publishing and
/// the `trimUploadTask` entry travels only as a record, pre-marked `DONE`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrimRange {
    pub start: f64,
    pub end: f64,
}

/// Published once per ingestion, addressed to all four stage workers; each
/// worker filters by presence of its own task field (spec §4.4 step 8, §6).
/// Also reused by `POST /upload/answer/trim_existing_upload` to address the
/// `trim-upload` worker alone, with `trim` carrying the cut bounds and
/// `transcode_web_task`/`transcode_mobile_task` set to that stage's own
/// already-terminal entries (those two artifacts aren't re-derived by this
/// request, so their refs are inert placeholders the worker never looks up).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobMessage {
    pub mentor: String,
    pub question: String,
    /// Object store key of the (possibly already-trimmed) original video.
    pub video: String,
    pub transcode_web_task: TaskRef,
    pub transcode_mobile_task: TaskRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcribe_task: Option<TaskRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim_upload_task: Option<TaskRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim: Option<TrimRange>,
}

/// Stage names a worker process consumes from; also the consumer group name
/// in `mentorup-bus`.
impl JobMessage {
    pub fn task_for_stage(&self, stage: TaskName) -> Option<&TaskRef> {
        match stage {
            TaskName::TranscodingWeb => Some(&self.transcode_web_task),
            TaskName::TranscodingMobile => Some(&self.transcode_mobile_task),
            TaskName::Transcribing => self.transcribe_task.as_ref(),
            TaskName::TrimUpload => self.trim_upload_task.as_ref(),
            TaskName::Finalization => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_for_stage_respects_optional_tasks() {
        let msg = JobMessage {
            mentor: "m1".into(),
            question: "q1".into(),
            video: "videos/m1/q1/original.mp4".into(),
            transcode_web_task: TaskRef {
                task_id: "w".into(),
                task_name: TaskName::TranscodingWeb,
                status: TaskStatus::Queued,
            },
            transcode_mobile_task: TaskRef {
                task_id: "mo".into(),
                task_name: TaskName::TranscodingMobile,
                status: TaskStatus::Queued,
            },
            transcribe_task: None,
            trim_upload_task: None,
            trim: None,
        };
        assert!(msg.task_for_stage(TaskName::TranscodingWeb).is_some());
        assert!(msg.task_for_stage(TaskName::Transcribing).is_none());
    }
}
