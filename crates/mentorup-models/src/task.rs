//! `UploadTask` / `TaskEntry` and the per-stage status state machine (spec §3, §4.6).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::answer::AnswerMedia;

/// One of the four processing stages plus the terminal `finalization` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum TaskName {
    TrimUpload,
    TranscodingWeb,
    TranscodingMobile,
    Transcribing,
    Finalization,
}

impl TaskName {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskName::TrimUpload => "trim-upload",
            TaskName::TranscodingWeb => "transcoding-web",
            TaskName::TranscodingMobile => "transcoding-mobile",
            TaskName::Transcribing => "transcribing",
            TaskName::Finalization => "finalization",
        }
    }
}

/// Status of one `TaskEntry`. See spec §4.6 for the legal transition diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Queued,
    InProgress,
    Done,
    Failed,
    Cancelling,
    Cancelled,
}

impl TaskStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Failed | TaskStatus::Cancelled)
    }

    /// `true` for the status this spec's "CANCELLING prefix check" looks for.
    pub fn is_cancelling_or_cancelled(&self) -> bool {
        matches!(self, TaskStatus::Cancelling | TaskStatus::Cancelled)
    }

    /// Validate a proposed transition per spec §4.6's state diagram:
    /// `QUEUED -> IN_PROGRESS -> DONE`, `FAILED`/`CANCELLED` are sinks reachable
    /// from any non-terminal state (CANCELLED only by way of CANCELLING).
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (Queued, InProgress) | (Queued, Failed) | (Queued, Cancelling) => true,
            (InProgress, Done) | (InProgress, Failed) | (InProgress, Cancelling) => true,
            (Cancelling, Cancelled) => true,
            _ => false,
        }
    }
}

/// One row of an `UploadTask`'s stage list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TaskEntry {
    pub task_name: TaskName,
    pub task_id: String,
    pub status: TaskStatus,
}

impl TaskEntry {
    pub fn new(task_name: TaskName, task_id: impl Into<String>) -> Self {
        Self {
            task_name,
            task_id: task_id.into(),
            status: TaskStatus::Queued,
        }
    }
}

/// The progress record for one in-flight processing job on an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UploadTask {
    pub mentor_id: String,
    pub question_id: String,
    pub task_list: Vec<TaskEntry>,
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub media: Vec<AnswerMedia>,
}

impl UploadTask {
    /// Admission check used by the dispatcher (spec §4.6):
    /// true iff any entry is in `{QUEUED, IN_PROGRESS}`.
    pub fn is_in_progress(&self) -> bool {
        self.task_list
            .iter()
            .any(|t| matches!(t.status, TaskStatus::Queued | TaskStatus::InProgress))
    }

    pub fn entry(&self, task_id: &str) -> Option<&TaskEntry> {
        self.task_list.iter().find(|t| t.task_id == task_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queued_to_in_progress_to_done_is_legal() {
        assert!(TaskStatus::Queued.can_transition_to(TaskStatus::InProgress));
        assert!(TaskStatus::InProgress.can_transition_to(TaskStatus::Done));
    }

    #[test]
    fn terminal_states_reject_further_transitions() {
        assert!(!TaskStatus::Done.can_transition_to(TaskStatus::Failed));
        assert!(!TaskStatus::Cancelled.can_transition_to(TaskStatus::Queued));
    }

    #[test]
    fn cancelled_only_reachable_via_cancelling() {
        assert!(!TaskStatus::Queued.can_transition_to(TaskStatus::Cancelled));
        assert!(TaskStatus::Queued.can_transition_to(TaskStatus::Cancelling));
        assert!(TaskStatus::Cancelling.can_transition_to(TaskStatus::Cancelled));
    }

    #[test]
    fn is_in_progress_reflects_nonterminal_entries() {
        let mut task = UploadTask {
            mentor_id: "m1".into(),
            question_id: "q1".into(),
            task_list: vec![TaskEntry::new(TaskName::TranscodingWeb, "t1")],
            transcript: String::new(),
            media: vec![],
        };
        assert!(task.is_in_progress());
        task.task_list[0].status = TaskStatus::Done;
        assert!(!task.is_in_progress());
    }
}
