//! Concrete patch variants replacing the source's "dynamic status dict" (spec §9).
//!
//! Each patch carries only the fields it means to set; the metadata adapter
//! serializes them with undefined fields omitted (`skip_serializing_if`).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::answer::AnswerMedia;
use crate::task::TaskStatus;

/// Partial update to an `Answer` row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnswerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_edited_transcript: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<AnswerMedia>>,
}

impl AnswerPatch {
    pub fn transcript(mut self, transcript: impl Into<String>) -> Self {
        self.transcript = Some(transcript.into());
        self
    }

    pub fn has_edited_transcript(mut self, value: bool) -> Self {
        self.has_edited_transcript = Some(value);
        self
    }

    pub fn media(mut self, media: Vec<AnswerMedia>) -> Self {
        self.media = Some(media);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_none() && self.has_edited_transcript.is_none() && self.media.is_none()
    }
}

/// Partial update to exactly one `TaskEntry`, identified by `task_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TaskPatch {
    pub task_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<AnswerMedia>>,
}

impl TaskPatch {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: None,
            transcript: None,
            media: None,
        }
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn transcript(mut self, transcript: impl Into<String>) -> Self {
        self.transcript = Some(transcript.into());
        self
    }

    pub fn media(mut self, media: Vec<AnswerMedia>) -> Self {
        self.media = Some(media);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_omits_unset_fields_when_serialized() {
        let patch = TaskPatch::new("t1").status(TaskStatus::Done);
        let json = serde_json::to_value(&patch).unwrap();
        assert!(json.get("transcript").is_none());
        assert!(json.get("media").is_none());
        assert_eq!(json["status"], "DONE");
    }
}
