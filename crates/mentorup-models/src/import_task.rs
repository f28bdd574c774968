//! `ImportTask` — aggregate for bulk mentor transfer (spec §3, §4.7).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStageStatus {
    Queued,
    InProgress,
    Done,
    Failed,
}

/// Per-answer entry of the `s3_video_migration` sub-status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnswerMigrationEntry {
    pub question_id: String,
    pub status: ImportStageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AnswerMigrationEntry {
    pub fn queued(question_id: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            status: ImportStageStatus::Queued,
            error_message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ImportTask {
    pub mentor_id: String,
    pub graphql_update: ImportStageStatus,
    pub s3_video_migration: ImportStageStatus,
    #[serde(default)]
    pub per_answer: Vec<AnswerMigrationEntry>,
}

impl ImportTask {
    /// Initial state created at the start of `mentor_import` (spec §4.7).
    pub fn new(mentor_id: impl Into<String>) -> Self {
        Self {
            mentor_id: mentor_id.into(),
            graphql_update: ImportStageStatus::Queued,
            s3_video_migration: ImportStageStatus::Queued,
            per_answer: Vec::new(),
        }
    }
}
