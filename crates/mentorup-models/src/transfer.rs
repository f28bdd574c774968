//! Trigger payloads for C7's transfer/import background work (spec §4.7).
//!
//! These travel over `mentorup-bus`'s generic `publish_json`/`consume_json`
//! methods rather than the single-`JobMessage` fan-out stream, since they
//! address one background consumer apiece instead of four parallel stages.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Published by `POST /upload/transfer`; asks the transfer worker to copy
/// every `needs_transfer` media entry of one Answer into owned storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferJobMessage {
    pub mentor: String,
    pub question: String,
}

/// Published by `POST /upload/transfer/mentor`; asks the import worker to
/// run the full `mentor_import` lifecycle for one mentor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MentorImportJobMessage {
    pub mentor: String,
    pub mentor_export_json: serde_json::Value,
    pub replaced_mentor_data_changes: serde_json::Value,
}

/// One answer `mentor_import` reports as needing its media transferred into
/// owned storage, grouped by `question_id` (spec §4.7 "enumerate answers
/// needing media transfer into per-question sub-tasks").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingAnswerTransfer {
    pub question_id: String,
    #[serde(default)]
    pub media: Vec<crate::answer::AnswerMedia>,
}
