//! Shared data models for the mentor-upload pipeline.
//!
//! This crate provides serde-serializable types for:
//! - `Answer` / `AnswerMedia`, the metadata entity and its tagged artifacts
//! - `UploadTask` / `TaskEntry`, the per-answer stage-progress record and its
//!   status state machine
//! - `AnswerPatch` / `TaskPatch`, concrete patch variants (spec §9)
//! - `ImportTask`, the bulk mentor-transfer aggregate
//! - `JobMessage`, the fan-out payload published to the message bus
//! - `TransferJobMessage` / `MentorImportJobMessage`, the C7 trigger payloads

pub mod answer;
pub mod import_task;
pub mod job_message;
pub mod patch;
pub mod task;
pub mod transfer;

pub use answer::{Answer, AnswerMedia, MediaTag, MediaType, IDLE_QUESTION_NAME};
pub use import_task::{AnswerMigrationEntry, ImportStageStatus, ImportTask};
pub use job_message::{JobMessage, TaskRef, TrimRange};
pub use patch::{AnswerPatch, TaskPatch};
pub use task::{TaskEntry, TaskName, TaskStatus, UploadTask};
pub use transfer::{MentorImportJobMessage, PendingAnswerTransfer, TransferJobMessage};
