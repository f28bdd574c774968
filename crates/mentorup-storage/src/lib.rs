//! S3-compatible object store client (spec §4.2).
//!
//! This crate provides:
//! - A narrow `put`/`get`/`delete_many`/`list` façade over the object store
//! - The deterministic answer/thumbnail key layout (`StorageLayout`)

pub mod client;
pub mod error;
pub mod operations;

pub use client::{ObjectInfo, S3Client, S3Config};
pub use error::{StorageError, StorageResult};
pub use operations::{
    AnswerArtifact, StorageLayout, CONTENT_TYPE_MP4, CONTENT_TYPE_PNG, CONTENT_TYPE_VTT,
};
