#![deny(unreachable_patterns)]
//! Stage-worker and transfer/import orchestrator processes for the
//! mentor-upload pipeline (spec §4.5, §4.7).
//!
//! This crate provides:
//! - The common stage-worker shell (`stage::run_stage`, spec §4.5)
//! - The four independent stage workers (`stages::*`)
//! - The C7 answer-transfer and mentor-import background workers
//! - Worker configuration, error types, and structured task logging

pub mod config;
pub mod error;
pub mod logging;
pub mod mentor_import;
pub mod stage;
pub mod stages;
pub mod transfer;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::TaskLogger;
pub use stage::WorkerContext;
