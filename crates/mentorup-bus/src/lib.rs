//! Fan-out message bus over Redis Streams (spec §4.4, §6).
//!
//! One job stream, one consumer group per stage worker: every stage sees
//! every published `JobMessage` and filters by presence of its own task.

pub mod error;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use queue::{
    JobBus, QueueConfig, MENTOR_IMPORT_STREAM, TRANSFER_GROUP, TRANSFER_STREAM,
};
