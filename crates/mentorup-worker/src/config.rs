//! Worker configuration (spec §6 environment inputs, §10.3).

use std::time::Duration;

/// Worker process configuration, sourced from `TRANSCODE_*`/`WORKER_*` env vars.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Scratch root each stage invocation scopes a temp dir under (spec §5
    /// "Resource lifecycle"; `TRANSCODE_WORK_DIR`).
    pub work_dir: String,
    /// How long a single `XREADGROUP` blocks waiting for new messages.
    pub poll_block: Duration,
    /// Max messages read per poll, per consumer group.
    pub batch_size: usize,
    /// Graceful shutdown grace period once a ctrl_c/SIGTERM is observed.
    pub shutdown_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: "/tmp/mentorup-worker".to_string(),
            poll_block: Duration::from_millis(5000),
            batch_size: 10,
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("TRANSCODE_WORK_DIR")
                .unwrap_or_else(|_| "/tmp/mentorup-worker".to_string()),
            poll_block: Duration::from_millis(
                std::env::var("WORKER_POLL_BLOCK_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5000),
            ),
            batch_size: std::env::var("WORKER_BATCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            shutdown_timeout: Duration::from_secs(
                std::env::var("WORKER_SHUTDOWN_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }
}
