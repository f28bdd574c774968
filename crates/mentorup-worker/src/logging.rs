//! Structured task logging utilities.
//!
//! Provides consistent, structured logging for stage-worker processing with
//! tracing spans and contextual information.

use tracing::{error, info, warn, Span};

/// Task logger for structured logging with consistent formatting.
///
/// Provides a simple interface for logging a stage invocation's lifecycle
/// events with automatic contextual information (task id, stage name).
#[derive(Debug, Clone)]
pub struct TaskLogger {
    task_id: String,
    operation: String,
}

impl TaskLogger {
    /// Create a new task logger for a specific `task_id` and stage name.
    pub fn new(task_id: &str, operation: &str) -> Self {
        Self {
            task_id: task_id.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Log the start of a stage invocation.
    pub fn log_start(&self, message: &str) {
        info!(
            task_id = %self.task_id,
            operation = %self.operation,
            "task started: {}", message
        );
    }

    /// Log a progress update during stage processing.
    pub fn log_progress(&self, message: &str) {
        info!(
            task_id = %self.task_id,
            operation = %self.operation,
            "task progress: {}", message
        );
    }

    /// Log a warning during stage processing.
    pub fn log_warning(&self, message: &str) {
        warn!(
            task_id = %self.task_id,
            operation = %self.operation,
            "task warning: {}", message
        );
    }

    /// Log an error during stage processing.
    pub fn log_error(&self, message: &str) {
        error!(
            task_id = %self.task_id,
            operation = %self.operation,
            "task error: {}", message
        );
    }

    /// Log the completion of a stage invocation.
    pub fn log_completion(&self, message: &str) {
        info!(
            task_id = %self.task_id,
            operation = %self.operation,
            "task completed: {}", message
        );
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Create a tracing span for this task, for scenarios needing more than
    /// one-off log lines (wraps the whole stage invocation).
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "task",
            task_id = %self.task_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logger_exposes_task_id_and_operation() {
        let logger = TaskLogger::new("test-task-123", "transcode-web");
        assert_eq!(logger.task_id(), "test-task-123");
        assert_eq!(logger.operation(), "transcode-web");
    }
}
