//! Fan-out message bus over one Redis Stream (spec §4.4 step 8, §6).
//!
//! Every job is a single `XADD` to one shared stream. Each stage worker reads
//! through its OWN consumer group (named after the stage), so every message
//! is delivered to every interested stage — unlike a single shared consumer
//! group, which would round-robin messages across consumers and defeat the
//! fan-out. `init` is idempotent: `XGROUP CREATE ... MKSTREAM` on a group
//! that already exists is treated as success (`BUSYGROUP`).

use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use mentorup_models::JobMessage;

use crate::error::{QueueError, QueueResult};

/// Stream name for `TransferJobMessage` triggers (spec §4.7 answer transfer).
pub const TRANSFER_STREAM: &str = "mentorup:transfer";
/// Stream name for `MentorImportJobMessage` triggers (spec §4.7 mentor import).
pub const MENTOR_IMPORT_STREAM: &str = "mentorup:mentor-import";
/// The single consumer group name used by C7's background workers, each of
/// which owns its own stream and therefore needs no fan-out.
pub const TRANSFER_GROUP: &str = "transfer-worker";

#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub redis_url: String,
    pub stream_name: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            stream_name: "mentorup:jobs".to_string(),
        }
    }
}

impl QueueConfig {
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            stream_name: std::env::var("QUEUE_STREAM")
                .unwrap_or_else(|_| "mentorup:jobs".to_string()),
        }
    }
}

/// Client over the fan-out job stream. One `JobBus` instance is shared by the
/// dispatcher (publishing) and every stage worker (consuming via its own
/// consumer group).
pub struct JobBus {
    client: redis::Client,
    config: QueueConfig,
}

impl JobBus {
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> QueueResult<Self> {
        Self::new(QueueConfig::from_env())
    }

    /// Creates `group` on the job stream if it doesn't already exist.
    /// `group` is conventionally the stage name (e.g. `"transcode-web"`).
    pub async fn init_group(&self, group: &str) -> QueueResult<()> {
        self.init_group_on(&self.config.stream_name, group).await
    }

    /// Publishes one `JobMessage` to the shared stream (spec §4.4 step 8).
    pub async fn publish(&self, message: &JobMessage) -> QueueResult<String> {
        let message_id = self
            .publish_json(&self.config.stream_name, message)
            .await?;
        info!(
            mentor = %message.mentor,
            question = %message.question,
            message_id = %message_id,
            "published job message"
        );
        Ok(message_id)
    }

    /// Reads up to `count` new messages for `group` via `consumer_name`,
    /// blocking up to `block_ms`.
    pub async fn consume(
        &self,
        group: &str,
        consumer_name: &str,
        block_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<(String, JobMessage)>> {
        self.consume_json(&self.config.stream_name, group, consumer_name, block_ms, count)
            .await
    }

    /// Acknowledges `message_id` for `group`. Does NOT delete the stream
    /// entry: other groups reading the same fan-out message may not have
    /// acked it yet.
    pub async fn ack(&self, group: &str, message_id: &str) -> QueueResult<()> {
        self.ack_on(&self.config.stream_name, group, message_id).await
    }

    /// Stream length (shared across all groups).
    pub async fn len(&self) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let len: u64 = conn.xlen(&self.config.stream_name).await?;
        Ok(len)
    }

    /// Creates `group` on an arbitrary `stream` if it doesn't already exist.
    /// Used by C7's single-consumer triggers (`TRANSFER_STREAM`,
    /// `MENTOR_IMPORT_STREAM`), which don't share the fan-out job stream.
    pub async fn init_group_on(&self, stream: &str, group: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let result: Result<(), redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(stream)
            .arg(group)
            .arg("$")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(_) => info!("created consumer group: {} on {}", group, stream),
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!("consumer group already exists: {} on {}", group, stream);
            }
            Err(e) => return Err(QueueError::Redis(e)),
        }

        Ok(())
    }

    /// Publishes any serializable `message` to `stream`, returning its entry id.
    pub async fn publish_json<T: Serialize>(&self, stream: &str, message: &T) -> QueueResult<String> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(message)?;

        let message_id: String = redis::cmd("XADD")
            .arg(stream)
            .arg("*")
            .arg("job")
            .arg(&payload)
            .query_async(&mut conn)
            .await?;

        Ok(message_id)
    }

    /// Reads up to `count` new messages of type `T` for `group` on `stream`
    /// via `consumer_name`, blocking up to `block_ms`. Malformed payloads are
    /// logged and acked so they don't block the group forever (poison-pill).
    pub async fn consume_json<T: DeserializeOwned>(
        &self,
        stream: &str,
        group: &str,
        consumer_name: &str,
        block_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<(String, T)>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let result: redis::streams::StreamReadReply = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(group)
            .arg(consumer_name)
            .arg("COUNT")
            .arg(count)
            .arg("BLOCK")
            .arg(block_ms)
            .arg("STREAMS")
            .arg(stream)
            .arg(">")
            .query_async(&mut conn)
            .await?;

        let mut messages = Vec::new();
        for stream_key in result.keys {
            for entry in stream_key.ids {
                let message_id = entry.id.clone();
                if let Some(redis::Value::BulkString(payload)) = entry.map.get("job") {
                    let payload_str = String::from_utf8_lossy(payload);
                    match serde_json::from_str::<T>(&payload_str) {
                        Ok(message) => messages.push((message_id, message)),
                        Err(e) => {
                            warn!("failed to parse message payload on {}: {}", stream, e);
                            self.ack_on(stream, group, &message_id).await.ok();
                        }
                    }
                }
            }
        }

        Ok(messages)
    }

    /// Acknowledges `message_id` for `group` on an arbitrary `stream`.
    pub async fn ack_on(&self, stream: &str, group: &str, message_id: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        redis::cmd("XACK")
            .arg(stream)
            .arg(group)
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        debug!("acked message {} for group {} on {}", message_id, group, stream);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_a_single_shared_stream() {
        let config = QueueConfig::default();
        assert_eq!(config.stream_name, "mentorup:jobs");
    }
}
