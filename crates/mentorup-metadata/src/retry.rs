//! Retry policy with exponential backoff and jitter for the metadata client.

use std::time::Duration;

use tracing::{info_span, warn, Instrument};

use crate::error::{MetadataError, MetadataResult};

/// Retry policy configuration, tunable via `METADATA_RETRY_*` env vars.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 5000,
        }
    }
}

impl RetryConfig {
    pub fn from_env() -> Self {
        let base_delay_ms: u64 = std::env::var("METADATA_RETRY_BASE_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100);
        let max_delay_ms: u64 = std::env::var("METADATA_RETRY_MAX_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5000);

        Self {
            max_retries: 3,
            base_delay_ms,
            max_delay_ms,
        }
    }
}

/// Executes `op` with retry on network errors and 5xx responses. Honors a
/// server-provided jittered backoff; does not retry 4xx or malformed bodies.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, operation: &str, op: F) -> MetadataResult<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = MetadataResult<T>>,
{
    let mut last_error = None;

    for attempt in 0..=config.max_retries {
        let span = info_span!("metadata_retry", operation = %operation, attempt = attempt + 1);
        let result = op().instrument(span).await;

        match result {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                let delay = calculate_delay(config, attempt);
                warn!(
                    operation = %operation,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "metadata request failed, retrying: {}",
                    e
                );
                tokio::time::sleep(delay).await;
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error
        .unwrap_or_else(|| MetadataError::InvalidResponse("retry loop exited without error".into())))
}

fn calculate_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let exp_delay = config.base_delay_ms.saturating_mul(2u64.pow(attempt));
    let capped_delay = exp_delay.min(config.max_delay_ms);

    let jittered = if capped_delay > 0 {
        use std::time::SystemTime;
        let nanos = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        let random_factor = (nanos % 1000) as f64 / 1000.0;
        ((capped_delay as f64) * random_factor) as u64
    } else {
        0
    };

    Duration::from_millis(jittered.max(config.base_delay_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_config_default_matches_spec_expectations() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_delay_ms, 100);
        assert_eq!(config.max_delay_ms, 5000);
    }

    #[test]
    fn calculate_delay_respects_max() {
        let config = RetryConfig {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 2000,
        };
        let delay = calculate_delay(&config, 10);
        assert!(delay.as_millis() <= 2000);
    }

    #[test]
    fn calculate_delay_minimum() {
        let config = RetryConfig::default();
        let delay = calculate_delay(&config, 0);
        assert!(delay.as_millis() >= config.base_delay_ms as u128);
    }
}
