//! Application state (spec §9 "Global clients").

use std::sync::Arc;

use mentorup_bus::JobBus;
use mentorup_metadata::MetadataClient;
use mentorup_storage::operations::StorageLayout;
use mentorup_storage::S3Client;

use crate::config::ApiConfig;
use crate::middleware::RateLimiterCache;

/// Process-wide handles shared by every handler. Constructed once at
/// startup; fails fast if required environment variables are absent.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub metadata: Arc<MetadataClient>,
    pub storage: Arc<S3Client>,
    pub bus: Arc<JobBus>,
    pub layout: Arc<StorageLayout>,
    pub rate_limiter: Arc<RateLimiterCache>,
}

impl AppState {
    pub async fn from_env(config: ApiConfig) -> anyhow::Result<Self> {
        let metadata = MetadataClient::from_env()?;
        let storage = S3Client::from_env().await?;
        let bus = JobBus::from_env()?;
        let static_url_base = std::env::var("STATIC_URL_BASE")
            .map_err(|_| anyhow::anyhow!("STATIC_URL_BASE not set"))?;
        let rate_limiter = RateLimiterCache::new(config.rate_limit_rps);

        Ok(Self {
            metadata: Arc::new(metadata),
            storage: Arc::new(storage),
            bus: Arc::new(bus),
            layout: Arc::new(StorageLayout::new(static_url_base)),
            rate_limiter: Arc::new(rate_limiter),
            config,
        })
    }
}
