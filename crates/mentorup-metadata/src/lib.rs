//! GraphQL metadata client (spec §4.3).
//!
//! - Bearer-token auth via `API_SECRET`
//! - Retry with exponential backoff + jitter on network errors and 5xx
//! - Fails with `MetadataError` on non-2xx HTTP or a GraphQL `errors` field

pub mod client;
pub mod error;
pub mod retry;

pub use client::{MetadataClient, MetadataConfig};
pub use error::{MetadataError, MetadataResult};
pub use retry::RetryConfig;
