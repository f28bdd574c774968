//! HTTP ingestion/dispatcher API for the mentor-upload pipeline (spec §4.4, §6).

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod util;

pub use config::ApiConfig;
pub use routes::create_router;
pub use state::AppState;
