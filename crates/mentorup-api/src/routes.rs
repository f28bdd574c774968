//! API routes (spec §6).

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::timeout::TimeoutLayer;

use crate::handlers::answer::{cancel, regen_vtt, trim_existing_upload, upload_answer};
use crate::handlers::ping::ping;
use crate::handlers::thumbnail::upload_thumbnail;
use crate::handlers::transfer::{transfer, transfer_mentor};
use crate::middleware::{cors_layer, rate_limit_middleware, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Mounts `handler` at both `path` and `path/`, since spec §6 requires every
/// route to accept an optional trailing slash.
fn with_trailing_slash(router: Router<AppState>, path: &str, method_router: axum::routing::MethodRouter<AppState>) -> Router<AppState> {
    router
        .route(path, method_router.clone())
        .route(&format!("{path}/"), method_router)
}

pub fn create_router(state: AppState) -> Router {
    let rate_limiter = Arc::clone(&state.rate_limiter);

    let mut upload_routes = Router::new();
    upload_routes = with_trailing_slash(upload_routes, "/upload/ping", get(ping));
    upload_routes = with_trailing_slash(upload_routes, "/upload/answer", post(upload_answer));
    upload_routes = with_trailing_slash(
        upload_routes,
        "/upload/answer/trim_existing_upload",
        post(trim_existing_upload),
    );
    upload_routes = with_trailing_slash(upload_routes, "/upload/answer/regen_vtt", post(regen_vtt));
    upload_routes = with_trailing_slash(upload_routes, "/upload/answer/cancel", post(cancel));
    upload_routes = with_trailing_slash(upload_routes, "/upload/thumbnail", post(upload_thumbnail));
    upload_routes = with_trailing_slash(upload_routes, "/upload/transfer", post(transfer));
    upload_routes = with_trailing_slash(upload_routes, "/upload/transfer/mentor", post(transfer_mentor));
    let upload_routes =
        upload_routes.layer(middleware::from_fn_with_state(rate_limiter, rate_limit_middleware));

    Router::new()
        .merge(upload_routes)
        .layer(TimeoutLayer::new(state.config.request_timeout))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
