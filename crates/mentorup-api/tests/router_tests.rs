//! End-to-end router tests for the `/upload/*` HTTP surface (spec §6).
//!
//! These build a real `AppState` from in-memory client handles (no network
//! I/O happens at construction time for any of `S3Client`/`JobBus`/
//! `MetadataClient` — only on first call), so the router under test is wired
//! exactly as `mentorup-api`'s binary wires it.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use serde_json::json;
use tower::ServiceExt;

use mentorup_api::middleware::RateLimiterCache;
use mentorup_api::{create_router, ApiConfig, AppState};
use mentorup_bus::JobBus;
use mentorup_metadata::{MetadataClient, MetadataConfig};
use mentorup_storage::operations::StorageLayout;
use mentorup_storage::{S3Client, S3Config};

const JWT_SECRET: &str = "test-secret";

fn test_config() -> ApiConfig {
    ApiConfig {
        host: "127.0.0.1".into(),
        port: 0,
        upload_root: std::env::temp_dir().join("mentorup-router-tests").to_string_lossy().into_owned(),
        jwt_secret: JWT_SECRET.into(),
        status_url_force_https: false,
        cors_origins: vec!["*".into()],
        rate_limit_rps: 1000,
        request_timeout: Duration::from_secs(120),
    }
}

async fn test_state() -> AppState {
    let config = test_config();
    let storage = S3Client::new(S3Config {
        bucket_name: "test-bucket".into(),
        region: "us-east-1".into(),
        access_key_id: "test".into(),
        secret_access_key: "test".into(),
        endpoint_url: Some("http://localhost:9".into()),
    })
    .await
    .expect("S3Client construction does not dial out");

    let metadata = MetadataClient::new(MetadataConfig {
        endpoint: "http://localhost:9/graphql".into(),
        api_secret: "test".into(),
        timeout: Duration::from_secs(1),
    })
    .expect("MetadataClient construction does not dial out");

    let bus = JobBus::new(mentorup_bus::QueueConfig {
        redis_url: "redis://127.0.0.1:6399".into(),
        stream_name: "mentorup:jobs:test".into(),
    })
    .expect("JobBus construction does not dial out");

    AppState {
        rate_limiter: Arc::new(RateLimiterCache::new(1000)),
        layout: Arc::new(StorageLayout::new("https://static.example.com".into())),
        metadata: Arc::new(metadata),
        storage: Arc::new(storage),
        bus: Arc::new(bus),
        config,
    }
}

#[derive(Serialize)]
struct Claims {
    id: String,
    role: String,
    #[serde(rename = "mentorIds")]
    mentor_ids: Vec<String>,
    exp: usize,
}

fn bearer_token(mentor_ids: Vec<String>) -> String {
    let claims = Claims {
        id: "user-1".into(),
        role: "USER".into(),
        mentor_ids,
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_bytes())).unwrap()
}

#[tokio::test]
async fn ping_is_public_and_returns_200() {
    let app = create_router(test_state().await);

    let response = app
        .oneshot(Request::builder().uri("/upload/ping").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn ping_accepts_trailing_slash() {
    let app = create_router(test_state().await);

    let response = app
        .oneshot(Request::builder().uri("/upload/ping/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn regen_vtt_without_bearer_token_is_401() {
    let app = create_router(test_state().await);

    let body = json!({"mentor": "mentor-one", "question": "question-one"});
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload/answer/regen_vtt")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cancel_rejects_mentor_outside_requesters_set_as_403() {
    let app = create_router(test_state().await);
    let token = bearer_token(vec!["someone-else".into()]);

    let body = json!({
        "mentor": "mentor-one",
        "question": "question-one",
        "task_ids_to_cancel": ["task-1"],
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload/answer/cancel")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn cancel_rejects_short_mentor_identifier_as_400() {
    let app = create_router(test_state().await);
    let token = bearer_token(vec!["ab".into()]);

    let body = json!({
        "mentor": "ab",
        "question": "question-one",
        "task_ids_to_cancel": ["task-1"],
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload/answer/cancel")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
