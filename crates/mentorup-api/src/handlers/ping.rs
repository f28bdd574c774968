//! `GET /upload/ping` — trivial liveness probe (spec §6).

use axum::http::StatusCode;

pub async fn ping() -> StatusCode {
    StatusCode::OK
}
