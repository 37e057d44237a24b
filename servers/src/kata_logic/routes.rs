//! HTTP surface.
//!
//! - `GET /health`: `{status, time, kata_buffer}`, never fails.
//! - `GET /users/{username}`: the stored user, or 500 `{error}`.
//! - `GET /katas/random`: `{id, name, url, tags}`, or 500 `{error, details}`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::kata_logic::error::{AppError, RandomKataError};
use crate::kata_logic::model::{KataSummary, User};
use crate::kata_logic::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub time: String,
    pub kata_buffer: BufferHealth,
}

#[derive(Debug, Serialize)]
pub struct BufferHealth {
    pub size: usize,
    /// Whole seconds since the last refresh; `null` before the first one.
    pub age_secs: Option<u64>,
}

pub fn router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/users/{username}", get(get_user))
        .route("/katas/random", get(random_kata))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout))
        .with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let stats = state.buffer.stats().await;
    Json(HealthResponse {
        status: "OK",
        time: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        kata_buffer: BufferHealth {
            size: stats.size,
            age_secs: stats.age.map(|age| age.as_secs()),
        },
    })
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<User>, AppError> {
    let user = state.users.sync_user(&username).await?;
    Ok(Json(user))
}

async fn random_kata(State(state): State<Arc<AppState>>) -> Result<Json<KataSummary>, RandomKataError> {
    let kata = state.katas.get_random_kata().await?;
    Ok(Json(kata.summary()))
}
