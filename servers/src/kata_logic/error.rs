use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lib_common::core::BufferError;
use lib_common::markets::codewars::CodewarsError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::kata_logic::repository::RepositoryError;

/// Failures of a request, each wrapped with the stage that produced it.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to get random ID: {0}")]
    RandomId(#[source] BufferError),

    #[error("failed to get kata details: {0}")]
    KataDetails(#[source] CodewarsError),

    #[error("failed to save kata: {0}")]
    SaveKata(#[source] RepositoryError),

    #[error("failed to load kata: {0}")]
    LoadKata(#[source] RepositoryError),

    #[error("failed to fetch user {username:?}: {source}")]
    FetchUser {
        username: String,
        #[source]
        source: CodewarsError,
    },

    #[error("failed to save user {username:?}: {source}")]
    SaveUser {
        username: String,
        #[source]
        source: RepositoryError,
    },

    #[error("failed to load user {username:?}: {source}")]
    LoadUser {
        username: String,
        #[source]
        source: RepositoryError,
    },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = %self, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

/// `GET /katas/random` reports a fixed message and puts the cause in `details`.
#[derive(Debug)]
pub struct RandomKataError(pub AppError);

impl From<AppError> for RandomKataError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for RandomKataError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "random kata request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Failed to get random kata",
                "details": self.0.to_string(),
            })),
        )
            .into_response()
    }
}
