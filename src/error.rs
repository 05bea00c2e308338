//! API error kinds and their HTTP mapping.
//!
//! One enum covers every failure a request handler can surface. Auth and
//! validation failures reject before side effects; fetch and extraction
//! failures abort a save with nothing persisted; storage failures are
//! reported with a generic 500. The response body is always
//! `{"error": "<message>"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::content::{NormalizeError, PageFetchError};
use crate::feed::FeedFetchError;
use crate::hn::HnError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad or missing shared secret.
    #[error("Unauthorized")]
    Unauthorized,

    /// A required field is missing or unusable.
    #[error("{0}")]
    Validation(String),

    /// Upstream page fetch failed (unreachable or non-success status).
    #[error(transparent)]
    Fetch(#[from] PageFetchError),

    /// Upstream feed fetch failed.
    #[error(transparent)]
    FeedFetch(#[from] FeedFetchError),

    /// Hacker News API fetch failed.
    #[error(transparent)]
    Hn(#[from] HnError),

    /// Readability extraction yielded nothing usable.
    #[error(transparent)]
    Extraction(#[from] NormalizeError),

    /// The requested row does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Persistence failure.
    #[error("Database error: {0}")]
    Storage(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }
}

/// Storage operations surface as `anyhow::Error`; they all map to the same
/// 500 response.
impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Storage(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Fetch(_)
            | ApiError::FeedFetch(_)
            | ApiError::Hn(_)
            | ApiError::Extraction(_)
            | ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
