//! Shared-secret authentication.
//!
//! Every endpoint requires the `x-auth-key` header to match the configured
//! secret exactly. The check runs as an extractor, so it rejects before the
//! handler body and before any side effect. Comparison is constant-time.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use secrecy::ExposeSecret;
use subtle::ConstantTimeEq;

use super::AppState;
use crate::error::ApiError;

/// Header carrying the shared secret.
const AUTH_HEADER: &str = "x-auth-key";

/// Extractor that authorizes the request or rejects with 401.
#[derive(Debug, Clone, Copy)]
pub struct RequireAuth;

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get(AUTH_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        let expected = state.api_key.expose_secret();

        // ct_eq short-circuits only on length, never on content.
        if bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
            Ok(Self)
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}
