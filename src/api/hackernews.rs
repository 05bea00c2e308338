//! Hacker News browsing, dispatched on the `type` parameter.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::auth::RequireAuth;
use super::{ActionParams, AppState};
use crate::error::ApiError;
use crate::hn;

pub async fn dispatch(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Query(params): Query<ActionParams>,
) -> Result<Response, ApiError> {
    let op = params
        .op
        .clone()
        .ok_or_else(|| ApiError::validation("Invalid type"))?;

    match op.as_str() {
        "top" => top(&state, &params).await,
        "comments" => comments(&state, &params).await,
        _ => Err(ApiError::validation("Invalid type")),
    }
}

async fn top(state: &AppState, params: &ActionParams) -> Result<Response, ApiError> {
    let page = params.page.unwrap_or(0);
    let stories = hn::top_stories(&state.client, state.hn_base_url.as_deref(), page).await?;
    Ok(Json(stories).into_response())
}

async fn comments(state: &AppState, params: &ActionParams) -> Result<Response, ApiError> {
    let id = params.id.ok_or_else(|| ApiError::validation("ID required"))?;
    let story = hn::story_comments(&state.client, state.hn_base_url.as_deref(), id)
        .await?
        .ok_or(ApiError::NotFound("Story"))?;
    Ok(Json(story).into_response())
}
