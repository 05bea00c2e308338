//! Feed subscription actions, dispatched on the `type` parameter.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use url::Url;

use super::auth::RequireAuth;
use super::{ActionParams, AppState};
use crate::content::{fetch_page, normalize};
use crate::error::ApiError;
use crate::feed::{fetch_feed, refresh_all};

pub async fn dispatch(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Query(query): Query<ActionParams>,
    body: Option<Json<ActionParams>>,
) -> Result<Response, ApiError> {
    let params = query.merged(body.map(|Json(b)| b).unwrap_or_default());
    let op = params
        .op
        .clone()
        .ok_or_else(|| ApiError::validation("Invalid type"))?;

    match op.as_str() {
        "add_feed" => add_feed(&state, &params).await,
        "refresh_feeds" => refresh_feeds(&state).await,
        "get_unread" => get_unread(&state).await,
        "mark_read" => mark_read(&state, &params).await,
        "get_subscriptions" => get_subscriptions(&state).await,
        "delete_feed" => delete_feed(&state, &params).await,
        "preview" => preview(&state, &params).await,
        _ => Err(ApiError::validation("Invalid type")),
    }
}

/// Subscribe to a feed. The URL is fetched and parsed up front, both to
/// validate it and to resolve the subscription title.
async fn add_feed(state: &AppState, params: &ActionParams) -> Result<Response, ApiError> {
    let url = params
        .url
        .as_deref()
        .ok_or_else(|| ApiError::validation("URL required"))?;

    let parsed = fetch_feed(&state.client, url).await?;
    state.db.insert_feed(url, &parsed.title).await?;

    Ok(success())
}

/// Refresh every subscription. Always succeeds with a count of newly
/// inserted items; per-feed failures are logged inside the fan-out.
async fn refresh_feeds(state: &AppState) -> Result<Response, ApiError> {
    let feeds = state.db.list_feeds().await?;
    let new_items = refresh_all(&state.db, &state.client, &feeds).await;

    Ok(Json(json!({ "success": true, "new_items": new_items })).into_response())
}

async fn get_unread(state: &AppState) -> Result<Response, ApiError> {
    let items = state.db.unread_items().await?;
    Ok(Json(items).into_response())
}

async fn mark_read(state: &AppState, params: &ActionParams) -> Result<Response, ApiError> {
    let id = params.id.ok_or_else(|| ApiError::validation("ID required"))?;
    state.db.mark_item_read(id).await?;
    Ok(success())
}

async fn get_subscriptions(state: &AppState) -> Result<Response, ApiError> {
    let feeds = state.db.list_feeds().await?;
    Ok(Json(feeds).into_response())
}

async fn delete_feed(state: &AppState, params: &ActionParams) -> Result<Response, ApiError> {
    let id = params.id.ok_or_else(|| ApiError::validation("ID required"))?;
    state.db.delete_feed(id).await?;
    Ok(success())
}

/// Stateless scrape: clean a page and hand it back without persisting,
/// so a feed item can be read before deciding to save it.
async fn preview(state: &AppState, params: &ActionParams) -> Result<Response, ApiError> {
    let url_str = params
        .url
        .as_deref()
        .ok_or_else(|| ApiError::validation("URL required"))?;
    let url = Url::parse(url_str).map_err(|_| ApiError::validation("Invalid URL"))?;

    let html = fetch_page(&state.client, &url).await?;
    let article = normalize(&html, &url)?;

    Ok(Json(json!({
        "title": article.title,
        "content": article.content,
        "url": url_str,
    }))
    .into_response())
}

fn success() -> Response {
    Json(json!({ "success": true })).into_response()
}
