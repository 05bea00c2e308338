//! Article and highlight actions, dispatched on the `type` parameter.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use url::Url;

use super::auth::RequireAuth;
use super::{ActionParams, AppState};
use crate::content::{apply_highlights, fetch_page, normalize};
use crate::error::ApiError;

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
        .ok_or_else(|| ApiError::validation("Invalid action type"))?;

    match op.as_str() {
        "list" => list(&state, &params).await,
        "read" => read(&state, &params).await,
        "search" => search(&state, &params).await,
        "save" => save(&state, &params).await,
        "archive" => archive(&state, &params).await,
        "delete" => delete(&state, &params).await,
        "add_highlight" => add_highlight(&state, &params).await,
        "get_highlights" => get_highlights(&state, &params).await,
        "all_highlights" => all_highlights(&state).await,
        "delete_highlight" => delete_highlight(&state, &params).await,
        _ => Err(ApiError::validation("Invalid action type")),
    }
}

async fn list(state: &AppState, params: &ActionParams) -> Result<Response, ApiError> {
    let archived = params.archived.as_deref() == Some("true");
    let articles = state.db.list_articles(archived).await?;
    Ok(Json(articles).into_response())
}

async fn read(state: &AppState, params: &ActionParams) -> Result<Response, ApiError> {
    let id = require_id(params)?;
    let mut article = state
        .db
        .get_article(id)
        .await?
        .ok_or(ApiError::NotFound("Article"))?;

    // Server-side rendering of stored highlights, on request.
    if params.annotated.as_deref() == Some("true") {
        let highlights = state.db.highlights_for_article(id).await?;
        article.content = apply_highlights(&article.content, &highlights);
    }

    Ok(Json(article).into_response())
}

async fn search(state: &AppState, params: &ActionParams) -> Result<Response, ApiError> {
    match params.q.as_deref().filter(|q| !q.is_empty()) {
        Some(q) => {
            let articles = state.db.search_articles(q).await?;
            Ok(Json(articles).into_response())
        }
        None => Ok(Json(json!([])).into_response()),
    }
}

/// Scrape, clean, and persist a page. Fetch and extraction failures abort
/// the save — no partial article row is ever written.
async fn save(state: &AppState, params: &ActionParams) -> Result<Response, ApiError> {
    let url_str = params
        .url
        .as_deref()
        .ok_or_else(|| ApiError::validation("URL required"))?;
    let url = Url::parse(url_str).map_err(|_| ApiError::validation("Invalid URL"))?;

    let html = fetch_page(&state.client, &url).await?;
    let article = normalize(&html, &url)?;

    let id = state
        .db
        .insert_article(url.as_str(), &article.title, &article.content, params.hn_id)
        .await?;

    Ok(Json(json!({ "success": true, "id": id, "title": article.title })).into_response())
}

async fn archive(state: &AppState, params: &ActionParams) -> Result<Response, ApiError> {
    let id = require_id(params)?;
    let archived = params.action.as_deref() == Some("archive");

    if !state.db.set_archived(id, archived).await? {
        return Err(ApiError::NotFound("Article"));
    }
    Ok(success())
}

async fn delete(state: &AppState, params: &ActionParams) -> Result<Response, ApiError> {
    let id = require_id(params)?;
    state.db.delete_article(id).await?;
    Ok(success())
}

async fn add_highlight(state: &AppState, params: &ActionParams) -> Result<Response, ApiError> {
    let (article_id, quote) = match (params.article_id, params.quote.as_deref()) {
        (Some(article_id), Some(quote)) if !quote.is_empty() => (article_id, quote),
        _ => return Err(ApiError::validation("Missing data")),
    };
    let note = params.note.as_deref().unwrap_or("");

    let id = state.db.insert_highlight(article_id, quote, note).await?;
    Ok(Json(json!({ "success": true, "id": id })).into_response())
}

async fn get_highlights(state: &AppState, params: &ActionParams) -> Result<Response, ApiError> {
    let article_id = params
        .article_id
        .ok_or_else(|| ApiError::validation("article_id required"))?;
    let highlights = state.db.highlights_for_article(article_id).await?;
    Ok(Json(highlights).into_response())
}

async fn all_highlights(state: &AppState) -> Result<Response, ApiError> {
    let highlights = state.db.all_highlights().await?;
    Ok(Json(highlights).into_response())
}

async fn delete_highlight(state: &AppState, params: &ActionParams) -> Result<Response, ApiError> {
    let id = require_id(params)?;
    state.db.delete_highlight(id).await?;
    Ok(success())
}

fn require_id(params: &ActionParams) -> Result<i64, ApiError> {
    params.id.ok_or_else(|| ApiError::validation("ID required"))
}

fn success() -> Response {
    Json(json!({ "success": true })).into_response()
}
