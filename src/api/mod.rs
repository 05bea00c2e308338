//! HTTP surface: a small router with three `type`-dispatched endpoints.
//!
//! Every endpoint takes its action discriminator (`type`) and arguments
//! from the query string or the JSON body, query winning — mirroring
//! clients that send GETs with query params and POSTs with a JSON body.
//! Authentication runs as an extractor, so it rejects before any handler
//! logic or side effect.
//!
//! State is injected, not global: one [`AppState`] owns the database
//! handle, the HTTP client, and the resolved shared secret.

pub mod auth;
pub mod feeds;
pub mod hackernews;
pub mod library;

use axum::routing::get;
use axum::Router;
use secrecy::SecretString;
use serde::Deserialize;

use crate::storage::Database;

/// Shared state for all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub client: reqwest::Client,
    pub api_key: SecretString,
    /// Override for the Hacker News API host; `None` means the real API.
    /// Tests point this at a mock server.
    pub hn_base_url: Option<String>,
}

impl AppState {
    pub fn new(db: Database, client: reqwest::Client, api_key: SecretString) -> Self {
        Self {
            db,
            client,
            api_key,
            hn_base_url: None,
        }
    }

    pub fn with_hn_base_url(mut self, base: impl Into<String>) -> Self {
        self.hn_base_url = Some(base.into());
        self
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/library",
            get(library::dispatch).post(library::dispatch),
        )
        .route("/api/feeds", get(feeds::dispatch).post(feeds::dispatch))
        .route("/api/hn", get(hackernews::dispatch))
        .with_state(state)
}

/// The superset of parameters any dispatched action consumes. Individual
/// actions validate the fields they require and ignore the rest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionParams {
    /// Action discriminator.
    #[serde(rename = "type")]
    pub op: Option<String>,
    pub id: Option<i64>,
    pub q: Option<String>,
    pub archived: Option<String>,
    pub url: Option<String>,
    pub hn_id: Option<i64>,
    pub article_id: Option<i64>,
    pub quote: Option<String>,
    pub note: Option<String>,
    /// Archive toggle direction: `"archive"` or `"unarchive"`.
    pub action: Option<String>,
    pub annotated: Option<String>,
    pub page: Option<usize>,
}

impl ActionParams {
    /// Merge query parameters over body parameters, query winning per field.
    pub fn merged(self, fallback: ActionParams) -> ActionParams {
        ActionParams {
            op: self.op.or(fallback.op),
            id: self.id.or(fallback.id),
            q: self.q.or(fallback.q),
            archived: self.archived.or(fallback.archived),
            url: self.url.or(fallback.url),
            hn_id: self.hn_id.or(fallback.hn_id),
            article_id: self.article_id.or(fallback.article_id),
            quote: self.quote.or(fallback.quote),
            note: self.note.or(fallback.note),
            action: self.action.or(fallback.action),
            annotated: self.annotated.or(fallback.annotated),
            page: self.page.or(fallback.page),
        }
    }
}
