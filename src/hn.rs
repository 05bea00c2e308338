//! Hacker News browsing via the public Firebase API.
//!
//! Stateless: nothing here touches the database. Top-story ids are fetched
//! once per request and a page of items is hydrated concurrently; items the
//! API returns as `null` (dead, dang-scrubbed, or plain missing) are
//! dropped, as are individual item fetch failures.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Production API base. Tests point at a mock server instead.
const HN_API_BASE: &str = "https://hacker-news.firebaseio.com/v0";

/// Stories per page of the top-stories listing.
const PAGE_SIZE: usize = 20;

/// Top-level comments hydrated per story.
const COMMENT_LIMIT: usize = 20;

#[derive(Debug, Error)]
pub enum HnError {
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
}

/// An item as the Firebase API returns it — story or comment, with nearly
/// every field optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HnItem {
    pub id: i64,
    #[serde(default)]
    pub by: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub descendants: Option<i64>,
    #[serde(default)]
    pub kids: Vec<i64>,
}

/// A story together with its hydrated top-level comments.
#[derive(Debug, Clone, Serialize)]
pub struct StoryWithComments {
    pub story: HnItem,
    pub comments: Vec<HnItem>,
}

/// Fetch one page of top stories.
///
/// `base_url` overrides the API host (tests); `None` uses the real API.
pub async fn top_stories(
    client: &reqwest::Client,
    base_url: Option<&str>,
    page: usize,
) -> Result<Vec<HnItem>, HnError> {
    let base = base_url.unwrap_or(HN_API_BASE);

    let response = client
        .get(format!("{}/topstories.json", base))
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(HnError::HttpStatus(response.status().as_u16()));
    }
    let ids: Vec<i64> = response.json().await?;

    let start = (page * PAGE_SIZE).min(ids.len());
    let end = (start + PAGE_SIZE).min(ids.len());
    let stories = join_all(ids[start..end].iter().map(|&id| fetch_item(client, base, id)))
        .await
        .into_iter()
        .flatten()
        .collect();

    Ok(stories)
}

/// Fetch a story and its first top-level comments.
///
/// Returns `Ok(None)` when the story id resolves to nothing.
pub async fn story_comments(
    client: &reqwest::Client,
    base_url: Option<&str>,
    id: i64,
) -> Result<Option<StoryWithComments>, HnError> {
    let base = base_url.unwrap_or(HN_API_BASE);

    let Some(story) = fetch_item(client, base, id).await else {
        return Ok(None);
    };

    let kid_ids: Vec<i64> = story.kids.iter().take(COMMENT_LIMIT).copied().collect();
    let comments = join_all(kid_ids.iter().map(|&kid| fetch_item(client, base, kid)))
        .await
        .into_iter()
        .flatten()
        .collect();

    Ok(Some(StoryWithComments { story, comments }))
}

/// Fetch a single item; `None` for API nulls and individual failures alike,
/// so one dead comment never sinks a whole page.
async fn fetch_item(client: &reqwest::Client, base: &str, id: i64) -> Option<HnItem> {
    let response = client
        .get(format!("{}/item/{}.json", base, id))
        .send()
        .await
        .ok()?;
    if !response.status().is_success() {
        return None;
    }
    response.json::<Option<HnItem>>().await.ok()?
}

// ============================================================================
// Tests
// ============================================================================
