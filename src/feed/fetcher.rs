//! Feed fetching and the refresh fan-out.
//!
//! All subscriptions are fetched and parsed in parallel with no ordering
//! guarantee. A feed that fails — network, status, oversized body — is
//! logged and contributes nothing; it never aborts the batch. There are no
//! retries: a failed feed waits for the next explicit refresh.

use futures::future::join_all;
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

use crate::feed::parser::{parse_feed, ParsedFeed};
use crate::storage::{Database, Feed, NewFeedItem};

/// Per-feed fetch timeout.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Response body cap for feed documents.
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while fetching one feed.
///
/// Parsing is absent by design: [`parse_feed`] is infallible and a
/// non-feed document simply yields zero items.
#[derive(Debug, Error)]
pub enum FeedFetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the 30-second timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body exceeded the size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

/// Fetch a feed URL and parse whatever comes back.
pub async fn fetch_feed(
    client: &reqwest::Client,
    url: &str,
) -> Result<ParsedFeed, FeedFetchError> {
    let response = tokio::time::timeout(FETCH_TIMEOUT, client.get(url).send())
        .await
        .map_err(|_| FeedFetchError::Timeout)?
        .map_err(FeedFetchError::Network)?;

    if !response.status().is_success() {
        return Err(FeedFetchError::HttpStatus(response.status().as_u16()));
    }

    let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
    Ok(parse_feed(&bytes))
}

/// Refresh every subscription concurrently and return the number of newly
/// inserted items across all of them.
///
/// Unordered, uncapped fan-out: each feed fetches, parses, and inserts
/// independently. Failures are isolated per feed and logged at warn; item
/// duplicates are absorbed by the storage layer's insert-or-ignore, so
/// repeated or racing refreshes converge instead of duplicating.
pub async fn refresh_all(db: &Database, client: &reqwest::Client, feeds: &[Feed]) -> usize {
    let tasks = feeds.iter().map(|feed| async move {
        match refresh_one(db, client, feed).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(feed = %feed.url, error = %e, "Feed refresh failed");
                0
            }
        }
    });

    join_all(tasks).await.into_iter().sum()
}

/// Fetch, parse, and store one feed's items. Returns the insert count.
async fn refresh_one(
    db: &Database,
    client: &reqwest::Client,
    feed: &Feed,
) -> anyhow::Result<usize> {
    let parsed = fetch_feed(client, &feed.url).await?;

    let items: Vec<NewFeedItem> = parsed
        .items
        .into_iter()
        .map(|item| NewFeedItem {
            guid: item.guid,
            title: item.title,
            url: item.link,
            pub_date: item.pub_date,
        })
        .collect();

    let inserted = db.insert_feed_items(feed.id, &items).await?;
    Ok(inserted)
}

/// Stream a response body into memory, bailing once it exceeds `limit`.
async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FeedFetchError> {
    // Fast path: trust Content-Length when the server offers one.
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FeedFetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FeedFetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FeedFetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VALID_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Test Feed</title>
    <item><guid>1</guid><title>Test</title><link>https://example.com/1</link>
        <pubDate>Mon, 06 Jan 2025 10:00:00 GMT</pubDate></item>
</channel></rss>"#;

    async fn setup_db_with_feed(url: &str) -> (Database, Feed) {
        let db = Database::open(":memory:").await.unwrap();
        db.insert_feed(url, "Test Feed").await.unwrap();
        let feeds = db.list_feeds().await.unwrap();
        (db, feeds.into_iter().next().unwrap())
    }

    #[tokio::test]
    async fn refresh_inserts_new_items() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(VALID_RSS)
                    .insert_header("Content-Type", "application/xml"),
            )
            .mount(&mock_server)
            .await;

        let (db, feed) = setup_db_with_feed(&format!("{}/feed", mock_server.uri())).await;
        let client = reqwest::Client::new();

        let count = refresh_all(&db, &client, &[feed]).await;
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn refresh_twice_is_idempotent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RSS))
            .mount(&mock_server)
            .await;

        let (db, feed) = setup_db_with_feed(&format!("{}/feed", mock_server.uri())).await;
        let client = reqwest::Client::new();

        let first = refresh_all(&db, &client, std::slice::from_ref(&feed)).await;
        let second = refresh_all(&db, &client, &[feed.clone()]).await;
        assert_eq!(first, 1);
        assert_eq!(second, 0); // same guid, INSERT OR IGNORE

        assert_eq!(db.count_feed_items(feed.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn one_failing_feed_does_not_abort_the_batch() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/good"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RSS))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/bad"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let db = Database::open(":memory:").await.unwrap();
        db.insert_feed(&format!("{}/bad", mock_server.uri()), "Bad")
            .await
            .unwrap();
        db.insert_feed(&format!("{}/good", mock_server.uri()), "Good")
            .await
            .unwrap();
        let feeds = db.list_feeds().await.unwrap();
        let client = reqwest::Client::new();

        let count = refresh_all(&db, &client, &feeds).await;
        assert_eq!(count, 1); // the good feed still lands
    }

    #[tokio::test]
    async fn malformed_feed_yields_zero_items_not_an_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<not valid xml"))
            .mount(&mock_server)
            .await;

        let (db, feed) = setup_db_with_feed(&format!("{}/feed", mock_server.uri())).await;
        let client = reqwest::Client::new();

        let count = refresh_all(&db, &client, &[feed]).await;
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn fetch_404_is_an_http_status_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let result = fetch_feed(&client, &format!("{}/feed", mock_server.uri())).await;
        match result {
            Err(FeedFetchError::HttpStatus(404)) => {}
            other => panic!("Expected HttpStatus(404), got {:?}", other.map(|f| f.title)),
        }
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let mock_server = MockServer::start().await;
        let big = "x".repeat(MAX_FEED_SIZE + 1);
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(big))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let result = fetch_feed(&client, &format!("{}/feed", mock_server.uri())).await;
        assert!(matches!(result, Err(FeedFetchError::ResponseTooLarge)));
    }
}
