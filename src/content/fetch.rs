//! Page retrieval for article saving and previews.

use futures::StreamExt;
use reqwest::header::USER_AGENT;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Browser identity advertised when scraping pages. Plenty of sites serve
/// stripped or blocked responses to obvious bots, and some only emit real
/// image URLs to browser user agents.
const USER_AGENT_STRING: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Per-page fetch timeout.
const PAGE_TIMEOUT: Duration = Duration::from_secs(20);

/// Response body cap for scraped pages.
const MAX_PAGE_SIZE: usize = 5 * 1024 * 1024; // 5MB

/// Errors from fetching a page, kept distinct from extraction errors so a
/// caller can tell "the site was unreachable" from "the page was not an
/// article".
#[derive(Debug, Error)]
pub enum PageFetchError {
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Failed to fetch: status {0}")]
    HttpStatus(u16),
    #[error("Request timed out")]
    Timeout,
    #[error("Response too large")]
    ResponseTooLarge,
}

/// Fetch a page as text, advertising a browser user agent.
///
/// Non-success statuses are errors: a 404 or 500 page is never worth
/// extracting, and the caller must not persist anything for it.
pub async fn fetch_page(client: &reqwest::Client, url: &Url) -> Result<String, PageFetchError> {
    let response = tokio::time::timeout(
        PAGE_TIMEOUT,
        client
            .get(url.as_str())
            .header(USER_AGENT, USER_AGENT_STRING)
            .send(),
    )
    .await
    .map_err(|_| PageFetchError::Timeout)?
    .map_err(PageFetchError::Network)?;

    if !response.status().is_success() {
        return Err(PageFetchError::HttpStatus(response.status().as_u16()));
    }

    if let Some(len) = response.content_length() {
        if len as usize > MAX_PAGE_SIZE {
            return Err(PageFetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(PageFetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > MAX_PAGE_SIZE {
            return Err(PageFetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

// ============================================================================
// Tests
// ============================================================================
