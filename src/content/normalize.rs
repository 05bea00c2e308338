//! Article normalization: lazy-image repair plus readability extraction.
//!
//! Saved articles are read far from their origin, so every image must carry
//! a usable absolute URL before extraction runs. Two pre-passes over each
//! `<img>` tag handle the common breakage:
//!
//! 1. Lazy-load promotion: sites that populate `src` from JavaScript park
//!    the real URL in `data-src`, `data-original`, or `data-url` (checked in
//!    that order). The first present wins and becomes the effective source.
//! 2. Absolutization: the effective source is resolved against the page URL,
//!    so `src="foo.jpg"` on `https://example.com/post` becomes
//!    `https://example.com/foo.jpg`.
//!
//! The rewritten document then goes through readability extraction, which
//! strips navigation, ads, and boilerplate down to a title and a clean HTML
//! fragment. A page that yields nothing article-shaped is an error — callers
//! must not persist partial or empty content.

use dom_smoothie::{Config, Readability};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

/// Lazy-load attribute names, in the priority order they are consulted.
const LAZY_ATTRIBUTES: [&str; 3] = ["data-src", "data-original", "data-url"];

static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<img\b[^>]*>").expect("static img pattern"));

static IMG_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?P<name>data-src|data-original|data-url|src)\s*=\s*["'](?P<val>[^"']*)["']"#)
        .expect("static attr pattern")
});

static SRC_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bsrc\s*=\s*("[^"]*"|'[^']*')"#).expect("static src pattern"));

/// A cleaned article produced by [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedArticle {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The readability pass found nothing article-shaped.
    #[error("Could not parse article")]
    Unreadable,
}

/// Normalize a raw HTML page into a readable article.
///
/// # Errors
///
/// [`NormalizeError::Unreadable`] when extraction yields no usable content.
pub fn normalize(html: &str, source_url: &Url) -> Result<NormalizedArticle, NormalizeError> {
    let repaired = rewrite_images(html, source_url);

    let cfg = Config {
        max_elements_to_parse: usize::MAX,
        ..Default::default()
    };
    let mut readability = Readability::new(repaired.as_ref(), Some(source_url.as_str()), Some(cfg))
        .map_err(|_| NormalizeError::Unreadable)?;
    let article = readability.parse().map_err(|_| NormalizeError::Unreadable)?;

    let content = article.content.to_string();
    if content.trim().is_empty() {
        return Err(NormalizeError::Unreadable);
    }

    Ok(NormalizedArticle {
        title: article.title,
        content,
    })
}

/// Rewrite every `<img>` tag so its `src` is the promoted lazy-load source
/// (when present) resolved to an absolute URL against `base`.
///
/// Tags with no resolvable source at all are left untouched.
fn rewrite_images<'a>(html: &'a str, base: &Url) -> std::borrow::Cow<'a, str> {
    IMG_TAG.replace_all(html, |caps: &regex::Captures<'_>| {
        let tag = &caps[0];
        match effective_src(tag) {
            Some(src) => {
                let resolved = base
                    .join(&src)
                    .map(|u| u.to_string())
                    .unwrap_or(src);
                set_img_src(tag, &resolved)
            }
            None => tag.to_string(),
        }
    })
}

/// The image source the browser would eventually use: the first lazy-load
/// attribute in priority order, else the plain `src`.
fn effective_src(tag: &str) -> Option<String> {
    let mut src = None;
    let mut lazy: [Option<String>; 3] = Default::default();

    for caps in IMG_ATTR.captures_iter(tag) {
        let name = caps["name"].to_ascii_lowercase();
        let value = caps["val"].to_string();
        // Empty attributes count as absent, so a blank data-src cannot
        // shadow a real src.
        if value.trim().is_empty() {
            continue;
        }
        if name == "src" {
            src.get_or_insert(value);
        } else if let Some(i) = LAZY_ATTRIBUTES.iter().position(|a| *a == name) {
            lazy[i].get_or_insert(value);
        }
    }

    lazy.into_iter()
        .flatten()
        .next()
        .or(src)
        .filter(|v| !v.trim().is_empty())
}

/// Rebuild an `<img>` tag with the given `src`, dropping any previous one.
fn set_img_src(tag: &str, src: &str) -> String {
    let stripped = SRC_ATTR.replace_all(tag, "");
    // Keep the remaining attributes exactly as written, after "<img".
    let rest = &stripped[4..];
    format!("<img src=\"{}\"{}", src, rest)
}

// ============================================================================
// Tests
// ============================================================================
