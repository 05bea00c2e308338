//! Lenient RSS/Atom extraction.
//!
//! Real-world feeds are messy: RSS 2.0 and Atom interleave freely, fields go
//! missing, dates come in whatever format the publisher felt like, and some
//! documents are not XML at all. This parser extracts a feed title and an
//! ordered item list using explicit per-field fallback chains, and it never
//! fails: a document that cannot be read as markup yields an empty item
//! list, so one broken feed cannot disturb a refresh batch.
//!
//! Fallback chains, in order:
//!
//! - feed title: `<channel><title>` / `<feed><title>` → `"Unknown Feed"`
//! - item title: `<title>` → `"No Title"`
//! - item link: `<link>` text content (RSS) → `href` attribute (Atom);
//!   items with neither are dropped entirely
//! - item guid: `<guid>` or `<id>` text → the resolved link
//! - item date: [`DATE_CANDIDATES`] tried in priority order → current time
//!
//! The date fallback is a documented limitation, not a bug: an item that
//! carries no timestamp is stamped with the wall clock at parse time, so
//! re-parsing the same dateless feed yields fresh stamps and unstable
//! ordering. Deduplication does not depend on dates (guids carry it), so the
//! behavior is preserved rather than silently repaired.

use chrono::Utc;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Feed-level title fallback when no channel/feed title is present.
const FALLBACK_FEED_TITLE: &str = "Unknown Feed";

/// Item-level title fallback.
const FALLBACK_ITEM_TITLE: &str = "No Title";

/// Date element names tried in priority order, stopping at the first that
/// produced text. `pubDate` is the RSS 2.0 convention; `published` and
/// `updated` are Atom's.
const DATE_CANDIDATES: [&str; 3] = ["pubDate", "published", "updated"];

/// A fully resolved feed item. Every field is non-empty by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedItem {
    pub title: String,
    pub link: String,
    pub guid: String,
    pub pub_date: String,
}

/// Result of parsing one feed document.
#[derive(Debug, Clone)]
pub struct ParsedFeed {
    pub title: String,
    pub items: Vec<ParsedItem>,
}

/// Which text field of the current item the reader is positioned inside.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ItemField {
    Title,
    Link,
    Guid,
    Date(usize), // index into DATE_CANDIDATES
}

/// Accumulator for the item element currently being read.
#[derive(Debug, Default)]
struct ItemState {
    title: Option<String>,
    link_text: Option<String>,
    link_href: Option<String>,
    link_seen: bool,
    guid: Option<String>,
    dates: [Option<String>; 3],
}

impl ItemState {
    /// Resolve the accumulated fields into a [`ParsedItem`], or `None` when
    /// no link could be recovered — a linkless item cannot be deduplicated
    /// or displayed, so it is dropped rather than fabricated.
    fn resolve(self) -> Option<ParsedItem> {
        // RSS convention first (element text), Atom convention second (href).
        let link = non_empty(self.link_text).or_else(|| non_empty(self.link_href))?;

        let title =
            non_empty(self.title).unwrap_or_else(|| FALLBACK_ITEM_TITLE.to_string());
        let guid = non_empty(self.guid).unwrap_or_else(|| link.clone());
        let pub_date = self
            .dates
            .into_iter()
            .find_map(non_empty)
            .unwrap_or_else(|| Utc::now().to_rfc3339());

        Some(ParsedItem {
            title,
            link,
            guid,
            pub_date,
        })
    }
}

/// Parse a feed document into a title and item list.
///
/// Infallible by contract: malformed or non-XML input yields whatever title
/// was resolved before the reader gave up (else the fallback) and an empty
/// item list. Callers decide whether an empty feed is worth reporting.
pub fn parse_feed(bytes: &[u8]) -> ParsedFeed {
    let mut reader = Reader::from_reader(bytes);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    // Self-closing elements (Atom's `<link href=".."/>`) arrive as a
    // Start/End pair so the field-tracking below has one shape to handle.
    config.expand_empty_elements = true;

    let mut feed_title: Option<String> = None;
    let mut capturing_feed_title = false;
    let mut title_buf = String::new();

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut item: Option<ItemState> = None;
    let mut field: Option<ItemField> = None;
    let mut field_name: Vec<u8> = Vec::new();
    let mut field_buf = String::new();

    let mut items = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name().as_ref().to_vec();

                if item.is_none() && (name == b"item" || name == b"entry") {
                    item = Some(ItemState::default());
                    field = None;
                } else if let Some(state) = item.as_mut() {
                    // While a field is open, nested markup (a <b> inside a
                    // title, say) contributes its text and nothing else.
                    if field.is_none() {
                        field = item_field_for(&name, state);
                        if field.is_some() {
                            field_name.clone_from(&name);
                            field_buf.clear();
                        }
                        if let Some(ItemField::Link) = field {
                            state.link_seen = true;
                            state.link_href = href_attribute(&e);
                        }
                    }
                } else if name == b"title" && parent_is_feed_root(&stack) && !capturing_feed_title
                {
                    capturing_feed_title = feed_title.is_none();
                    title_buf.clear();
                }

                stack.push(name);
            }
            Ok(Event::End(e)) => {
                let name = e.local_name().as_ref().to_vec();
                // Unmatched ends are tolerated; pop whatever is on top.
                if stack.last() == Some(&name) {
                    stack.pop();
                } else if let Some(pos) = stack.iter().rposition(|n| *n == name) {
                    stack.truncate(pos);
                }

                if item.is_some() && (name == b"item" || name == b"entry") {
                    if let Some(parsed) = item.take().and_then(ItemState::resolve) {
                        items.push(parsed);
                    }
                    field = None;
                } else if let Some(f) = field {
                    if name == field_name {
                        if let Some(state) = item.as_mut() {
                            store_field(state, f, std::mem::take(&mut field_buf));
                        }
                        field = None;
                    }
                } else if capturing_feed_title && name == b"title" {
                    feed_title = Some(std::mem::take(&mut title_buf));
                    capturing_feed_title = false;
                }
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map(|c| c.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(t.as_ref()).into_owned());
                if field.is_some() {
                    field_buf.push_str(&text);
                } else if capturing_feed_title {
                    title_buf.push_str(&text);
                }
            }
            Ok(Event::CData(t)) => {
                let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                if field.is_some() {
                    field_buf.push_str(&text);
                } else if capturing_feed_title {
                    title_buf.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                // Not structured markup after all. Per contract: keep any
                // title already resolved, drop every item.
                tracing::debug!(error = %e, "Feed document unparseable, returning empty item list");
                items.clear();
                break;
            }
        }
    }

    ParsedFeed {
        title: feed_title
            .and_then(|t| non_empty(Some(t)))
            .unwrap_or_else(|| FALLBACK_FEED_TITLE.to_string()),
        items,
    }
}

/// Map an element name inside an item/entry to the field it feeds.
///
/// First-match-wins per field: a second `<link>` or `<id>` in the same item
/// is ignored, matching document-order resolution.
fn item_field_for(name: &[u8], state: &ItemState) -> Option<ItemField> {
    match name {
        b"title" if state.title.is_none() => Some(ItemField::Title),
        b"link" if !state.link_seen => Some(ItemField::Link),
        b"guid" | b"id" if state.guid.is_none() => Some(ItemField::Guid),
        _ => DATE_CANDIDATES
            .iter()
            .position(|c| c.as_bytes() == name)
            .filter(|&i| state.dates[i].is_none())
            .map(ItemField::Date),
    }
}

fn store_field(state: &mut ItemState, field: ItemField, text: String) {
    match field {
        ItemField::Title => state.title = Some(text),
        ItemField::Link => state.link_text = Some(text),
        ItemField::Guid => state.guid = Some(text),
        ItemField::Date(i) => state.dates[i] = Some(text),
    }
}

/// Extract an `href` attribute from an element, if present.
fn href_attribute(e: &BytesStart<'_>) -> Option<String> {
    e.attributes().flatten().find_map(|attr| {
        (attr.key.local_name().as_ref() == b"href").then(|| {
            attr.unescape_value()
                .map(|c| c.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned())
        })
    })
}

/// True when the enclosing element is the channel/feed root, so a `<title>`
/// here is the feed's title and not an item's.
fn parent_is_feed_root(stack: &[Vec<u8>]) -> bool {
    matches!(
        stack.last().map(Vec::as_slice),
        Some(b"channel") | Some(b"feed")
    )
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn rss_items_resolve_all_fields() {
        let doc = br#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <title>Example Blog</title>
  <item>
    <title>First Post</title>
    <link>https://example.com/first</link>
    <guid>post-1</guid>
    <pubDate>Mon, 06 Jan 2025 10:00:00 GMT</pubDate>
  </item>
  <item>
    <title>Second Post</title>
    <link>https://example.com/second</link>
    <guid>post-2</guid>
    <pubDate>Tue, 07 Jan 2025 10:00:00 GMT</pubDate>
  </item>
</channel></rss>"#;

        let feed = parse_feed(doc);
        assert_eq!(feed.title, "Example Blog");
        assert_eq!(feed.items.len(), 2);
        assert_eq!(feed.items[0].title, "First Post");
        assert_eq!(feed.items[0].link, "https://example.com/first");
        assert_eq!(feed.items[0].guid, "post-1");
        assert_eq!(feed.items[0].pub_date, "Mon, 06 Jan 2025 10:00:00 GMT");
    }

    #[test]
    fn atom_link_recovered_from_href_attribute() {
        let doc = br#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Feed</title>
  <entry>
    <title>Entry One</title>
    <link href="https://example.com/entry-1"/>
    <id>urn:uuid:1</id>
    <updated>2025-01-06T10:00:00Z</updated>
  </entry>
</feed>"#;

        let feed = parse_feed(doc);
        assert_eq!(feed.title, "Atom Feed");
        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.items[0].link, "https://example.com/entry-1");
        assert_eq!(feed.items[0].guid, "urn:uuid:1");
        assert_eq!(feed.items[0].pub_date, "2025-01-06T10:00:00Z");
    }

    #[test]
    fn rss_link_text_wins_over_href() {
        let doc = br#"<rss><channel><item>
  <link href="https://attr.example.com/x">https://text.example.com/x</link>
</item></channel></rss>"#;

        let feed = parse_feed(doc);
        assert_eq!(feed.items[0].link, "https://text.example.com/x");
    }

    #[test]
    fn item_without_link_is_dropped() {
        let doc = br#"<rss><channel>
  <item><title>No link here</title><guid>g1</guid></item>
  <item><title>Linked</title><link>https://example.com/a</link></item>
</channel></rss>"#;

        let feed = parse_feed(doc);
        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.items[0].title, "Linked");
    }

    #[test]
    fn every_returned_item_has_nonempty_link() {
        // N items, some linkless: result length <= N, no empty links.
        let doc = br#"<rss><channel>
  <item><link>https://example.com/1</link></item>
  <item><link>  </link></item>
  <item><title>orphan</title></item>
  <item><link>https://example.com/2</link></item>
</channel></rss>"#;

        let feed = parse_feed(doc);
        assert_eq!(feed.items.len(), 2);
        assert!(feed.items.iter().all(|i| !i.link.is_empty()));
    }

    #[test]
    fn guid_falls_back_to_link() {
        let doc = br#"<rss><channel><item>
  <link>https://example.com/only-link</link>
</item></channel></rss>"#;

        let feed = parse_feed(doc);
        assert_eq!(feed.items[0].guid, "https://example.com/only-link");
    }

    #[test]
    fn missing_titles_use_fallbacks() {
        let doc = br#"<rss><channel><item>
  <link>https://example.com/x</link>
</item></channel></rss>"#;

        let feed = parse_feed(doc);
        assert_eq!(feed.title, "Unknown Feed");
        assert_eq!(feed.items[0].title, "No Title");
    }

    #[test]
    fn item_title_does_not_leak_into_feed_title() {
        let doc = br#"<rss><channel>
  <item><title>Item Title</title><link>https://example.com/x</link></item>
</channel></rss>"#;

        let feed = parse_feed(doc);
        assert_eq!(feed.title, "Unknown Feed");
    }

    #[test]
    fn rss_date_priority_pubdate_first() {
        let doc = br#"<rss><channel><item>
  <link>https://example.com/x</link>
  <updated>2025-03-01T00:00:00Z</updated>
  <pubDate>Sat, 01 Feb 2025 00:00:00 GMT</pubDate>
</item></channel></rss>"#;

        // pubDate outranks updated regardless of document order.
        let feed = parse_feed(doc);
        assert_eq!(feed.items[0].pub_date, "Sat, 01 Feb 2025 00:00:00 GMT");
    }

    #[test]
    fn atom_date_priority_published_over_updated() {
        let doc = br#"<feed><entry>
  <link href="https://example.com/x"/>
  <updated>2025-03-01T00:00:00Z</updated>
  <published>2025-02-01T00:00:00Z</published>
</entry></feed>"#;

        let feed = parse_feed(doc);
        assert_eq!(feed.items[0].pub_date, "2025-02-01T00:00:00Z");
    }

    #[test]
    fn dateless_item_gets_a_current_stamp() {
        let doc = br#"<rss><channel><item>
  <link>https://example.com/x</link>
</item></channel></rss>"#;

        let before = Utc::now();
        let feed = parse_feed(doc);
        let stamped = chrono::DateTime::parse_from_rfc3339(&feed.items[0].pub_date).unwrap();
        assert!(stamped >= before.fixed_offset() - chrono::Duration::seconds(1));
    }

    #[test]
    fn cdata_and_entities_decode() {
        let doc = br#"<rss><channel>
  <title><![CDATA[Tom & Jerry]]></title>
  <item>
    <title>Fish &amp; Chips</title>
    <link>https://example.com/food?a=1&amp;b=2</link>
  </item>
</channel></rss>"#;

        let feed = parse_feed(doc);
        assert_eq!(feed.title, "Tom & Jerry");
        assert_eq!(feed.items[0].title, "Fish & Chips");
        assert_eq!(feed.items[0].link, "https://example.com/food?a=1&b=2");
    }

    #[test]
    fn nested_markup_inside_a_title_keeps_all_text() {
        let doc = br#"<rss><channel><item>
  <title>Fish <b>and</b> Chips</title>
  <link>https://example.com/x</link>
</item></channel></rss>"#;

        let feed = parse_feed(doc);
        assert_eq!(feed.items[0].title, "Fish and Chips");
    }

    #[test]
    fn malformed_document_returns_empty_items() {
        let feed = parse_feed(b"this is not xml at all < < <<<");
        assert_eq!(feed.title, "Unknown Feed");
        assert!(feed.items.is_empty());
    }

    #[test]
    fn truncated_document_does_not_panic() {
        let doc = br#"<rss><channel><title>Cut</title><item><title>Half an ite"#;
        let feed = parse_feed(doc);
        // Whatever survives, nothing panics and no linkless item appears.
        assert!(feed.items.iter().all(|i| !i.link.is_empty()));
    }

    #[test]
    fn second_link_element_is_ignored() {
        // Atom feeds commonly carry multiple <link rel=...> elements; only
        // the first is consulted, matching document-order resolution.
        let doc = br#"<feed><entry>
  <link href="https://example.com/alternate"/>
  <link href="https://example.com/self"/>
</entry></feed>"#;

        let feed = parse_feed(doc);
        assert_eq!(feed.items[0].link, "https://example.com/alternate");
    }

    #[test]
    fn mixed_rss_and_atom_containers_in_document_order() {
        let doc = br#"<rss><channel>
  <item><link>https://example.com/rss-item</link></item>
  <entry><link href="https://example.com/atom-entry"/></entry>
</channel></rss>"#;

        let feed = parse_feed(doc);
        assert_eq!(feed.items.len(), 2);
        assert_eq!(feed.items[0].link, "https://example.com/rss-item");
        assert_eq!(feed.items[1].link, "https://example.com/atom-entry");
    }

    proptest! {
        #[test]
        fn arbitrary_bytes_never_panic(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let feed = parse_feed(&data);
            prop_assert!(feed.items.iter().all(|i| !i.link.is_empty()));
        }
    }
}
