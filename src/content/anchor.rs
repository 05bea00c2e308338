//! Best-effort highlight re-anchoring.
//!
//! Highlights are stored as verbatim quotes, not offsets or DOM ranges, so
//! reapplying them is plain substring search: if the quote still occurs in
//! the content, its first occurrence is wrapped in a `<mark>` carrying the
//! note. Known limitations, kept deliberately: a quote that spans an HTML
//! tag boundary no longer matches and is skipped; a quote that occurs more
//! than once binds to the first textual occurrence. Stored highlights
//! predate any offset scheme, so this stays substring-based.

use crate::storage::Highlight;

/// Wrap each highlight's first occurrence in the content with a
/// `<mark class="highlight" data-note="...">` marker.
///
/// Highlights are applied in the order given; quotes that no longer occur
/// are skipped silently.
pub fn apply_highlights(content: &str, highlights: &[Highlight]) -> String {
    let mut updated = content.to_string();

    for highlight in highlights {
        if highlight.quote.is_empty() || !updated.contains(&highlight.quote) {
            continue;
        }
        let safe_note = highlight.note.replace('"', "&quot;");
        let mark = format!(
            r#"<mark class="highlight" data-note="{}">{}</mark>"#,
            safe_note, highlight.quote
        );
        updated = updated.replacen(&highlight.quote, &mark, 1);
    }

    updated
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn highlight(quote: &str, note: &str) -> Highlight {
        Highlight {
            id: 1,
            article_id: 1,
            quote: quote.to_string(),
            note: note.to_string(),
            created_at: "2025-01-06 10:00:00".to_string(),
        }
    }

    #[test]
    fn two_distinct_quotes_both_wrapped_with_own_notes() {
        let content = "<p>The quick brown fox jumps over the lazy dog.</p>";
        let highlights = vec![
            highlight("quick brown fox", "speedy"),
            highlight("lazy dog", "sleepy"),
        ];

        let out = apply_highlights(content, &highlights);
        assert!(out.contains(
            r#"<mark class="highlight" data-note="speedy">quick brown fox</mark>"#
        ));
        assert!(out.contains(r#"<mark class="highlight" data-note="sleepy">lazy dog</mark>"#));
    }

    #[test]
    fn only_first_occurrence_is_wrapped() {
        let content = "echo echo echo";
        let out = apply_highlights(content, &[highlight("echo", "")]);
        assert_eq!(
            out,
            r#"<mark class="highlight" data-note="">echo</mark> echo echo"#
        );
    }

    #[test]
    fn vanished_quote_is_skipped() {
        let content = "<p>Nothing to see here.</p>";
        let out = apply_highlights(content, &[highlight("missing text", "note")]);
        assert_eq!(out, content);
    }

    #[test]
    fn note_quotes_are_escaped_into_the_attribute() {
        let content = "some quoted words";
        let out = apply_highlights(content, &[highlight("quoted", r#"he said "hi""#)]);
        assert!(out.contains(r#"data-note="he said &quot;hi&quot;""#));
    }

    #[test]
    fn empty_quote_is_ignored() {
        let content = "untouched";
        let out = apply_highlights(content, &[highlight("", "note")]);
        assert_eq!(out, content);
    }
}
