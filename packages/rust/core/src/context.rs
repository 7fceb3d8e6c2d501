//! Context assembly for article generation.
//!
//! Turns a ranked list of related articles into the bounded text blob fed
//! to the generator so new articles stay consistent with prior ones.

use babelwiki_shared::RelatedArticle;

/// Fixed sentinel used when relevance search finds nothing. The generator
/// prompt is written to proceed coherently from this.
pub const NO_RELATED_CONTEXT: &str = "No related articles found.";

/// Character budget per related-article entry. Entries beyond this fall
/// back to the stored summary, then get truncated outright.
const MAX_ENTRY_CHARS: usize = 2_000;

/// Assemble the context blob from related articles.
///
/// One entry per article, naming its keyword and presenting its body. To
/// keep the payload inside the generation input budget, an article whose
/// content exceeds the per-entry budget contributes its stored summary
/// instead of its full content.
pub fn build_context(related: &[RelatedArticle]) -> String {
    if related.is_empty() {
        return NO_RELATED_CONTEXT.to_string();
    }

    let mut context = String::from("Related articles in our encyclopedia:\n\n");
    for article in related {
        let body = if article.content.len() > MAX_ENTRY_CHARS && !article.summary.trim().is_empty()
        {
            article.summary.as_str()
        } else {
            article.content.as_str()
        };

        context.push_str(&format!(
            "From article about {}:\n{}\n\n",
            article.keyword,
            truncate_entry(body, MAX_ENTRY_CHARS)
        ));
    }

    context
}

/// Truncate an entry to approximately `max_chars` characters, on a char
/// boundary, with an explicit marker.
fn truncate_entry(text: &str, max_chars: usize) -> String {
    if text.len() <= max_chars {
        return text.to_string();
    }

    let cut = text
        .char_indices()
        .take_while(|(i, _)| *i <= max_chars)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(0);
    format!("{}\n[... entry truncated ...]", &text[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn related(keyword: &str, content: &str, summary: &str) -> RelatedArticle {
        RelatedArticle {
            keyword: keyword.into(),
            content: content.into(),
            summary: summary.into(),
            score: 1.0,
        }
    }

    #[test]
    fn empty_input_yields_sentinel() {
        assert_eq!(build_context(&[]), NO_RELATED_CONTEXT);
    }

    #[test]
    fn one_entry_per_related_article() {
        let context = build_context(&[
            related("Atlantis", "An island civilization.", "digest"),
            related("Brass Empire", "A clockwork state.", "digest"),
        ]);

        assert!(context.starts_with("Related articles in our encyclopedia:"));
        assert!(context.contains("From article about Atlantis:\nAn island civilization."));
        assert!(context.contains("From article about Brass Empire:\nA clockwork state."));
    }

    #[test]
    fn entries_do_not_compound_each_other() {
        // Each entry carries only its own article's body.
        let context = build_context(&[
            related("First", "first body", "s"),
            related("Second", "second body", "s"),
        ]);
        assert_eq!(context.matches("first body").count(), 1);
        assert_eq!(context.matches("second body").count(), 1);
    }

    #[test]
    fn long_content_falls_back_to_summary() {
        let long_content = "x".repeat(MAX_ENTRY_CHARS + 1);
        let context = build_context(&[related("Huge", &long_content, "A short digest.")]);
        assert!(context.contains("From article about Huge:\nA short digest."));
        assert!(!context.contains(&long_content));
    }

    #[test]
    fn long_content_without_summary_is_truncated() {
        let long_content = "y".repeat(MAX_ENTRY_CHARS * 2);
        let context = build_context(&[related("Huge", &long_content, "  ")]);
        assert!(context.contains("[... entry truncated ...]"));
        assert!(context.len() < long_content.len());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "é".repeat(MAX_ENTRY_CHARS); // 2 bytes per char
        let truncated = truncate_entry(&text, MAX_ENTRY_CHARS);
        assert!(truncated.contains("[... entry truncated ...]"));
    }
}
