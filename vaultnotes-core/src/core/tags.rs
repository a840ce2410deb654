//! `#tag` extraction from note text.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

// `#` is a non-word character, so `\B` before it means "start of text or a
// non-word character precedes": `foo#bar` does not match, `(#bar` does.
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\B#(\w+)").expect("valid tag regex"));

/// Returns the distinct tags in `text`, sorted, without the leading `#`.
pub fn extract_tags(text: &str) -> BTreeSet<String> {
    TAG_RE
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(text: &str) -> Vec<String> {
        extract_tags(text).into_iter().collect()
    }

    #[test]
    fn test_sorted_and_deduplicated() {
        assert_eq!(tags("#zeta #alpha #zeta and #beta"), vec!["alpha", "beta", "zeta"]);
    }

    #[test]
    fn test_word_character_before_hash_blocks_match() {
        assert!(tags("foo#bar").is_empty());
        assert_eq!(tags("(#bar) x#y #z"), vec!["bar", "z"]);
    }

    #[test]
    fn test_start_of_text_and_line() {
        assert_eq!(tags("#first\n#second"), vec!["first", "second"]);
    }

    #[test]
    fn test_markdown_heading_is_not_a_tag() {
        assert!(tags("# Heading\n## Sub").is_empty());
    }

    #[test]
    fn test_adjacent_hashes() {
        assert_eq!(tags("##double #a#b"), vec!["a", "double"]);
    }

    #[test]
    fn test_unicode_word_characters() {
        assert_eq!(tags("#café #日本"), vec!["café", "日本"]);
    }

    #[test]
    fn test_empty_text() {
        assert!(extract_tags("").is_empty());
    }

    #[test]
    fn test_idempotent_over_own_rendering() {
        let text = "Welcome #todo and #later #todo";
        let rendered: String = extract_tags(text)
            .iter()
            .map(|t| format!("#{t}"))
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(extract_tags(&rendered), extract_tags(text));
    }
}
