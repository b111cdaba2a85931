//! Sentence-based text chunking.

use std::sync::OnceLock;

use regex::Regex;
use tracing::info;

/// Approximate characters per model token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Default chunk size in tokens.
pub const DEFAULT_MAX_TOKENS: usize = 1000;

fn sentence_end() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]+").expect("static sentence pattern"))
}

/// Split `text` into trimmed, non-empty sentences.
pub(crate) fn sentences(text: &str) -> Vec<&str> {
    sentence_end()
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Rough token count: characters divided by four.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / CHARS_PER_TOKEN
}

/// Pack sentences into chunks of at most `max_tokens * 4` characters.
///
/// Sentence terminators are dropped and sentences are joined by a single
/// space. A sentence that alone exceeds the limit becomes its own chunk.
pub fn chunk_text(text: &str, max_tokens: usize) -> Vec<String> {
    let max_chars = max_tokens * CHARS_PER_TOKEN;
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in sentences(text) {
        let len = sentence.chars().count();
        if !current.is_empty() && current_len + len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(sentence);
        current_len += len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    info!("Split text into {} chunks", chunks.len());
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_chunk() {
        assert_eq!(
            chunk_text("First point. Second point!  Third?", DEFAULT_MAX_TOKENS),
            vec!["First point Second point Third"]
        );
    }

    #[test]
    fn test_splits_at_limit() {
        assert_eq!(chunk_text("One. Two! Three?", 1), vec!["One", "Two", "Three"]);
        // The joining space is not counted against the limit.
        assert_eq!(chunk_text("aa. bb. cc. dd.", 2), vec!["aa bb cc", "dd"]);
    }

    #[test]
    fn test_oversized_sentence_kept_whole() {
        let long = "x".repeat(20);
        assert_eq!(chunk_text(&format!("{long}. y."), 1), vec![long, "y".to_string()]);
    }

    #[test]
    fn test_empty_and_punctuation_only() {
        assert!(chunk_text("", DEFAULT_MAX_TOKENS).is_empty());
        assert!(chunk_text(" ...!? ", DEFAULT_MAX_TOKENS).is_empty());
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcdefgh"), 2);
        assert_eq!(estimate_tokens("abcdefghij"), 2);
    }
}
