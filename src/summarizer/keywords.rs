//! Keyword extraction: TF-IDF across sentences, word frequency as fallback.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use super::chunk::sentences;

/// Default number of keywords returned.
pub const DEFAULT_TOP_K: usize = 8;

/// TF-IDF needs more filtered words than this.
const TFIDF_MIN_WORDS: usize = 10;

/// Sentences this short (in characters) are ignored by TF-IDF.
const MIN_SENTENCE_CHARS: usize = 10;

/// Terms present in a larger share of sentences than this carry no signal.
const MAX_DOC_FREQ: f64 = 0.8;

const MAX_FEATURES: usize = 1000;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "is",
    "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does", "did", "will",
    "would", "could", "should", "may", "might", "must", "can", "this", "that", "these", "those",
    "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us", "them", "my", "your",
    "his", "its", "our", "their",
];

fn punctuation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s]").expect("static punctuation pattern"))
}

/// Lowercased words with punctuation, stop words and words of two
/// characters or fewer removed.
fn content_words(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    punctuation()
        .replace_all(&lowered, " ")
        .split_whitespace()
        .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Extract up to `top_k` keywords from `text`, best first.
pub fn extract_keywords(text: &str, top_k: usize) -> Vec<String> {
    if text.trim().is_empty() || top_k == 0 {
        return Vec::new();
    }

    let words = content_words(text);
    if words.len() > TFIDF_MIN_WORDS {
        if let Some(keywords) = tfidf_keywords(text, top_k) {
            return keywords;
        }
    }
    frequency_keywords(&words, top_k)
}

/// Unigrams followed by bigrams of adjacent content words.
fn terms(words: &[String]) -> Vec<String> {
    let mut terms = words.to_vec();
    terms.extend(words.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
    terms
}

/// Rank terms by their mean l2-normalised TF-IDF weight over sentences.
///
/// Returns `None` when there are fewer than two usable sentences or no term
/// survives document-frequency pruning.
fn tfidf_keywords(text: &str, top_k: usize) -> Option<Vec<String>> {
    let docs: Vec<Vec<String>> = sentences(text)
        .into_iter()
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .map(|s| terms(&content_words(s)))
        .collect();
    if docs.len() < 2 {
        return None;
    }
    let n_docs = docs.len() as f64;

    let mut doc_freq: HashMap<&str, usize> = HashMap::new();
    let mut corpus_freq: HashMap<&str, usize> = HashMap::new();
    for doc in &docs {
        let unique: HashSet<&str> = doc.iter().map(String::as_str).collect();
        for term in unique {
            *doc_freq.entry(term).or_default() += 1;
        }
        for term in doc {
            *corpus_freq.entry(term.as_str()).or_default() += 1;
        }
    }

    let mut kept: Vec<&str> = doc_freq
        .iter()
        .filter(|(_, &df)| df as f64 <= MAX_DOC_FREQ * n_docs)
        .map(|(&term, _)| term)
        .collect();
    if kept.is_empty() {
        return None;
    }
    if kept.len() > MAX_FEATURES {
        kept.sort_by(|a, b| corpus_freq[b].cmp(&corpus_freq[a]).then_with(|| a.cmp(b)));
        kept.truncate(MAX_FEATURES);
    }

    // Smoothed idf: ln((1 + n) / (1 + df)) + 1.
    let idf: BTreeMap<&str, f64> = kept
        .into_iter()
        .map(|term| {
            let df = doc_freq[term] as f64;
            (term, ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0)
        })
        .collect();

    let mut scores: BTreeMap<&str, f64> = BTreeMap::new();
    for doc in &docs {
        let mut weights: HashMap<&str, f64> = HashMap::new();
        for term in doc {
            if let Some((&key, &term_idf)) = idf.get_key_value(term.as_str()) {
                *weights.entry(key).or_default() += term_idf;
            }
        }
        let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm == 0.0 {
            continue;
        }
        for (term, weight) in weights {
            *scores.entry(term).or_default() += weight / norm;
        }
    }

    let mut ranked: Vec<(&str, f64)> = scores
        .into_iter()
        .map(|(term, total)| (term, total / n_docs))
        .filter(|(_, score)| *score > 0.0)
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    Some(
        ranked
            .into_iter()
            .take(top_k)
            .map(|(term, _)| term.to_string())
            .collect(),
    )
}

/// Most frequent words first, ties in order of first appearance; words
/// seen only once are dropped.
fn frequency_keywords(words: &[String], top_k: usize) -> Vec<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for word in words {
        match index.get(word.as_str()) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(word.as_str(), counts.len());
                counts.push((word.as_str(), 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    counts
        .into_iter()
        .take(top_k)
        .filter(|(_, count)| *count > 1)
        .map(|(word, _)| word.to_string())
        .collect()
}
