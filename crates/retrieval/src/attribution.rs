//! Document attribution for search results.
//!
//! Picks the document a set of results mostly came from and turns it into a
//! citation the surrounding service can show next to an answer.

use crate::types::SearchResult;
use serde::{Deserialize, Serialize};

/// Maximum snippet length in bytes.
const MAX_SNIPPET_LENGTH: usize = 150;

/// Where an answer came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub document_id: String,
    pub title: String,
    pub source_locator: String,
    pub is_remote: bool,

    /// Start of the best-scoring chunk from this document
    pub snippet: String,
}

/// Id of the document that contributes the most results.
///
/// Ties go to the document seen first in `results`.
pub fn most_relevant_document(results: &[SearchResult]) -> Option<&str> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for result in results {
        match counts
            .iter_mut()
            .find(|(id, _)| *id == result.document_id.as_str())
        {
            Some((_, count)) => *count += 1,
            None => counts.push((result.document_id.as_str(), 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (id, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((id, count));
        }
    }
    best.map(|(id, _)| id)
}

/// Citation for the most relevant document, built from its first
/// (highest-ranked) result.
pub fn cite(results: &[SearchResult]) -> Option<Citation> {
    let document_id = most_relevant_document(results)?;
    let top = results.iter().find(|r| r.document_id == document_id)?;

    Some(Citation {
        document_id: top.document_id.clone(),
        title: top.document_metadata.title.clone(),
        source_locator: top.document_metadata.source_locator.clone(),
        is_remote: top.document_metadata.is_remote,
        snippet: truncate_snippet(&top.text, MAX_SNIPPET_LENGTH),
    })
}

/// Truncate to at most `max_len` bytes on a word boundary, adding "...".
pub fn truncate_snippet(text: &str, max_len: usize) -> String {
    let text = text.trim();
    if text.len() <= max_len {
        return text.to_string();
    }

    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let truncated = &text[..end];
    match truncated.rfind(char::is_whitespace) {
        Some(last_space) if last_space > 0 => format!("{}...", truncated[..last_space].trim_end()),
        _ => format!("{}...", truncated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentMetadata;
    use chrono::Utc;

    fn result(document_id: &str, score: f64, text: &str) -> SearchResult {
        SearchResult {
            text: text.to_string(),
            score,
            document_id: document_id.to_string(),
            document_metadata: DocumentMetadata {
                filename: format!("{}.pdf", document_id),
                title: format!("Manual {}", document_id),
                author: String::new(),
                page_count: 10,
                created_at: Utc::now(),
                source_locator: format!("https://example.com/{}.pdf", document_id),
                is_remote: true,
                outline: Vec::new(),
            },
            chunk_id: "chunk-0".to_string(),
        }
    }

    #[test]
    fn test_majority_document_wins() {
        let results = vec![
            result("A", 0.9, "a1"),
            result("A", 0.8, "a2"),
            result("B", 0.7, "b1"),
            result("A", 0.6, "a3"),
        ];
        assert_eq!(most_relevant_document(&results), Some("A"));
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        let results = vec![
            result("B", 0.9, "b1"),
            result("A", 0.8, "a1"),
            result("A", 0.7, "a2"),
            result("B", 0.6, "b2"),
        ];
        assert_eq!(most_relevant_document(&results), Some("B"));
    }

    #[test]
    fn test_no_results_no_document() {
        assert_eq!(most_relevant_document(&[]), None);
        assert!(cite(&[]).is_none());
    }

    #[test]
    fn test_cite_uses_best_chunk_of_winner() {
        let results = vec![
            result("B", 0.95, "b best"),
            result("A", 0.9, "a best"),
            result("A", 0.8, "a second"),
        ];
        let citation = cite(&results).unwrap();
        assert_eq!(citation.document_id, "A");
        assert_eq!(citation.title, "Manual A");
        assert_eq!(citation.snippet, "a best");
        assert!(citation.is_remote);
    }

    #[test]
    fn test_truncate_snippet() {
        assert_eq!(truncate_snippet("Short text", 100), "Short text");

        let long = "This is a very long text that needs to be truncated at some point";
        let snippet = truncate_snippet(long, 30);
        assert_eq!(snippet, "This is a very long text that...");

        let accented = "é".repeat(40);
        let snippet = truncate_snippet(&accented, 15);
        assert!(snippet.ends_with("..."));
    }
}
