//! Context windows around a token position.
//!
//! Documents are re-tokenized on every call with [`document_tokens`], the same
//! way positions in the index were counted. A document that cannot be read
//! only costs that one snippet.

use std::path::Path;

use crate::documents::DocumentTable;
use crate::index::{DocId, Position};
use crate::tokenizer::document_tokens;

/// Tokens within `radius` of the 1-based `anchor`, joined by single spaces.
///
/// `None` when `anchor` is not a position inside `tokens` (which includes an
/// empty token list).
pub fn window<S: AsRef<str>>(tokens: &[S], anchor: Position, radius: usize) -> Option<String> {
    let anchor = usize::try_from(anchor).ok()?;
    if anchor == 0 || anchor > tokens.len() {
        return None;
    }
    let center = anchor - 1;
    let start = center.saturating_sub(radius);
    let end = center.saturating_add(radius).min(tokens.len() - 1);
    let text = tokens[start..=end]
        .iter()
        .map(|token| token.as_ref())
        .collect::<Vec<&str>>()
        .join(" ");
    Some(text.trim().to_string())
}

/// Snippet of the document at `path`, or `None` if it cannot be read or the
/// anchor is outside it.
pub fn snippet(path: &Path, anchor: Position, radius: usize) -> Option<String> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "cannot read document for snippet");
            return None;
        }
    };
    let text = String::from_utf8_lossy(&bytes);
    window(&document_tokens(&text), anchor, radius)
}

#[derive(Debug, Clone, Copy)]
pub struct SnippetGenerator {
    radius: usize,
}

impl SnippetGenerator {
    pub fn new(radius: usize) -> Self { Self { radius } }

    pub fn radius(&self) -> usize { self.radius }

    pub fn generate(&self, documents: &DocumentTable, doc_id: DocId, anchor: Position) -> Option<String> {
        let Some(path) = documents.path(doc_id) else {
            tracing::warn!(doc_id, "document id missing from document table");
            return None;
        };
        snippet(path, anchor, self.radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const FIVE: [&str; 5] = ["a", "b", "c", "d", "e"];

    #[test]
    fn window_centered() {
        assert_eq!(window(&FIVE, 3, 2).as_deref(), Some("a b c d e"));
        assert_eq!(window(&FIVE, 3, 1).as_deref(), Some("b c d"));
        assert_eq!(window(&FIVE, 3, 0).as_deref(), Some("c"));
    }

    #[test]
    fn window_clamps_at_edges() {
        assert_eq!(window(&FIVE, 1, 2).as_deref(), Some("a b c"));
        assert_eq!(window(&FIVE, 5, 2).as_deref(), Some("c d e"));
        assert_eq!(window(&FIVE, 2, 100).as_deref(), Some("a b c d e"));
    }

    #[test]
    fn window_outside_tokens_is_none() {
        assert_eq!(window(&FIVE, 0, 2), None);
        assert_eq!(window(&FIVE, 6, 2), None);
        let empty: [&str; 0] = [];
        assert_eq!(window(&empty, 1, 2), None);
    }

    #[test]
    fn snippet_reads_and_tokenizes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.html");
        fs::write(&path, "<p>The Quick, brown fox!</p> jumps <b>over</b> it").unwrap();
        assert_eq!(snippet(&path, 4, 1).as_deref(), Some("brown fox jumps"));
    }

    #[test]
    fn unreadable_document_is_none() {
        let dir = tempdir().unwrap();
        assert_eq!(snippet(&dir.path().join("missing.txt"), 1, 2), None);
    }

    #[test]
    fn generator_resolves_through_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("1.txt");
        fs::write(&path, "one two three").unwrap();
        let table: DocumentTable = [(1u32, path)].into_iter().collect();
        let snippets = SnippetGenerator::new(1);
        assert_eq!(snippets.generate(&table, 1, 1).as_deref(), Some("one two"));
        assert_eq!(snippets.generate(&table, 2, 1), None);
    }
}
