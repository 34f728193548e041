use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::num::ParseIntError;

use crate::index::Position;

lazy_static! {
    static ref NON_QUERY_CHARS: Regex = Regex::new(r"[^a-zA-Z0-9\s]").expect("valid regex");
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").expect("valid regex");
    static ref MARKUP_TAG: Regex = Regex::new(r"<[^>]*>").expect("valid regex");
    static ref NON_TEXT_CHARS: Regex = Regex::new(r"[^a-z0-9\s]").expect("valid regex");
    static ref DIGIT_RUN: Regex = Regex::new(r"[0-9]+").expect("valid regex");
}

/// Terms ignored by free-text queries.
#[derive(Debug, Clone, Default)]
pub struct Stoplist {
    terms: HashSet<String>,
}

impl Stoplist {
    pub fn new() -> Self { Self::default() }

    /// Builds a stoplist from raw lines; each is trimmed and lowercased, blanks are dropped.
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { terms }
    }

    pub fn contains(&self, token: &str) -> bool { self.terms.contains(token) }

    pub fn len(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }
}

/// Strip everything outside `[a-zA-Z0-9\s]`, collapse whitespace runs and trim.
/// Case is kept so the cleaned text can be echoed back as the query label.
pub fn clean_query(text: &str) -> String {
    let stripped = NON_QUERY_CHARS.replace_all(text, "");
    WHITESPACE_RUN.replace_all(stripped.trim(), " ").into_owned()
}

/// Lowercased whitespace-separated tokens of an already cleaned query.
pub fn query_tokens(cleaned: &str) -> Vec<String> {
    cleaned.split_whitespace().map(str::to_lowercase).collect()
}

/// Tokenize document text the way positions were counted: lowercase, markup
/// tags and non-alphanumerics become spaces. Token `i` sits at position `i + 1`.
pub fn document_tokens(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let untagged = MARKUP_TAG.replace_all(&lowered, " ");
    let plain = NON_TEXT_CHARS.replace_all(&untagged, " ");
    plain.split_whitespace().map(str::to_string).collect()
}

/// Every run of ASCII digits in `field`, in order. Surrounding text such as
/// brackets, commas or quotes is ignored.
pub fn digit_runs(field: &str) -> Result<Vec<Position>, ParseIntError> {
    DIGIT_RUN.find_iter(field).map(|m| m.as_str().parse()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_query_strips_punctuation_and_collapses_space() {
        assert_eq!(clean_query("  Machine,   learning!! (2024) "), "Machine learning 2024");
        assert_eq!(clean_query("don't-stop"), "dontstop");
        assert_eq!(clean_query("?!"), "");
    }

    #[test]
    fn query_tokens_are_lowercased() {
        assert_eq!(query_tokens("Machine Learning"), vec!["machine", "learning"]);
        assert!(query_tokens("").is_empty());
    }

    #[test]
    fn document_tokens_drop_markup() {
        let tokens = document_tokens("<html><b>Deep</b> learning, e.g. <i>CNNs</i></html>");
        assert_eq!(tokens, vec!["deep", "learning", "e", "g", "cnns"]);
    }

    #[test]
    fn digit_runs_ignore_surrounding_text() {
        assert_eq!(digit_runs("\"[3, 17, 42]\"").unwrap(), vec![3, 17, 42]);
        assert_eq!(digit_runs("5 9").unwrap(), vec![5, 9]);
        assert!(digit_runs("none").unwrap().is_empty());
        assert!(digit_runs("99999999999").is_err());
    }

    #[test]
    fn stoplist_normalizes_lines() {
        let stop = Stoplist::from_terms(["The ", "", "  and", "OF"]);
        assert_eq!(stop.len(), 3);
        assert!(stop.contains("the"));
        assert!(stop.contains("and"));
        assert!(stop.contains("of"));
        assert!(!stop.contains(""));
    }
}
