//! What a query produces, and how it is rendered as JSON.
//!
//! Each query path fills exactly one [`Payload`] shape. An empty match set is
//! an [`Outcome::Empty`] carrying the reason, so callers can tell "every
//! token was a stopword" apart from "no document contains all terms".

use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

use crate::documents::DocumentTable;
use crate::index::{DocId, Position};

pub const NO_RESULTS_MESSAGE: &str = "No results found.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    /// The term, document or term combination matched nothing.
    NoMatches,
    /// Every query token was on the stoplist.
    AllStopwords,
    /// Nothing was left of the query after cleaning.
    EmptyQuery,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetHit {
    pub doc_id: DocId,
    pub snippet: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermFrequency {
    pub term: String,
    pub frequency: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermPositions {
    pub term: String,
    pub positions: Vec<Position>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Term, free-text and print-by-word queries: one row per document.
    Snippets(Vec<SnippetHit>),
    /// Document-reverse queries: how often each term occurs in `doc_id`.
    Frequencies { doc_id: DocId, terms: Vec<TermFrequency> },
    /// Print-by-document: the entry log rows recorded for `doc_id`.
    Positions { doc_id: DocId, rows: Vec<TermPositions> },
}

impl Payload {
    fn is_empty(&self) -> bool {
        match self {
            Payload::Snippets(hits) => hits.is_empty(),
            Payload::Frequencies { terms, .. } => terms.is_empty(),
            Payload::Positions { rows, .. } => rows.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Hits(Payload),
    Empty(EmptyReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub label: String,
    pub outcome: Outcome,
}

impl QueryResult {
    /// Wraps `payload`, turning an empty one into `Empty(NoMatches)`.
    pub fn from_payload(label: impl Into<String>, payload: Payload) -> Self {
        let outcome = if payload.is_empty() {
            Outcome::Empty(EmptyReason::NoMatches)
        } else {
            Outcome::Hits(payload)
        };
        Self { label: label.into(), outcome }
    }

    pub fn empty(label: impl Into<String>, reason: EmptyReason) -> Self {
        Self { label: label.into(), outcome: Outcome::Empty(reason) }
    }

    pub fn is_empty(&self) -> bool { matches!(self.outcome, Outcome::Empty(_)) }

    pub fn empty_reason(&self) -> Option<EmptyReason> {
        match self.outcome {
            Outcome::Empty(reason) => Some(reason),
            Outcome::Hits(_) => None,
        }
    }

    pub fn payload(&self) -> Option<&Payload> {
        match &self.outcome {
            Outcome::Hits(payload) => Some(payload),
            Outcome::Empty(_) => None,
        }
    }

    /// Matched documents in discovery order, without duplicates.
    pub fn matched_doc_ids(&self) -> Vec<DocId> {
        match self.payload() {
            Some(Payload::Snippets(hits)) => {
                let mut seen = HashSet::new();
                hits.iter().map(|h| h.doc_id).filter(|id| seen.insert(*id)).collect()
            }
            Some(Payload::Frequencies { doc_id, .. }) | Some(Payload::Positions { doc_id, .. }) => vec![*doc_id],
            None => Vec::new(),
        }
    }

    /// `{"query": ..., "results": [...]}` with one element per row.
    pub fn to_json(&self, documents: &DocumentTable) -> Value {
        let results: Vec<ResultRow<'_>> = match &self.outcome {
            Outcome::Empty(_) => vec![ResultRow::Message { message: NO_RESULTS_MESSAGE }],
            Outcome::Hits(Payload::Snippets(hits)) => hits
                .iter()
                .map(|hit| ResultRow::Document {
                    doc_name: documents.name(hit.doc_id),
                    snippet: hit.snippet.as_deref(),
                })
                .collect(),
            Outcome::Hits(Payload::Frequencies { terms, .. }) => terms
                .iter()
                .map(|t| ResultRow::Frequency { word: &t.term, frequency: t.frequency })
                .collect(),
            Outcome::Hits(Payload::Positions { doc_id, rows }) => rows
                .iter()
                .map(|r| ResultRow::Positions { word: &r.term, doc_id: *doc_id, positions: &r.positions })
                .collect(),
        };
        serde_json::json!({ "query": self.label, "results": results })
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum ResultRow<'a> {
    Document {
        #[serde(rename = "docName")]
        doc_name: Option<String>,
        snippet: Option<&'a str>,
    },
    Frequency {
        word: &'a str,
        frequency: usize,
    },
    Positions {
        word: &'a str,
        #[serde(rename = "docId")]
        doc_id: DocId,
        positions: &'a [Position],
    },
    Message {
        message: &'static str,
    },
}
