use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::cache::NormalizationCache;
use crate::error::RecordError;
use crate::tokenizer::digit_runs;

pub type DocId = u32;
/// 1-based token offset within a document.
pub type Position = u32;

/// Positions of one term inside each document that contains it.
pub type Postings = BTreeMap<DocId, Vec<Position>>;

/// Term -> document -> positions.
///
/// Positions for a (term, document) pair keep the order they were read in,
/// duplicates included. Terms and documents iterate in sorted order so scans
/// over the index are reproducible.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InvertedIndex {
    postings: BTreeMap<String, Postings>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Append `positions` to the list for (`term`, `doc_id`).
    pub fn insert(&mut self, term: &str, doc_id: DocId, positions: &[Position]) {
        self.postings
            .entry(term.to_string())
            .or_default()
            .entry(doc_id)
            .or_default()
            .extend_from_slice(positions);
    }

    pub fn postings(&self, term: &str) -> Option<&Postings> { self.postings.get(term) }

    pub fn positions(&self, term: &str, doc_id: DocId) -> Option<&[Position]> {
        self.postings.get(term)?.get(&doc_id).map(Vec::as_slice)
    }

    pub fn contains_term(&self, term: &str) -> bool { self.postings.contains_key(term) }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &Postings)> {
        self.postings.iter().map(|(term, postings)| (term.as_str(), postings))
    }

    pub fn num_terms(&self) -> usize { self.postings.len() }
}

/// One accepted raw line, as recorded (term is the index key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub term: String,
    pub doc_id: DocId,
    pub positions: Vec<Position>,
}

/// Every accepted raw line in file order, with a per-document lookup.
#[derive(Debug, Clone, Default)]
pub struct EntryLog {
    entries: Vec<Entry>,
    by_doc: HashMap<DocId, Vec<usize>>,
}

impl EntryLog {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, entry: Entry) {
        self.by_doc.entry(entry.doc_id).or_default().push(self.entries.len());
        self.entries.push(entry);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> { self.entries.iter() }

    /// Entries recorded for `doc_id`, in file order.
    pub fn for_document(&self, doc_id: DocId) -> impl Iterator<Item = &Entry> {
        self.by_doc
            .get(&doc_id)
            .into_iter()
            .flatten()
            .map(move |&i| &self.entries[i])
    }

    pub fn for_term<'a>(&'a self, term: &'a str) -> impl Iterator<Item = &'a Entry> + 'a {
        self.entries.iter().filter(move |e| e.term == term)
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

/// An unparsed `term,docId,positions` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub term: String,
    pub doc_id: String,
    pub positions: String,
}

impl RawRecord {
    pub fn new(term: impl Into<String>, doc_id: impl Into<String>, positions: impl Into<String>) -> Self {
        Self { term: term.into(), doc_id: doc_id.into(), positions: positions.into() }
    }

    /// Split a line on its first two commas; the positions field keeps any
    /// further commas.
    pub fn from_line(line: &str) -> Result<Self, RecordError> {
        let fields: Vec<&str> = line.splitn(3, ',').collect();
        match fields.as_slice() {
            [term, doc_id, positions] => Ok(Self::new(*term, *doc_id, *positions)),
            _ => Err(RecordError::MissingFields { fields: fields.len() }),
        }
    }

    fn parse(&self) -> Result<(DocId, Vec<Position>), RecordError> {
        let doc_id = self
            .doc_id
            .trim()
            .parse::<DocId>()
            .map_err(|_| RecordError::InvalidDocId(self.doc_id.clone()))?;
        let positions = digit_runs(&self.positions)
            .map_err(|_| RecordError::PositionOverflow(self.positions.clone()))?;
        if positions.is_empty() {
            return Err(RecordError::NoPositions(self.positions.clone()));
        }
        Ok((doc_id, positions))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub accepted: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct BuiltIndex {
    pub index: InvertedIndex,
    pub entries: EntryLog,
    pub report: BuildReport,
}

/// Folds raw records into an [`InvertedIndex`] and [`EntryLog`].
///
/// A record that fails to parse is logged and skipped; the build carries on.
pub struct IndexBuilder<'a> {
    stemming: bool,
    cache: &'a NormalizationCache,
    built: BuiltIndex,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(stemming: bool, cache: &'a NormalizationCache) -> Self {
        Self { stemming, cache, built: BuiltIndex::default() }
    }

    pub fn build<I>(mut self, records: I) -> BuiltIndex
    where
        I: IntoIterator<Item = RawRecord>,
    {
        for record in records {
            if let Err(err) = self.add(&record) {
                tracing::warn!(term = %record.term, error = %err, "skipping index record");
            }
        }
        self.finish()
    }

    /// Parse `line` (1-based `line_no`, for diagnostics) and add it.
    pub fn add_line(&mut self, line_no: usize, line: &str) -> Result<(), RecordError> {
        let result = RawRecord::from_line(line).and_then(|record| self.add(&record));
        if let Err(err) = &result {
            if matches!(err, RecordError::MissingFields { .. }) {
                self.built.report.skipped += 1;
            }
            tracing::warn!(line = line_no, error = %err, "skipping index record");
        }
        result
    }

    /// Like [`IndexBuilder::add_line`] for an undecoded line. A line that is
    /// not UTF-8 is skipped and counted like any other bad record.
    pub fn add_bytes(&mut self, line_no: usize, bytes: &[u8]) -> Result<(), RecordError> {
        match std::str::from_utf8(bytes) {
            Ok(line) => self.add_line(line_no, line),
            Err(_) => {
                self.built.report.skipped += 1;
                tracing::warn!(line = line_no, error = %RecordError::InvalidEncoding, "skipping index record");
                Err(RecordError::InvalidEncoding)
            }
        }
    }

    pub fn add(&mut self, record: &RawRecord) -> Result<(), RecordError> {
        let parsed = record.parse().and_then(|(doc_id, positions)| {
            let term = record.term.trim();
            if term.is_empty() {
                Err(RecordError::EmptyTerm)
            } else {
                Ok((term, doc_id, positions))
            }
        });
        let (term, doc_id, positions) = match parsed {
            Ok(parsed) => parsed,
            Err(err) => {
                self.built.report.skipped += 1;
                return Err(err);
            }
        };

        let key = if self.stemming { self.cache.normalize(term) } else { term.to_string() };
        self.built.index.insert(&key, doc_id, &positions);
        self.built.entries.push(Entry { term: key, doc_id, positions });
        self.built.report.accepted += 1;
        Ok(())
    }

    pub fn finish(self) -> BuiltIndex {
        let built = self.built;
        tracing::info!(
            terms = built.index.num_terms(),
            entries = built.entries.len(),
            skipped = built.report.skipped,
            "built inverted index"
        );
        built
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(stemming: bool, cache: &NormalizationCache, lines: &[&str]) -> BuiltIndex {
        let mut builder = IndexBuilder::new(stemming, cache);
        for (i, line) in lines.iter().enumerate() {
            let _ = builder.add_line(i + 1, line);
        }
        builder.finish()
    }

    #[test]
    fn same_pair_concatenates_in_input_order() {
        let cache = NormalizationCache::new();
        let built = build(false, &cache, &["rust,1,\"[9, 2]\"", "rust,1,\"[5, 2]\""]);
        assert_eq!(built.index.positions("rust", 1), Some(&[9, 2, 5, 2][..]));
        assert_eq!(built.entries.len(), 2);
        assert_eq!(built.entries.iter().next().unwrap().positions, vec![9, 2]);
    }

    #[test]
    fn malformed_records_are_skipped() {
        let cache = NormalizationCache::new();
        let built = build(
            false,
            &cache,
            &["rust,abc,[1]", "rust", "rust,2", "rust,3,[]", ",4,[1]", "rust,5,[7]"],
        );
        assert_eq!(built.report, BuildReport { accepted: 1, skipped: 5 });
        assert_eq!(built.index.num_terms(), 1);
        assert_eq!(built.index.positions("rust", 5), Some(&[7][..]));
    }

    #[test]
    fn stemming_keys_by_stem_and_fills_cache() {
        let cache = NormalizationCache::new();
        let built = build(true, &cache, &["running,1,[3]", "runs,2,[4]"]);
        let docs: Vec<DocId> = built.index.postings("run").unwrap().keys().copied().collect();
        assert_eq!(docs, vec![1, 2]);
        assert!(!built.index.contains_term("running"));
        assert_eq!(cache.get("running").as_deref(), Some("run"));
        assert_eq!(built.entries.iter().next().unwrap().term, "run");
    }

    #[test]
    fn verbatim_terms_without_stemming() {
        let cache = NormalizationCache::new();
        let built = build(false, &cache, &["Running,1,[3]"]);
        assert!(built.index.contains_term("Running"));
        assert!(cache.is_empty());
    }

    #[test]
    fn entry_log_indexes_by_document() {
        let cache = NormalizationCache::new();
        let built = build(false, &cache, &["a,1,[1]", "b,2,[2]", "c,1,[3]", "a,1,[4]"]);
        let terms: Vec<&str> = built.entries.for_document(1).map(|e| e.term.as_str()).collect();
        assert_eq!(terms, vec!["a", "c", "a"]);
        assert_eq!(built.entries.for_document(9).count(), 0);
        assert_eq!(built.entries.for_term("a").count(), 2);
    }

    #[test]
    fn undecodable_line_is_counted_not_fatal() {
        let cache = NormalizationCache::new();
        let mut builder = IndexBuilder::new(false, &cache);
        assert!(builder.add_bytes(1, b"rust,1,[1]").is_ok());
        assert_eq!(builder.add_bytes(2, b"caf\xe9,2,[3]"), Err(RecordError::InvalidEncoding));
        assert!(builder.add_bytes(3, b"go,3,[2]").is_ok());
        let built = builder.finish();
        assert_eq!(built.report, BuildReport { accepted: 2, skipped: 1 });
    }

    #[test]
    fn build_from_records() {
        let cache = NormalizationCache::new();
        let built = IndexBuilder::new(false, &cache).build(vec![
            RawRecord::new("x", "1", "1 2"),
            RawRecord::new("x", "one", "1"),
        ]);
        assert_eq!(built.report.accepted, 1);
        assert_eq!(built.report.skipped, 1);
    }
}
