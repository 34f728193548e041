use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::cache::NormalizationCache;
use crate::documents::DocumentTable;
use crate::index::{BuiltIndex, DocId, EntryLog, InvertedIndex, Position};
use crate::request::Request;
use crate::result::{EmptyReason, Payload, QueryResult, SnippetHit, TermFrequency, TermPositions};
use crate::snippet::SnippetGenerator;
use crate::tokenizer::{clean_query, query_tokens, Stoplist};

pub const DEFAULT_SNIPPET_RADIUS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Normalize terms with the Porter stemmer (through the cache).
    pub stemming: bool,
    /// Tokens shown on each side of a snippet's anchor.
    pub snippet_radius: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { stemming: false, snippet_radius: DEFAULT_SNIPPET_RADIUS }
    }
}

/// Read-only view over a built index plus the lexical resources queries need.
///
/// Every evaluation takes `&self`; the normalization cache is the only state
/// that changes, and it synchronizes itself.
pub struct SearchEngine {
    index: InvertedIndex,
    entries: EntryLog,
    stoplist: Stoplist,
    cache: NormalizationCache,
    documents: DocumentTable,
    snippets: SnippetGenerator,
    config: EngineConfig,
}

impl SearchEngine {
    pub fn new(
        built: BuiltIndex,
        stoplist: Stoplist,
        cache: NormalizationCache,
        documents: DocumentTable,
        config: EngineConfig,
    ) -> Self {
        Self {
            index: built.index,
            entries: built.entries,
            stoplist,
            cache,
            documents,
            snippets: SnippetGenerator::new(config.snippet_radius),
            config,
        }
    }

    pub fn index(&self) -> &InvertedIndex { &self.index }

    pub fn entries(&self) -> &EntryLog { &self.entries }

    pub fn cache(&self) -> &NormalizationCache { &self.cache }

    pub fn documents(&self) -> &DocumentTable { &self.documents }

    pub fn config(&self) -> &EngineConfig { &self.config }

    /// Index key for a query token.
    fn normalize(&self, token: &str) -> String {
        if self.config.stemming {
            self.cache.normalize(token)
        } else {
            token.to_string()
        }
    }

    pub fn run(&self, request: &Request) -> QueryResult {
        match request {
            Request::Word(word) => self.search_word(word),
            Request::Document(doc_id) => self.search_document(*doc_id),
            Request::Query(text) => self.search_query(text),
            Request::PrintWord(word) => self.print_word(word),
            Request::PrintDocument(doc_id) => self.print_document(*doc_id),
        }
    }

    /// Evaluate `-SEARCH=...`/`-PRINT_INDEX=...` lines in parallel.
    ///
    /// Blank lines are ignored and malformed ones are logged and skipped.
    /// Results keep input order and are labelled `query <n>: <line>`, counting
    /// only the lines that parsed.
    pub fn run_batch<S>(&self, lines: &[S]) -> Vec<QueryResult>
    where
        S: AsRef<str> + Sync,
    {
        let requests: Vec<(&str, Request)> = lines
            .iter()
            .map(|line| line.as_ref().trim())
            .filter(|line| !line.is_empty())
            .filter_map(|line| match Request::parse_command(line) {
                Ok(request) => Some((line, request)),
                Err(err) => {
                    tracing::warn!(line, error = %err, "skipping query line");
                    None
                }
            })
            .collect();

        requests
            .par_iter()
            .enumerate()
            .map(|(i, (line, request))| {
                let mut result = self.run(request);
                result.label = format!("query {}: {}", i + 1, line);
                result
            })
            .collect()
    }

    /// Documents containing `word`, each with a snippet around the term's
    /// first position.
    pub fn search_word(&self, word: &str) -> QueryResult {
        let word = word.trim().to_lowercase();
        let label = format!("Search by word: {word}");
        let key = self.normalize(&word);

        let Some(postings) = self.index.postings(&key) else {
            tracing::debug!(%word, %key, "word not in index");
            return QueryResult::empty(label, EmptyReason::NoMatches);
        };
        let hits = postings
            .iter()
            .map(|(&doc_id, positions)| SnippetHit {
                doc_id,
                snippet: positions
                    .iter()
                    .min()
                    .and_then(|&anchor| self.snippets.generate(&self.documents, doc_id, anchor)),
            })
            .collect();
        QueryResult::from_payload(label, Payload::Snippets(hits))
    }

    /// Every term recorded for `doc_id` with its number of positions there.
    pub fn search_document(&self, doc_id: DocId) -> QueryResult {
        let terms = self
            .index
            .terms()
            .filter_map(|(term, postings)| {
                postings
                    .get(&doc_id)
                    .map(|positions| TermFrequency { term: term.to_string(), frequency: positions.len() })
            })
            .collect();
        QueryResult::from_payload(format!("Document ID: {doc_id}"), Payload::Frequencies { doc_id, terms })
    }

    /// Conjunctive free-text query.
    pub fn search_query(&self, text: &str) -> QueryResult {
        let cleaned = clean_query(text);
        let label = format!("Query: {cleaned}");

        let tokens = query_tokens(&cleaned);
        if tokens.is_empty() {
            return QueryResult::empty(label, EmptyReason::EmptyQuery);
        }
        let kept: Vec<&String> = tokens.iter().filter(|t| !self.stoplist.contains(t)).collect();
        if kept.is_empty() {
            tracing::debug!(query = %cleaned, "all query words are stopwords");
            return QueryResult::empty(label, EmptyReason::AllStopwords);
        }
        let terms: BTreeSet<String> = kept.into_iter().map(|t| self.normalize(t)).collect();

        let hits: Vec<SnippetHit> = self
            .conjunctive_docs(&terms)
            .into_iter()
            .map(|doc_id| SnippetHit {
                doc_id,
                snippet: self
                    .first_position(&terms, doc_id)
                    .and_then(|anchor| self.snippets.generate(&self.documents, doc_id, anchor)),
            })
            .collect();
        if hits.is_empty() {
            tracing::debug!(query = %cleaned, "no document contains every query term");
        }
        QueryResult::from_payload(label, Payload::Snippets(hits))
    }

    /// Documents in every term's postings, ascending.
    fn conjunctive_docs(&self, terms: &BTreeSet<String>) -> Vec<DocId> {
        let mut candidates: Option<BTreeSet<DocId>> = None;
        for term in terms {
            let Some(postings) = self.index.postings(term) else {
                tracing::debug!(%term, "query term not in index");
                return Vec::new();
            };
            let narrowed: BTreeSet<DocId> = match candidates {
                None => postings.keys().copied().collect(),
                Some(current) => current.into_iter().filter(|id| postings.contains_key(id)).collect(),
            };
            if narrowed.is_empty() {
                return Vec::new();
            }
            candidates = Some(narrowed);
        }
        candidates.map(|docs| docs.into_iter().collect()).unwrap_or_default()
    }

    /// Earliest position of any of `terms` in `doc_id`.
    fn first_position(&self, terms: &BTreeSet<String>, doc_id: DocId) -> Option<Position> {
        terms
            .iter()
            .filter_map(|term| self.index.positions(term, doc_id))
            .flat_map(|positions| positions.iter().copied())
            .min()
    }

    /// Entry log rows whose term equals the lowercased `word`, compared as
    /// typed (the log holds index keys, so under stemming the caller gives a
    /// stem).
    ///
    /// One row per matching record, in log order, with the synthetic snippet
    /// `Positions: [..]`.
    pub fn print_word(&self, word: &str) -> QueryResult {
        let word = word.trim().to_lowercase();
        let label = format!("Index entries for word: {word}");

        let hits = self
            .entries
            .for_term(&word)
            .map(|entry| SnippetHit {
                doc_id: entry.doc_id,
                snippet: Some(format!("Positions: {:?}", entry.positions)),
            })
            .collect();
        QueryResult::from_payload(label, Payload::Snippets(hits))
    }

    /// Entry log rows for `doc_id`, one per recorded line.
    pub fn print_document(&self, doc_id: DocId) -> QueryResult {
        let rows = self
            .entries
            .for_document(doc_id)
            .map(|entry| TermPositions { term: entry.term.clone(), positions: entry.positions.clone() })
            .collect();
        QueryResult::from_payload(
            format!("Index entries for Document ID: {doc_id}"),
            Payload::Positions { doc_id, rows },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexBuilder;
    use crate::result::Outcome;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn engine(lines: &[&str], stoplist: &[&str], config: EngineConfig) -> SearchEngine {
        let cache = NormalizationCache::new();
        let mut builder = IndexBuilder::new(config.stemming, &cache);
        for (i, line) in lines.iter().enumerate() {
            let _ = builder.add_line(i + 1, line);
        }
        let built = builder.finish();
        SearchEngine::new(built, Stoplist::from_terms(stoplist), cache, DocumentTable::new(), config)
    }

    fn plain(lines: &[&str]) -> SearchEngine {
        engine(lines, &["the", "and", "of"], EngineConfig::default())
    }

    #[test]
    fn boolean_query_intersects_postings() {
        let e = plain(&["machine,1,[1]", "machine,2,[4]", "learning,2,[5]", "learning,3,[2]"]);
        let result = e.search_query("machine learning");
        assert_eq!(result.label, "Query: machine learning");
        assert_eq!(result.matched_doc_ids(), vec![2]);
    }

    #[test]
    fn absent_term_short_circuits_to_no_matches() {
        let e = plain(&["machine,1,[1]"]);
        let result = e.search_query("machine unicorn");
        assert_eq!(result.empty_reason(), Some(EmptyReason::NoMatches));
    }

    #[test]
    fn stopword_only_query_is_distinguished() {
        let e = plain(&["machine,1,[1]", "learning,2,[1]"]);
        assert_eq!(e.search_query("The and OF").empty_reason(), Some(EmptyReason::AllStopwords));
        assert_eq!(e.search_query("machine learning").empty_reason(), Some(EmptyReason::NoMatches));
        assert_eq!(e.search_query("?!").empty_reason(), Some(EmptyReason::EmptyQuery));
    }

    #[test]
    fn duplicate_tokens_collapse() {
        let e = plain(&["rust,4,[2]"]);
        assert_eq!(e.search_query("rust Rust RUST").matched_doc_ids(), vec![4]);
    }

    #[test]
    fn stemmed_query_matches_variants() {
        let config = EngineConfig { stemming: true, ..EngineConfig::default() };
        let e = engine(&["networks,1,[3]", "networking,2,[8]"], &[], config);
        assert_eq!(e.search_query("network").matched_doc_ids(), vec![1, 2]);
        assert_eq!(e.search_word("Networked").matched_doc_ids(), vec![1, 2]);
        assert!(e.cache().get("networked").is_some());
    }

    #[test]
    fn word_search_absent_is_empty_not_error() {
        let e = plain(&["rust,1,[1]"]);
        let result = e.search_word("python");
        assert_eq!(result.label, "Search by word: python");
        assert_eq!(result.empty_reason(), Some(EmptyReason::NoMatches));
    }

    #[test]
    fn word_search_without_document_table_has_no_snippet() {
        let e = plain(&["rust,1,[3, 1]"]);
        match e.search_word("RUST").outcome {
            Outcome::Hits(Payload::Snippets(hits)) => {
                assert_eq!(hits, vec![SnippetHit { doc_id: 1, snippet: None }]);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn document_reverse_counts_positions() {
        let e = plain(&["beta,1,[1, 5]", "alpha,1,[2]", "alpha,2,[1]", "beta,1,[9]"]);
        let result = e.search_document(1);
        let Some(Payload::Frequencies { doc_id, terms }) = result.payload() else {
            panic!("expected frequencies");
        };
        assert_eq!(*doc_id, 1);
        let pairs: Vec<(&str, usize)> = terms.iter().map(|t| (t.term.as_str(), t.frequency)).collect();
        assert_eq!(pairs, vec![("alpha", 1), ("beta", 3)]);
    }

    #[test]
    fn document_reverse_unknown_id_is_empty() {
        let e = plain(&["alpha,1,[2]"]);
        assert_eq!(e.search_document(42).empty_reason(), Some(EmptyReason::NoMatches));
    }

    #[test]
    fn print_document_keeps_log_rows() {
        let e = plain(&["beta,1,[1]", "alpha,2,[2]", "beta,1,[7]"]);
        let result = e.print_document(1);
        let Some(Payload::Positions { rows, .. }) = result.payload() else {
            panic!("expected positions");
        };
        let rows: Vec<(&str, &[Position])> = rows.iter().map(|r| (r.term.as_str(), r.positions.as_slice())).collect();
        assert_eq!(rows, vec![("beta", &[1][..]), ("beta", &[7][..])]);
    }

    #[test]
    fn print_word_lists_one_row_per_record() {
        let e = plain(&["rust,2,[4]", "rust,1,[1, 3]", "go,1,[2]", "rust,2,[6]"]);
        let result = e.print_word("Rust");
        assert_eq!(result.label, "Index entries for word: rust");
        let Some(Payload::Snippets(hits)) = result.payload() else {
            panic!("expected snippets");
        };
        let listed: Vec<(DocId, Option<&str>)> = hits.iter().map(|h| (h.doc_id, h.snippet.as_deref())).collect();
        assert_eq!(
            listed,
            vec![(2, Some("Positions: [4]")), (1, Some("Positions: [1, 3]")), (2, Some("Positions: [6]"))]
        );
        assert_eq!(result.matched_doc_ids(), vec![2, 1]);
    }

    #[test]
    fn print_word_matches_recorded_key_as_typed() {
        let config = EngineConfig { stemming: true, ..EngineConfig::default() };
        let e = engine(&["agreed,1,[4]"], &[], config);
        let result = e.print_word("agre");
        assert_eq!(result.label, "Index entries for word: agre");
        let Some(Payload::Snippets(hits)) = result.payload() else {
            panic!("expected snippets");
        };
        assert_eq!(hits, &vec![SnippetHit { doc_id: 1, snippet: Some("Positions: [4]".into()) }]);
        assert_eq!(e.print_word("agreed").empty_reason(), Some(EmptyReason::NoMatches));
    }

    fn with_document(lines: &[&str], text: &str, radius: usize) -> (TempDir, SearchEngine) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("1.txt");
        fs::write(&path, text).unwrap();
        let cache = NormalizationCache::new();
        let mut builder = IndexBuilder::new(false, &cache);
        for (i, line) in lines.iter().enumerate() {
            builder.add_line(i + 1, line).unwrap();
        }
        let documents: DocumentTable = [(1u32, path)].into_iter().collect();
        let config = EngineConfig { snippet_radius: radius, ..EngineConfig::default() };
        let engine = SearchEngine::new(builder.finish(), Stoplist::new(), cache, documents, config);
        (dir, engine)
    }

    fn only_snippet(result: &QueryResult) -> Option<String> {
        match result.payload() {
            Some(Payload::Snippets(hits)) if hits.len() == 1 => hits[0].snippet.clone(),
            other => panic!("expected one hit, got {other:?}"),
        }
    }

    #[test]
    fn word_snippet_centres_on_smallest_position() {
        let (_dir, e) = with_document(&["rust,1,[5, 2]"], "alpha rust gamma delta rust zeta", 1);
        assert_eq!(only_snippet(&e.search_word("rust")).as_deref(), Some("alpha rust gamma"));
    }

    #[test]
    fn query_snippet_centres_on_earliest_term() {
        // "six" sorts first but "two" occurs earlier.
        let (_dir, e) = with_document(&["two,1,[2]", "six,1,[6]"], "one two three four five six", 1);
        assert_eq!(only_snippet(&e.search_query("two six")).as_deref(), Some("one two three"));

        let (_dir, e) = with_document(&["two,1,[2]", "six,1,[6]"], "one two three four five six", 0);
        assert_eq!(only_snippet(&e.search_query("six two")).as_deref(), Some("two"));
    }

    #[test]
    fn batch_preserves_order_and_skips_bad_lines() {
        let e = plain(&["machine,1,[1]", "learning,1,[2]"]);
        let lines = [
            "-SEARCH=QUERY machine learning",
            "",
            "-SEARCH=NOPE x",
            "-SEARCH=DOC 1",
            "-SEARCH=WORD absent",
        ];
        let results = e.run_batch(&lines);
        let labels: Vec<&str> = results.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "query 1: -SEARCH=QUERY machine learning",
                "query 2: -SEARCH=DOC 1",
                "query 3: -SEARCH=WORD absent",
            ]
        );
        assert_eq!(results[0].matched_doc_ids(), vec![1]);
        assert!(results[2].is_empty());
    }
}
