//! Retrieval over a precomputed positional inverted index.
//!
//! The index is read from `term,docId,positions` records, optionally keyed by
//! Porter stems. [`SearchEngine`] answers term, document and conjunctive
//! free-text queries, prints raw index entries, and cuts context snippets out
//! of the source documents.

pub mod cache;
pub mod documents;
pub mod error;
pub mod index;
pub mod persist;
pub mod query;
pub mod request;
pub mod result;
pub mod snippet;
pub mod stemmer;
pub mod tokenizer;

pub use cache::NormalizationCache;
pub use documents::DocumentTable;
pub use error::{RecordError, RequestError};
pub use index::{BuildReport, BuiltIndex, DocId, Entry, EntryLog, IndexBuilder, InvertedIndex, Position, RawRecord};
pub use query::{EngineConfig, SearchEngine, DEFAULT_SNIPPET_RADIUS};
pub use request::Request;
pub use result::{EmptyReason, Outcome, Payload, QueryResult, SnippetHit, TermFrequency, TermPositions};
pub use stemmer::stem;
pub use tokenizer::Stoplist;
