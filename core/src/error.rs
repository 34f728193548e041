//! Typed errors for the two kinds of malformed input the engine sees: lines of
//! the raw index and query/request lines. Both are scoped to one line and are
//! reported, never fatal.

use thiserror::Error;

/// A raw index line that could not become an index entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("expected `term,docId,positions`, found {fields} field(s)")]
    MissingFields { fields: usize },

    #[error("line is not valid UTF-8")]
    InvalidEncoding,

    #[error("empty term")]
    EmptyTerm,

    #[error("document id {0:?} is not an integer")]
    InvalidDocId(String),

    #[error("no positions in {0:?}")]
    NoPositions(String),

    #[error("position out of range in {0:?}")]
    PositionOverflow(String),
}

/// A query line that does not name a valid request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("empty request")]
    Empty,

    #[error("no value given for {0}")]
    MissingValue(String),

    #[error("unknown command {0:?}")]
    UnknownCommand(String),

    #[error("document id {0:?} is not an integer")]
    InvalidDocId(String),
}
