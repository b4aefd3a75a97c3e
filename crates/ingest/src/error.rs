//! Ingest Error Types
//!
//! Every adapter aborts on the first construct it does not understand; there
//! is no partial recovery, so none of these are retryable.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An ingest error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for ingest operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A source file could not be read.
    #[display("unable to read source file: {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
    /// The source is structurally broken (invalid JSON/XML, missing elements).
    #[display("malformed source: {_0}")]
    MalformedSource(#[error(not(source))] String),
    /// A tag or class outside the adapter's closed vocabulary.
    #[display("unrecognized markup: {_0}")]
    UnrecognizedMarkup(#[error(not(source))] String),
    #[display("nested footnotes are not supported")]
    NestedFootnote,
    #[display("invalid footnote marker: {_0:?}")]
    InvalidFootnoteMarker(#[error(not(source))] String),
    /// A verse reference or cross-reference code could not be parsed.
    #[display("invalid reference: {_0:?}")]
    InvalidReference(#[error(not(source))] String),
    /// A hunk does not satisfy the canonical object schema.
    #[display("hunk failed validation: {_0}")]
    Validation(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Source files are either well-formed or they're not.
        false
    }
}
