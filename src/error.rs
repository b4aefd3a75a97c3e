//! Command Error Types

use std::path::PathBuf;

use derive_more::{Display, Error};

/// A command error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for commands.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("configuration error")]
    Config,
    #[display("module storage error")]
    Storage,
    /// The source adapter failed before producing a stream.
    #[display("ingest failed")]
    Ingest,
    #[display("catalog query failed")]
    Catalog,
    #[display("download failed: {_0}")]
    Fetch(#[error(not(source))] String),
    #[display("filesystem error: {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
    #[display("could not write output")]
    Output,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Fetch(_))
    }
}
