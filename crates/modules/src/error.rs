//! Module Storage Error Types

use derive_more::{Display, Error};

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// A read-only open found a schema older than this build expects.
    #[display("database schema is outdated (version {_0}); run an ingest to migrate it")]
    SchemaOutdated(#[error(not(source))] i64),
    #[display("module not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// A stored value could not be converted to or from its model.
    #[display("invalid module data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
    /// An object did not satisfy the canonical object schema.
    #[display("object failed validation: {_0}")]
    Validation(#[error(not(source))] String),
    /// The adapter feeding an import stream failed.
    #[display("source adapter failed")]
    Source,
    /// A write was attempted on a module that has already been sealed.
    #[display("module is finalized: {_0}")]
    Finalized(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
