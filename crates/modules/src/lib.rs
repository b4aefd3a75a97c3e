//! SQLite storage for scripture modules.
//!
//! A module is one ingested edition of a source corpus. Each module lives
//! under its own namespace (`ex_v1:<uuid>`) and is written exactly once:
//! books are registered, hunk streams are imported in reading order with
//! contiguous linear ids, the source files are recorded, and finally the
//! module is sealed with a content hash derived from those files.
//!
//! Sealed modules are immutable. Anything without a content hash is an
//! abandoned or in-progress import and is ignored by readers.
//!
//! # Architecture
//! - [`Database`]: a writable pool for ingest or a read-only pool for the
//!   catalog, over the same file.
//! - [`Manager`]: allocates namespaces, lists modules, reopens handles.
//! - [`ModuleHandle`]: per-module writer. Each book stream is imported in a
//!   single transaction, so a failing adapter leaves no partial book behind.

mod db;
pub mod error;
mod handle;
mod manager;
mod models;

pub use crate::db::{Access, DEFAULT_MAX_CONNECTIONS, Database};
pub use crate::handle::ModuleHandle;
pub use crate::manager::{Manager, SCHEMA_PREFIX, SCHEMA_VERSION};
pub use crate::models::ModuleInfo;
