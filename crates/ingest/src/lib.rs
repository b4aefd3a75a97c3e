//! Source normalizers: each adapter reads one scripture corpus and emits
//! canonical [`Hunk`](models::Hunk)s in final reading order.
//!
//! Adapters are strict. Markup outside an adapter's vocabulary aborts the
//! ingest rather than being guessed at, and every file read is registered
//! with [`Provenance`] so the finished module can be sealed with a
//! [`completion_hash`].

mod adapter;
mod consts;
pub mod error;
pub mod models;
mod provenance;
mod source;

pub use crate::adapter::{NetBible, Njps, Sblgnt, njps, sblgnt};
pub use crate::provenance::{Input, Provenance, completion_hash};
pub use crate::source::{Hunks, Source};
