//! Query side of the scripture library.
//!
//! A [`Catalog`] is loaded once from the module database and serves two
//! lookups: the [table of contents](Catalog::table_of_contents), with verse
//! coverage and gaps per chapter, and [range lookups](Catalog::get_scripture)
//! returned in reading order. Only finalized modules are visible.

mod catalog;
pub mod error;
mod toc;

pub use crate::catalog::{Catalog, Passage};
pub use crate::toc::{BookContents, ChapterContents, ModuleContents, TableOfContents, VerseCoverage};
