use crate::error::Result;
use crate::models::{BookEntry, Hunk, ModuleMetadata};
use crate::provenance::Provenance;

/// Lazy, forward-only sequence of hunks in final reading order.
pub type Hunks<'a> = Box<dyn Iterator<Item = Result<Hunk>> + 'a>;

/// A corpus adapter.
///
/// Drivers walk `books()`, then `units(book)`, importing the hunks of each
/// unit inside a single storage transaction. Every file an adapter reads goes
/// through [`provenance`](Self::provenance) first.
pub trait Source {
    /// One ingest transaction's worth of source (a file, an element, ...).
    type Unit;

    fn module(&self) -> ModuleMetadata;

    /// Books in canonical reading order, with ids counting from zero.
    fn books(&mut self) -> Result<Vec<BookEntry>>;

    fn units(&mut self, book: &BookEntry) -> Result<Vec<Self::Unit>>;

    fn hunks(&mut self, book: &BookEntry, unit: Self::Unit) -> Result<Hunks<'_>>;

    fn provenance(&mut self) -> &mut Provenance;
}
