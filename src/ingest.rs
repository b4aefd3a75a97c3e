//! Drives a [`Source`] into a new, finalized module.

use exegete_ingest::Source;
use exegete_modules::{Database, Manager};
use exn::ResultExt;
use tracing::{debug, info, instrument};

use crate::error::{ErrorKind, Result};

/// Result of a successful ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingested {
    pub namespace: String,
    pub content_hash: String,
    pub objects: i64,
}

/// Ingests every book of `source` into a fresh namespace and seals it.
///
/// Each unit is imported in its own transaction. If any unit fails the
/// module is left unfinalized, which keeps it out of every catalog.
#[instrument(skip_all, fields(shortcode = %source.module().shortcode))]
pub async fn ingest<S: Source>(db: &Database, mut source: S) -> Result<Ingested> {
    let module = Manager::from(db)
        .create_module(&source.module())
        .await
        .or_raise(|| ErrorKind::Storage)?;
    let books = source.books().or_raise(|| ErrorKind::Ingest)?;
    for book in &books {
        module.add_book(book).await.or_raise(|| ErrorKind::Storage)?;
    }
    module
        .record_inputs(&source.provenance().take_pending())
        .await
        .or_raise(|| ErrorKind::Storage)?;

    let mut objects = 0;
    for book in &books {
        let mut linear_id = 0;
        for unit in source.units(book).or_raise(|| ErrorKind::Ingest)? {
            let hunks = source.hunks(book, unit).or_raise(|| ErrorKind::Ingest)?;
            linear_id = module
                .import_book_stream(linear_id, book.id, hunks)
                .await
                .or_raise(|| ErrorKind::Storage)?;
            module
                .record_inputs(&source.provenance().take_pending())
                .await
                .or_raise(|| ErrorKind::Storage)?;
        }
        debug!(book = %book.name, objects = linear_id, "ingested book");
        objects += linear_id;
    }

    let content_hash = module.complete().await.or_raise(|| ErrorKind::Storage)?;
    info!(namespace = module.namespace(), objects, "ingest complete");
    Ok(Ingested {
        namespace: module.namespace().to_string(),
        content_hash,
        objects,
    })
}
