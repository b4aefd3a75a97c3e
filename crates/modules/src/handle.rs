//! Writes into, and seals, a single module.

use exegete_ingest::models::{BookEntry, Hunk};
use exegete_ingest::{Input, completion_hash};
use exn::{OptionExt, ResultExt};
use sqlx::SqlitePool;
use tracing::{debug, info, instrument};

use crate::error::{ErrorKind, Result};
use crate::models::{BookRow, InputRow, ModuleInfo, ModuleRow, ObjectRow};

/// Handle bound to one module namespace.
///
/// Obtained from [`Manager::create_module`](crate::Manager::create_module)
/// or [`Manager::rehydrate`](crate::Manager::rehydrate). All writes are
/// rejected with [`ErrorKind::Finalized`] once [`complete`](Self::complete)
/// has stamped the content hash.
#[derive(Debug, Clone)]
pub struct ModuleHandle {
    pool: SqlitePool,
    id: i64,
    namespace: String,
}
impl ModuleHandle {
    pub(crate) fn new(pool: SqlitePool, id: i64, namespace: String) -> Self {
        Self { pool, id, namespace }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub async fn info(&self) -> Result<ModuleInfo> {
        let row: ModuleRow = sqlx::query_as(include_str!("../queries/get_module.sql"))
            .bind(&self.namespace)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?
            .ok_or_raise(|| ErrorKind::NotFound(self.namespace.clone()))?;
        row.try_into()
    }

    pub async fn is_finalized(&self) -> Result<bool> {
        let hash: Option<Option<String>> = sqlx::query_scalar(include_str!("../queries/get_content_hash.sql"))
            .bind(self.id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(hash.ok_or_raise(|| ErrorKind::NotFound(self.namespace.clone()))?.is_some())
    }

    async fn ensure_writable(&self) -> Result<()> {
        if self.is_finalized().await? {
            exn::bail!(ErrorKind::Finalized(self.namespace.clone()));
        }
        Ok(())
    }

    // =========================================================================
    // Books
    // =========================================================================

    /// Books must exist before any object references them.
    #[instrument(skip(self, book), fields(namespace = %self.namespace, book = %book.name))]
    pub async fn add_book(&self, book: &BookEntry) -> Result<()> {
        self.ensure_writable().await?;
        let row = BookRow::from(book);
        sqlx::query(include_str!("../queries/insert_book.sql"))
            .bind(self.id)
            .bind(row.book_id)
            .bind(row.name)
            .bind(row.division)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        info!(id = book.id, "added book");
        Ok(())
    }

    /// Books in canonical order.
    pub async fn books(&self) -> Result<Vec<BookEntry>> {
        let rows: Vec<BookRow> = sqlx::query_as(include_str!("../queries/list_books.sql"))
            .bind(self.id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(BookEntry::try_from).collect()
    }

    // =========================================================================
    // Objects
    // =========================================================================

    /// Imports a stream of hunks into a book, assigning consecutive linear
    /// ids starting at `linear_id`. Returns the next unused linear id.
    ///
    /// The whole stream is one transaction: if the adapter fails or any hunk
    /// fails validation, nothing from this stream is committed.
    #[instrument(skip(self, hunks), fields(namespace = %self.namespace))]
    pub async fn import_book_stream<I>(&self, linear_id: i64, book_id: u32, hunks: I) -> Result<i64>
    where
        I: IntoIterator<Item = exegete_ingest::error::Result<Hunk>>,
    {
        self.ensure_writable().await?;
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let mut next = linear_id;
        for hunk in hunks {
            let hunk = hunk.or_raise(|| ErrorKind::Source)?;
            hunk.validate()
                .or_raise(|| ErrorKind::Validation(format!("book {book_id}, linear id {next}")))?;
            let row = ObjectRow::new(book_id, next, &hunk)?;
            sqlx::query(include_str!("../queries/insert_object.sql"))
                .bind(self.id)
                .bind(row.book_id)
                .bind(row.chapter_start)
                .bind(row.chapter_end)
                .bind(row.verse_start)
                .bind(row.verse_end)
                .bind(row.kind)
                .bind(row.linear_id)
                .bind(row.text)
                .bind(row.plaintext)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
            next += 1;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        debug!(objects = next - linear_id, next, "imported book stream");
        Ok(next)
    }

    // =========================================================================
    // Provenance
    // =========================================================================

    /// Records source files; a filename already on record is ignored.
    pub async fn record_inputs(&self, inputs: &[Input]) -> Result<()> {
        self.ensure_writable().await?;
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        for input in inputs {
            sqlx::query(include_str!("../queries/insert_input.sql"))
                .bind(self.id)
                .bind(&input.filename)
                .bind(&input.hash)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)
    }

    /// Recorded inputs, ordered by filename.
    pub async fn inputs(&self) -> Result<Vec<Input>> {
        let rows: Vec<InputRow> = sqlx::query_as(include_str!("../queries/list_inputs.sql"))
            .bind(self.id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(rows.into_iter().map(Input::from).collect())
    }

    /// Seals the module: computes the completion hash over all recorded
    /// inputs and stamps it. A module can only be sealed once.
    #[instrument(skip(self), fields(namespace = %self.namespace))]
    pub async fn complete(&self) -> Result<String> {
        let inputs = self.inputs().await?;
        let hash = completion_hash(&inputs);
        let result = sqlx::query(include_str!("../queries/complete_module.sql"))
            .bind(&hash)
            .bind(self.id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if result.rows_affected() == 0 {
            exn::bail!(ErrorKind::Finalized(self.namespace.clone()));
        }
        info!(%hash, inputs = inputs.len(), "module finalized");
        Ok(hash)
    }
}
