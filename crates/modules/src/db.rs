//! The module database.
//!
//! Ingest and catalog reads open the same SQLite file in different ways. An
//! ingest owns a writable pool that creates the file and brings the schema up
//! to date. The catalog only ever reads sealed modules, so it opens the file
//! read-only, never migrates, and refuses a schema older than this build's.

use exn::{OptionExt, ResultExt};
use sqlx::SqliteConnection;
use sqlx::pool::PoolConnectionMetadata;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::{ErrorKind, Result};

/// Embedded migrations, applied by writable opens only.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
/// Pool size when the caller has no preference.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
/// A whole-book import holds the write lock for a while. Readers in WAL mode
/// are unaffected but a second writer has to wait.
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// What a [`Database`] handle may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Ingest: creates the file, migrates, writes modules.
    ReadWrite,
    /// Catalog: reads sealed modules; every write fails.
    ReadOnly,
}

/// Connection pool for the module database.
///
/// Every module lives in this one database, scoped by its row in `modules`.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    access: Access,
}

impl Database {
    /// Opens the database at `path` for ingest, creating it and applying any
    /// pending migrations.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);
        let db = Self::pooled(options, max_connections, Access::ReadWrite).await?;
        db.migrate().await?;
        Ok(db)
    }

    /// Opens an existing database for catalog queries.
    ///
    /// The file must already hold the current schema: a missing file is a
    /// database error and an older schema is [`ErrorKind::SchemaOutdated`].
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub async fn open_read_only(path: impl AsRef<Path>, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .read_only(true)
            .busy_timeout(BUSY_TIMEOUT);
        let db = Self::pooled(options, max_connections, Access::ReadOnly).await?;
        db.check_schema().await?;
        Ok(db)
    }

    /// A private in-memory database with the current schema.
    ///
    /// Not `#[cfg(test)]`: downstream crates use this in their own tests.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new().filename(":memory:").foreign_keys(true);
        // Every connection to ":memory:" is a different database.
        let db = Self::pooled(options, 1, Access::ReadWrite).await?;
        db.migrate().await?;
        Ok(db)
    }

    async fn pooled(options: SqliteConnectOptions, max_connections: u32, access: Access) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .after_connect(|conn, meta| Box::pin(async move { Self::apply_pragmas(conn, meta).await }))
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(Self { pool, access })
    }

    /// Per-connection tuning. Safe on read-only connections.
    async fn apply_pragmas(conn: &mut SqliteConnection, _meta: PoolConnectionMetadata) -> sqlx::Result<()> {
        sqlx::query(
            r#"
                PRAGMA cache_size = -16384;
                PRAGMA temp_store = MEMORY;
            "#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    #[instrument("performing database migrations", skip(self))]
    async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.or_raise(|| ErrorKind::Migration)
    }

    /// Fails unless every embedded migration has been applied.
    async fn check_schema(&self) -> Result<()> {
        let latest = MIGRATOR
            .iter()
            .map(|m| m.version)
            .max()
            .ok_or_raise(|| ErrorKind::Migration)?;
        let tracked: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
        )
        .fetch_one(&self.pool)
        .await
        .or_raise(|| ErrorKind::Database)?;
        let applied: Option<i64> = if tracked == 0 {
            None
        } else {
            sqlx::query_scalar("SELECT MAX(version) FROM _sqlx_migrations WHERE success")
                .fetch_one(&self.pool)
                .await
                .or_raise(|| ErrorKind::Database)?
        };
        debug!(?applied, latest, "schema version");
        match applied {
            Some(version) if version >= latest => Ok(()),
            _ => exn::bail!(ErrorKind::SchemaOutdated(applied.unwrap_or(0))),
        }
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Waits for all connections to be returned, then closes the pool.
    /// Writable pools refresh query planner statistics first.
    pub async fn close(&self) {
        if self.access == Access::ReadWrite {
            _ = sqlx::query("PRAGMA optimize").execute(&self.pool).await;
        }
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Manager;
    use exegete_ingest::models::{Language, ModuleMetadata, ModuleType};

    fn metadata() -> ModuleMetadata {
        ModuleMetadata {
            kind: ModuleType::Bible,
            name: "Test Bible".into(),
            shortcode: "TST".into(),
            license_text: String::new(),
            license_url: String::new(),
            url: String::new(),
            description: String::new(),
            language: Language::English,
        }
    }

    #[tokio::test]
    async fn test_connect_in_memory() {
        let db = Database::connect_in_memory().await.unwrap();
        assert_eq!(db.access(), Access::ReadWrite);
        assert!(!db.pool().is_closed());
        db.close().await;
        assert!(db.pool().is_closed());
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = Database::connect_in_memory().await.unwrap();
        db.migrate().await.unwrap();
        let tables: Vec<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE '\\_%' ESCAPE '\\' ORDER BY name")
                .fetch_all(db.pool())
                .await
                .unwrap();
        assert_eq!(tables, ["books", "inputs", "modules", "objects"]);
        db.close().await;
    }

    #[tokio::test]
    async fn test_pragmas_are_applied() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("modules.db"), 2).await.unwrap();
        let row: (i64,) = sqlx::query_as("PRAGMA foreign_keys").fetch_one(db.pool()).await.unwrap();
        assert_eq!(row.0, 1, "foreign_keys should be ON");
        let row: (String,) = sqlx::query_as("PRAGMA journal_mode").fetch_one(db.pool()).await.unwrap();
        assert_eq!(row.0, "wal");
        let row: (i64,) = sqlx::query_as("PRAGMA cache_size").fetch_one(db.pool()).await.unwrap();
        assert_eq!(row.0, -16384);
        db.close().await;
    }

    #[tokio::test]
    async fn test_read_only_sees_sealed_modules_and_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modules.db");
        let writer = Database::open(&path, 1).await.unwrap();
        Manager::from(&writer).create_module(&metadata()).await.unwrap();
        writer.close().await;

        let reader = Database::open_read_only(&path, 2).await.unwrap();
        assert_eq!(reader.access(), Access::ReadOnly);
        let modules = Manager::from(&reader).list_module_info().await.unwrap();
        assert_eq!(modules.len(), 1);

        let err = Manager::from(&reader).create_module(&metadata()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Database));
        reader.close().await;
    }

    #[tokio::test]
    async fn test_read_only_never_creates_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.db");
        let err = Database::open_read_only(&path, 1).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Database));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_read_only_rejects_unmigrated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.db");
        std::fs::write(&path, b"").unwrap();
        let err = Database::open_read_only(&path, 1).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::SchemaOutdated(0)));
    }
}
