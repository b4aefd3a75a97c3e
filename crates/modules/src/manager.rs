//! Allocation and discovery of module namespaces.

use exegete_ingest::models::ModuleMetadata;
use exn::{OptionExt, ResultExt};
use sqlx::SqlitePool;
use time::UtcDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::handle::ModuleHandle;
use crate::models::{ModuleInfo, ModuleRow};

/// Prefix shared by every namespace created with the current schema.
pub const SCHEMA_PREFIX: &str = "ex_v1";
pub const SCHEMA_VERSION: u32 = 1;

/// Creates, lists and reopens modules.
#[derive(Debug, Clone)]
pub struct Manager {
    pool: SqlitePool,
}
impl From<&Database> for Manager {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Manager {
    /// Allocates a fresh namespace and persists the module metadata.
    ///
    /// The metadata row is committed before the handle is returned, with no
    /// content hash: the module stays unfinalized until
    /// [`ModuleHandle::complete`] succeeds.
    #[instrument(skip(self, metadata), fields(shortcode = %metadata.shortcode))]
    pub async fn create_module(&self, metadata: &ModuleMetadata) -> Result<ModuleHandle> {
        let namespace = format!("{SCHEMA_PREFIX}:{}", Uuid::new_v4());
        let row = ModuleRow::new(namespace, SCHEMA_VERSION, metadata, UtcDateTime::now());
        let id: i64 = sqlx::query_scalar(include_str!("../queries/insert_module.sql"))
            .bind(&row.namespace)
            .bind(row.schema_version)
            .bind(row.kind)
            .bind(row.name)
            .bind(row.shortcode)
            .bind(row.license_text)
            .bind(row.license_url)
            .bind(row.url)
            .bind(row.description)
            .bind(row.language)
            .bind(row.created_at)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        info!(namespace = %row.namespace, "created module");
        Ok(ModuleHandle::new(self.pool.clone(), id, row.namespace))
    }

    /// Namespaces sharing the schema prefix, finalized or not, oldest first.
    pub async fn list_modules(&self) -> Result<Vec<String>> {
        Ok(self.list_module_info().await?.into_iter().map(|info| info.namespace).collect())
    }

    /// Like [`list_modules`](Self::list_modules), with the stored metadata.
    pub async fn list_module_info(&self) -> Result<Vec<ModuleInfo>> {
        let rows: Vec<ModuleRow> = sqlx::query_as(include_str!("../queries/list_modules.sql"))
            .bind(format!("{SCHEMA_PREFIX}:*"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(ModuleInfo::try_from).collect()
    }

    /// Reopens an existing module without touching its storage.
    #[instrument(skip(self))]
    pub async fn rehydrate(&self, namespace: &str) -> Result<ModuleHandle> {
        let row: ModuleRow = sqlx::query_as(include_str!("../queries/get_module.sql"))
            .bind(namespace)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?
            .ok_or_raise(|| ErrorKind::NotFound(namespace.to_string()))?;
        Ok(ModuleHandle::new(self.pool.clone(), row.id, row.namespace))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use exegete_ingest::models::{Language, ModuleType};

    pub(crate) fn metadata(shortcode: &str) -> ModuleMetadata {
        ModuleMetadata {
            kind: ModuleType::Bible,
            name: format!("{shortcode} Bible"),
            shortcode: shortcode.to_string(),
            license_text: "Public domain.".into(),
            license_url: "https://example.org/license".into(),
            url: "https://example.org".into(),
            description: "A test module.".into(),
            language: Language::English,
        }
    }

    #[tokio::test]
    async fn test_create_module() {
        let db = Database::connect_in_memory().await.unwrap();
        let manager = Manager::from(&db);
        let module = manager.create_module(&metadata("TST")).await.unwrap();
        assert!(module.namespace().starts_with("ex_v1:"));

        let info = module.info().await.unwrap();
        assert_eq!(info.metadata, metadata("TST"));
        assert_eq!(info.schema_version, SCHEMA_VERSION);
        assert!(!info.is_finalized());
    }

    #[tokio::test]
    async fn test_namespaces_are_unique_and_ordered() {
        let db = Database::connect_in_memory().await.unwrap();
        let manager = Manager::from(&db);
        let first = manager.create_module(&metadata("ONE")).await.unwrap();
        let second = manager.create_module(&metadata("TWO")).await.unwrap();
        assert_ne!(first.namespace(), second.namespace());
        assert_eq!(manager.list_modules().await.unwrap(), [first.namespace(), second.namespace()]);
    }

    #[tokio::test]
    async fn test_list_ignores_foreign_namespaces() {
        let db = Database::connect_in_memory().await.unwrap();
        let manager = Manager::from(&db);
        manager.create_module(&metadata("TST")).await.unwrap();
        sqlx::query(
            "INSERT INTO modules (namespace, schema_version, type, name, shortcode, license_text, license_url, url, \
             description, language, created_at) VALUES ('legacy:1', 0, 'bible', '', '', '', '', '', '', 'eng', 0)",
        )
        .execute(db.pool())
        .await
        .unwrap();
        assert_eq!(manager.list_modules().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rehydrate() {
        let db = Database::connect_in_memory().await.unwrap();
        let manager = Manager::from(&db);
        let created = manager.create_module(&metadata("TST")).await.unwrap();
        let rehydrated = manager.rehydrate(created.namespace()).await.unwrap();
        assert_eq!(rehydrated.namespace(), created.namespace());
        assert_eq!(rehydrated.info().await.unwrap(), created.info().await.unwrap());
    }

    #[tokio::test]
    async fn test_rehydrate_unknown_namespace() {
        let db = Database::connect_in_memory().await.unwrap();
        let err = Manager::from(&db).rehydrate("ex_v1:missing").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }
}
