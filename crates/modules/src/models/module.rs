use exegete_ingest::models::{Language, ModuleMetadata, ModuleType};
use exn::ResultExt;
use time::UtcDateTime;

use crate::error::{Error, ErrorKind};

/// A module as stored: its metadata plus lifecycle fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub namespace: String,
    pub schema_version: u32,
    pub metadata: ModuleMetadata,
    /// Set once, at finalization.
    pub content_hash: Option<String>,
    pub created_at: UtcDateTime,
}
impl ModuleInfo {
    /// A module without a content hash is still being ingested (or its
    /// ingest failed) and must not be served.
    pub fn is_finalized(&self) -> bool {
        self.content_hash.is_some()
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ModuleRow {
    pub(crate) id: i64,
    pub(crate) namespace: String,
    pub(crate) schema_version: i64,
    #[sqlx(rename = "type")]
    pub(crate) kind: String,
    pub(crate) name: String,
    pub(crate) shortcode: String,
    pub(crate) license_text: String,
    pub(crate) license_url: String,
    pub(crate) url: String,
    pub(crate) description: String,
    pub(crate) language: String,
    pub(crate) content_hash: Option<String>,
    pub(crate) created_at: i64,
}
impl ModuleRow {
    pub(crate) fn new(namespace: String, schema_version: u32, metadata: &ModuleMetadata, created_at: UtcDateTime) -> Self {
        Self {
            id: 0,
            namespace,
            schema_version: i64::from(schema_version),
            kind: metadata.kind.as_str().to_string(),
            name: metadata.name.clone(),
            shortcode: metadata.shortcode.clone(),
            license_text: metadata.license_text.clone(),
            license_url: metadata.license_url.clone(),
            url: metadata.url.clone(),
            description: metadata.description.clone(),
            language: metadata.language.code().to_string(),
            content_hash: None,
            created_at: created_at.unix_timestamp(),
        }
    }
}
impl TryFrom<ModuleRow> for ModuleInfo {
    type Error = Error;
    fn try_from(row: ModuleRow) -> Result<Self, Self::Error> {
        Ok(Self {
            namespace: row.namespace,
            schema_version: u32::try_from(row.schema_version).or_raise(|| ErrorKind::InvalidData("schema version"))?,
            metadata: ModuleMetadata {
                kind: row.kind.parse::<ModuleType>().or_raise(|| ErrorKind::InvalidData("module type"))?,
                name: row.name,
                shortcode: row.shortcode,
                license_text: row.license_text,
                license_url: row.license_url,
                url: row.url,
                description: row.description,
                language: row.language.parse::<Language>().or_raise(|| ErrorKind::InvalidData("language"))?,
            },
            content_hash: row.content_hash,
            created_at: UtcDateTime::from_unix_timestamp(row.created_at)
                .or_raise(|| ErrorKind::InvalidData("created at"))?,
        })
    }
}
