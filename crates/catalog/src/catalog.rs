use std::collections::{BTreeMap, HashMap};

use exegete_ingest::models::{BookEntry, ObjectType};
use exegete_modules::{Database, Manager, ModuleInfo};
use exegete_words::Word;
use exn::{OptionExt, ResultExt};
use serde::Serialize;
use sqlx::SqlitePool;
use time::format_description::well_known::Rfc3339;
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

use crate::error::{ErrorKind, Result};
use crate::toc::{self, Address, BookContents, ModuleContents, TableOfContents};

/// An object returned by a range lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Passage {
    pub chapter_start: Option<u32>,
    pub verse_start: Option<u32>,
    pub chapter_end: Option<u32>,
    pub verse_end: Option<u32>,
    #[serde(rename = "type")]
    pub kind: ObjectType,
    pub text: Vec<Word>,
}

#[derive(Debug, sqlx::FromRow)]
struct PassageRow {
    chapter_start: Option<i64>,
    verse_start: Option<i64>,
    chapter_end: Option<i64>,
    verse_end: Option<i64>,
    #[sqlx(rename = "type")]
    kind: String,
    text: String,
}
impl TryFrom<PassageRow> for Passage {
    type Error = crate::error::Error;
    fn try_from(row: PassageRow) -> Result<Self> {
        Ok(Self {
            chapter_start: number(row.chapter_start, "chapter start")?,
            verse_start: number(row.verse_start, "verse start")?,
            chapter_end: number(row.chapter_end, "chapter end")?,
            verse_end: number(row.verse_end, "verse end")?,
            kind: row.kind.parse::<ObjectType>().or_raise(|| ErrorKind::InvalidData("object type"))?,
            text: serde_json::from_str(&row.text).or_raise(|| ErrorKind::InvalidData("object text"))?,
        })
    }
}

fn number(value: Option<i64>, field: &'static str) -> Result<Option<u32>> {
    value
        .map(|v| u32::try_from(v).or_raise(|| ErrorKind::InvalidData(field)))
        .transpose()
}

/// A finalized module and its books, as loaded at startup.
#[derive(Debug)]
struct Translation {
    info: ModuleInfo,
    books: Vec<BookEntry>,
}

/// Read-only view over every finalized module.
///
/// Construct once with [`Catalog::load`] and share by reference. The table of
/// contents is computed on first use and cached for the catalog's lifetime;
/// modules finalized after loading are not picked up until a new catalog is
/// loaded.
#[derive(Debug)]
pub struct Catalog {
    pool: SqlitePool,
    translations: BTreeMap<String, Translation>,
    /// `(shortcode, book name)` to book id.
    books: HashMap<(String, String), u32>,
    toc: OnceCell<TableOfContents>,
}
impl Catalog {
    /// Loads every finalized module. Modules without a content hash are
    /// skipped. If two finalized modules share a shortcode, the most recently
    /// created one wins.
    #[instrument(skip_all)]
    pub async fn load(db: &Database) -> Result<Self> {
        let manager = Manager::from(db);
        let modules = manager.list_module_info().await.or_raise(|| ErrorKind::Database)?;
        let mut translations = BTreeMap::new();
        let mut books: HashMap<(String, String), u32> = HashMap::new();
        for info in modules {
            if !info.is_finalized() {
                warn!(namespace = %info.namespace, "skipping unfinalized module");
                continue;
            }
            let handle = manager.rehydrate(&info.namespace).await.or_raise(|| ErrorKind::Database)?;
            let entries = handle.books().await.or_raise(|| ErrorKind::Database)?;
            let shortcode = info.metadata.shortcode.clone();
            books.retain(|(code, _), _| *code != shortcode);
            for entry in &entries {
                books.insert((shortcode.clone(), entry.name.clone()), entry.id);
            }
            if let Some(replaced) = translations.insert(shortcode.clone(), Translation { info, books: entries }) {
                warn!(%shortcode, namespace = %replaced.info.namespace, "shortcode shadowed by a newer module");
            }
        }
        info!(modules = translations.len(), "catalog loaded");
        Ok(Self {
            pool: db.pool().clone(),
            translations,
            books,
            toc: OnceCell::new(),
        })
    }

    /// Shortcodes of the loaded modules, sorted.
    pub fn translations(&self) -> impl Iterator<Item = &str> {
        self.translations.keys().map(String::as_str)
    }

    pub fn module(&self, shortcode: &str) -> Option<&ModuleInfo> {
        self.translations.get(shortcode).map(|t| &t.info)
    }

    /// The cached table of contents, built on first call.
    pub async fn table_of_contents(&self) -> Result<&TableOfContents> {
        self.toc.get_or_try_init(|| self.build_table_of_contents()).await
    }

    /// The table of contents serialized for external caches.
    pub async fn to_json(&self) -> Result<String> {
        let toc = self.table_of_contents().await?;
        serde_json::to_string(toc).or_raise(|| ErrorKind::InvalidData("table of contents"))
    }

    #[instrument(skip(self))]
    async fn build_table_of_contents(&self) -> Result<TableOfContents> {
        let mut contents = TableOfContents::new();
        for (shortcode, translation) in &self.translations {
            let info = &translation.info;
            let mut books = Vec::with_capacity(translation.books.len());
            for book in &translation.books {
                books.push(BookContents {
                    name: book.name.clone(),
                    division: book.division,
                    chapters: toc::chapters(&self.addresses(&info.namespace, book.id).await?),
                });
            }
            let metadata = &info.metadata;
            contents.insert(shortcode.clone(), ModuleContents {
                kind: metadata.kind,
                language: metadata.language,
                date_created: info
                    .created_at
                    .format(&Rfc3339)
                    .or_raise(|| ErrorKind::InvalidData("created at"))?,
                name: metadata.name.clone(),
                license_text: metadata.license_text.clone(),
                license_url: metadata.license_url.clone(),
                url: metadata.url.clone(),
                description: metadata.description.clone(),
                content_hash: info.content_hash.clone().unwrap_or_default(),
                books,
            });
        }
        info!(modules = contents.len(), "built table of contents");
        Ok(contents)
    }

    async fn addresses(&self, namespace: &str, book_id: u32) -> Result<Vec<Address>> {
        let rows: Vec<(Option<i64>, Option<i64>, Option<i64>, Option<i64>)> =
            sqlx::query_as(include_str!("../queries/list_addresses.sql"))
                .bind(namespace)
                .bind(i64::from(book_id))
                .fetch_all(&self.pool)
                .await
                .or_raise(|| ErrorKind::Database)?;
        rows.into_iter()
            .map(|(cs, ce, vs, ve)| {
                let chapter_start = number(cs, "chapter start")?.ok_or_raise(|| ErrorKind::InvalidData("chapter start"))?;
                Ok(Address {
                    chapter_start,
                    chapter_end: number(ce, "chapter end")?.unwrap_or(chapter_start),
                    verse_start: number(vs, "verse start")?,
                    verse_end: number(ve, "verse end")?,
                })
            })
            .collect()
    }

    /// Objects of a book whose *start* falls inside the requested range, in
    /// reading order.
    ///
    /// Objects are matched on `chapter_start`/`verse_start` only: an object
    /// that begins before the range but ends inside it is not returned.
    #[instrument(skip(self))]
    pub async fn get_scripture(
        &self,
        translation: &str,
        book: &str,
        chapter_start: u32,
        verse_start: u32,
        chapter_end: u32,
        verse_end: u32,
    ) -> Result<Vec<Passage>> {
        let book_id = self
            .books
            .get(&(translation.to_string(), book.to_string()))
            .copied()
            .ok_or_raise(|| ErrorKind::NotFound(format!("{translation} {book}")))?;
        let namespace = self
            .translations
            .get(translation)
            .map(|t| t.info.namespace.as_str())
            .ok_or_raise(|| ErrorKind::NotFound(translation.to_string()))?;
        let rows: Vec<PassageRow> = sqlx::query_as(include_str!("../queries/get_scripture.sql"))
            .bind(namespace)
            .bind(i64::from(book_id))
            .bind(i64::from(chapter_start))
            .bind(i64::from(verse_start))
            .bind(i64::from(chapter_end))
            .bind(i64::from(verse_end))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Passage::try_from).collect()
    }
}
