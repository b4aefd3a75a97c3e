use exegete_ingest::models::{BookEntry, Division};
use exn::ResultExt;

use crate::error::{Error, ErrorKind};

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BookRow {
    pub(crate) book_id: i64,
    pub(crate) name: String,
    pub(crate) division: String,
}
impl From<&BookEntry> for BookRow {
    fn from(book: &BookEntry) -> Self {
        Self {
            book_id: i64::from(book.id),
            name: book.name.clone(),
            division: book.division.as_str().to_string(),
        }
    }
}
impl TryFrom<BookRow> for BookEntry {
    type Error = Error;
    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: u32::try_from(row.book_id).or_raise(|| ErrorKind::InvalidData("book id"))?,
            name: row.name,
            division: row.division.parse::<Division>().or_raise(|| ErrorKind::InvalidData("division"))?,
        })
    }
}
