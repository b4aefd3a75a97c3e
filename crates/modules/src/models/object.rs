use exegete_ingest::models::Hunk;
use exn::ResultExt;

use crate::error::{Error, ErrorKind};

/// Insert-side projection of a [`Hunk`] at a given position in its book.
#[derive(Debug)]
pub(crate) struct ObjectRow {
    pub(crate) book_id: i64,
    pub(crate) chapter_start: Option<i64>,
    pub(crate) chapter_end: Option<i64>,
    pub(crate) verse_start: Option<i64>,
    pub(crate) verse_end: Option<i64>,
    pub(crate) kind: &'static str,
    pub(crate) linear_id: i64,
    pub(crate) text: String,
    pub(crate) plaintext: String,
}
impl ObjectRow {
    pub(crate) fn new(book_id: u32, linear_id: i64, hunk: &Hunk) -> Result<Self, Error> {
        Ok(Self {
            book_id: i64::from(book_id),
            chapter_start: hunk.chapter_start.map(i64::from),
            chapter_end: hunk.chapter_end.map(i64::from),
            verse_start: hunk.verse_start.map(i64::from),
            verse_end: hunk.verse_end.map(i64::from),
            kind: hunk.kind.as_str(),
            linear_id,
            text: serde_json::to_string(&hunk.text).or_raise(|| ErrorKind::InvalidData("words"))?,
            plaintext: hunk.plaintext(),
        })
    }
}
