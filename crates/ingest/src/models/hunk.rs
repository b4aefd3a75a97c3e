use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use exegete_words::{Word, plaintext};
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Verse,
    Title,
    Footnote,
}
impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Verse => "verse",
            ObjectType::Title => "title",
            ObjectType::Footnote => "footnote",
        }
    }
}
impl FromStr for ObjectType {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "verse" => Self::Verse,
            "title" => Self::Title,
            "footnote" => Self::Footnote,
            _ => exn::bail!(ErrorKind::Validation(format!("unknown object type: {s}"))),
        })
    }
}
impl Display for ObjectType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// One canonical object emitted by an adapter, prior to storage.
///
/// Addressing is optional: titles usually have none, and a handful of verses
/// (the shorter ending of Mark) sit outside the chapter/verse scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    #[serde(rename = "type")]
    pub kind: ObjectType,
    pub chapter_start: Option<u32>,
    pub chapter_end: Option<u32>,
    pub verse_start: Option<u32>,
    pub verse_end: Option<u32>,
    pub text: Vec<Word>,
}
impl Hunk {
    pub fn new(kind: ObjectType, text: Vec<Word>) -> Self {
        Self {
            kind,
            chapter_start: None,
            chapter_end: None,
            verse_start: None,
            verse_end: None,
            text,
        }
    }

    pub fn verse(text: Vec<Word>) -> Self {
        Self::new(ObjectType::Verse, text)
    }

    pub fn title(text: Vec<Word>) -> Self {
        Self::new(ObjectType::Title, text)
    }

    pub fn footnote(text: Vec<Word>) -> Self {
        Self::new(ObjectType::Footnote, text)
    }

    /// Addresses the hunk to a verse range within a single chapter.
    pub fn at(self, chapter: u32, verse_start: u32, verse_end: u32) -> Self {
        self.spanning(chapter, verse_start, chapter, verse_end)
    }

    pub fn spanning(self, chapter_start: u32, verse_start: u32, chapter_end: u32, verse_end: u32) -> Self {
        Self {
            chapter_start: Some(chapter_start),
            chapter_end: Some(chapter_end),
            verse_start: Some(verse_start),
            verse_end: Some(verse_end),
            ..self
        }
    }

    pub fn is_addressed(&self) -> bool {
        self.chapter_start.is_some()
    }

    pub fn plaintext(&self) -> String {
        plaintext(&self.text)
    }

    /// Checks the hunk against the canonical object schema.
    pub fn validate(&self) -> Result<()> {
        if let Some(word) = self
            .text
            .iter()
            .find(|w| w.value.is_empty() || w.value.contains(char::is_whitespace))
        {
            exn::bail!(ErrorKind::Validation(format!(
                "word {:?} is empty or contains whitespace",
                word.value
            )));
        }
        match (self.chapter_start, self.chapter_end) {
            (None, None) => {
                if self.verse_start.is_some() || self.verse_end.is_some() {
                    exn::bail!(ErrorKind::Validation("verse addressed without a chapter".into()));
                }
            },
            (Some(start), Some(end)) => {
                if end < start {
                    exn::bail!(ErrorKind::Validation(format!("chapter range {start}-{end} is reversed")));
                }
                match (self.verse_start, self.verse_end) {
                    (None, None) => {},
                    (Some(vs), Some(ve)) if start == end && ve < vs => {
                        exn::bail!(ErrorKind::Validation(format!("verse range {vs}-{ve} is reversed")));
                    },
                    (Some(_), Some(_)) => {},
                    _ => exn::bail!(ErrorKind::Validation("half-open verse range".into())),
                }
            },
            _ => exn::bail!(ErrorKind::Validation("half-open chapter range".into())),
        }
        if self.kind == ObjectType::Footnote && !self.is_addressed() {
            exn::bail!(ErrorKind::Validation("footnote has no address".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn words(values: &[&str]) -> Vec<Word> {
        values.iter().map(|v| Word::new(*v)).collect()
    }

    #[rstest]
    #[case::addressed_verse(Hunk::verse(words(&["In", "the", "beginning"])).at(1, 1, 1))]
    #[case::verse_range(Hunk::verse(words(&["text"])).at(3, 4, 5))]
    #[case::cross_chapter(Hunk::verse(words(&["text"])).spanning(3, 30, 4, 1))]
    #[case::empty_verse(Hunk::verse(vec![]).at(24, 7, 7))]
    #[case::unaddressed_verse(Hunk::verse(words(&["shorter", "ending"])))]
    #[case::title(Hunk::title(words(&["Psalm", "1"])))]
    #[case::footnote(Hunk::footnote(words(&["Or", "“when”"])).at(1, 1, 1))]
    fn test_valid(#[case] hunk: Hunk) {
        assert!(hunk.validate().is_ok());
    }

    #[rstest]
    #[case::whitespace_word(Hunk::verse(words(&["two words"])).at(1, 1, 1))]
    #[case::empty_word(Hunk::verse(words(&[""])).at(1, 1, 1))]
    #[case::reversed_verses(Hunk::verse(words(&["x"])).at(1, 5, 4))]
    #[case::reversed_chapters(Hunk::verse(words(&["x"])).spanning(2, 1, 1, 1))]
    #[case::unaddressed_footnote(Hunk::footnote(words(&["note"])))]
    #[case::half_open(Hunk { chapter_end: None, ..Hunk::verse(vec![]).at(1, 1, 1) })]
    #[case::verse_without_chapter(Hunk { verse_start: Some(1), verse_end: Some(1), ..Hunk::verse(vec![]) })]
    fn test_invalid(#[case] hunk: Hunk) {
        let err = hunk.validate().unwrap_err();
        assert!(matches!(&*err, ErrorKind::Validation(_)));
    }

    #[test]
    fn test_plaintext() {
        let hunk = Hunk::verse(words(&["Jesus", "wept."])).at(11, 35, 35);
        assert_eq!(hunk.plaintext(), "Jesus wept.");
    }
}
