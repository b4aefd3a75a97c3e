//! NET Bible: one JSON file per chapter, each a list of verse records whose
//! `text` is an inline HTML fragment.
//!
//! Layout: `<root>/{ot,nt}/<book dir>/<chapter>.json`.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use exegete_words::{Attributes, Fragment, Stemmer, segment};
use exn::{OptionExt, ResultExt};
use scraper::{ElementRef, Html, Node};
use serde::{Deserialize, Deserializer};
use tracing::{debug, instrument, warn};

use super::fs::{is_json, sorted_entries};
use crate::consts::STRONGS_REGEX;
use crate::error::{Error, ErrorKind, Result};
use crate::models::{BookEntry, Division, Hunk, Language, ModuleMetadata, ModuleType};
use crate::provenance::Provenance;
use crate::source::{Hunks, Source};

const DIVISIONS: [(&str, Division); 2] = [("ot", Division::FirstTestament), ("nt", Division::NewTestament)];

const LICENSE_TEXT: &str = "\
THE NET BIBLE®, New English Translation (NET)

The NET Bible® Scripture text (without the NET Bible notes) may be quoted in any form \
(written, visual, electronic, projection, or audio) without written permission, contingent \
upon the quoted text being followed by the designation (NET) and an appropriate copyright \
acknowledgment: Scripture quoted by permission. Quotations designated (NET) are from the NET \
Bible® copyright ©1996, 2019 by Biblical Studies Press, L.L.C. http://netbible.com All rights \
reserved.

Commercial publication requires a license from HarperCollins Christian Publishing.";

const DESCRIPTION: &str = "\
The NET is a complete translation of the original biblical languages into English, produced \
by a multi-denominational team of more than twenty-five biblical scholars. The first edition \
was completed in 2001, with revisions in 2003, 2005 and a major update in 2019.";

/// Adapter for the NET Bible JSON distribution.
#[derive(Debug)]
pub struct NetBible {
    provenance: Provenance,
    stemmer: Option<Stemmer>,
    book_dirs: Vec<PathBuf>,
}
impl NetBible {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            provenance: Provenance::new(root),
            stemmer: Some(Stemmer::english()),
            book_dirs: Vec::new(),
        }
    }

    pub fn with_stemming(mut self, enabled: bool) -> Self {
        self.stemmer = enabled.then(Stemmer::english);
        self
    }
}

impl Source for NetBible {
    /// One chapter file.
    type Unit = PathBuf;

    fn module(&self) -> ModuleMetadata {
        ModuleMetadata {
            kind: ModuleType::Bible,
            name: "NET Bible®".into(),
            shortcode: "NET".into(),
            license_text: LICENSE_TEXT.into(),
            license_url: "https://netbible.com/copyright/".into(),
            url: "https://netbible.com".into(),
            description: DESCRIPTION.into(),
            language: Language::English,
        }
    }

    /// Book names come from the first record of the first chapter file of
    /// each book directory.
    #[instrument(skip(self), fields(root = %self.provenance.root().display()))]
    fn books(&mut self) -> Result<Vec<BookEntry>> {
        self.book_dirs.clear();
        let mut books = Vec::new();
        for (name, division) in DIVISIONS {
            let division_dir = self.provenance.root().join(name);
            if !division_dir.is_dir() {
                warn!(dir = %division_dir.display(), "testament directory missing, skipping");
                continue;
            }
            for book_dir in sorted_entries(&division_dir, Path::is_dir)? {
                let peek = sorted_entries(&book_dir, is_json)?.into_iter().next().ok_or_raise(|| {
                    ErrorKind::MalformedSource(format!("{} has no chapter files", book_dir.display()))
                })?;
                let name = read_records(&mut self.provenance, &peek)?
                    .into_iter()
                    .next()
                    .map(|record| record.bookname)
                    .ok_or_raise(|| ErrorKind::MalformedSource(format!("{} has no records", peek.display())))?;
                let id = u32::try_from(books.len())
                    .or_raise(|| ErrorKind::MalformedSource("too many books".into()))?;
                debug!(id, %name, ?division, "found book");
                books.push(BookEntry::new(id, name, division));
                self.book_dirs.push(book_dir);
            }
        }
        if books.is_empty() {
            exn::bail!(ErrorKind::MalformedSource(format!(
                "no books under {}",
                self.provenance.root().display()
            )));
        }
        Ok(books)
    }

    fn units(&mut self, book: &BookEntry) -> Result<Vec<PathBuf>> {
        let dir = self
            .book_dirs
            .get(book.id as usize)
            .ok_or_raise(|| ErrorKind::MalformedSource(format!("unknown book: {}", book.name)))?;
        sorted_entries(dir, is_json)
    }

    fn hunks(&mut self, _book: &BookEntry, unit: PathBuf) -> Result<Hunks<'_>> {
        let records = read_records(&mut self.provenance, &unit)?;
        let stemmer = self.stemmer.as_ref();
        Ok(Box::new(records.into_iter().map(move |record| verse(record, stemmer))))
    }

    fn provenance(&mut self) -> &mut Provenance {
        &mut self.provenance
    }
}

#[derive(Debug, Deserialize)]
struct Record {
    bookname: String,
    #[serde(deserialize_with = "lenient_number")]
    chapter: u32,
    #[serde(deserialize_with = "lenient_number")]
    verse: u32,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u32),
    String(String),
}

/// Chapter and verse numbers appear both as JSON numbers and as strings.
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn read_records(provenance: &mut Provenance, path: &Path) -> Result<Vec<Record>> {
    let contents = provenance.open(path)?;
    serde_json::from_slice(&contents)
        .or_raise(|| ErrorKind::MalformedSource(format!("{} is not a list of verse records", path.display())))
}

fn verse(record: Record, stemmer: Option<&Stemmer>) -> Result<Hunk> {
    let mut words = segment(fragments(&record.text)?);
    if let Some(stemmer) = stemmer {
        stemmer.apply(&mut words);
    }
    Ok(Hunk::verse(words).at(record.chapter, record.verse, record.verse))
}

// ============================================================================
// Markup
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    /// Inserted by the HTML parser.
    Html,
    Body,
    Paragraph,
    Span,
    Bold,
    Italic,
    Superscript,
    /// Strong's cross-reference.
    Strongs,
    /// Translator's note; not part of the free text.
    Note,
    LineBreak,
}
impl FromStr for Tag {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "html" => Self::Html,
            "body" => Self::Body,
            "p" => Self::Paragraph,
            "span" => Self::Span,
            "b" => Self::Bold,
            "i" => Self::Italic,
            "sup" => Self::Superscript,
            "st" => Self::Strongs,
            "n" => Self::Note,
            "br" => Self::LineBreak,
            _ => exn::bail!(ErrorKind::UnrecognizedMarkup(format!("<{s}>"))),
        })
    }
}

/// Paragraph classes. All of them are layout-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParagraphClass {
    BodyText,
    BodyBlock,
    ParagraphTitle,
    /// Psalm superscription.
    PsalmSuperscription,
    /// Hebrew letter heading in Lamentations; the letter itself is in a
    /// `span.hebrew`.
    LamentationsHebrew,
    /// Speaker in Song of Songs; also marked up with `<b>`.
    SongSpeaker,
    Poetry,
    PoetryBreak,
    OtPoetry,
    Quote,
}
impl FromStr for ParagraphClass {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "bodytext" => Self::BodyText,
            "bodyblock" => Self::BodyBlock,
            "paragraphtitle" => Self::ParagraphTitle,
            "psasuper" => Self::PsalmSuperscription,
            "lamhebrew" => Self::LamentationsHebrew,
            "sosspeaker" => Self::SongSpeaker,
            "poetry" => Self::Poetry,
            "poetrybreak" => Self::PoetryBreak,
            "otpoetry" => Self::OtPoetry,
            "quote" => Self::Quote,
            _ => exn::bail!(ErrorKind::UnrecognizedMarkup(format!("<p class=\"{s}\">"))),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpanClass {
    Hebrew,
    SmallCaps,
}
impl FromStr for SpanClass {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "hebrew" => Self::Hebrew,
            "smcaps" => Self::SmallCaps,
            _ => exn::bail!(ErrorKind::UnrecognizedMarkup(format!("<span class=\"{s}\">"))),
        })
    }
}

/// Reduces one verse of NET markup to attributed fragments.
pub(crate) fn fragments(html: &str) -> Result<Vec<Fragment>> {
    if html.is_empty() {
        // Acts 24:7 and friends: the verse exists but has no text.
        return Ok(Vec::new());
    }
    let document = Html::parse_fragment(html);
    let mut walker = Walker::default();
    walker.visit(document.root_element(), &Attributes::default())?;
    Ok(walker.fragments)
}

#[derive(Debug, Default)]
struct Walker {
    fragments: Vec<Fragment>,
    /// A `<br>` was seen; the next word carries the line-break flag.
    line_break: bool,
}
impl Walker {
    fn visit(&mut self, element: ElementRef<'_>, attributes: &Attributes) -> Result<()> {
        let element_data = element.value();
        match element_data.name().parse::<Tag>()? {
            Tag::Html | Tag::Body => self.descend(element, attributes),
            Tag::Paragraph => {
                for class in element_data.classes() {
                    class.parse::<ParagraphClass>()?;
                }
                self.descend(element, attributes)
            },
            Tag::Span => {
                let mut span = attributes.clone();
                for class in element_data.classes() {
                    match class.parse::<SpanClass>()? {
                        SpanClass::Hebrew => span.language = Some(Language::BiblicalHebrew.code().into()),
                        SpanClass::SmallCaps => span.flags.small_caps = true,
                    }
                }
                self.descend(element, &span)
            },
            Tag::Bold => self.descend(element, &attributes.with_flags(|f| f.strong = true)),
            Tag::Italic => self.descend(element, &attributes.with_flags(|f| f.emphasis = true)),
            Tag::Superscript => self.descend(element, &attributes.with_flags(|f| f.superscript = true)),
            Tag::Strongs => {
                let codes = element_data
                    .attr("data-num")
                    .ok_or_raise(|| ErrorKind::MalformedSource("<st> without data-num".into()))?;
                let codes = codes
                    .split_whitespace()
                    .map(|code| match STRONGS_REGEX.is_match(code) {
                        true => Ok(code.to_string()),
                        false => Err(Error::from(ErrorKind::InvalidReference(code.to_string()))),
                    })
                    .collect::<Result<Vec<_>>>()?;
                self.descend(element, &attributes.with_strongs(codes))
            },
            Tag::Note => Ok(()),
            Tag::LineBreak => {
                self.fragments.push(Fragment::with_attributes(attributes.clone(), " "));
                self.line_break = true;
                Ok(())
            },
        }
    }

    fn descend(&mut self, element: ElementRef<'_>, attributes: &Attributes) -> Result<()> {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.push_text(attributes, text),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.visit(child, attributes)?;
                    }
                },
                other => exn::bail!(ErrorKind::UnrecognizedMarkup(format!("{other:?}"))),
            }
        }
        Ok(())
    }

    fn push_text(&mut self, attributes: &Attributes, text: &str) {
        if !self.line_break {
            self.fragments.push(Fragment::with_attributes(attributes.clone(), text));
            return;
        }
        let Some(start) = text.find(|c: char| !c.is_whitespace()) else {
            self.fragments.push(Fragment::with_attributes(attributes.clone(), text));
            return;
        };
        // Only the first word after the break is flagged.
        let end = text[start..].find(char::is_whitespace).map_or(text.len(), |i| start + i);
        let flagged = attributes.with_flags(|f| f.line_break = true);
        self.fragments.push(Fragment::with_attributes(flagged, &text[..end]));
        if end < text.len() {
            self.fragments.push(Fragment::with_attributes(attributes.clone(), &text[end..]));
        }
        self.line_break = false;
    }
}
