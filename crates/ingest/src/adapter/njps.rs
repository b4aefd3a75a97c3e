//! NJPS Tanakh as distributed by Sefaria: one JSON file per book holding
//! `{"text": [[verse html, ...], ...]}`.
//!
//! Layout: `<root>/<grouping>/<book>.json`, see [`GROUPINGS`].

use std::path::{Path, PathBuf};
use std::str::FromStr;

use exegete_words::{Attributes, Fragment, Stemmer, segment};
use exn::{OptionExt, ResultExt};
use scraper::{ElementRef, Html, Node};
use serde::Deserialize;
use tracing::instrument;

use crate::consts::FOOTNOTE_MARKER_REGEX;
use crate::error::{Error, ErrorKind, Result};
use crate::models::{BookEntry, Division, Hunk, Language, ModuleMetadata, ModuleType};
use crate::provenance::Provenance;
use crate::source::{Hunks, Source};

/// Canonical book list, by grouping, using Sefaria's names.
pub const GROUPINGS: &[(&str, &[&str])] = &[
    ("Torah", &["Genesis", "Exodus", "Leviticus", "Numbers", "Deuteronomy"]),
    (
        "Prophets",
        &[
            "Joshua",
            "Judges",
            "I Samuel",
            "II Samuel",
            "I Kings",
            "II Kings",
            "Isaiah",
            "Jeremiah",
            "Ezekiel",
            "Hosea",
            "Joel",
            "Amos",
            "Obadiah",
            "Jonah",
            "Micah",
            "Nahum",
            "Habakkuk",
            "Zephaniah",
            "Haggai",
            "Zechariah",
            "Malachi",
        ],
    ),
    (
        "Writings",
        &[
            "Psalms",
            "Proverbs",
            "Job",
            "Song of Songs",
            "Ruth",
            "Lamentations",
            "Ecclesiastes",
            "Esther",
            "Daniel",
            "Ezra",
            "Nehemiah",
            "I Chronicles",
            "II Chronicles",
        ],
    ),
];

const DESCRIPTION: &str = "\
Regarded throughout the English-speaking world as the standard English translation of the \
Holy Scriptures, the JPS TANAKH is an entirely original translation into contemporary English, \
based on the Masoretic (the traditional Hebrew) text. It is the culmination of three decades \
of collaboration by academic scholars and rabbis.";

/// Location of a book's source file inside the corpus root.
pub fn source_path(root: &Path, grouping: &str, book: &str) -> PathBuf {
    root.join(grouping).join(format!("{book}.json"))
}

/// Sefaria download URL for a book.
pub fn download_url(book: &str) -> String {
    format!("https://www.sefaria.org/download/version/{book} - en - Tanakh: The Holy Scriptures, published by JPS.json")
}

/// Sefaria uses roman numerals where SBL style uses digits.
fn display_name(book: &str) -> String {
    match book.split_once(' ') {
        Some(("I", rest)) => format!("1 {rest}"),
        Some(("II", rest)) => format!("2 {rest}"),
        _ => book.to_string(),
    }
}

/// Adapter for the Sefaria NJPS distribution.
#[derive(Debug)]
pub struct Njps {
    provenance: Provenance,
    stemmer: Option<Stemmer>,
}
impl Njps {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            provenance: Provenance::new(root),
            stemmer: Some(Stemmer::english()),
        }
    }

    pub fn with_stemming(mut self, enabled: bool) -> Self {
        self.stemmer = enabled.then(Stemmer::english);
        self
    }

    fn locate(&self, book: &BookEntry) -> Result<PathBuf> {
        GROUPINGS
            .iter()
            .flat_map(|(grouping, books)| books.iter().map(move |b| (*grouping, *b)))
            .nth(book.id as usize)
            .map(|(grouping, name)| source_path(self.provenance.root(), grouping, name))
            .ok_or_raise(|| ErrorKind::MalformedSource(format!("unknown book: {}", book.name)))
    }
}

impl Source for Njps {
    /// One whole-book file.
    type Unit = PathBuf;

    fn module(&self) -> ModuleMetadata {
        ModuleMetadata {
            kind: ModuleType::Bible,
            name: "Tanakh: The Holy Scriptures, published by JPS".into(),
            shortcode: "NJPS".into(),
            license_text: "Licensed under the Creative Commons CC-BY-NC license.".into(),
            license_url: "https://creativecommons.org/licenses/by-nc/4.0/".into(),
            url: "https://jps.org/books/tanakh-the-holy-scriptures-blue/".into(),
            description: DESCRIPTION.into(),
            language: Language::English,
        }
    }

    fn books(&mut self) -> Result<Vec<BookEntry>> {
        (0u32..)
            .zip(GROUPINGS.iter().flat_map(|(_, books)| books.iter()))
            .map(|(id, name)| Ok(BookEntry::new(id, display_name(name), Division::FirstTestament)))
            .collect()
    }

    fn units(&mut self, book: &BookEntry) -> Result<Vec<PathBuf>> {
        Ok(vec![self.locate(book)?])
    }

    #[instrument(skip(self, book), fields(book = %book.name))]
    fn hunks(&mut self, book: &BookEntry, unit: PathBuf) -> Result<Hunks<'_>> {
        let contents = self.provenance.open(&unit)?;
        let document: Document = serde_json::from_slice(&contents)
            .or_raise(|| ErrorKind::MalformedSource(format!("{} is not a Sefaria text", unit.display())))?;
        let stemmer = self.stemmer.as_ref();
        let verses = (1u32..).zip(document.text).flat_map(|(chapter, verses)| {
            (1u32..).zip(verses).map(move |(verse, html)| (chapter, verse, html))
        });
        Ok(Box::new(verses.flat_map(move |(chapter, verse, html)| {
            match verse_hunks(&html, chapter, verse, stemmer) {
                Ok(hunks) => hunks.into_iter().map(Ok).collect::<Vec<_>>(),
                Err(err) => vec![Err(err)],
            }
        })))
    }

    fn provenance(&mut self) -> &mut Provenance {
        &mut self.provenance
    }
}

#[derive(Debug, Deserialize)]
struct Document {
    text: Vec<Vec<String>>,
}

/// A verse followed by its footnotes, all addressed to the verse.
fn verse_hunks(html: &str, chapter: u32, verse: u32, stemmer: Option<&Stemmer>) -> Result<Vec<Hunk>> {
    let Some(parsed) = parse_verse(html)? else {
        return Ok(Vec::new());
    };
    let words = |fragments: Vec<Fragment>| {
        let mut words = segment(fragments);
        if let Some(stemmer) = stemmer {
            stemmer.apply(&mut words);
        }
        words
    };
    let mut hunks = vec![Hunk::verse(words(parsed.verse)).at(chapter, verse, verse)];
    for footnote in parsed.footnotes {
        hunks.push(Hunk::footnote(words(footnote)).at(chapter, verse, verse));
    }
    Ok(hunks)
}

// ============================================================================
// Markup
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Big,
    LineBreak,
    Italic,
    Small,
    Strong,
    Superscript,
}
impl FromStr for Tag {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "big" => Self::Big,
            "br" => Self::LineBreak,
            "i" => Self::Italic,
            "small" => Self::Small,
            "strong" => Self::Strong,
            "sup" => Self::Superscript,
            _ => exn::bail!(ErrorKind::UnrecognizedMarkup(format!("<{s}>"))),
        })
    }
}

/// Role of an `<i>` element at the top level of a verse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItalicRole {
    Emphasis,
    Footnote,
    /// Rendering hint for Sefaria's frontend, no content.
    EndFootnote,
}
impl ItalicRole {
    fn of(element: ElementRef<'_>) -> Result<Self> {
        let mut role = Self::Emphasis;
        for class in element.value().classes() {
            role = match class {
                "footnote" => Self::Footnote,
                "endFootnote" => Self::EndFootnote,
                _ => exn::bail!(ErrorKind::UnrecognizedMarkup(format!("<i class=\"{class}\">"))),
            };
        }
        Ok(role)
    }
}

#[derive(Debug, Default, PartialEq)]
struct ParsedVerse {
    verse: Vec<Fragment>,
    footnotes: Vec<Vec<Fragment>>,
}

/// Splits one verse of Sefaria markup into verse text and footnote bodies.
/// Returns `None` for blank verses (e.g. Joshua 21:36).
fn parse_verse(html: &str) -> Result<Option<ParsedVerse>> {
    if html.is_empty() {
        return Ok(None);
    }
    let document = Html::parse_fragment(html);
    let mut body = document.root_element();
    // The parser may wrap everything in a single paragraph.
    let mut children = body.children();
    if let (Some(only), None) = (children.next(), children.next())
        && let Some(p) = ElementRef::wrap(only).filter(|e| e.value().name() == "p")
    {
        body = p;
    }

    let mut parsed = ParsedVerse::default();
    let plain = Attributes::default();
    for child in body.children() {
        let element = match child.value() {
            Node::Text(text) => {
                parsed.verse.push(Fragment::new(&**text));
                continue;
            },
            Node::Element(_) => ElementRef::wrap(child).ok_or_raise(|| ErrorKind::MalformedSource(html.into()))?,
            other => exn::bail!(ErrorKind::UnrecognizedMarkup(format!("{other:?}"))),
        };
        let tag = element.value().name().parse::<Tag>()?;
        if has_nested_footnote(element) {
            exn::bail!(ErrorKind::NestedFootnote);
        }
        match tag {
            Tag::Superscript => {
                let marker: String = element.text().collect();
                if !FOOTNOTE_MARKER_REGEX.is_match(&marker) {
                    exn::bail!(ErrorKind::InvalidFootnoteMarker(marker));
                }
            },
            Tag::Italic => match ItalicRole::of(element)? {
                ItalicRole::EndFootnote => {},
                ItalicRole::Footnote => {
                    let mut footnote = Vec::new();
                    descend(element, &plain, &mut footnote)?;
                    parsed.footnotes.push(footnote);
                },
                ItalicRole::Emphasis => visit(element, &plain, &mut parsed.verse)?,
            },
            _ => visit(element, &plain, &mut parsed.verse)?,
        }
    }
    Ok(Some(parsed))
}

fn has_nested_footnote(element: ElementRef<'_>) -> bool {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|e| e.value().classes().any(|class| class == "footnote"))
}

fn visit(element: ElementRef<'_>, attributes: &Attributes, out: &mut Vec<Fragment>) -> Result<()> {
    match element.value().name().parse::<Tag>()? {
        Tag::Big => descend(element, attributes, out),
        // Sefaria sometimes separates two words with nothing but a <br>.
        Tag::LineBreak => {
            out.push(Fragment::with_attributes(attributes.clone(), " "));
            descend(element, attributes, out)
        },
        Tag::Italic => descend(element, &attributes.with_flags(|f| f.emphasis = true), out),
        Tag::Small => descend(element, &attributes.with_flags(|f| f.small_caps = true), out),
        Tag::Strong => descend(element, &attributes.with_flags(|f| f.strong = true), out),
        Tag::Superscript => descend(element, &attributes.with_flags(|f| f.superscript = true), out),
    }
}

fn descend(element: ElementRef<'_>, attributes: &Attributes, out: &mut Vec<Fragment>) -> Result<()> {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push(Fragment::with_attributes(attributes.clone(), &**text)),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    visit(child, attributes, out)?;
                }
            },
            other => exn::bail!(ErrorKind::UnrecognizedMarkup(format!("{other:?}"))),
        }
    }
    Ok(())
}
