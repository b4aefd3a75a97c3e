//! SBL Greek New Testament: `sblgnt.xml` holds the text and `sblgntapp.xml`
//! the critical apparatus, which is merged in as footnotes.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;

use exegete_words::{Attributes, Fragment, segment};
use exn::{OptionExt, ResultExt};
use tracing::{instrument, warn};

use super::xml::{self, XmlElement, XmlNode};
use crate::consts::VERSE_ID_REGEX;
use crate::error::{ErrorKind, Result};
use crate::models::{BookEntry, Division, Hunk, Language, ModuleMetadata, ModuleType};
use crate::provenance::Provenance;
use crate::source::{Hunks, Source};

pub const PRIMARY_FILE: &str = "sblgnt.xml";
pub const APPARATUS_FILE: &str = "sblgntapp.xml";

const LICENSE_TEXT: &str = "\
End User License Agreement

SBL Greek New Testament

Copyright 2010 by the Society of Biblical Literature and Logos Bible Software.

You may freely distribute the SBL Greek New Testament (SBLGNT), but you are not permitted to \
sell it on its own, either in print or electronic format. If the SBLGNT constitutes less than \
25 percent of the content of a larger print or electronic work, you may sell it as part of that \
work. The SBLGNT may not be used in a Greek-English diglot without a license, regardless of \
whether such work will be sold or given away.";

/// Parsed `"Book C:V"` / `"Book C:V1-V2"` verse id.
#[derive(Debug, Clone, PartialEq, Eq)]
struct VerseId {
    book: Option<String>,
    chapter: u32,
    verse_start: u32,
    verse_end: u32,
}

fn parse_verse_id(id: &str) -> Result<VerseId> {
    let invalid = || ErrorKind::InvalidReference(id.to_string());
    let captures = VERSE_ID_REGEX.captures(id.trim()).ok_or_raise(invalid)?;
    let chapter = captures[2].parse::<u32>().or_raise(invalid)?;
    let verse_start = captures[3].parse::<u32>().or_raise(invalid)?;
    let verse_end = match captures.get(4) {
        Some(end) => end.as_str().parse::<u32>().or_raise(invalid)?,
        None => verse_start,
    };
    Ok(VerseId {
        book: captures.get(1).map(|m| m.as_str().to_string()),
        chapter,
        verse_start,
        verse_end,
    })
}

/// Adapter for the SBLGNT XML distribution.
#[derive(Debug)]
pub struct Sblgnt {
    provenance: Provenance,
    document: Option<XmlElement>,
    apparatus: Apparatus,
}
impl Sblgnt {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            provenance: Provenance::new(root),
            document: None,
            apparatus: Apparatus::default(),
        }
    }

    fn load(&mut self, file: &str) -> Result<XmlElement> {
        let path = self.provenance.root().join(file);
        xml::parse(&self.provenance.open_to_string(&path)?)
    }
}

impl Source for Sblgnt {
    /// Index of a `<book>` element.
    type Unit = usize;

    fn module(&self) -> ModuleMetadata {
        ModuleMetadata {
            kind: ModuleType::Bible,
            name: "SBL Greek New Testament".into(),
            shortcode: "SBLGNT".into(),
            license_text: LICENSE_TEXT.into(),
            license_url: "https://sblgnt.com/license/".into(),
            url: "https://sblgnt.com".into(),
            description: "A critically edited Greek New Testament from Logos Bible Software and the Society of \
                          Biblical Literature."
                .into(),
            language: Language::KoineGreek,
        }
    }

    /// Loads both files; the apparatus is keyed by the book titles found here.
    #[instrument(skip(self), fields(root = %self.provenance.root().display()))]
    fn books(&mut self) -> Result<Vec<BookEntry>> {
        let primary = self.load(PRIMARY_FILE)?;
        if primary.name != "sblgnt" {
            exn::bail!(ErrorKind::MalformedSource(format!("unexpected root <{}>", primary.name)));
        }
        let mut books = Vec::new();
        let mut titles = HashMap::new();
        for (id, book) in (0u32..).zip(primary.elements_named("book")) {
            let first = book
                .elements_named("p")
                .flat_map(|p| p.elements_named("verse-number"))
                .next()
                .ok_or_raise(|| ErrorKind::MalformedSource(format!("book {id} has no verses")))?;
            let verse_id = first
                .attr("id")
                .ok_or_raise(|| ErrorKind::MalformedSource("<verse-number> without id".into()))?;
            let name = parse_verse_id(verse_id)?
                .book
                .ok_or_raise(|| ErrorKind::InvalidReference(verse_id.to_string()))?;
            titles.insert(book.one("title")?.text().trim().to_string(), id);
            books.push(BookEntry::new(id, name, Division::NewTestament));
        }
        let apparatus = self.load(APPARATUS_FILE)?;
        self.apparatus = Apparatus::parse(&apparatus, &titles)?;
        self.document = Some(primary);
        Ok(books)
    }

    fn units(&mut self, book: &BookEntry) -> Result<Vec<usize>> {
        Ok(vec![book.id as usize])
    }

    fn hunks(&mut self, book: &BookEntry, unit: usize) -> Result<Hunks<'_>> {
        let Self { document, apparatus, .. } = self;
        let document = document
            .as_ref()
            .ok_or_raise(|| ErrorKind::MalformedSource("books must be listed before reading hunks".into()))?;
        let element = document
            .elements_named("book")
            .nth(unit)
            .ok_or_raise(|| ErrorKind::MalformedSource(format!("no book element {unit}")))?;
        Ok(Box::new(BookStream::new(book.id, element, apparatus)))
    }

    fn provenance(&mut self) -> &mut Provenance {
        &mut self.provenance
    }
}

// ============================================================================
// Apparatus
// ============================================================================

/// `(book id, chapter, last verse)` of the verse an entry is attached to.
type ApparatusKey = (u32, u32, u32);

#[derive(Debug, Default)]
struct Apparatus {
    entries: HashMap<ApparatusKey, Vec<Hunk>>,
}
impl Apparatus {
    fn parse(root: &XmlElement, titles: &HashMap<String, u32>) -> Result<Self> {
        let mut entries: HashMap<ApparatusKey, Vec<Hunk>> = HashMap::new();
        for book in root.elements_named("book") {
            let title = book.one("title")?.text();
            let book_id = *titles
                .get(title.trim())
                .ok_or_raise(|| ErrorKind::MalformedSource(format!("apparatus for unknown book {title:?}")))?;
            for node in book.elements() {
                match node.name.as_str() {
                    "title" => {},
                    "p" => {
                        let (id, hunk) = entry(node)?;
                        entries.entry((book_id, id.chapter, id.verse_end)).or_default().push(hunk);
                    },
                    other => exn::bail!(ErrorKind::UnrecognizedMarkup(format!("<{other}> in apparatus"))),
                }
            }
        }
        Ok(Self { entries })
    }

    /// Removes and returns the entries for a verse; each is emitted once.
    fn take(&mut self, key: ApparatusKey) -> Vec<Hunk> {
        self.entries.remove(&key).unwrap_or_default()
    }

    fn remaining(&self, book_id: u32) -> usize {
        self.entries.iter().filter(|((id, _, _), _)| *id == book_id).map(|(_, v)| v.len()).sum()
    }
}

/// One apparatus paragraph: a verse number, then text with `<b>` lemmas.
fn entry(p: &XmlElement) -> Result<(VerseId, Hunk)> {
    let mut nodes = p
        .children
        .iter()
        .skip_while(|node| matches!(node, XmlNode::Text(text) if text.trim().is_empty()));
    let id = match nodes.next() {
        Some(XmlNode::Element(first)) if first.name == "verse-number" => parse_verse_id(
            first
                .attr("id")
                .ok_or_raise(|| ErrorKind::MalformedSource("<verse-number> without id".into()))?,
        )?,
        _ => exn::bail!(ErrorKind::MalformedSource("apparatus entry without a verse number".into())),
    };
    let mut fragments = Vec::new();
    for node in nodes {
        apparatus_fragments(node, &Attributes::default(), &mut fragments)?;
    }
    let hunk = Hunk::footnote(segment(fragments)).at(id.chapter, id.verse_start, id.verse_end);
    Ok((id, hunk))
}

fn apparatus_fragments(node: &XmlNode, attributes: &Attributes, out: &mut Vec<Fragment>) -> Result<()> {
    match node {
        XmlNode::Text(text) => out.push(Fragment::with_attributes(attributes.clone(), text.as_str())),
        XmlNode::Element(element) if element.name == "b" => {
            let strong = attributes.with_flags(|f| f.strong = true);
            for child in &element.children {
                apparatus_fragments(child, &strong, out)?;
            }
        },
        XmlNode::Element(element) => {
            exn::bail!(ErrorKind::UnrecognizedMarkup(format!("<{}> in apparatus entry", element.name)))
        },
    }
    Ok(())
}

// ============================================================================
// Primary text
// ============================================================================

/// The verse being accumulated. Verses span paragraphs, so this outlives
/// any single `<p>`.
#[derive(Debug, Default)]
struct VerseState {
    address: Option<VerseId>,
    fragments: Vec<Fragment>,
}
impl VerseState {
    fn is_empty(&self) -> bool {
        self.address.is_none() && self.fragments.is_empty()
    }
}

/// Walks the children of one `<book>`, one element per step. Each step
/// updates the verse state and queues whatever hunks it completed.
struct BookStream<'a> {
    book_id: u32,
    nodes: std::slice::Iter<'a, XmlNode>,
    state: VerseState,
    apparatus: &'a mut Apparatus,
    queue: VecDeque<Hunk>,
    finished: bool,
}
impl<'a> BookStream<'a> {
    fn new(book_id: u32, book: &'a XmlElement, apparatus: &'a mut Apparatus) -> Self {
        Self {
            book_id,
            nodes: book.children.iter(),
            state: VerseState::default(),
            apparatus,
            queue: VecDeque::new(),
            finished: false,
        }
    }

    fn step(&mut self, node: &XmlElement) -> Result<()> {
        match node.name.as_str() {
            "title" | "mark-end" => {
                self.flush();
                self.queue.push_back(Hunk::title(segment([Fragment::new(node.deep_text())])));
            },
            "p" => self.paragraph(node)?,
            other => exn::bail!(ErrorKind::UnrecognizedMarkup(format!("<{other}> in book"))),
        }
        Ok(())
    }

    fn paragraph(&mut self, p: &XmlElement) -> Result<()> {
        // A verse continuing into a new paragraph needs a word break.
        if !self.state.is_empty() {
            self.state.fragments.push(Fragment::new(" "));
        }
        for node in p.elements() {
            if node.elements().next().is_some() {
                exn::bail!(ErrorKind::MalformedSource(format!("unexpected children in <{}>", node.name)));
            }
            match node.name.as_str() {
                "verse-number" => {
                    self.flush();
                    let id = node
                        .attr("id")
                        .ok_or_raise(|| ErrorKind::MalformedSource("<verse-number> without id".into()))?;
                    self.state.address = Some(parse_verse_id(id)?);
                },
                "w" | "prefix" | "suffix" => self.state.fragments.push(Fragment::new(node.text())),
                other => exn::bail!(ErrorKind::UnrecognizedMarkup(format!("<{other}> in paragraph"))),
            }
        }
        Ok(())
    }

    /// Emits the current verse (if any) followed by its apparatus entries.
    fn flush(&mut self) {
        let state = std::mem::take(&mut self.state);
        if state.is_empty() {
            return;
        }
        let verse = Hunk::verse(segment(state.fragments));
        match state.address {
            Some(id) => {
                self.queue.push_back(verse.at(id.chapter, id.verse_start, id.verse_end));
                self.queue.extend(self.apparatus.take((self.book_id, id.chapter, id.verse_end)));
            },
            // The shorter ending of Mark has no address.
            None => self.queue.push_back(verse),
        }
    }
}
impl Iterator for BookStream<'_> {
    type Item = Result<Hunk>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(hunk) = self.queue.pop_front() {
                return Some(Ok(hunk));
            }
            if self.finished {
                return None;
            }
            match self.nodes.next() {
                Some(XmlNode::Element(node)) => {
                    if let Err(err) = self.step(node) {
                        self.finished = true;
                        self.queue.clear();
                        return Some(Err(err));
                    }
                },
                Some(XmlNode::Text(_)) => {},
                None => {
                    self.flush();
                    self.finished = true;
                    let leftover = self.apparatus.remaining(self.book_id);
                    if leftover > 0 {
                        warn!(book_id = self.book_id, leftover, "apparatus entries matched no verse");
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ObjectType;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    const PRIMARY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<sblgnt>
  <book id="Mk">
    <title>ΚΑΤΑ ΜΑΡΚΟΝ</title>
    <p>
      <verse-number id="Mark 1:1">1:1</verse-number>
      <w>Ἀρχὴ</w><suffix> </suffix><w>τοῦ</w><suffix> </suffix><w>εὐαγγελίου</w>
    </p>
    <p>
      <w>Ἰησοῦ</w><suffix> </suffix>
      <verse-number id="Mark 1:2-3">1:2-3</verse-number>
      <prefix>(</prefix><w>Καθὼς</w><suffix>) </suffix>
    </p>
    <mark-end>[ΣΥΝΤΟΜΟΣ]</mark-end>
    <p><w>Πάντα</w><suffix> </suffix><w>δὲ</w></p>
  </book>
  <book id="Jn">
    <title>ΚΑΤΑ ΙΩΑΝΝΗΝ</title>
    <p><verse-number id="John 1:1">1:1</verse-number><w>Ἐν</w><suffix> </suffix><w>ἀρχῇ</w></p>
  </book>
</sblgnt>"#;

    const APPARATUS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<sblgntapp>
  <book>
    <title>ΚΑΤΑ ΜΑΡΚΟΝ</title>
    <p><verse-number id="Mark 1:1">1:1</verse-number> <b>Ἰησοῦ</b> WH NIV] + υἱοῦ θεοῦ Treg</p>
    <p><verse-number id="Mark 1:2">1:2</verse-number> <b>Καθὼς</b> WH] Ὡς RP</p>
  </book>
</sblgntapp>"#;

    fn corpus(primary: &str) -> TempDir {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join(PRIMARY_FILE), primary).unwrap();
        fs::write(root.path().join(APPARATUS_FILE), APPARATUS).unwrap();
        root
    }

    fn values(hunk: &Hunk) -> Vec<&str> {
        hunk.text.iter().map(|w| w.value.as_str()).collect()
    }

    #[rstest]
    #[case("Matthew 1:1", Some("Matthew"), 1, 1, 1)]
    #[case("1 Corinthians 3:4-5", Some("1 Corinthians"), 3, 4, 5)]
    #[case("16:9", None, 16, 9, 9)]
    fn test_parse_verse_id(
        #[case] id: &str,
        #[case] book: Option<&str>,
        #[case] chapter: u32,
        #[case] verse_start: u32,
        #[case] verse_end: u32,
    ) {
        let parsed = parse_verse_id(id).unwrap();
        assert_eq!(parsed.book.as_deref(), book);
        assert_eq!((parsed.chapter, parsed.verse_start, parsed.verse_end), (chapter, verse_start, verse_end));
    }

    #[rstest]
    #[case("Matthew")]
    #[case("Matthew 1")]
    #[case("Matthew one:two")]
    fn test_parse_verse_id_invalid(#[case] id: &str) {
        let err = parse_verse_id(id).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidReference(_)));
    }

    #[test]
    fn test_books() {
        let root = corpus(PRIMARY);
        let mut source = Sblgnt::new(root.path());
        let books = source.books().unwrap();
        assert_eq!(
            books,
            [
                BookEntry::new(0, "Mark", Division::NewTestament),
                BookEntry::new(1, "John", Division::NewTestament),
            ]
        );
        let mut inputs: Vec<_> = source.provenance().take_pending().into_iter().map(|i| i.filename).collect();
        inputs.sort();
        assert_eq!(inputs, [PRIMARY_FILE, APPARATUS_FILE]);
    }

    #[test]
    fn test_hunks_merge_apparatus() {
        let root = corpus(PRIMARY);
        let mut source = Sblgnt::new(root.path());
        let books = source.books().unwrap();
        let unit = source.units(&books[0]).unwrap()[0];
        let hunks: Vec<Hunk> = source.hunks(&books[0], unit).unwrap().collect::<Result<_>>().unwrap();

        let kinds: Vec<_> = hunks.iter().map(|h| h.kind).collect();
        assert_eq!(
            kinds,
            [
                ObjectType::Title,
                ObjectType::Verse,
                ObjectType::Footnote,
                ObjectType::Verse,
                ObjectType::Title,
                ObjectType::Verse,
            ]
        );
        assert_eq!(values(&hunks[0]), ["ΚΑΤΑ", "ΜΑΡΚΟΝ"]);
        assert_eq!(values(&hunks[1]), ["Ἀρχὴ", "τοῦ", "εὐαγγελίου", "Ἰησοῦ"]);
        assert_eq!((hunks[1].chapter_start, hunks[1].verse_start), (Some(1), Some(1)));
        assert_eq!(hunks[2].text[0].value, "Ἰησοῦ");
        assert!(hunks[2].text[0].attributes.flags.strong);
        assert!(!hunks[2].text[1].attributes.flags.strong);
        assert_eq!(values(&hunks[3]), ["(Καθὼς)"]);
        assert_eq!((hunks[3].verse_start, hunks[3].verse_end), (Some(2), Some(3)));
        // Shorter ending of Mark.
        assert_eq!(values(&hunks[5]), ["Πάντα", "δὲ"]);
        assert!(!hunks[5].is_addressed());
        assert!(hunks.iter().all(|h| h.text.iter().all(|w| w.stem.is_none())));
        assert!(hunks.iter().all(|h| h.validate().is_ok()));
    }

    #[test]
    fn test_apparatus_entries_emitted_once() {
        let root = corpus(PRIMARY);
        let mut source = Sblgnt::new(root.path());
        let books = source.books().unwrap();
        let first: Vec<Hunk> = source.hunks(&books[0], 0).unwrap().collect::<Result<_>>().unwrap();
        let again: Vec<Hunk> = source.hunks(&books[0], 0).unwrap().collect::<Result<_>>().unwrap();
        let footnotes = |hunks: &[Hunk]| hunks.iter().filter(|h| h.kind == ObjectType::Footnote).count();
        assert_eq!(footnotes(&first), 1);
        assert_eq!(footnotes(&again), 0);
    }

    #[test]
    fn test_unrecognized_element_stops_stream() {
        let primary = PRIMARY.replace("<mark-end>[ΣΥΝΤΟΜΟΣ]</mark-end>", "<section>x</section>");
        let root = corpus(&primary);
        let mut source = Sblgnt::new(root.path());
        let books = source.books().unwrap();
        let results: Vec<Result<Hunk>> = source.hunks(&books[0], 0).unwrap().collect();
        let err = results.last().unwrap().as_ref().unwrap_err();
        assert!(matches!(&**err, ErrorKind::UnrecognizedMarkup(_)));
        assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
    }

    #[test]
    fn test_hunks_before_books() {
        let root = corpus(PRIMARY);
        let mut source = Sblgnt::new(root.path());
        let book = BookEntry::new(0, "Mark", Division::NewTestament);
        let err = source.hunks(&book, 0).err().unwrap();
        assert!(matches!(&*err, ErrorKind::MalformedSource(_)));
    }
}
