//! Table of contents model and chapter/verse coverage.

use std::collections::{BTreeMap, BTreeSet};

use exegete_ingest::models::{Division, Language, ModuleType};
use serde::Serialize;

/// Every finalized module, keyed by shortcode.
pub type TableOfContents = BTreeMap<String, ModuleContents>;

/// Public description of one module and the books it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleContents {
    #[serde(rename = "type")]
    pub kind: ModuleType,
    pub language: Language,
    pub date_created: String,
    pub name: String,
    pub license_text: String,
    pub license_url: String,
    pub url: String,
    pub description: String,
    pub content_hash: String,
    pub books: Vec<BookContents>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookContents {
    pub name: String,
    pub division: Division,
    pub chapters: Vec<ChapterContents>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterContents {
    pub chapter: u32,
    /// `None` when the chapter is only referenced by unversed objects, such
    /// as a chapter title.
    pub verses: Option<VerseCoverage>,
}

/// Verse span of a chapter and the verse numbers missing from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerseCoverage {
    pub first: u32,
    pub last: u32,
    pub gaps: Vec<u32>,
}

/// Stored address of an object that has a chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Address {
    pub chapter_start: u32,
    pub chapter_end: u32,
    pub verse_start: Option<u32>,
    pub verse_end: Option<u32>,
}

/// Summarizes the chapters touched by a book's objects.
///
/// A chapter's verses are every `verse_start` and `verse_end` of objects that
/// start or end in that chapter. Gaps are the numbers between the first and
/// last verse that no such object uses.
pub(crate) fn chapters(addresses: &[Address]) -> Vec<ChapterContents> {
    let mut verses: BTreeMap<u32, BTreeSet<u32>> = BTreeMap::new();
    for address in addresses {
        for chapter in [address.chapter_start, address.chapter_end] {
            let used = verses.entry(chapter).or_default();
            used.extend(address.verse_start);
            used.extend(address.verse_end);
        }
    }
    verses
        .into_iter()
        .map(|(chapter, used)| ChapterContents {
            chapter,
            verses: coverage(&used),
        })
        .collect()
}

fn coverage(used: &BTreeSet<u32>) -> Option<VerseCoverage> {
    let first = *used.first()?;
    let last = *used.last()?;
    Some(VerseCoverage {
        first,
        last,
        gaps: (first..=last).filter(|verse| !used.contains(verse)).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn verse(chapter: u32, verse: u32) -> Address {
        Address {
            chapter_start: chapter,
            chapter_end: chapter,
            verse_start: Some(verse),
            verse_end: Some(verse),
        }
    }

    fn verses(chapter: &ChapterContents) -> &VerseCoverage {
        chapter.verses.as_ref().unwrap()
    }

    #[rstest]
    #[case::contiguous(&[1, 2, 3], 1, 3, &[])]
    #[case::single_gap(&[1, 2, 4, 5], 1, 5, &[3])]
    #[case::several_gaps(&[2, 5, 9], 2, 9, &[3, 4, 6, 7, 8])]
    #[case::single_verse(&[7], 7, 7, &[])]
    fn test_gap_detection(#[case] used: &[u32], #[case] first: u32, #[case] last: u32, #[case] gaps: &[u32]) {
        let addresses: Vec<_> = used.iter().map(|v| verse(1, *v)).collect();
        let chapters = chapters(&addresses);
        assert_eq!(chapters.len(), 1);
        let coverage = verses(&chapters[0]);
        assert_eq!((coverage.first, coverage.last), (first, last));
        assert_eq!(coverage.gaps, gaps);
    }

    #[test]
    fn test_chapters_are_sorted_and_distinct() {
        let chapters = chapters(&[verse(3, 1), verse(1, 1), verse(3, 2), verse(2, 1)]);
        assert_eq!(chapters.iter().map(|c| c.chapter).collect::<Vec<_>>(), [1, 2, 3]);
        assert_eq!(verses(&chapters[2]).last, 2);
    }

    #[test]
    fn test_range_spanning_chapters_counts_in_both() {
        let spanning = Address {
            chapter_start: 1,
            chapter_end: 2,
            verse_start: Some(30),
            verse_end: Some(2),
        };
        let chapters = chapters(&[verse(1, 29), spanning, verse(2, 3)]);
        assert_eq!(chapters.len(), 2);
        // Both ends of the span land in both chapters, as they are stored
        // without per-chapter attribution.
        assert_eq!(verses(&chapters[0]).first, 2);
        assert_eq!(verses(&chapters[0]).last, 30);
        assert_eq!(verses(&chapters[1]).first, 2);
        assert_eq!(verses(&chapters[1]).last, 30);
    }

    #[test]
    fn test_unversed_chapter_has_no_coverage() {
        let title = Address {
            chapter_start: 4,
            chapter_end: 4,
            verse_start: None,
            verse_end: None,
        };
        let chapters = chapters(&[title]);
        assert_eq!(chapters[0].chapter, 4);
        assert_eq!(chapters[0].verses, None);
    }
}
