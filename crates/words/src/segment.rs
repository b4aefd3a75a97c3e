use crate::models::{Attributes, Fragment, Word};
use crate::spacing::introduce_spaces;

/// Incremental word segmenter.
///
/// Each fragment is first passed through [`introduce_spaces`], then its
/// characters are appended to a running buffer; every whitespace character
/// cuts the buffer into a completed word. The attributes of a word are those
/// of the fragment that supplied its first character.
#[derive(Debug, Default)]
pub struct Segmenter {
    buffer: String,
    attributes: Option<Attributes>,
    words: Vec<Word>,
}
impl Segmenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: &Fragment) {
        if fragment.is_whitespace() {
            self.cut();
            return;
        }
        for c in introduce_spaces(&fragment.value).chars() {
            if c.is_whitespace() {
                self.cut();
                continue;
            }
            if self.buffer.is_empty() {
                self.attributes = Some(fragment.attributes.clone());
            }
            self.buffer.push(c);
        }
    }

    fn cut(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let value = std::mem::take(&mut self.buffer);
        let attributes = self.attributes.take().unwrap_or_default();
        self.words.push(Word::with_attributes(value, attributes));
    }

    /// Flushes any trailing word and returns everything segmented so far.
    pub fn finish(mut self) -> Vec<Word> {
        self.cut();
        self.words
    }
}

/// Segments an ordered sequence of fragments into words.
///
/// # Examples
///
/// ```
/// use exegete_words::{Fragment, segment};
/// let words = segment([Fragment::new("light—and darkness")]);
/// let values: Vec<_> = words.iter().map(|w| w.value.as_str()).collect();
/// assert_eq!(values, ["light—", "and", "darkness"]);
/// ```
pub fn segment<I>(fragments: I) -> Vec<Word>
where
    I: IntoIterator,
    I::Item: AsRef<Fragment>,
{
    let mut segmenter = Segmenter::new();
    for fragment in fragments {
        segmenter.push(fragment.as_ref());
    }
    segmenter.finish()
}

impl AsRef<Fragment> for Fragment {
    fn as_ref(&self) -> &Fragment {
        self
    }
}

/// Flattened plaintext projection of a word list, used for search.
pub fn plaintext(words: &[Word]) -> String {
    words.iter().map(|w| w.value.as_str()).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn values(words: &[Word]) -> Vec<&str> {
        words.iter().map(|w| w.value.as_str()).collect()
    }

    #[rstest]
    #[case(&["In the beginning"], &["In", "the", "beginning"])]
    #[case(&["In the", " beginning"], &["In", "the", "beginning"])]
    #[case(&["begin", "ning"], &["beginning"])]
    #[case(&["  leading and trailing  "], &["leading", "and", "trailing"])]
    #[case(&["tabs\tand\nnewlines"], &["tabs", "and", "newlines"])]
    #[case(&["", " ", ""], &[])]
    #[case(&["light", "", "ning"], &["lightning"])]
    #[case(&["light", "\u{a0}", "ning"], &["light", "ning"])]
    fn test_segment_values(#[case] input: &[&str], #[case] expected: &[&str]) {
        let fragments: Vec<Fragment> = input.iter().map(|s| Fragment::new(*s)).collect();
        assert_eq!(values(&segment(&fragments)), expected);
    }

    #[rstest]
    #[case("", false)]
    #[case(" \t\n", true)]
    #[case(" a ", false)]
    fn test_fragment_is_whitespace(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(Fragment::new(value).is_whitespace(), expected);
    }

    #[test]
    fn test_em_dash_splits_into_two_words() {
        let words = segment([Fragment::new("word—word")]);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].value, "word—");
        assert_eq!(words[1].value, "word");
        assert!(!words.iter().any(|w| w.value.contains(char::is_whitespace)));
    }

    #[test]
    fn test_attributes_come_from_first_character() {
        let strong = Attributes::default().with_strongs(vec!["430".to_string()]);
        let fragments = [
            Fragment::with_attributes(strong.clone(), "Go"),
            Fragment::new("d created"),
        ];
        let words = segment(&fragments);
        assert_eq!(values(&words), ["God", "created"]);
        assert_eq!(words[0].attributes, strong);
        assert!(words[1].attributes.is_empty());
    }

    #[test]
    fn test_attributes_do_not_leak_across_whitespace() {
        let emphasis = Attributes::default().with_flags(|f| f.emphasis = true);
        let fragments = [
            Fragment::new("and "),
            Fragment::with_attributes(emphasis.clone(), "it was"),
            Fragment::new(" good"),
        ];
        let words = segment(&fragments);
        assert_eq!(values(&words), ["and", "it", "was", "good"]);
        assert!(words[0].attributes.is_empty());
        assert_eq!(words[1].attributes, emphasis);
        assert_eq!(words[2].attributes, emphasis);
        assert!(words[3].attributes.is_empty());
    }

    #[test]
    fn test_segmentation_is_deterministic() {
        let fragments = [Fragment::new("Then God said—“Let there be light.”")];
        assert_eq!(segment(&fragments), segment(&fragments));
    }

    #[test]
    fn test_plaintext() {
        let words = segment([Fragment::new("  and   there was light ")]);
        assert_eq!(plaintext(&words), "and there was light");
        assert_eq!(plaintext(&[]), "");
    }
}
