use crate::models::Word;
use rust_stemmers::{Algorithm, Stemmer as SnowballStemmer};

/// Characters stripped from a word before stemming, in addition to ASCII
/// punctuation.
const EXTRA_PUNCTUATION: &[char] = &['‘', '’', '“', '”', '"', '\'', '—', ',', '…'];

/// Snowball stemmer attaching a search stem to each word.
pub struct Stemmer {
    inner: SnowballStemmer,
}
impl std::fmt::Debug for Stemmer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stemmer").finish_non_exhaustive()
    }
}
impl Stemmer {
    pub fn english() -> Self {
        Self {
            inner: SnowballStemmer::create(Algorithm::English),
        }
    }

    /// Computes the stem of a single display value.
    pub fn stem(&self, value: &str) -> String {
        let stripped: String = value
            .chars()
            .filter(|c| !c.is_ascii_punctuation() && !EXTRA_PUNCTUATION.contains(c))
            .flat_map(char::to_lowercase)
            .collect();
        self.inner.stem(&stripped).into_owned()
    }

    /// Attaches a stem to every word, leaving display values untouched.
    pub fn apply(&self, words: &mut [Word]) {
        for word in words.iter_mut() {
            word.stem = Some(self.stem(&word.value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("created", "creat")]
    #[case("Created,", "creat")]
    #[case("“Let", "let")]
    #[case("waters.”", "water")]
    #[case("darkness—", "dark")]
    #[case("…", "")]
    fn test_stem(#[case] value: &str, #[case] expected: &str) {
        assert_eq!(Stemmer::english().stem(value), expected);
    }

    #[test]
    fn test_apply_keeps_display_value() {
        let mut words = vec![Word::new("Heavens,"), Word::new("earth.")];
        Stemmer::english().apply(&mut words);
        assert_eq!(words[0].value, "Heavens,");
        assert_eq!(words[0].stem.as_deref(), Some("heaven"));
        assert_eq!(words[1].stem.as_deref(), Some("earth"));
    }
}
