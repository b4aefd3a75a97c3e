use serde::{Deserialize, Serialize};

fn is_false(value: &bool) -> bool {
    !*value
}

/// Decorative flags projected from presentational markup.
///
/// None of these affect segmentation; they are carried so that a consumer can
/// re-render the text faithfully.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Flags {
    #[serde(rename = "small-caps", default, skip_serializing_if = "is_false")]
    pub small_caps: bool,
    #[serde(rename = "em", default, skip_serializing_if = "is_false")]
    pub emphasis: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strong: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub superscript: bool,
    /// The word is the first one after a hard line break in the source.
    #[serde(rename = "br", default, skip_serializing_if = "is_false")]
    pub line_break: bool,
}
impl Flags {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Attributes inherited by a word from the markup enclosing its first character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attributes {
    /// Strong's concordance numbers (cross-reference codes).
    #[serde(rename = "c-strongs", default, skip_serializing_if = "Vec::is_empty")]
    pub strongs: Vec<String>,
    /// ISO 639-3 language override (e.g. a Hebrew phrase inside English text).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(flatten)]
    pub flags: Flags,
}
impl Attributes {
    pub fn is_empty(&self) -> bool {
        self.strongs.is_empty() && self.language.is_none() && self.flags.is_empty()
    }

    /// Returns a copy of these attributes with the strong's codes replaced.
    pub fn with_strongs(&self, strongs: Vec<String>) -> Self {
        Self { strongs, ..self.clone() }
    }

    pub fn with_language(&self, language: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
            ..self.clone()
        }
    }

    pub fn with_flags(&self, update: impl FnOnce(&mut Flags)) -> Self {
        let mut attributes = self.clone();
        update(&mut attributes.flags);
        attributes
    }
}

/// A run of raw text sharing a single set of attributes.
///
/// Fragments may contain any number of words (or none, or only whitespace).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub attributes: Attributes,
    pub value: String,
}
impl Fragment {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            attributes: Attributes::default(),
            value: value.into(),
        }
    }

    pub fn with_attributes(attributes: Attributes, value: impl Into<String>) -> Self {
        Self { attributes, value: value.into() }
    }

    /// Non-empty and made only of whitespace. Such a fragment ends the
    /// current word and contributes nothing else.
    pub fn is_whitespace(&self) -> bool {
        !self.value.is_empty() && self.value.chars().all(char::is_whitespace)
    }
}
impl From<&str> for Fragment {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
impl From<String> for Fragment {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// A single whitespace-free word: the unit external annotations address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Word {
    pub value: String,
    #[serde(flatten)]
    pub attributes: Attributes,
    /// Morphological stem, used for search only; never replaces `value`.
    #[serde(rename = "s-snowball", default, skip_serializing_if = "Option::is_none")]
    pub stem: Option<String>,
}
impl Word {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            attributes: Attributes::default(),
            stem: None,
        }
    }

    pub fn with_attributes(value: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            value: value.into(),
            attributes,
            stem: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_word_serializes_to_value_only() {
        let json = serde_json::to_string(&Word::new("beginning")).unwrap();
        assert_eq!(json, r#"{"value":"beginning"}"#);
    }

    #[test]
    fn test_attributes_are_flattened() {
        let attributes = Attributes::default()
            .with_strongs(vec!["7225".to_string()])
            .with_flags(|f| f.small_caps = true);
        let mut word = Word::with_attributes("LORD", attributes);
        word.stem = Some("lord".to_string());
        let json = serde_json::to_value(&word).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "value": "LORD",
                "c-strongs": ["7225"],
                "small-caps": true,
                "s-snowball": "lord",
            })
        );
        let back: Word = serde_json::from_value(json).unwrap();
        assert_eq!(back, word);
    }

    #[test]
    fn test_attribute_builders_do_not_mutate_parent() {
        let parent = Attributes::default().with_language("hbo");
        let child = parent.with_flags(|f| f.emphasis = true);
        assert!(!parent.flags.emphasis);
        assert!(child.flags.emphasis);
        assert_eq!(child.language.as_deref(), Some("hbo"));
    }
}
