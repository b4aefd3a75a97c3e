use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind};

/// Kind of module. Only bibles exist today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    Bible,
}
impl ModuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleType::Bible => "bible",
        }
    }
}
impl FromStr for ModuleType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "bible" => Self::Bible,
            _ => exn::bail!(ErrorKind::MalformedSource(format!("unknown module type: {s}"))),
        })
    }
}
impl Display for ModuleType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Primary language of a module, stored as its ISO 639-3 code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "hbo")]
    BiblicalHebrew,
    #[serde(rename = "ecg")]
    KoineGreek,
    #[serde(rename = "eng")]
    English,
}
impl Language {
    /// Returns the ISO 639-3 code.
    ///
    /// # Examples
    ///
    /// ```
    /// use exegete_ingest::models::Language;
    /// assert_eq!(Language::KoineGreek.code(), "ecg");
    /// assert_eq!("hbo".parse::<Language>().unwrap(), Language::BiblicalHebrew);
    /// ```
    pub fn code(&self) -> &'static str {
        match self {
            Language::BiblicalHebrew => "hbo",
            Language::KoineGreek => "ecg",
            Language::English => "eng",
        }
    }
}
impl FromStr for Language {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "hbo" => Self::BiblicalHebrew,
            "ecg" => Self::KoineGreek,
            "eng" => Self::English,
            _ => exn::bail!(ErrorKind::MalformedSource(format!("unknown language code: {s}"))),
        })
    }
}
impl Display for Language {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.code())
    }
}

/// Immutable descriptive metadata of a module, fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleMetadata {
    #[serde(rename = "type")]
    pub kind: ModuleType,
    pub name: String,
    /// Short public identifier, e.g. `NET`.
    pub shortcode: String,
    pub license_text: String,
    pub license_url: String,
    pub url: String,
    pub description: String,
    pub language: Language,
}
