use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Division {
    /// First testament (Hebrew scriptures).
    #[serde(rename = "FT")]
    FirstTestament,
    #[serde(rename = "NT")]
    NewTestament,
}
impl Division {
    pub fn as_str(&self) -> &'static str {
        match self {
            Division::FirstTestament => "FT",
            Division::NewTestament => "NT",
        }
    }
}
impl FromStr for Division {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "FT" => Self::FirstTestament,
            "NT" => Self::NewTestament,
            _ => exn::bail!(ErrorKind::MalformedSource(format!("unknown division: {s}"))),
        })
    }
}
impl Display for Division {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// A book as discovered by an adapter; ids are in canonical reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookEntry {
    pub id: u32,
    pub name: String,
    pub division: Division,
}
impl BookEntry {
    pub fn new(id: u32, name: impl Into<String>, division: Division) -> Self {
        Self {
            id,
            name: name.into(),
            division,
        }
    }
}
