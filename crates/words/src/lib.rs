//! Word segmentation for canonical scripture text.
//!
//! Every ingest adapter reduces its markup to an ordered list of attributed
//! [`Fragment`]s. This crate turns those fragments into discrete [`Word`]s.
//!
//! # Stability
//! External annotation systems address words by `(book, chapter, verse, word
//! offset)`. Any change to how fragments are cut into words shifts those
//! offsets and silently re-targets existing annotations, so the algorithm is
//! deliberately small:
//! - a word ends at every whitespace character,
//! - a word takes the attributes of its first character,
//! - empty words are never emitted.
//!
//! Spacing normalization ([`introduce_spaces`]) runs on every fragment before
//! it is cut, and stemming ([`Stemmer`]) only ever adds a side attribute.

mod models;
mod segment;
mod spacing;
mod stem;

pub use crate::models::{Attributes, Flags, Fragment, Word};
pub use crate::segment::{Segmenter, plaintext, segment};
pub use crate::spacing::{PADDED_DASHES, introduce_spaces};
pub use crate::stem::Stemmer;
