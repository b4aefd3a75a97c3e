mod book;
mod hunk;
mod module;

pub use self::book::{BookEntry, Division};
pub use self::hunk::{Hunk, ObjectType};
pub use self::module::{Language, ModuleMetadata, ModuleType};
