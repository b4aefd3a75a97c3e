//! Corpus adapters. Each one owns a closed markup vocabulary and fails hard
//! on anything outside it.

mod fs;
mod net;
pub mod njps;
pub mod sblgnt;
mod xml;

pub use self::net::NetBible;
pub use self::njps::Njps;
pub use self::sblgnt::Sblgnt;
