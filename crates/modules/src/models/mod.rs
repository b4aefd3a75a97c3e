mod book;
mod input;
mod module;
mod object;

pub(crate) use self::book::BookRow;
pub(crate) use self::input::InputRow;
pub use self::module::ModuleInfo;
pub(crate) use self::module::ModuleRow;
pub(crate) use self::object::ObjectRow;
