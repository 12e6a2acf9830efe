mod book;

pub use self::book::{BookRecord, LICENSE_SEPARATOR};
