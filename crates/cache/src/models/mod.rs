mod author;
mod book;

pub(crate) use self::author::AuthorRow;
pub(crate) use self::book::BookRow;
