use crate::error::{Error, ErrorKind, Result};
use exn::ResultExt;
use pgrdf_extract::models::{BookRecord, LICENSE_SEPARATOR};
use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BookRow {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) publisher: String,
    #[sqlx(default)]
    pub(crate) published_at: Option<String>,
    #[sqlx(default)]
    pub(crate) language: Option<String>,
    pub(crate) license: String,
}
impl TryFrom<&BookRecord> for BookRow {
    type Error = Error;
    fn try_from(book: &BookRecord) -> Result<Self> {
        Ok(Self {
            id: i64::try_from(book.id).or_raise(|| ErrorKind::InvalidData("book id"))?,
            title: book.title.clone(),
            publisher: book.publisher.clone(),
            published_at: book
                .published_at
                .map(|date| date.format(DATE_FORMAT))
                .transpose()
                .or_raise(|| ErrorKind::InvalidData("published date"))?,
            language: book.language.clone(),
            license: book.license(),
        })
    }
}
impl BookRow {
    /// Rebuilds the record, given the author names and subjects read from
    /// the join tables.
    pub(crate) fn into_record(self, authors: Vec<String>, subjects: Vec<String>) -> Result<BookRecord> {
        let licenses = match self.license.is_empty() {
            true => Vec::new(),
            false => self.license.split(LICENSE_SEPARATOR).map(str::to_string).collect(),
        };
        Ok(BookRecord {
            id: u64::try_from(self.id).or_raise(|| ErrorKind::InvalidData("book id"))?,
            title: self.title,
            authors,
            publisher: self.publisher,
            published_at: self
                .published_at
                .map(|date| Date::parse(&date, DATE_FORMAT))
                .transpose()
                .or_raise(|| ErrorKind::InvalidData("published date"))?,
            language: self.language,
            subjects,
            licenses,
        })
    }
}
