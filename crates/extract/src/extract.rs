//! Main extraction logic for catalog RDF documents.

use exn::{OptionExt, ResultExt};
use time::{Date, Month};
use tracing::instrument;

use crate::consts;
use crate::error::{ErrorKind, Result};
use crate::models::BookRecord;
use crate::parse::parse;
use crate::subject::classify;
use crate::tree::Node;

#[derive(Debug)]
pub struct Extractor {
    document: Node,
}
impl Extractor {
    pub fn from_document(document: Node) -> Self {
        Self { document }
    }

    /// Parses the XML up front; fails only if it isn't well-formed.
    pub fn from_xml(xml: &str) -> Result<Self> {
        Ok(Self::from_document(parse(xml)?))
    }

    /// Extraction of the record automatically performs a validity check,
    /// so [`is_valid`](Self::is_valid) is only useful if you don't plan on
    /// extracting it.
    pub fn is_valid(&self) -> bool {
        self.ebook().and_then(Self::id).is_ok()
    }

    /// Extracts the catalog record.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the root element is not `rdf:RDF`,
    /// - there is no `pgterms:ebook` entry (or it's not an element), or
    /// - its `rdf:about` attribute is missing or isn't `ebooks/<number>`, with
    ///   a number between 1 and `i64::MAX`.
    ///
    /// Every other field is best-effort and falls back to empty/absent.
    #[instrument(skip(self), fields(id))]
    pub fn record(&self) -> Result<BookRecord> {
        let ebook = self.ebook()?;
        let id = Self::id(ebook)?;
        tracing::Span::current().record("id", id);
        Ok(BookRecord {
            id,
            title: Self::title(ebook),
            authors: Self::authors(ebook),
            publisher: Self::publisher(ebook),
            published_at: Self::published_at(ebook),
            language: Self::language(ebook),
            subjects: Self::subjects(ebook),
            licenses: self.licenses(),
        })
    }

    fn rdf(&self) -> Result<&Node> {
        self.document.get(consts::ROOT_ELEMENT).ok_or_raise(|| ErrorKind::InvalidDocument)
    }

    fn ebook(&self) -> Result<&Node> {
        let ebook = self
            .rdf()?
            .aggregate(&[consts::EBOOK_ELEMENT])
            .into_iter()
            .next()
            .ok_or_raise(|| ErrorKind::MissingField("pgterms:ebook"))?;
        match ebook {
            Node::Mapping(_) => Ok(ebook),
            _ => exn::bail!(ErrorKind::MissingField("pgterms:ebook")),
        }
    }

    fn id(ebook: &Node) -> Result<u64> {
        let about = match ebook.aggregate(consts::ABOUT_PATH).into_iter().next() {
            Some(Node::Scalar(about)) => about,
            _ => exn::bail!(ErrorKind::MissingField("rdf:about")),
        };
        let digits = consts::EBOOK_ABOUT_REGEX
            .captures(about)
            .and_then(|captures| captures.get(1))
            .ok_or_raise(|| ErrorKind::ParseError {
                field: "rdf:about",
                value: about.to_string(),
            })?;
        let id = digits.as_str().parse::<u64>().or_raise(|| ErrorKind::ParseError {
            field: "rdf:about",
            value: about.to_string(),
        })?;
        // Catalog numbers are stored as SQLite integers.
        if id == 0 || i64::try_from(id).is_err() {
            exn::bail!(ErrorKind::ParseError {
                field: "rdf:about",
                value: about.to_string(),
            });
        }
        Ok(id)
    }

    fn title(ebook: &Node) -> String {
        ebook.first_text(consts::TITLE_PATH).unwrap_or_default().to_string()
    }

    fn authors(ebook: &Node) -> Vec<String> {
        ebook.all_text(consts::AUTHORS_PATH).into_iter().map(str::to_string).collect()
    }

    fn publisher(ebook: &Node) -> String {
        ebook.first_text(consts::PUBLISHER_PATH).unwrap_or_default().to_string()
    }

    fn published_at(ebook: &Node) -> Option<Date> {
        ebook.first_text(consts::ISSUED_PATH).and_then(parse_date)
    }

    fn language(ebook: &Node) -> Option<String> {
        ebook.first_text(consts::LANGUAGE_PATH).filter(|s| !s.is_empty()).map(str::to_string)
    }

    fn subjects(ebook: &Node) -> Vec<String> {
        ebook.aggregate(consts::SUBJECTS_PATH).into_iter().filter_map(classify).collect()
    }

    fn licenses(&self) -> Vec<String> {
        // Only reachable once `ebook()` succeeded, so the root exists.
        let Ok(rdf) = self.rdf() else {
            return Vec::new();
        };
        rdf.all_text(consts::LICENSES_PATH).into_iter().map(str::to_string).collect()
    }
}

impl TryFrom<&Extractor> for BookRecord {
    type Error = crate::error::Error;
    fn try_from(extractor: &Extractor) -> Result<Self> {
        extractor.record()
    }
}

/// Parses the leading `YYYY-MM-DD` of a date or date-time value.
///
/// Anything that isn't a real calendar date comes back as `None`; a bad
/// issue date is not worth rejecting a record over.
fn parse_date(value: &str) -> Option<Date> {
    let captures = consts::DATE_REGEX.captures(value.trim())?;
    let year = captures.get(1)?.as_str().parse::<i32>().ok()?;
    let month = Month::try_from(captures.get(2)?.as_str().parse::<u8>().ok()?).ok()?;
    let day = captures.get(3)?.as_str().parse::<u8>().ok()?;
    Date::from_calendar_date(year, month, day).ok()
}
