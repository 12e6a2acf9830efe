use time::Date;

/// Separator used when a record's licenses are flattened into one column.
pub const LICENSE_SEPARATOR: &str = "; ";

/// Bibliographic metadata for one catalog entry, as extracted from its RDF
/// document.
///
/// Records are built once per parse and never modified afterwards; the store
/// persists each id exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BookRecord {
    /// Catalog number (from `rdf:about="ebooks/<id>"`)
    pub id: u64,
    /// Title, empty when the document has none
    pub title: String,
    /// Contributor names in document order (may repeat, may be empty)
    pub authors: Vec<String>,
    /// Publisher, empty when the document has none
    pub publisher: String,
    /// Issue date; absent when missing or not a valid calendar date
    pub published_at: Option<Date>,
    /// Language code as written in the document (e.g. "en")
    pub language: Option<String>,
    /// Classified subjects in document order
    pub subjects: Vec<String>,
    /// License resource identifiers
    pub licenses: Vec<String>,
}
impl BookRecord {
    /// Creates an otherwise empty record for the given catalog number.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            title: String::new(),
            authors: Vec::new(),
            publisher: String::new(),
            published_at: None,
            language: None,
            subjects: Vec::new(),
            licenses: Vec::new(),
        }
    }

    /// Licenses as stored: joined with [`LICENSE_SEPARATOR`].
    ///
    /// ```
    /// use pgrdf_extract::models::BookRecord;
    /// let mut book = BookRecord::new(1);
    /// book.licenses = vec!["CC0".to_string(), "public-domain".to_string()];
    /// assert_eq!(book.license(), "CC0; public-domain");
    /// ```
    pub fn license(&self) -> String {
        self.licenses.join(LICENSE_SEPARATOR)
    }
}
impl AsRef<BookRecord> for BookRecord {
    fn as_ref(&self) -> &BookRecord {
        self
    }
}
