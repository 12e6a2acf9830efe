//! Layout of the catalog directory.
//!
//! The RDF feed unpacks to one directory per catalog number, each holding a
//! single document: `<id>/pg<id>.rdf`.

use std::path::PathBuf;

/// Path of a document relative to the catalog root.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use pgrdf_source::document_path;
/// assert_eq!(document_path(84), Path::new("84/pg84.rdf"));
/// ```
pub fn document_path(id: u64) -> PathBuf {
    PathBuf::from(id.to_string()).join(format!("pg{id}.rdf"))
}

/// Catalog number of a directory entry name.
///
/// Only names made entirely of ASCII digits that parse to a positive number
/// count; everything else in the catalog root (`DELETE-ME`, `.DS_Store`,
/// `cache`) is ignored.
///
/// # Examples
///
/// ```
/// use pgrdf_source::parse_id;
/// assert_eq!(parse_id("84"), Some(84));
/// assert_eq!(parse_id("0"), None);
/// assert_eq!(parse_id("+84"), None);
/// assert_eq!(parse_id("84.rdf"), None);
/// ```
pub fn parse_id(name: &str) -> Option<u64> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok().filter(|&id| id > 0)
}
