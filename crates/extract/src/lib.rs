mod consts;
pub mod error;
mod extract;
pub mod models;
mod parse;
pub mod subject;
mod tree;

use tracing::instrument;

use crate::error::Result;
pub use crate::extract::Extractor;
use crate::models::BookRecord;
pub use crate::parse::parse;
pub use crate::tree::{ATTRIBUTES_KEY, Node, TEXT_KEY};

/// Easy, top-level entrypoint for the extraction of a [`BookRecord`] from the
/// text of one catalog RDF document.
///
/// Validates the document as part of the extraction. See [`Extractor`] for
/// more details.
#[instrument(skip(xml), fields(xml_size = xml.len()))]
pub fn extract(xml: &str) -> Result<BookRecord> {
    Extractor::from_xml(xml)?.record()
}
