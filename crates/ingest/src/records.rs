use crate::error::{ErrorKind, Result};
use async_stream::stream;
use exn::ResultExt;
use futures::Stream;
use pgrdf_extract::extract;
use pgrdf_extract::models::BookRecord;
use pgrdf_source::SourceHandle;
use pgrdf_source::error::ErrorKind as SourceErrorKind;
use tracing::instrument;

/// Reads and extracts one document.
///
/// # Errors
///
/// - [`ErrorKind::NotFound`] if the source has no document for `id`,
/// - [`ErrorKind::Source`] if reading it failed for any other reason, or
/// - [`ErrorKind::Extract`] if the document isn't a valid catalog entry.
#[instrument(skip(source), fields(source = source.name()))]
pub async fn record(source: &SourceHandle, id: u64) -> Result<BookRecord> {
    let text = source.read(id).await.map_err(|err| {
        let kind = match &*err {
            SourceErrorKind::NotFound(id) => ErrorKind::NotFound(*id),
            _ => ErrorKind::Source,
        };
        err.raise(kind)
    })?;
    let book = extract(&text).or_raise(|| ErrorKind::Extract)?;
    if book.id != id {
        tracing::warn!(id, found = book.id, "document describes a different catalog number");
    }
    Ok(book)
}

/// Lists every catalog number up front, then lazily reads and extracts one
/// document per item pulled from the returned stream.
///
/// Each item pairs the outcome with the catalog number it was read for, so
/// failures can still be attributed. The stream is single-pass.
pub async fn records(source: &SourceHandle) -> Result<impl Stream<Item = (Result<BookRecord>, u64)> + Send + '_> {
    let ids = source.ids().await.or_raise(|| ErrorKind::Source)?;
    tracing::info!(source = source.name(), documents = ids.len(), "discovered catalog documents");
    Ok(stream! {
        for id in ids {
            yield (record(source, id).await, id);
        }
    })
}
