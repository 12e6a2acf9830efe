//! Document source trait and implementations.
//!
//! A source hands out catalog numbers and the raw RDF text behind each one.
//! Sources are read-only: the loader never writes back to them.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalSource;
#[cfg(feature = "mock")]
pub use self::mock::MockSource;
use crate::error::Result;
use async_trait::async_trait;

/// Unified interface for catalog document sources.
///
/// # Examples
///
/// ```
/// use pgrdf_source::{backend::DocumentSource, error::Result};
///
/// async fn total_size(source: &dyn DocumentSource) -> Result<usize> {
///     let mut total = 0;
///     for id in source.ids().await? {
///         total += source.read(id).await?.len();
///     }
///     Ok(total)
/// }
/// ```
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Name of the configured source, used for logging only.
    fn name(&self) -> &str;

    /// Every catalog number available, in ascending order.
    ///
    /// Listing is eager (the whole directory is read before returning);
    /// documents themselves are only read on demand.
    async fn ids(&self) -> Result<Vec<u64>>;

    /// Raw text of one document.
    ///
    /// # Errors
    ///
    /// [`NotFound`](crate::error::ErrorKind::NotFound) when the source has no
    /// document for `id`.
    async fn read(&self, id: u64) -> Result<String>;
}
