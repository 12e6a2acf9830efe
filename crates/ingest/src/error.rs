//! Ingest Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An ingest error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for ingest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of an ingest failure.
///
/// ### Per-record Errors
/// Surfaced as [`IngestEvent::Rejected`](crate::IngestEvent::Rejected); the
/// run carries on.
/// - [`ErrorKind::Source`]
/// - [`ErrorKind::NotFound`]
/// - [`ErrorKind::Extract`]
///
/// ### Fatal Errors
/// End the run; records committed before the failure stay committed.
/// - [`ErrorKind::Cache`]
/// - [`ErrorKind::Store`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Reading from the [`DocumentSource`](pgrdf_source::DocumentSource) failed.
    #[display("failed to read from document source")]
    Source,
    /// The source has no document for this catalog number.
    #[display("no document for catalog number {_0}")]
    NotFound(#[error(not(source))] u64),
    /// The document is not a valid catalog entry.
    #[display("failed to extract catalog record")]
    Extract,
    /// A batched lookup or the full-reload clean failed.
    #[display("catalog database error")]
    Cache,
    /// Persisting this book failed; nothing of it was written.
    #[display("failed to store book {_0}")]
    Store(#[error(not(source))] u64),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
