//! Loads a catalog source into the catalog database.
//!
//! The primary entry point is [`ingest`], which consumes the lazy stream
//! produced by [`records`] in chunks and reports [`IngestEvent`]s as it goes.
//! [`run_incremental`] and [`run_full_reload`] drive it to completion.

pub mod error;
mod pipeline;
mod records;

pub use crate::pipeline::{CHUNK_SIZE, IngestEvent, LoadMode, Progress, ingest, run_full_reload, run_incremental};
pub use crate::records::{record, records};
