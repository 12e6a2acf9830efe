pub mod backend;
pub mod error;
mod path;

pub use crate::backend::DocumentSource;
pub use crate::path::{document_path, parse_id};
use std::sync::Arc;

pub type SourceHandle = Arc<dyn DocumentSource + Send + Sync>;
