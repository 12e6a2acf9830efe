//! Local filesystem document source.

use crate::backend::DocumentSource;
use crate::error::{ErrorKind, Result};
use crate::path::{document_path, parse_id};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::instrument;

/// Reads documents from an unpacked catalog directory.
///
/// # Examples
///
/// ```no_run
/// use pgrdf_source::backend::LocalSource;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let source = LocalSource::new("cache", "/srv/gutenberg/cache/epub")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalSource {
    name: String,
    /// Directory holding one sub-directory per catalog number
    root: PathBuf,
}
impl LocalSource {
    /// Create a new local source.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute, or is not an existing
    /// directory. Unlike a writable store, a source that doesn't exist yet is
    /// a configuration mistake.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() || !root.is_dir() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        Ok(Self { name: name.into(), root })
    }

    fn map_io_error(e: std::io::Error, id: u64, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(id),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }
}

#[async_trait]
impl DocumentSource for LocalSource {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(source = %self.name))]
    async fn ids(&self) -> Result<Vec<u64>> {
        let map = |e: std::io::Error| match e.kind() {
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(self.root.clone()),
            _ => ErrorKind::Io(e),
        };
        let mut entries = fs::read_dir(&self.root).await.map_err(map)?;
        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(map)? {
            if let Some(id) = entry.file_name().to_str().and_then(parse_id) {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        tracing::debug!(count = ids.len(), "listed catalog documents");
        Ok(ids)
    }

    async fn read(&self, id: u64) -> Result<String> {
        let path = self.root.join(document_path(id));
        let bytes = fs::read(&path).await.map_err(|e| Self::map_io_error(e, id, &path))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
