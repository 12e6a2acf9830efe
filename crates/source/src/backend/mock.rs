//! In-memory document source for testing.

use crate::backend::DocumentSource;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// In-memory document source for testing.
///
/// Documents are stored in a `BTreeMap` behind a [`RwLock`], so documents can
/// be added or removed between pipeline runs through a shared reference.
///
/// # Examples
///
/// ```
/// use pgrdf_source::backend::{DocumentSource, MockSource};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let source = MockSource::with_documents([(84, "<rdf:RDF>...</rdf:RDF>")]);
/// source.insert(11, "<rdf:RDF>...</rdf:RDF>").await;
/// assert_eq!(source.ids().await?, vec![11, 84]);
/// # Ok(())
/// # }
/// ```
pub struct MockSource {
    name: String,
    documents: RwLock<BTreeMap<u64, String>>,
}

impl MockSource {
    /// Create a mock source pre-populated with documents.
    pub fn with_documents(documents: impl IntoIterator<Item = (u64, impl Into<String>)>) -> Self {
        Self {
            name: "mock".to_string(),
            documents: RwLock::new(documents.into_iter().map(|(id, text)| (id, text.into())).collect()),
        }
    }

    /// Change the name of the mock source.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add or replace a document.
    pub async fn insert(&self, id: u64, text: impl Into<String>) {
        self.documents.write().await.insert(id, text.into());
    }

    /// Remove a document, returning whether it existed.
    pub async fn remove(&self, id: u64) -> bool {
        self.documents.write().await.remove(&id).is_some()
    }
}
impl Default for MockSource {
    fn default() -> Self {
        let documents: [(u64, String); 0] = [];
        Self::with_documents(documents)
    }
}

#[async_trait]
impl DocumentSource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ids(&self) -> Result<Vec<u64>> {
        Ok(self.documents.read().await.keys().copied().collect())
    }

    async fn read(&self, id: u64) -> Result<String> {
        self.documents.read().await.get(&id).cloned().ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ids_are_sorted() {
        let source = MockSource::with_documents([(3, "c"), (1, "a"), (2, "b")]);
        assert_eq!(source.ids().await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_insert_and_remove() {
        let source = MockSource::default().with_name("test");
        assert_eq!(source.name(), "test");
        source.insert(5, "five").await;
        assert_eq!(source.read(5).await.unwrap(), "five");
        assert!(source.remove(5).await);
        assert!(!source.remove(5).await);
        let err = source.read(5).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(5)));
    }
}
