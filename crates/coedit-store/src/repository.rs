//! Repository contract and the in-memory implementation.
//!
//! Every save is a compare-and-swap on [`Document::revision`]: the record is
//! written only if the stored revision still matches the one the caller read.
//! Content, version counter and version list are replaced together, so a
//! reader never sees a bumped `current_version` without its version record.

use async_trait::async_trait;
use coedit_core::prelude::*;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::instrument;

/// Durable storage for documents and their embedded version history
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Fetch a document by id
    async fn get(&self, id: &DocumentId) -> Result<Document>;

    /// Atomically store a document.
    ///
    /// Returns the stored copy carrying its new revision. Fails with
    /// [`Error::RepositoryConflict`] when the stored revision moved since
    /// `document` was read.
    async fn save(&self, document: Document) -> Result<Document>;

    /// Delete a document and, transitively, its versions
    async fn delete(&self, id: &DocumentId) -> Result<()>;

    /// Ids of all stored documents, sorted
    async fn list_ids(&self) -> Result<Vec<DocumentId>>;
}

/// Check an incoming save against the currently stored record.
pub fn check_revision(stored: Option<&Document>, incoming: &Document) -> Result<()> {
    match stored {
        Some(current) if current.revision != incoming.revision => {
            log::debug!(
                "Revision mismatch on {}: stored {}, incoming {}",
                incoming.id,
                current.revision,
                incoming.revision
            );
            Err(Error::repository_conflict(&incoming.id))
        }
        Some(_) => Ok(()),
        None if incoming.revision == 0 => Ok(()),
        None => Err(Error::not_found(format!("document {}", incoming.id))),
    }
}

/// In-memory repository behind a single async `RwLock`
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    documents: RwLock<HashMap<DocumentId, Document>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentRepository for InMemoryRepository {
    async fn get(&self, id: &DocumentId) -> Result<Document> {
        self.documents
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("document {}", id)))
    }

    #[instrument(skip(self, document), fields(document = %document.id, revision = document.revision), name = "memory_save")]
    async fn save(&self, mut document: Document) -> Result<Document> {
        let mut documents = self.documents.write().await;
        check_revision(documents.get(&document.id), &document)?;

        document.revision += 1;
        documents.insert(document.id.clone(), document.clone());
        Ok(document)
    }

    async fn delete(&self, id: &DocumentId) -> Result<()> {
        self.documents
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("document {}", id)))
    }

    async fn list_ids(&self) -> Result<Vec<DocumentId>> {
        let mut ids: Vec<_> = self.documents.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
