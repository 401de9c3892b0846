//! File-backed repository: one JSON record per document.
//!
//! Saves are serialized per document, re-check the on-disk revision, then
//! write to a temp file and rename over the record so a crash never leaves a
//! half-written document behind.

use crate::repository::{DocumentRepository, check_revision};
use async_trait::async_trait;
use coedit_core::prelude::*;
use dashmap::DashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::instrument;

const RECORD_EXTENSION: &str = "json";

/// Repository storing each document as `<root>/<id>.json`
#[derive(Debug)]
pub struct FileRepository {
    root: PathBuf,
    /// Per-document write locks
    locks: DashMap<DocumentId, Arc<Mutex<()>>>,
}

impl FileRepository {
    /// Open (creating if needed) a repository rooted at `root`
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        log::debug!("Opened file repository at {}", root.display());
        Ok(Self {
            root,
            locks: DashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of per-document write locks currently tracked
    pub fn tracked_locks(&self) -> usize {
        self.locks.len()
    }

    /// Resolve the record path, rejecting ids that could escape the root
    fn record_path(&self, id: &DocumentId) -> Result<PathBuf> {
        let raw = id.as_str();
        let valid = !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(Error::validation_error(format!(
                "Invalid document id: {:?}",
                raw
            )));
        }
        Ok(self.root.join(format!("{}.{}", raw, RECORD_EXTENSION)))
    }

    fn lock_for(&self, id: &DocumentId) -> Arc<Mutex<()>> {
        self.locks.entry(id.clone()).or_default().clone()
    }

    async fn read_record(&self, path: &Path) -> Result<Option<Document>> {
        match fs::read_to_string(path).await {
            Ok(json) => serde_json::from_str(&json).map(Some).map_err(|e| {
                Error::serialization(format!("Corrupt record {}: {}", path.display(), e))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(e)),
        }
    }
}

#[async_trait]
impl DocumentRepository for FileRepository {
    async fn get(&self, id: &DocumentId) -> Result<Document> {
        let path = self.record_path(id)?;
        self.read_record(&path)
            .await?
            .ok_or_else(|| Error::not_found(format!("document {}", id)))
    }

    #[instrument(skip(self, document), fields(document = %document.id, revision = document.revision), name = "file_save")]
    async fn save(&self, mut document: Document) -> Result<Document> {
        let path = self.record_path(&document.id)?;
        let lock = self.lock_for(&document.id);
        let _guard = lock.lock().await;

        let stored = self.read_record(&path).await?;
        check_revision(stored.as_ref(), &document)?;

        document.revision += 1;
        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| Error::serialization(format!("Failed to encode document: {}", e)))?;

        // Write to temp file first, then rename over the record
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, json).await?;
        fs::rename(&temp_path, &path).await?;

        log::debug!(
            "Stored {} at revision {} (version {})",
            document.id,
            document.revision,
            document.current_version
        );
        Ok(document)
    }

    async fn delete(&self, id: &DocumentId) -> Result<()> {
        let path = self.record_path(id)?;
        let lock = self.lock_for(id);
        let guard = lock.lock().await;

        let removed = match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(Error::not_found(format!("document {}", id)))
            }
            Err(e) => Err(Error::io(e)),
        };

        drop(guard);
        drop(lock);
        // Keep the entry while another task still holds or awaits it
        self.locks
            .remove_if(id, |_, entry| Arc::strong_count(entry) == 1);
        removed
    }

    async fn list_ids(&self) -> Result<Vec<DocumentId>> {
        let mut ids = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(DocumentId::from(stem));
            }
        }
        ids.sort();
        Ok(ids)
    }
}
