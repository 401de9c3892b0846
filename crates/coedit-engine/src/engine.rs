//! The collaborative editing engine.
//!
//! Write path: read the document, clear a stale lock, check the caller may
//! write, mutate in memory, then commit with one revision-checked save and
//! publish events. A save that loses a race is retried once from a fresh
//! read; a second loss surfaces `RepositoryConflict` to the caller.
//!
//! Read-only operations (fetch, history, compare) never consult the lock.

use crate::diff::render_diff;
use crate::events::{DocumentEvent, EventSink, NullSink};
use crate::lock::{LockManager, ReleaseOutcome};
use crate::version::{EditKind, EditRequest, VersionComparison, VersionManager, VersionPage};
use coedit_core::prelude::*;
use coedit_store::DocumentRepository;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::instrument;

/// Result of [`CollabEngine::apply_edit`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOutcome {
    pub document: Document,
    pub kind: EditKind,
    /// Version record created for the superseded content, if any
    pub recorded_version: Option<u64>,
    pub title_changed: bool,
}

impl EditOutcome {
    pub fn created_version(&self) -> bool {
        self.kind == EditKind::ContentChanged
    }
}

/// Versioning and locking engine over a document repository
#[derive(Clone)]
pub struct CollabEngine {
    repository: Arc<dyn DocumentRepository>,
    clock: Arc<dyn Clock>,
    authorizer: Arc<dyn Authorizer>,
    events: Arc<dyn EventSink>,
    locks: LockManager,
    config: EngineConfig,
    metrics: EngineMetrics,
}

impl CollabEngine {
    /// Create an engine with the system clock, role-based overrides and no
    /// event sink.
    pub fn new(repository: Arc<dyn DocumentRepository>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            repository,
            clock: Arc::new(SystemClock),
            authorizer: Arc::new(RoleAuthorizer),
            events: Arc::new(NullSink),
            locks: LockManager::new(config.lock_timeout_ms),
            config,
            metrics: EngineMetrics::new(),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = authorizer;
        self
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    // ==================== Documents ====================

    /// Store a new document at version 1
    #[instrument(skip(self, content), fields(size = content.len()), name = "engine_create")]
    pub async fn create_document(&self, title: &str, content: &str) -> Result<Document> {
        let document = Document::new(title, content, self.clock.now());
        let stored = self.repository.save(document).await?;
        log::info!("Created document {}", stored.id);
        Ok(stored)
    }

    /// Store a new document under a caller-chosen id
    pub async fn create_document_with_id(
        &self,
        id: DocumentId,
        title: &str,
        content: &str,
    ) -> Result<Document> {
        let document = Document::with_id(id, title, content, self.clock.now());
        self.repository.save(document).await
    }

    pub async fn get_document(&self, id: &DocumentId) -> Result<Document> {
        self.repository.get(id).await
    }

    /// Delete a document and its history
    pub async fn delete_document(&self, id: &DocumentId) -> Result<()> {
        self.repository.delete(id).await?;
        log::info!("Deleted document {}", id);
        Ok(())
    }

    // ==================== Edits ====================

    /// Apply an edit on behalf of `caller`.
    ///
    /// Fails with `AlreadyLocked` if someone else holds a live lock. Content
    /// identical to the stored content records nothing and reports
    /// [`EditKind::Unchanged`]; that is not an error.
    #[instrument(
        skip(self, caller, request),
        fields(document = %id, caller = %caller.id, auto_save = request.is_auto_save),
        name = "engine_apply_edit"
    )]
    pub async fn apply_edit(
        &self,
        id: &DocumentId,
        caller: &CallerIdentity,
        request: EditRequest,
    ) -> Result<EditOutcome> {
        let request = &request;
        self.with_conflict_retry(id, move || self.try_apply_edit(id, caller, request))
            .await
    }

    async fn try_apply_edit(
        &self,
        id: &DocumentId,
        caller: &CallerIdentity,
        request: &EditRequest,
    ) -> Result<EditOutcome> {
        let now = self.clock.now();
        let mut document = self.repository.get(id).await?;
        let expired = LockManager::check_expiry(&mut document, now);

        if let Err(e) = LockManager::ensure_writable(&document, &caller.id, now) {
            self.metrics.lock_conflicts.increment();
            log::debug!("Edit on {} by {} rejected: {}", id, caller.id, e);
            return Err(e);
        }

        let applied = VersionManager::apply(&mut document, &caller.user_ref(), request, now);

        if applied.kind == EditKind::Unchanged && expired.is_none() {
            self.metrics.edits_skipped.increment();
            log::debug!("Edit on {} left content unchanged", id);
            return Ok(EditOutcome {
                document,
                kind: applied.kind,
                recorded_version: None,
                title_changed: false,
            });
        }

        let stored = self.repository.save(document).await?;

        if let Some(lock) = expired {
            self.publish_expired(&stored.id, lock);
        }
        match applied.kind {
            EditKind::ContentChanged => {
                self.metrics.edits_applied.increment();
                self.metrics.versions_created.increment();
                log::info!(
                    "Document {} now at version {} (recorded v{})",
                    stored.id,
                    stored.current_version,
                    applied.recorded_version.unwrap_or_default()
                );
                self.events.publish(DocumentEvent::ContentChanged {
                    document_id: stored.id.clone(),
                    new_version: stored.current_version,
                    is_auto_save: request.is_auto_save,
                });
            }
            EditKind::TitleOnly => self.metrics.edits_applied.increment(),
            EditKind::Unchanged => self.metrics.edits_skipped.increment(),
        }
        if applied.title_changed {
            self.events.publish(DocumentEvent::TitleChanged {
                document_id: stored.id.clone(),
                title: stored.title.clone(),
            });
        }

        Ok(EditOutcome {
            document: stored,
            kind: applied.kind,
            recorded_version: applied.recorded_version,
            title_changed: applied.title_changed,
        })
    }

    // ==================== Locks ====================

    /// Acquire (or refresh) the advisory lock for `caller`
    #[instrument(skip(self, caller), fields(document = %id, caller = %caller.id), name = "engine_acquire_lock")]
    pub async fn acquire_lock(
        &self,
        id: &DocumentId,
        caller: &CallerIdentity,
    ) -> Result<DocumentLock> {
        self.with_conflict_retry(id, move || self.try_acquire_lock(id, caller))
            .await
    }

    async fn try_acquire_lock(
        &self,
        id: &DocumentId,
        caller: &CallerIdentity,
    ) -> Result<DocumentLock> {
        let now = self.clock.now();
        let mut document = self.repository.get(id).await?;
        let expired = LockManager::check_expiry(&mut document, now);

        let lock = match self.locks.acquire(&mut document, caller, now) {
            Ok(lock) => lock,
            Err(e) => {
                self.metrics.lock_conflicts.increment();
                return Err(e);
            }
        };
        let stored = self.repository.save(document).await?;

        if let Some(previous) = expired {
            self.publish_expired(&stored.id, previous);
        }
        log::debug!("{} locked {} until {}", caller.id, id, lock.expires_at());
        self.events.publish(DocumentEvent::LockAcquired {
            document_id: stored.id,
            holder: lock.holder.clone(),
            acquired_at: lock.acquired_at,
        });
        Ok(lock)
    }

    /// Release the lock as its holder, or override it with an elevated role.
    /// Releasing an unlocked document succeeds without writing.
    #[instrument(skip(self, caller), fields(document = %id, caller = %caller.id), name = "engine_release_lock")]
    pub async fn release_lock(
        &self,
        id: &DocumentId,
        caller: &CallerIdentity,
    ) -> Result<ReleaseOutcome> {
        self.with_conflict_retry(id, move || self.try_release_lock(id, caller))
            .await
    }

    async fn try_release_lock(
        &self,
        id: &DocumentId,
        caller: &CallerIdentity,
    ) -> Result<ReleaseOutcome> {
        let now = self.clock.now();
        let mut document = self.repository.get(id).await?;
        let expired = LockManager::check_expiry(&mut document, now);
        let outcome = LockManager::release(&mut document, caller, self.authorizer.as_ref())?;

        if expired.is_none() && outcome == ReleaseOutcome::AlreadyUnlocked {
            return Ok(outcome);
        }
        let stored = self.repository.save(document).await?;

        if let Some(previous) = expired {
            self.publish_expired(&stored.id, previous);
        }
        if let ReleaseOutcome::Released { previous, forced } = &outcome {
            if *forced {
                log::warn!(
                    "{} overrode lock on {} held by {}",
                    caller.id,
                    id,
                    previous.holder.id
                );
            }
            self.events.publish(DocumentEvent::LockReleased {
                document_id: stored.id.clone(),
                released_by: caller.user_ref(),
                forced: *forced,
            });
        }
        Ok(outcome)
    }

    /// Clear the lock if it is stale and return the resulting lock state
    pub async fn check_expiry(&self, id: &DocumentId) -> Result<LockState> {
        self.with_conflict_retry(id, move || self.try_check_expiry(id))
            .await
    }

    async fn try_check_expiry(&self, id: &DocumentId) -> Result<LockState> {
        let mut document = self.repository.get(id).await?;
        let Some(previous) = LockManager::check_expiry(&mut document, self.clock.now()) else {
            return Ok(document.lock);
        };
        let stored = self.repository.save(document).await?;
        self.publish_expired(&stored.id, previous);
        Ok(stored.lock)
    }

    // ==================== History ====================

    /// Bring back a historic version's content as a new major version.
    /// Existing versions are never renumbered or removed.
    #[instrument(skip(self, caller, note), fields(document = %id, caller = %caller.id), name = "engine_restore")]
    pub async fn restore(
        &self,
        id: &DocumentId,
        caller: &CallerIdentity,
        version_number: u64,
        note: Option<&str>,
    ) -> Result<EditOutcome> {
        let document = self.repository.get(id).await?;
        let request = VersionManager::restore_request(&document, version_number, note)?;
        log::info!("{} restoring {} to version {}", caller.id, id, version_number);
        self.apply_edit(id, caller, request).await
    }

    /// Compare two recorded versions
    pub async fn compare(&self, id: &DocumentId, v1: u64, v2: u64) -> Result<VersionComparison> {
        let document = self.repository.get(id).await?;
        VersionManager::compare(&document, v1, v2)
    }

    /// Page through history, newest first. `page_size` of `None` uses the
    /// configured default.
    pub async fn list_versions(
        &self,
        id: &DocumentId,
        page: usize,
        page_size: Option<usize>,
    ) -> Result<VersionPage> {
        let document = self.repository.get(id).await?;
        VersionManager::page(
            &document,
            page,
            page_size.unwrap_or(self.config.default_page_size),
            self.config.max_page_size,
        )
    }

    pub async fn get_version(&self, id: &DocumentId, version_number: u64) -> Result<Version> {
        let document = self.repository.get(id).await?;
        VersionManager::get(&document, version_number)
    }

    /// Line-level preview between a recorded version and its successor
    /// state (the next version, or the live content for the latest one).
    pub async fn render_diff(&self, id: &DocumentId, version_number: u64) -> Result<String> {
        let document = self.repository.get(id).await?;
        let version = VersionManager::get(&document, version_number)?;
        let next = document
            .version(version_number + 1)
            .map(|v| v.content.as_str())
            .unwrap_or(document.content.as_str());
        Ok(render_diff(&version.content, next))
    }

    // ==================== Internals ====================

    /// Run `attempt`, and once more if it lost a save race.
    async fn with_conflict_retry<T, F, Fut>(&self, id: &DocumentId, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match attempt().await {
            Err(e) if e.is_retryable() && self.config.retry_on_conflict => {
                self.metrics.repository_retries.increment();
                log::warn!("Concurrent write on {}, retrying once", id);
                attempt().await
            }
            other => other,
        }
    }

    fn publish_expired(&self, id: &DocumentId, previous: DocumentLock) {
        self.events.publish(DocumentEvent::LockExpired {
            document_id: id.clone(),
            previous_holder: previous.holder,
        });
    }
}
