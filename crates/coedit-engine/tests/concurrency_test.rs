//! Racing writers, conflict retries and file-backed end-to-end runs

use async_trait::async_trait;
use coedit_engine::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tempfile::TempDir;

fn alice() -> CallerIdentity {
    CallerIdentity::member("alice", "Alice")
}

/// Lets another writer slip in just before the first save
struct InterferingRepository {
    inner: InMemoryRepository,
    armed: AtomicBool,
}

#[async_trait]
impl DocumentRepository for InterferingRepository {
    async fn get(&self, id: &DocumentId) -> Result<Document> {
        self.inner.get(id).await
    }

    async fn save(&self, document: Document) -> Result<Document> {
        if self.armed.swap(false, Ordering::SeqCst) {
            let mut other = self.inner.get(&document.id).await?;
            other.title = "Renamed elsewhere".to_string();
            self.inner.save(other).await?;
        }
        self.inner.save(document).await
    }

    async fn delete(&self, id: &DocumentId) -> Result<()> {
        self.inner.delete(id).await
    }

    async fn list_ids(&self) -> Result<Vec<DocumentId>> {
        self.inner.list_ids().await
    }
}

/// Every save loses the race
struct ContendedRepository {
    inner: InMemoryRepository,
    save_attempts: AtomicUsize,
}

#[async_trait]
impl DocumentRepository for ContendedRepository {
    async fn get(&self, id: &DocumentId) -> Result<Document> {
        self.inner.get(id).await
    }

    async fn save(&self, document: Document) -> Result<Document> {
        self.save_attempts.fetch_add(1, Ordering::SeqCst);
        Err(Error::repository_conflict(&document.id))
    }

    async fn delete(&self, id: &DocumentId) -> Result<()> {
        self.inner.delete(id).await
    }

    async fn list_ids(&self) -> Result<Vec<DocumentId>> {
        self.inner.list_ids().await
    }
}

async fn seeded(content: &str) -> (InMemoryRepository, DocumentId) {
    let inner = InMemoryRepository::new();
    let doc = inner
        .save(Document::new("Doc", content, chrono::Utc::now()))
        .await
        .unwrap();
    (inner, doc.id)
}

#[tokio::test]
async fn test_lost_race_is_retried_without_losing_the_other_write() {
    let (inner, id) = seeded("before").await;
    let repo = Arc::new(InterferingRepository {
        inner,
        armed: AtomicBool::new(true),
    });
    let engine = CollabEngine::new(repo, EngineConfig::default()).unwrap();

    let outcome = engine
        .apply_edit(&id, &alice(), EditRequest::content("after"))
        .await
        .unwrap();

    assert_eq!(outcome.document.content, "after");
    assert_eq!(outcome.document.title, "Renamed elsewhere");
    assert_eq!(outcome.document.current_version, 2);
    assert_eq!(engine.metrics().snapshot().repository_retries, 1);
}

#[tokio::test]
async fn test_second_conflict_surfaces_to_caller() {
    let (inner, id) = seeded("before").await;
    let repo = Arc::new(ContendedRepository {
        inner,
        save_attempts: AtomicUsize::new(0),
    });
    let engine = CollabEngine::new(repo.clone(), EngineConfig::default()).unwrap();

    let err = engine
        .apply_edit(&id, &alice(), EditRequest::content("after"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RepositoryConflict { .. }));
    assert_eq!(repo.save_attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_conflict_without_retry() {
    let (inner, id) = seeded("before").await;
    let repo = Arc::new(ContendedRepository {
        inner,
        save_attempts: AtomicUsize::new(0),
    });
    let config = EngineConfig::builder()
        .retry_on_conflict(false)
        .build()
        .unwrap();
    let engine = CollabEngine::new(repo.clone(), config).unwrap();

    let err = engine.acquire_lock(&id, &alice()).await.unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(repo.save_attempts.load(Ordering::SeqCst), 1);
    assert_eq!(engine.metrics().snapshot().repository_retries, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_edits_keep_history_contiguous() {
    let engine = CollabEngine::new(Arc::new(InMemoryRepository::new()), EngineConfig::default())
        .unwrap();
    let doc = engine.create_document("Doc", "seed").await.unwrap();

    let mut handles = Vec::new();
    for writer in 0..10 {
        let engine = engine.clone();
        let id = doc.id.clone();
        handles.push(tokio::spawn(async move {
            let caller = CallerIdentity::member(format!("writer-{writer}"), "Writer");
            let content = format!("content from writer {writer}");
            let result = engine
                .apply_edit(&id, &caller, EditRequest::content(content.clone()))
                .await;
            (content, result)
        }));
    }

    let mut committed = Vec::new();
    for handle in handles {
        let (content, result) = handle.await.unwrap();
        match result {
            Ok(outcome) => {
                assert_eq!(outcome.kind, EditKind::ContentChanged);
                committed.push((content, outcome.recorded_version.unwrap()));
            }
            Err(e) => assert!(e.is_retryable(), "unexpected error: {e}"),
        }
    }
    assert!(!committed.is_empty());

    let stored = engine.get_document(&doc.id).await.unwrap();
    stored.check_invariants().unwrap();
    assert_eq!(stored.versions.len(), committed.len());

    let numbers: HashSet<u64> = committed.iter().map(|(_, n)| *n).collect();
    assert_eq!(numbers.len(), committed.len());

    // Every committed write is either live or preserved in history
    for (content, _) in &committed {
        let live = stored.content == *content;
        let kept = stored.versions.iter().any(|v| v.content == *content);
        assert!(live || kept, "lost update: {content}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_racing_lock_acquisitions_have_one_winner() {
    let engine = CollabEngine::new(Arc::new(InMemoryRepository::new()), EngineConfig::default())
        .unwrap();
    let doc = engine.create_document("Doc", "seed").await.unwrap();

    let contenders = ["alice", "bob"].map(|name| {
        let engine = engine.clone();
        let id = doc.id.clone();
        tokio::spawn(async move {
            engine
                .acquire_lock(&id, &CallerIdentity::member(name, name))
                .await
        })
    });

    let mut winners = 0;
    for handle in contenders {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(e) => assert!(matches!(e, Error::AlreadyLocked { .. })),
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn test_file_backed_engine_round_trip() {
    let dir = TempDir::new().unwrap();
    let id = {
        let repo = FileRepository::open(dir.path()).await.unwrap();
        let engine = CollabEngine::new(Arc::new(repo), EngineConfig::default()).unwrap();
        let doc = engine
            .create_document_with_id(DocumentId::from("plan"), "Plan", "first draft")
            .await
            .unwrap();
        engine.acquire_lock(&doc.id, &alice()).await.unwrap();
        engine
            .apply_edit(&doc.id, &alice(), EditRequest::content("second draft"))
            .await
            .unwrap();
        doc.id
    };

    let repo = FileRepository::open(dir.path()).await.unwrap();
    let engine = CollabEngine::new(Arc::new(repo), EngineConfig::default()).unwrap();
    let stored = engine.get_document(&id).await.unwrap();

    assert_eq!(stored.content, "second draft");
    assert_eq!(stored.current_version, 2);
    assert!(stored.lock.is_locked());
    assert_eq!(
        engine.get_version(&id, 1).await.unwrap().content,
        "first draft"
    );
}
