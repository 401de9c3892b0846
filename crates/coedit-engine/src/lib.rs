//! # Coedit Engine
//!
//! Versioning and collaborative locking for shared documents.
//!
//! ## Components
//!
//! - [`diff`] - word-level change summaries (and line-level previews)
//! - [`lock::LockManager`] - advisory, lazily expiring per-document locks
//! - [`version::VersionManager`] - version records, history paging,
//!   compare and restore
//! - [`autosave`] - autosave policy for editor sessions
//! - [`events`] - change events for the broadcast layer
//! - [`engine::CollabEngine`] - the facade tying them to a repository
//!
//! ## Quick Start
//!
//! ```
//! use coedit_engine::prelude::*;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<()> {
//! let repo = Arc::new(InMemoryRepository::new());
//! let engine = CollabEngine::new(repo, EngineConfig::default())?;
//! let alice = CallerIdentity::member("alice", "Alice");
//!
//! let doc = engine.create_document("Notes", "a b c").await?;
//! engine.acquire_lock(&doc.id, &alice).await?;
//!
//! let outcome = engine
//!     .apply_edit(&doc.id, &alice, EditRequest::content("a b d"))
//!     .await?;
//! assert_eq!(outcome.document.current_version, 2);
//!
//! let v1 = engine.get_version(&doc.id, 1).await?;
//! assert_eq!(v1.content, "a b c");
//! assert_eq!(v1.diff.added, vec!["d"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! The engine holds no in-process lock across I/O. Mutual exclusion between
//! editors is the advisory lock on the document; lost updates between racing
//! writers are prevented by the repository's revision-checked save, and a
//! lost race is retried once before `RepositoryConflict` reaches the caller.

pub mod autosave;
pub mod diff;
pub mod engine;
pub mod events;
pub mod lock;
pub mod version;

pub use autosave::{AutoSaveCoordinator, EditorSession, SessionState};
pub use diff::{render_diff, word_diff};
pub use engine::{CollabEngine, EditOutcome};
pub use events::{ChannelSink, DocumentEvent, EventSink, NotificationFilter, NullSink};
pub use lock::{LockManager, ReleaseOutcome};
pub use version::{EditKind, EditRequest, VersionComparison, VersionManager, VersionPage};

pub mod prelude {
    pub use crate::autosave::{AutoSaveCoordinator, EditorSession, SessionState};
    pub use crate::engine::{CollabEngine, EditOutcome};
    pub use crate::events::{ChannelSink, DocumentEvent, EventSink, NotificationFilter};
    pub use crate::lock::ReleaseOutcome;
    pub use crate::version::{EditKind, EditRequest, VersionComparison, VersionPage};
    pub use coedit_core::prelude::*;
    pub use coedit_store::{DocumentRepository, FileRepository, InMemoryRepository};
}
