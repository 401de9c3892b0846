//! # Document Store
//!
//! Durable storage for versioned documents.
//!
//! - [`repository::DocumentRepository`] - the async repository contract
//! - [`repository::InMemoryRepository`] - lock-guarded map, for tests and
//!   single-process deployments
//! - [`file::FileRepository`] - one JSON record per document, atomic
//!   temp-file-then-rename writes
//! - [`hash::compute_hash`] - content fingerprints stored on versions
//!
//! ## Atomicity
//!
//! A document record embeds its version list, so a single save commits the
//! new content, the bumped `current_version` and the appended version
//! together. Saves are optimistic: each carries the revision it was read at
//! and is rejected with `RepositoryConflict` if another writer got there
//! first.
//!
//! ```no_run
//! use coedit_store::prelude::*;
//! use chrono::Utc;
//!
//! # async fn example() -> Result<()> {
//! let repo = FileRepository::open("/var/lib/coedit").await?;
//! let stored = repo.save(Document::new("Plan", "draft", Utc::now())).await?;
//! assert_eq!(stored.revision, 1);
//! # Ok(())
//! # }
//! ```

pub mod file;
pub mod hash;
pub mod repository;

pub use file::FileRepository;
pub use hash::compute_hash;
pub use repository::{DocumentRepository, InMemoryRepository, check_revision};

pub mod prelude {
    pub use crate::file::FileRepository;
    pub use crate::hash::compute_hash;
    pub use crate::repository::{DocumentRepository, InMemoryRepository};
    pub use coedit_core::prelude::*;
}
