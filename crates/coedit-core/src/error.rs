//! Error types for the versioning engine.
//!
//! All errors in the system are represented by the [`Error`] enum.
//! The engine returns them to the caller unchanged; the transport layer
//! decides how each variant maps to a user-facing response.

use crate::models::{DocumentId, UserRef};
use chrono::{DateTime, Utc};
use std::io;
use thiserror::Error as ThisError;

/// The core error type for all engine operations.
#[derive(ThisError, Debug)]
pub enum Error {
    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Document (or other keyed record) not found
    #[error("Not found: {key}")]
    NotFound { key: String },

    /// No version with this number exists for the document
    #[error("Version {version} not found for document {document_id}")]
    VersionNotFound {
        document_id: DocumentId,
        version: u64,
    },

    /// A different, non-expired holder owns the document lock
    #[error(
        "Document {document_id} is locked by {} since {}",
        .holder.display_name,
        .acquired_at.to_rfc3339()
    )]
    AlreadyLocked {
        document_id: DocumentId,
        holder: UserRef,
        acquired_at: DateTime<Utc>,
    },

    /// Caller tried to release a lock it does not hold
    #[error("{caller} does not hold the lock on document {document_id}")]
    NotLockHolder {
        document_id: DocumentId,
        caller: String,
    },

    /// Atomic save detected a concurrent write
    #[error("Concurrent write detected on document {document_id}, please retry")]
    RepositoryConflict { document_id: DocumentId },

    /// Record could not be encoded or decoded
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },

    /// Invalid configuration
    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    /// Validation error
    #[error("Validation error: {reason}")]
    ValidationError { reason: String },
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an IO error
    pub fn io(err: io::Error) -> Self {
        Error::Io(err)
    }

    /// Create a not found error
    pub fn not_found(key: impl Into<String>) -> Self {
        Error::NotFound { key: key.into() }
    }

    /// Create a version not found error
    pub fn version_not_found(document_id: &DocumentId, version: u64) -> Self {
        Error::VersionNotFound {
            document_id: document_id.clone(),
            version,
        }
    }

    /// Create a lock conflict error carrying the current holder
    pub fn already_locked(
        document_id: &DocumentId,
        holder: UserRef,
        acquired_at: DateTime<Utc>,
    ) -> Self {
        Error::AlreadyLocked {
            document_id: document_id.clone(),
            holder,
            acquired_at,
        }
    }

    /// Create a not-lock-holder error
    pub fn not_lock_holder(document_id: &DocumentId, caller: impl Into<String>) -> Self {
        Error::NotLockHolder {
            document_id: document_id.clone(),
            caller: caller.into(),
        }
    }

    /// Create a repository conflict error
    pub fn repository_conflict(document_id: &DocumentId) -> Self {
        Error::RepositoryConflict {
            document_id: document_id.clone(),
        }
    }

    /// Create a serialization error
    pub fn serialization(reason: impl Into<String>) -> Self {
        Error::Serialization {
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(reason: impl Into<String>) -> Self {
        Error::ConfigError {
            reason: reason.into(),
        }
    }

    /// Create a validation error
    pub fn validation_error(reason: impl Into<String>) -> Self {
        Error::ValidationError {
            reason: reason.into(),
        }
    }

    /// Transient races are the only errors worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::RepositoryConflict { .. })
    }
}
