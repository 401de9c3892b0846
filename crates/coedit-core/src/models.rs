//! Core data models for versioned, lockable documents.
//!
//! These types are designed to be:
//! - **Serializable**: the persisted shape is a document record with an
//!   embedded, append-only version list
//! - **Type-Safe**: enums replace ad hoc optional fields (see [`LockState`])
//! - **Immutable history**: a [`Version`] is never mutated after creation

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Average reading speed used for `reading_time_minutes`.
pub const WORDS_PER_MINUTE: usize = 200;

/// Stable document identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identity recorded on locks and versions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRef {
    pub id: String,
    pub display_name: String,
}

impl UserRef {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Role supplied by the authorization collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Member,
    Admin,
}

impl Role {
    /// Elevated roles may override another user's lock
    pub fn is_elevated(self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "member" => Ok(Role::Member),
            "admin" => Ok(Role::Admin),
            other => Err(Error::validation_error(format!("Unknown role: {}", other))),
        }
    }
}

/// Caller identity as delivered by the auth layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub id: String,
    pub display_name: String,
    pub role: Role,
}

impl CallerIdentity {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            role,
        }
    }

    /// Convenience constructor for a regular member
    pub fn member(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::new(id, display_name, Role::Member)
    }

    pub fn user_ref(&self) -> UserRef {
        UserRef::new(self.id.clone(), self.display_name.clone())
    }
}

/// Coarse classification attached to a version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    #[default]
    Minor,
    Major,
    Patch,
}

impl ChangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minor => "minor",
            Self::Major => "major",
            Self::Patch => "patch",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "minor" => Ok(Self::Minor),
            "major" => Ok(Self::Major),
            "patch" => Ok(Self::Patch),
            other => Err(Error::validation_error(format!(
                "Unknown change type: {} (expected minor, major or patch)",
                other
            ))),
        }
    }
}

/// Word-level change summary between two contents.
///
/// `modified` is reserved and currently always empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<String>,
}

impl VersionDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

/// Statistics derived from content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    pub word_count: usize,
    pub character_count: usize,
    pub reading_time_minutes: usize,
}

impl DocumentStats {
    pub fn from_content(content: &str) -> Self {
        let word_count = content.split_whitespace().count();
        Self {
            word_count,
            character_count: content.chars().count(),
            reading_time_minutes: word_count.div_ceil(WORDS_PER_MINUTE),
        }
    }
}

/// An advisory lock on a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLock {
    pub holder: UserRef,
    pub acquired_at: DateTime<Utc>,
    pub timeout_ms: u64,
}

impl DocumentLock {
    pub fn new(holder: UserRef, acquired_at: DateTime<Utc>, timeout_ms: u64) -> Self {
        Self {
            holder,
            acquired_at,
            timeout_ms,
        }
    }

    /// Expiry instant, saturating at the latest representable time
    pub fn expires_at(&self) -> DateTime<Utc> {
        i64::try_from(self.timeout_ms)
            .ok()
            .and_then(Duration::try_milliseconds)
            .and_then(|timeout| self.acquired_at.checked_add_signed(timeout))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// A lock is stale once `timeout_ms` or more has elapsed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    pub fn is_held_by(&self, user_id: &str) -> bool {
        self.holder.id == user_id
    }
}

/// Lock state of a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LockState {
    #[default]
    Unlocked,
    Locked(DocumentLock),
}

impl LockState {
    pub fn is_locked(&self) -> bool {
        matches!(self, LockState::Locked(_))
    }

    pub fn lock(&self) -> Option<&DocumentLock> {
        match self {
            LockState::Locked(lock) => Some(lock),
            LockState::Unlocked => None,
        }
    }
}

/// Immutable snapshot of superseded content plus edit metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub version_number: u64,
    /// Full content of the state that was superseded
    pub content: String,
    pub content_hash: String,
    pub edited_by: UserRef,
    pub edited_at: DateTime<Utc>,
    pub change_type: ChangeType,
    pub changes: String,
    pub is_auto_save: bool,
    pub diff: VersionDiff,
    pub word_count: usize,
    pub character_count: usize,
}

/// A versioned, lockable document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub content: String,
    pub current_version: u64,
    /// Append-only; insertion order is chronological
    pub versions: Vec<Version>,
    pub lock: LockState,
    pub stats: DocumentStats,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency stamp owned by the repository (0 = never stored)
    #[serde(default)]
    pub revision: u64,
}

impl Document {
    /// Create a fresh, unsaved document at version 1
    pub fn new(title: impl Into<String>, content: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self::with_id(DocumentId::generate(), title, content, now)
    }

    pub fn with_id(
        id: DocumentId,
        title: impl Into<String>,
        content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let content = content.into();
        Self {
            id,
            title: title.into(),
            stats: DocumentStats::from_content(&content),
            content,
            current_version: 1,
            versions: Vec::new(),
            lock: LockState::Unlocked,
            created_at: now,
            updated_at: now,
            revision: 0,
        }
    }

    pub fn version(&self, number: u64) -> Option<&Version> {
        // Numbers are dense and start at 1, so the index is a fast path.
        let idx = usize::try_from(number).ok()?.checked_sub(1)?;
        match self.versions.get(idx) {
            Some(v) if v.version_number == number => Some(v),
            _ => self.versions.iter().find(|v| v.version_number == number),
        }
    }

    pub fn latest_version(&self) -> Option<&Version> {
        self.versions.last()
    }

    /// Verify `current_version - 1 == versions.len()` and dense numbering.
    pub fn check_invariants(&self) -> Result<()> {
        if self.current_version == 0 {
            return Err(Error::validation_error(format!(
                "Document {} has version 0",
                self.id
            )));
        }
        if self.current_version - 1 != self.versions.len() as u64 {
            return Err(Error::validation_error(format!(
                "Document {} at version {} has {} version records",
                self.id,
                self.current_version,
                self.versions.len()
            )));
        }
        for (idx, version) in self.versions.iter().enumerate() {
            if version.version_number != idx as u64 + 1 {
                return Err(Error::validation_error(format!(
                    "Document {} has version {} at position {}",
                    self.id,
                    version.version_number,
                    idx + 1
                )));
            }
        }
        Ok(())
    }
}
