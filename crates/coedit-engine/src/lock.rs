//! Advisory per-document locks.
//!
//! The lock lives on the document record as a [`LockState`]. Transitions are
//! pure functions over a `Document`; the engine persists the result through
//! the repository's revision-checked save, which is what makes two racing
//! acquirers resolve to a single holder.
//!
//! Expiry is lazy: nothing clears a stale lock until the next lock-sensitive
//! access calls [`LockManager::check_expiry`].

use chrono::{DateTime, Utc};
use coedit_core::prelude::*;
use serde::{Deserialize, Serialize};

/// Result of a release request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReleaseOutcome {
    /// A lock was removed
    Released {
        previous: DocumentLock,
        /// Removed by an elevated caller who was not the holder
        forced: bool,
    },
    /// Nothing to release
    AlreadyUnlocked,
}

/// Lock state transitions
#[derive(Debug, Clone, Copy)]
pub struct LockManager {
    timeout_ms: u64,
}

impl LockManager {
    pub fn new(timeout_ms: u64) -> Self {
        Self { timeout_ms }
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Clear a stale lock, returning it if one was removed.
    pub fn check_expiry(document: &mut Document, now: DateTime<Utc>) -> Option<DocumentLock> {
        let stale = document.lock.lock().is_some_and(|lock| lock.is_expired(now));
        if !stale {
            return None;
        }
        match std::mem::take(&mut document.lock) {
            LockState::Locked(lock) => {
                log::debug!(
                    "Lock on {} held by {} expired at {}",
                    document.id,
                    lock.holder.id,
                    lock.expires_at()
                );
                Some(lock)
            }
            LockState::Unlocked => None,
        }
    }

    /// Fail unless `caller_id` may write: the document is unlocked, locked
    /// by the caller, or locked by someone whose lock has expired.
    pub fn ensure_writable(
        document: &Document,
        caller_id: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        match &document.lock {
            LockState::Locked(lock) if !lock.is_held_by(caller_id) && !lock.is_expired(now) => {
                Err(Error::already_locked(
                    &document.id,
                    lock.holder.clone(),
                    lock.acquired_at,
                ))
            }
            _ => Ok(()),
        }
    }

    /// Take (or refresh) the lock for `caller`.
    pub fn acquire(
        &self,
        document: &mut Document,
        caller: &CallerIdentity,
        now: DateTime<Utc>,
    ) -> Result<DocumentLock> {
        Self::ensure_writable(document, &caller.id, now)?;

        let lock = DocumentLock::new(caller.user_ref(), now, self.timeout_ms);
        document.lock = LockState::Locked(lock.clone());
        Ok(lock)
    }

    /// Release the lock as its holder, or as an authorized override.
    pub fn release(
        document: &mut Document,
        caller: &CallerIdentity,
        authorizer: &dyn Authorizer,
    ) -> Result<ReleaseOutcome> {
        let forced = match &document.lock {
            LockState::Unlocked => return Ok(ReleaseOutcome::AlreadyUnlocked),
            LockState::Locked(lock) if lock.is_held_by(&caller.id) => false,
            LockState::Locked(_) if authorizer.can_override_lock(caller, document) => true,
            LockState::Locked(_) => {
                return Err(Error::not_lock_holder(&document.id, caller.id.clone()));
            }
        };

        match std::mem::take(&mut document.lock) {
            LockState::Locked(previous) => Ok(ReleaseOutcome::Released { previous, forced }),
            LockState::Unlocked => Ok(ReleaseOutcome::AlreadyUnlocked),
        }
    }
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new(coedit_core::DEFAULT_LOCK_TIMEOUT_MS)
    }
}
