//! Lock-free engine counters
//!
//! Design:
//! - Counter: Monotonically increasing atomic u64 values
//! - EngineMetrics: The fixed set of counters the engine updates
//! - MetricsSnapshot: Serializable point-in-time copy

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A lock-free counter metric (monotonically increasing)
#[derive(Debug, Clone)]
pub struct Counter {
    value: Arc<AtomicU64>,
    name: String,
}

impl Counter {
    /// Create a new counter with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            value: Arc::new(AtomicU64::new(0)),
            name: name.into(),
        }
    }

    /// Increment counter by 1
    pub fn increment(&self) {
        self.add(1);
    }

    /// Add value to counter (saturating)
    pub fn add(&self, value: u64) {
        let mut current = self.value.load(Ordering::Relaxed);
        loop {
            let new_value = current.saturating_add(value);
            match self.value.compare_exchange_weak(
                current,
                new_value,
                Ordering::Release,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }

    pub fn value(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Counters maintained by the engine; clones share state.
#[derive(Debug, Clone)]
pub struct EngineMetrics {
    pub edits_applied: Counter,
    pub edits_skipped: Counter,
    pub versions_created: Counter,
    pub lock_conflicts: Counter,
    pub repository_retries: Counter,
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self {
            edits_applied: Counter::new("edits_applied"),
            edits_skipped: Counter::new("edits_skipped"),
            versions_created: Counter::new("versions_created"),
            lock_conflicts: Counter::new("lock_conflicts"),
            repository_retries: Counter::new("repository_retries"),
        }
    }
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            edits_applied: self.edits_applied.value(),
            edits_skipped: self.edits_skipped.value(),
            versions_created: self.versions_created.value(),
            lock_conflicts: self.lock_conflicts.value(),
            repository_retries: self.repository_retries.value(),
        }
    }
}

/// Point-in-time counter values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub edits_applied: u64,
    pub edits_skipped: u64,
    pub versions_created: u64,
    pub lock_conflicts: u64,
    pub repository_retries: u64,
}
