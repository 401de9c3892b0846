//! Domain events handed to the external broadcast layer.
//!
//! The engine publishes after a write has been committed; a sink never sees
//! an event for a save that failed.

use chrono::{DateTime, Utc};
use coedit_core::{DocumentId, UserRef};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Change notifications emitted by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentEvent {
    /// New content was accepted and a version recorded
    ContentChanged {
        document_id: DocumentId,
        new_version: u64,
        is_auto_save: bool,
    },
    /// Title changed without a new version
    TitleChanged {
        document_id: DocumentId,
        title: String,
    },
    LockAcquired {
        document_id: DocumentId,
        holder: UserRef,
        acquired_at: DateTime<Utc>,
    },
    LockReleased {
        document_id: DocumentId,
        released_by: UserRef,
        /// Released by someone other than the holder
        forced: bool,
    },
    /// A stale lock was cleared on access
    LockExpired {
        document_id: DocumentId,
        previous_holder: UserRef,
    },
}

impl DocumentEvent {
    pub fn document_id(&self) -> &DocumentId {
        match self {
            Self::ContentChanged { document_id, .. }
            | Self::TitleChanged { document_id, .. }
            | Self::LockAcquired { document_id, .. }
            | Self::LockReleased { document_id, .. }
            | Self::LockExpired { document_id, .. } => document_id,
        }
    }

    /// Whether collaborators should be notified. Autosaves are silent.
    pub fn is_notifiable(&self) -> bool {
        !matches!(
            self,
            Self::ContentChanged {
                is_auto_save: true,
                ..
            }
        )
    }
}

/// Receiver of engine events
pub trait EventSink: Send + Sync {
    fn publish(&self, event: DocumentEvent);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: DocumentEvent) {}
}

/// Forwards events into an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<DocumentEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver the broadcast layer drains
    pub fn new() -> (Self, UnboundedReceiver<DocumentEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn publish(&self, event: DocumentEvent) {
        // Receiver might be dropped; broadcasting is best effort
        if self.tx.send(event).is_err() {
            log::debug!("Event receiver dropped, discarding event");
        }
    }
}

/// Wraps a sink and drops events that should not reach users
#[derive(Debug, Clone)]
pub struct NotificationFilter<S> {
    inner: S,
}

impl<S: EventSink> NotificationFilter<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: EventSink> EventSink for NotificationFilter<S> {
    fn publish(&self, event: DocumentEvent) {
        if event.is_notifiable() {
            self.inner.publish(event);
        } else {
            log::trace!("Suppressed notification for {}", event.document_id());
        }
    }
}
