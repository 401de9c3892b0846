//! Autosave policy for editor sessions.
//!
//! The engine has no timer of its own. The editor layer keeps an
//! [`EditorSession`], asks [`AutoSaveCoordinator::should_auto_save`] whenever
//! it ticks, and issues a minor, autosave-flagged edit when told to. Two
//! autosaves of identical content record nothing the second time; the
//! session treats that as a successful save.

use crate::engine::{CollabEngine, EditOutcome};
use crate::version::EditRequest;
use chrono::{DateTime, Utc};
use coedit_core::prelude::*;
use serde::{Deserialize, Serialize};

/// Summary used for autosave-originated versions
pub const AUTOSAVE_SUMMARY: &str = "Auto-save";

/// Inputs to the autosave decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub has_unsaved_changes: bool,
    pub last_edit_at: Option<DateTime<Utc>>,
    pub auto_save_interval_ms: u64,
}

impl SessionState {
    pub fn new(auto_save_interval_ms: u64) -> Self {
        Self {
            has_unsaved_changes: false,
            last_edit_at: None,
            auto_save_interval_ms,
        }
    }
}

/// Stateless autosave policy
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoSaveCoordinator;

impl AutoSaveCoordinator {
    /// True once there are unsaved changes and at least the configured
    /// interval has passed since the last edit.
    pub fn should_auto_save(state: &SessionState, now: DateTime<Utc>) -> bool {
        if !state.has_unsaved_changes {
            return false;
        }
        match state.last_edit_at {
            Some(last_edit) => u64::try_from((now - last_edit).num_milliseconds())
                .is_ok_and(|elapsed| elapsed >= state.auto_save_interval_ms),
            None => false,
        }
    }
}

/// One user's editing session on one document
#[derive(Debug, Clone)]
pub struct EditorSession {
    document_id: DocumentId,
    buffer: String,
    state: SessionState,
}

impl EditorSession {
    pub fn new(document_id: DocumentId, content: impl Into<String>, interval_ms: u64) -> Self {
        Self {
            document_id,
            buffer: content.into(),
            state: SessionState::new(interval_ms),
        }
    }

    /// Open a session on the stored document using the engine's interval
    pub fn open(document: &Document, config: &EngineConfig) -> Self {
        Self::new(
            document.id.clone(),
            document.content.clone(),
            config.autosave_interval_ms,
        )
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Record a local edit
    pub fn record_edit(&mut self, content: impl Into<String>, now: DateTime<Utc>) {
        self.buffer = content.into();
        self.state.has_unsaved_changes = true;
        self.state.last_edit_at = Some(now);
    }

    /// The autosave edit to issue, if one is due
    pub fn pending_autosave(&self, now: DateTime<Utc>) -> Option<EditRequest> {
        AutoSaveCoordinator::should_auto_save(&self.state, now).then(|| {
            EditRequest::content(self.buffer.clone())
                .auto_save()
                .with_summary(AUTOSAVE_SUMMARY)
        })
    }

    /// Mark the buffer as persisted (whether or not a version was created)
    pub fn mark_saved(&mut self) {
        self.state.has_unsaved_changes = false;
    }

    /// Autosave through `engine` if due. Returns `None` when nothing was due.
    pub async fn autosave(
        &mut self,
        engine: &CollabEngine,
        caller: &CallerIdentity,
    ) -> Result<Option<EditOutcome>> {
        let Some(request) = self.pending_autosave(engine.now()) else {
            return Ok(None);
        };

        let outcome = engine.apply_edit(&self.document_id, caller, request).await?;
        log::debug!(
            "Autosave of {} finished as {:?}",
            self.document_id,
            outcome.kind
        );
        self.mark_saved();
        Ok(Some(outcome))
    }
}
