//! CLI subcommands and their execution against a [`CollabEngine`].
//!
//! Every command produces a JSON value; the binary prints it on stdout.

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use coedit_engine::prelude::*;
use serde_json::{Value, json};
use std::path::PathBuf;

/// Where new content comes from
#[derive(Args, Debug, Clone, Default)]
pub struct ContentSource {
    /// Inline content
    #[arg(long, conflicts_with = "file")]
    pub content: Option<String>,

    /// Read content from a file
    #[arg(long)]
    pub file: Option<PathBuf>,
}

impl ContentSource {
    pub fn inline(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            file: None,
        }
    }

    async fn resolve(&self) -> Result<Option<String>> {
        match (&self.content, &self.file) {
            (Some(content), _) => Ok(Some(content.clone())),
            (None, Some(path)) => {
                let content = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("reading {}", path.display()))?;
                Ok(Some(content))
            }
            (None, None) => Ok(None),
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create a document at version 1
    Create {
        #[arg(long)]
        title: String,
        /// Explicit document id (generated when omitted)
        #[arg(long)]
        id: Option<String>,
        #[command(flatten)]
        source: ContentSource,
    },
    /// Print a document
    Show { id: String },
    /// Edit title and/or content
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        source: ContentSource,
        #[arg(long, default_value = "minor")]
        change_type: ChangeType,
        #[arg(long, default_value = "")]
        summary: String,
        /// Mark the edit as an autosave
        #[arg(long)]
        auto_save: bool,
    },
    /// Acquire or refresh the edit lock
    Lock { id: String },
    /// Release the edit lock
    Unlock { id: String },
    /// Clear a stale lock and print the lock state
    Status { id: String },
    /// List versions, newest first
    History {
        id: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Print one recorded version
    Version { id: String, number: u64 },
    /// Word-level comparison of two recorded versions
    Compare { id: String, v1: u64, v2: u64 },
    /// Line-level preview of what changed after a version
    Diff { id: String, number: u64 },
    /// Bring back a recorded version's content as a new version
    Restore {
        id: String,
        number: u64,
        #[arg(long)]
        note: Option<String>,
    },
    /// Delete a document and its history
    Delete { id: String },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Create { .. } => "create",
            Command::Show { .. } => "show",
            Command::Edit { .. } => "edit",
            Command::Lock { .. } => "lock",
            Command::Unlock { .. } => "unlock",
            Command::Status { .. } => "status",
            Command::History { .. } => "history",
            Command::Version { .. } => "version",
            Command::Compare { .. } => "compare",
            Command::Diff { .. } => "diff",
            Command::Restore { .. } => "restore",
            Command::Delete { .. } => "delete",
        }
    }
}

/// Run `command` as `caller` and return its JSON output
pub async fn execute(
    engine: &CollabEngine,
    caller: &CallerIdentity,
    command: Command,
) -> Result<Value> {
    log::debug!("Executing {} as {}", command.name(), caller.id);

    let output = match command {
        Command::Create { title, id, source } => {
            let content = source.resolve().await?.unwrap_or_default();
            let document = match id {
                Some(id) => {
                    engine
                        .create_document_with_id(DocumentId::new(id), &title, &content)
                        .await?
                }
                None => engine.create_document(&title, &content).await?,
            };
            serde_json::to_value(document)?
        }
        Command::Show { id } => serde_json::to_value(engine.get_document(&id.into()).await?)?,
        Command::Edit {
            id,
            title,
            source,
            change_type,
            summary,
            auto_save,
        } => {
            let content = source.resolve().await?;
            if title.is_none() && content.is_none() {
                bail!("edit needs --title, --content or --file");
            }
            let mut request = EditRequest {
                title,
                content,
                change_type,
                summary,
                is_auto_save: false,
            };
            if auto_save {
                request = request.auto_save();
            }
            serde_json::to_value(engine.apply_edit(&id.into(), caller, request).await?)?
        }
        Command::Lock { id } => serde_json::to_value(engine.acquire_lock(&id.into(), caller).await?)?,
        Command::Unlock { id } => {
            serde_json::to_value(engine.release_lock(&id.into(), caller).await?)?
        }
        Command::Status { id } => serde_json::to_value(engine.check_expiry(&id.into()).await?)?,
        Command::History {
            id,
            page,
            page_size,
        } => serde_json::to_value(engine.list_versions(&id.into(), page, page_size).await?)?,
        Command::Version { id, number } => {
            serde_json::to_value(engine.get_version(&id.into(), number).await?)?
        }
        Command::Compare { id, v1, v2 } => {
            serde_json::to_value(engine.compare(&id.into(), v1, v2).await?)?
        }
        Command::Diff { id, number } => {
            let diff = engine.render_diff(&id.into(), number).await?;
            json!({ "version": number, "diff": diff })
        }
        Command::Restore { id, number, note } => serde_json::to_value(
            engine
                .restore(&id.into(), caller, number, note.as_deref())
                .await?,
        )?,
        Command::Delete { id } => {
            let id = DocumentId::from(id);
            engine.delete_document(&id).await?;
            json!({ "deleted": id })
        }
    };

    Ok(output)
}
