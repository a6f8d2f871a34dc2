//! On-disk conversation document and its store

use crate::error::{ChatError, ChatResult};
use crate::message::{Message, Role};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Theme recorded when an older document carries none
pub const DEFAULT_THEME: &str = "dark";

/// Maximum characters of the first request shown in a summary
const SUMMARY_REQUEST_CHARS: usize = 100;

/// Flat JSON document holding the active context.
///
/// Only ever written at a turn boundary, never while a response is streaming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedDocument {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(default = "default_theme")]
    pub theme: String,
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

/// Reads and atomically replaces the persisted document at one path
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, or `None` when no file exists yet.
    ///
    /// Parse failures are reported as [`ChatError::CorruptHistory`]; the
    /// message invariants are checked by [`TurnLog::load`](crate::TurnLog::load).
    pub fn load(&self) -> ChatResult<Option<PersistedDocument>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No history file");
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)?;
        let document = serde_json::from_str(&content)
            .map_err(|e| ChatError::CorruptHistory(format!("{}: {}", self.path.display(), e)))?;
        Ok(Some(document))
    }

    /// Write the document through a temporary file and rename it into place
    pub fn save(&self, document: &PersistedDocument) -> ChatResult<()> {
        let json = serde_json::to_string_pretty(document)
            .map_err(|e| ChatError::Storage(std::io::Error::other(e)))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, json)?;
        std::fs::rename(&temp_path, &self.path)?;

        info!(
            path = %self.path.display(),
            messages = document.messages.len(),
            "History persisted"
        );
        Ok(())
    }
}

/// Overview of a persisted document for the history window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySummary {
    pub model: String,
    /// First user request, flattened to one line and truncated
    pub first_request: Option<String>,
    /// Messages after the system prompt
    pub total_turns: usize,
}

impl HistorySummary {
    pub fn from_document(document: &PersistedDocument) -> Self {
        let first_request = document
            .messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| truncate_request(&m.content));

        Self {
            model: document.model.clone(),
            first_request,
            total_turns: document.messages.len().saturating_sub(1),
        }
    }
}

fn truncate_request(content: &str) -> String {
    let flat = content.replace('\n', " ");
    if flat.chars().count() > SUMMARY_REQUEST_CHARS {
        let head: String = flat.chars().take(SUMMARY_REQUEST_CHARS - 3).collect();
        format!("{}...", head)
    } else {
        flat
    }
}
