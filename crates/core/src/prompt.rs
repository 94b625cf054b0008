//! Prompt Models
//!
//! A prompt is one user message extracted from a conversation log. Prompts are
//! immutable once extracted; everything downstream (batching, caching, live
//! watching) consumes them by reference or by content.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A single user prompt extracted from a conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    /// Prompt text as typed by the user
    pub content: String,
    /// Original log timestamp (ISO 8601)
    pub timestamp: String,
    /// Conversation session identifier
    pub session_id: String,
    /// Project name the conversation belongs to
    pub project: String,
    /// Calendar date of the prompt (`YYYY-MM-DD`)
    pub date: String,
}

impl Prompt {
    /// Create a new prompt
    pub fn new(
        content: impl Into<String>,
        timestamp: impl Into<String>,
        session_id: impl Into<String>,
        project: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            timestamp: timestamp.into(),
            session_id: session_id.into(),
            project: project.into(),
            date: date.into(),
        }
    }

    /// Identity used to suppress duplicate emissions within one run.
    pub fn emission_key(&self) -> EmissionKey {
        EmissionKey {
            project: self.project.clone(),
            session_id: self.session_id.clone(),
            timestamp: self.timestamp.clone(),
        }
    }
}

/// `(project, session_id, timestamp)` triple identifying one logged prompt.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmissionKey {
    pub project: String,
    pub session_id: String,
    pub timestamp: String,
}

/// A newly observed prompt and the log file it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptEvent {
    pub prompt: Prompt,
    pub file_path: PathBuf,
}
