//! Claude Code Log Line Parsing
//!
//! Each line of a project log is one JSON object. Only real user prompts are
//! extracted; assistant turns, tool results, meta entries, and slash-command
//! echoes are skipped.

use std::path::Path;

use chrono::{DateTime, Local};
use prompt_coach_core::Prompt;
use serde::Deserialize;

/// Prefixes of user entries that echo a slash command or its output
const COMMAND_ECHO_PREFIXES: &[&str] = &[
    "<command-name>",
    "<command-message>",
    "<command-args>",
    "<local-command-stdout>",
    "<local-command-stderr>",
    "Caveat: The messages below were generated by the user while running local commands",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogEntry {
    #[serde(rename = "type")]
    entry_type: String,
    #[serde(default)]
    message: Option<LogMessage>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    cwd: Option<String>,
    #[serde(default)]
    is_meta: bool,
    #[serde(default)]
    is_sidechain: bool,
}

#[derive(Debug, Deserialize)]
struct LogMessage {
    #[serde(default)]
    content: Option<LogContent>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LogContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

/// Outcome of parsing one log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// A user prompt
    Prompt(Prompt),
    /// Valid JSON that is not a prompt
    Skipped,
    /// Not a valid log entry
    Malformed(String),
}

/// Parse one log line read from `file_path`.
pub fn parse_line(line: &str, file_path: &Path) -> ParsedLine {
    let entry: LogEntry = match serde_json::from_str(line) {
        Ok(entry) => entry,
        Err(e) => return ParsedLine::Malformed(e.to_string()),
    };

    if entry.entry_type != "user" || entry.is_meta || entry.is_sidechain {
        return ParsedLine::Skipped;
    }

    let Some(content) = entry
        .message
        .and_then(|m| m.content)
        .and_then(prompt_text)
    else {
        return ParsedLine::Skipped;
    };

    if is_command_echo(&content) {
        return ParsedLine::Skipped;
    }

    let Some(timestamp) = entry.timestamp else {
        return ParsedLine::Malformed("user entry without timestamp".to_string());
    };
    let Some(date) = local_date(&timestamp) else {
        return ParsedLine::Malformed(format!("unparsable timestamp: {}", timestamp));
    };

    let session_id = entry
        .session_id
        .or_else(|| stem(file_path))
        .unwrap_or_default();
    let project = entry
        .cwd
        .as_deref()
        .and_then(|cwd| basename(Path::new(cwd)))
        .or_else(|| file_path.parent().and_then(basename))
        .unwrap_or_default();

    ParsedLine::Prompt(Prompt::new(content, timestamp, session_id, project, date))
}

fn prompt_text(content: LogContent) -> Option<String> {
    let text = match content {
        LogContent::Text(text) => text,
        LogContent::Blocks(blocks) => blocks
            .into_iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text)
            .collect::<Vec<_>>()
            .join("\n"),
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn is_command_echo(content: &str) -> bool {
    COMMAND_ECHO_PREFIXES
        .iter()
        .any(|prefix| content.starts_with(prefix))
}

/// `YYYY-MM-DD` of an RFC 3339 timestamp in the local calendar.
pub fn local_date(timestamp: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(timestamp)
        .ok()
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d").to_string())
}

fn basename(path: &Path) -> Option<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
}

fn stem(path: &Path) -> Option<String> {
    path.file_stem().map(|n| n.to_string_lossy().to_string())
}
