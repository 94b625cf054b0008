//! Cross-Platform Path Utilities
//!
//! Functions for resolving engine directories across platforms.
//! Handles ~/.claude/projects/, ~/.prompt-coach/, and their environment
//! overrides.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Overrides the per-prompt results directory
pub const RESULTS_DIR_ENV: &str = "PROMPT_COACH_RESULTS_DIR";

/// Overrides the cache directory
pub const CACHE_DIR_ENV: &str = "PROMPT_COACH_CACHE_DIR";

/// Overrides the Claude projects directory watched for logs
pub const PROJECTS_DIR_ENV: &str = "CLAUDE_PROJECTS_DIR";

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the Claude projects directory (~/.claude/projects/)
pub fn claude_projects_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".claude").join("projects"))
}

/// Get the Prompt Coach directory (~/.prompt-coach/)
pub fn prompt_coach_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".prompt-coach"))
}

/// Get the config file path (~/.prompt-coach/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(prompt_coach_dir()?.join("config.json"))
}

/// Get the default results directory (~/.prompt-coach/results/)
pub fn default_results_dir() -> AppResult<PathBuf> {
    Ok(prompt_coach_dir()?.join("results"))
}

/// Get the default cache directory (~/.prompt-coach/cache/)
pub fn default_cache_dir() -> AppResult<PathBuf> {
    Ok(prompt_coach_dir()?.join("cache"))
}

/// Read a directory override from the environment.
pub fn env_dir(var: &str) -> Option<PathBuf> {
    override_dir(std::env::var_os(var))
}

/// Interpret a raw override value.
///
/// Unset and empty values both count as "no override".
pub fn override_dir<V: Into<OsString>>(value: Option<V>) -> Option<PathBuf> {
    value
        .map(Into::into)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Ensure a directory exists, creating it if necessary
pub async fn ensure_dir(path: &Path) -> AppResult<()> {
    if !tokio::fs::try_exists(path).await? {
        tokio::fs::create_dir_all(path).await?;
    }
    Ok(())
}
