//! Settings Models
//!
//! Engine configuration stored in config.json, plus environment overrides.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::services::cache::CacheLayout;
use crate::utils::error::AppResult;
use crate::utils::paths::{
    claude_projects_dir, default_cache_dir, default_results_dir, env_dir, CACHE_DIR_ENV,
    PROJECTS_DIR_ENV, RESULTS_DIR_ENV,
};

/// Default per-file debounce window in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Default number of remembered emissions for duplicate suppression
pub const DEFAULT_DEDUPE_CAPACITY: usize = 1000;

/// Default lifetime of a batch cache entry
pub const DEFAULT_BATCH_TTL_DAYS: u32 = 7;

/// Default cost budget per batch when a backend declares no limits
pub const DEFAULT_MAX_COST_PER_BATCH: usize = 100_000;

/// Engine configuration stored in config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root of the per-prompt results tree (default ~/.prompt-coach/results)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_dir: Option<PathBuf>,
    /// Root of the batch cache tree (default ~/.prompt-coach/cache)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    /// Directory holding Claude project logs (default ~/.claude/projects)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects_dir: Option<PathBuf>,
    /// Per-file debounce window for the log tailer
    pub debounce_ms: u64,
    /// Capacity of the duplicate-emission guard
    pub dedupe_capacity: usize,
    /// Lifetime of batch cache entries
    pub batch_ttl_days: u32,
    /// Maximum backend calls in flight during one analysis
    pub max_concurrent_batches: usize,
    /// Cost budget per batch when the backend declares none
    pub default_max_cost_per_batch: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            results_dir: None,
            cache_dir: None,
            projects_dir: None,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            dedupe_capacity: DEFAULT_DEDUPE_CAPACITY,
            batch_ttl_days: DEFAULT_BATCH_TTL_DAYS,
            max_concurrent_batches: 1,
            default_max_cost_per_batch: DEFAULT_MAX_COST_PER_BATCH,
        }
    }
}

impl Settings {
    /// Apply directory overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(env_dir);
    }

    /// Apply directory overrides from an arbitrary variable lookup.
    ///
    /// `lookup` returns `None` for a variable that sets no override.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<PathBuf>,
    {
        if let Some(dir) = lookup(RESULTS_DIR_ENV) {
            self.results_dir = Some(dir);
        }
        if let Some(dir) = lookup(CACHE_DIR_ENV) {
            self.cache_dir = Some(dir);
        }
        if let Some(dir) = lookup(PROJECTS_DIR_ENV) {
            self.projects_dir = Some(dir);
        }
    }

    /// Resolved results root
    pub fn results_dir(&self) -> AppResult<PathBuf> {
        match &self.results_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_results_dir(),
        }
    }

    /// Resolved cache root
    pub fn cache_dir(&self) -> AppResult<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_cache_dir(),
        }
    }

    /// Resolved Claude projects directory
    pub fn projects_dir(&self) -> AppResult<PathBuf> {
        match &self.projects_dir {
            Some(dir) => Ok(dir.clone()),
            None => claude_projects_dir(),
        }
    }

    /// On-disk layout of both caches
    pub fn cache_layout(&self) -> AppResult<CacheLayout> {
        Ok(CacheLayout::new(self.results_dir()?, self.cache_dir()?))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.debounce_ms == 0 {
            return Err("debounce_ms must be at least 1".to_string());
        }

        if self.dedupe_capacity == 0 {
            return Err("dedupe_capacity must be at least 1".to_string());
        }

        if self.max_concurrent_batches == 0 {
            return Err("max_concurrent_batches must be at least 1".to_string());
        }

        if self.default_max_cost_per_batch == 0 {
            return Err("default_max_cost_per_batch must be at least 1".to_string());
        }

        Ok(())
    }
}
