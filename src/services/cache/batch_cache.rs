//! Batch Result Cache
//!
//! Coarser cache keyed by a whole sorted batch plus model and template hash.
//! Entries carry their own TTL; an expired or mismatched entry is inert.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use prompt_coach_core::AnalysisResult;
use serde::{Deserialize, Serialize};
use tokio::fs;

use super::atomic::{is_temp_file, write_json_atomic};
use super::fingerprint::batch_fingerprint;
use crate::models::settings::DEFAULT_BATCH_TTL_DAYS;
use crate::utils::error::{AppError, AppResult};

/// A cached whole-batch analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedBatchResult {
    pub fingerprint: String,
    pub model: String,
    pub template_hash: String,
    pub created_at: DateTime<Utc>,
    pub ttl_days: u32,
    pub result: AnalysisResult,
}

impl CachedBatchResult {
    /// Whether the entry has outlived its TTL at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.created_at + Duration::days(i64::from(self.ttl_days)) < now
    }
}

/// TTL-gated store of whole-batch results under `<cache-root>/batches/`.
#[derive(Debug, Clone)]
pub struct BatchCache {
    dir: PathBuf,
    ttl_days: u32,
}

impl BatchCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ttl_days: DEFAULT_BATCH_TTL_DAYS,
        }
    }

    /// Set the TTL stored with new entries
    pub fn with_ttl_days(mut self, ttl_days: u32) -> Self {
        self.ttl_days = ttl_days;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ttl_days(&self) -> u32 {
        self.ttl_days
    }

    /// Key of a batch.
    pub fn fingerprint(&self, prompts: &[String], model: &str, template_hash: &str) -> String {
        batch_fingerprint(prompts, model, template_hash)
    }

    /// Path of the entry for a key.
    ///
    /// Keys are lowercase hex digests; anything else is rejected so a key can
    /// never name a file outside the batch directory.
    fn entry_path(&self, key: &str) -> AppResult<PathBuf> {
        if !is_hex_key(key) {
            return Err(AppError::validation(format!("invalid batch key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    /// Look up a live entry.
    pub async fn get(&self, key: &str, model: &str, template_hash: &str) -> Option<CachedBatchResult> {
        let path = self.entry_path(key).ok()?;
        let entry = read_entry(&path).await?;

        if entry.fingerprint != key || entry.model != model || entry.template_hash != template_hash {
            tracing::debug!(key, "Batch cache identity mismatch, treating as miss");
            return None;
        }
        if entry.is_expired(Utc::now()) {
            tracing::debug!(key, created_at = %entry.created_at, "Batch cache entry expired");
            return None;
        }
        Some(entry)
    }

    /// Store a batch result atomically with the configured TTL.
    pub async fn put(
        &self,
        key: &str,
        model: &str,
        template_hash: &str,
        result: &AnalysisResult,
    ) -> AppResult<()> {
        let path = self.entry_path(key)?;
        let entry = CachedBatchResult {
            fingerprint: key.to_string(),
            model: model.to_string(),
            template_hash: template_hash.to_string(),
            created_at: Utc::now(),
            ttl_days: self.ttl_days,
            result: result.clone(),
        };
        write_json_atomic(&path, &entry).await?;
        tracing::debug!(key, "Cached batch result");
        Ok(())
    }

    /// Remove expired and unreadable entries. Returns how many were removed.
    pub async fn cleanup_expired(&self) -> AppResult<usize> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let now = Utc::now();
        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if is_temp_file(&name) || !name.ends_with(".json") {
                continue;
            }
            let path = entry.path();
            let stale = match read_entry(&path).await {
                Some(cached) => cached.is_expired(now),
                None => true,
            };
            if stale {
                fs::remove_file(&path).await?;
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!(removed, "Removed stale batch cache entries");
        }
        Ok(removed)
    }
}

fn is_hex_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

async fn read_entry(path: &Path) -> Option<CachedBatchResult> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            if e.kind() != ErrorKind::NotFound {
                tracing::debug!(path = %path.display(), error = %e, "Unreadable batch cache entry");
            }
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(entry) => Some(entry),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Corrupt batch cache entry");
            None
        }
    }
}
