//! Per-Prompt Result Cache
//!
//! Content-addressable store of single-prompt analyses. One JSON file per
//! fingerprint, partitioned one directory per calendar date:
//!
//! ```text
//! <results-root>/<YYYY-MM-DD>/<fingerprint>.json
//! ```
//!
//! Entries are never mutated in place. A changed input produces a new
//! fingerprint, and stale entries are removed only by [`PerPromptCache::cleanup`].
//!
//! Reads are forgiving: a missing, unparsable, or mismatched file is a miss,
//! never an error. Writes are strict: filesystem failures propagate.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use prompt_coach_core::AnalysisResult;
use serde::{Deserialize, Serialize};
use tokio::fs;

use super::atomic::write_json_atomic;
use super::fingerprint::{FingerprintInput, PromptFingerprint};
use crate::utils::error::{AppError, AppResult};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Provenance of a cached per-prompt result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptResultMetadata {
    pub fingerprint: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub model: String,
    pub schema_id: String,
    /// Set when the result was computed for a multi-prompt batch and is
    /// shared by every prompt of that batch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_fingerprint: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PromptResultMetadata {
    /// Metadata for a result computed now.
    pub fn for_fingerprint(fp: &PromptFingerprint) -> Self {
        Self {
            fingerprint: fp.key.clone(),
            date: fp.date.clone(),
            project: fp.project.clone(),
            model: fp.model.clone(),
            schema_id: fp.schema_id.clone(),
            batch_fingerprint: None,
            created_at: Utc::now(),
        }
    }

    /// Mark the result as shared with the rest of a batch
    pub fn with_batch(mut self, batch_fingerprint: Option<String>) -> Self {
        self.batch_fingerprint = batch_fingerprint;
        self
    }

    fn matches(&self, fp: &PromptFingerprint) -> bool {
        self.fingerprint == fp.key && self.model == fp.model && self.schema_id == fp.schema_id
    }
}

/// A cached per-prompt analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptResult {
    pub metadata: PromptResultMetadata,
    pub result: AnalysisResult,
}

/// Date-partitioned store of per-prompt results.
#[derive(Debug, Clone)]
pub struct PerPromptCache {
    root: PathBuf,
}

impl PerPromptCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root of the results tree
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Compute the fingerprint of one prompt analysis.
    pub fn fingerprint(&self, input: FingerprintInput<'_>) -> PromptFingerprint {
        PromptFingerprint::compute(input)
    }

    /// Path of the entry for a fingerprint.
    ///
    /// Fails if the fingerprint's date is not a `YYYY-MM-DD` date, so a bad
    /// date can never escape the results root.
    pub fn entry_path(&self, fp: &PromptFingerprint) -> AppResult<PathBuf> {
        parse_date(&fp.date).ok_or_else(|| {
            AppError::validation(format!("invalid partition date: {:?}", fp.date))
        })?;
        Ok(self.root.join(&fp.date).join(format!("{}.json", fp.key)))
    }

    /// Look up a cached result.
    pub async fn get(&self, fp: &PromptFingerprint) -> Option<PromptResult> {
        let path = self.entry_path(fp).ok()?;

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    tracing::debug!(path = %path.display(), error = %e, "Unreadable cache entry");
                }
                return None;
            }
        };

        let entry: PromptResult = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Corrupt cache entry, treating as miss");
                return None;
            }
        };

        if !entry.metadata.matches(fp) {
            tracing::debug!(
                path = %path.display(),
                cached_model = %entry.metadata.model,
                cached_schema = %entry.metadata.schema_id,
                "Cache entry metadata mismatch, treating as miss"
            );
            return None;
        }

        Some(entry)
    }

    /// Store a result atomically.
    pub async fn put(
        &self,
        fp: &PromptFingerprint,
        result: &AnalysisResult,
        metadata: PromptResultMetadata,
    ) -> AppResult<()> {
        if metadata.fingerprint != fp.key {
            return Err(AppError::validation(
                "metadata fingerprint does not match entry key",
            ));
        }

        let path = self.entry_path(fp)?;
        let entry = PromptResult {
            metadata,
            result: result.clone(),
        };
        write_json_atomic(&path, &entry).await?;
        tracing::debug!(key = %fp.key, date = %fp.date, "Cached prompt result");
        Ok(())
    }

    /// Sorted list of date partitions present on disk.
    pub async fn partitions(&self) -> AppResult<Vec<NaiveDate>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut dates = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if let Some(date) = parse_date(&entry.file_name().to_string_lossy()) {
                dates.push(date);
            }
        }
        dates.sort();
        Ok(dates)
    }

    /// Remove every date partition strictly earlier than `before`.
    ///
    /// Directories whose name is not a date are left alone. Returns the number
    /// of partitions removed.
    pub async fn cleanup(&self, before: NaiveDate) -> AppResult<usize> {
        let mut removed = 0;
        for date in self.partitions().await? {
            if date >= before {
                continue;
            }
            let dir = self.root.join(date.format(DATE_FORMAT).to_string());
            fs::remove_dir_all(&dir).await?;
            removed += 1;
        }

        if removed > 0 {
            tracing::info!(removed, before = %before, "Removed old result partitions");
        }
        Ok(removed)
    }
}

fn parse_date(name: &str) -> Option<NaiveDate> {
    // Reject non-canonical spellings like "2025-1-5" that chrono would accept.
    if name.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(name, DATE_FORMAT).ok()
}
