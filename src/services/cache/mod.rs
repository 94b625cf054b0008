//! Analysis Caches
//!
//! Two on-disk caches keep repeated analysis from re-paying for unchanged
//! input:
//!
//! - `PerPromptCache`: one entry per prompt fingerprint, date partitioned
//! - `BatchCache`: one entry per sorted batch, TTL gated
//!
//! Both write through `atomic::write_json_atomic`, so readers never observe a
//! partial file.

pub mod atomic;
pub mod batch_cache;
pub mod fingerprint;
pub mod prompt_cache;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub use batch_cache::{BatchCache, CachedBatchResult};
pub use fingerprint::{batch_fingerprint, template_hash, FingerprintInput, PromptFingerprint};
pub use prompt_cache::{PerPromptCache, PromptResult, PromptResultMetadata};

use crate::utils::error::AppResult;

/// Subdirectory of the cache root holding batch entries
pub const BATCHES_DIR: &str = "batches";

/// Where both caches live on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayout {
    results_root: PathBuf,
    cache_root: PathBuf,
}

impl CacheLayout {
    pub fn new(results_root: impl Into<PathBuf>, cache_root: impl Into<PathBuf>) -> Self {
        Self {
            results_root: results_root.into(),
            cache_root: cache_root.into(),
        }
    }

    /// Root of the per-prompt results tree
    pub fn results_root(&self) -> &Path {
        &self.results_root
    }

    /// Root of the cache tree
    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Directory holding batch cache entries
    pub fn batches_dir(&self) -> PathBuf {
        self.cache_root.join(BATCHES_DIR)
    }

    /// Per-prompt cache over this layout
    pub fn prompt_cache(&self) -> PerPromptCache {
        PerPromptCache::new(&self.results_root)
    }

    /// Batch cache over this layout with the given TTL
    pub fn batch_cache(&self, ttl_days: u32) -> BatchCache {
        BatchCache::new(self.batches_dir()).with_ttl_days(ttl_days)
    }
}

/// Delete both cache trees.
///
/// Missing directories are not an error.
pub async fn clear_cache(layout: &CacheLayout) -> AppResult<()> {
    for dir in [layout.batches_dir(), layout.results_root.clone()] {
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => tracing::info!(dir = %dir.display(), "Cleared cache directory"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
