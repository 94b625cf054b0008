//! Analysis Context and Reporting
//!
//! Two pieces of state are threaded explicitly through an analysis run instead
//! of living in globals:
//!
//! 1. `AnalysisContext` - per-call options (project scope, cache bypass)
//! 2. `Reporter` trait - injected sink for progress and user-facing warnings
//!
//! The cache, batcher, and tailer never see a `Reporter`; only the
//! orchestration layer (analyzer, watch loop) reports.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

// ============================================================================
// AnalysisContext
// ============================================================================

/// Per-call options for an analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisContext {
    /// Project the prompts belong to. Part of every per-prompt fingerprint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Bypass cache lookup and write-back for this call only.
    #[serde(default)]
    pub no_cache: bool,
}

impl AnalysisContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope the run to a project.
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Skip the caches for this call.
    pub fn without_cache(mut self) -> Self {
        self.no_cache = true;
        self
    }

    /// Project name, if any.
    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }
}

// ============================================================================
// Reporter
// ============================================================================

/// Progress of a multi-batch analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// Zero-based index of the batch that just finished
    pub batch_index: usize,
    /// Number of batches the uncached prompts were split into
    pub total_batches: usize,
    /// Prompts in the finished batch
    pub batch_size: usize,
    /// Whether the batch was answered from the batch cache
    pub from_cache: bool,
}

/// Injected sink for progress and warnings.
pub trait Reporter: Send + Sync {
    /// Called once per batch after it completes.
    fn progress(&self, progress: BatchProgress);

    /// A recoverable problem the user may want to know about.
    fn warn(&self, message: &str);
}

/// Reporter that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn progress(&self, _progress: BatchProgress) {}

    fn warn(&self, _message: &str) {}
}

/// Reporter that keeps everything in memory, for callers that print a summary
/// at the end of a run.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    progress: Mutex<Vec<BatchProgress>>,
    warnings: Mutex<Vec<String>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Progress updates received so far.
    pub fn progress_updates(&self) -> Vec<BatchProgress> {
        self.progress
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Warnings received so far.
    pub fn warnings(&self) -> Vec<String> {
        self.warnings
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Reporter for CollectingReporter {
    fn progress(&self, progress: BatchProgress) {
        self.progress
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(progress);
    }

    fn warn(&self, message: &str) {
        self.warnings
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.to_string());
    }
}

// ============================================================================
// Tests
// ============================================================================
