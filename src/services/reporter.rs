//! Tracing Reporter
//!
//! `Reporter` implementation that forwards analysis progress and warnings to
//! `tracing`.

use prompt_coach_core::{BatchProgress, Reporter};

/// Reporter that logs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn progress(&self, progress: BatchProgress) {
        tracing::info!(
            batch = progress.batch_index + 1,
            total = progress.total_batches,
            size = progress.batch_size,
            from_cache = progress.from_cache,
            "Batch analyzed"
        );
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}
