//! Services
//!
//! Analysis engine: caches, batching, merging, log tailing, and the loops
//! that tie them to an `AnalysisService` backend.

pub mod analyzer;
pub mod batcher;
pub mod cache;
pub mod merge;
pub mod reporter;
pub mod shutdown;
pub mod tailer;
pub mod watch;

pub use analyzer::{AnalyzerConfig, BatchAnalyzer};
pub use batcher::{estimate_cost, split, Batch};
pub use cache::{clear_cache, BatchCache, CacheLayout, PerPromptCache};
pub use merge::merge;
pub use reporter::TracingReporter;
pub use shutdown::shutdown_signal;
pub use tailer::{LogTailer, LogTailerBuilder, TailerEvent, TailerEvents, TailerTrigger};
pub use watch::{DisplaySink, WatchOrchestrator, WatchSummary};
