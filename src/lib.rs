//! Prompt Coach - Analysis Engine Library
//!
//! Incremental analysis of the prompts a user types into Claude Code:
//! - Content-addressed per-prompt and per-batch result caches
//! - Cost-bounded batching with map-reduce merging of batch results
//! - Real-time, exactly-once tailing of Claude project logs
//! - Storage layer (JSON config) and utilities

pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use models::settings::Settings;
pub use prompt_coach_core::{
    AnalysisContext, AnalysisPattern, AnalysisResult, AnalysisStats, BatchLimits, Prompt,
    PromptEvent, Reporter,
};
pub use prompt_coach_llm::{AnalysisError, AnalysisService};
pub use services::{
    clear_cache, shutdown_signal, BatchAnalyzer, CacheLayout, DisplaySink, LogTailer,
    WatchOrchestrator,
};
pub use storage::ConfigService;
pub use utils::error::{AppError, AppResult};
