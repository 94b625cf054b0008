//! Prompt Coach Core
//!
//! Foundational data model, error types, and analysis context for the Prompt
//! Coach workspace. This crate has zero dependencies on storage, file watching,
//! or analysis backends.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `prompt` - Extracted prompts and prompt events
//! - `analysis` - Analysis report shape (`AnalysisResult`, `AnalysisPattern`, `Severity`)
//! - `batching` - Backend batch limits and packing order
//! - `context` - Per-call options and the injected `Reporter` seam

pub mod analysis;
pub mod batching;
pub mod context;
pub mod error;
pub mod prompt;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Data Model ─────────────────────────────────────────────────────────
pub use analysis::{
    AnalysisPattern, AnalysisResult, AnalysisStats, BeforeAfter, Severity, MAX_EXAMPLES,
    MAX_PATTERNS, MAX_SCORE,
};
pub use prompt::{EmissionKey, Prompt, PromptEvent};

// ── Batching ───────────────────────────────────────────────────────────
pub use batching::{BatchLimits, Prioritization};

// ── Context & Reporting ────────────────────────────────────────────────
pub use context::{AnalysisContext, BatchProgress, CollectingReporter, NoopReporter, Reporter};
