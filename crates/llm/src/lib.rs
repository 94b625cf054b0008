//! Prompt Coach LLM
//!
//! The abstract contract between the analysis engine and a text-analysis
//! backend (Anthropic, OpenAI, Ollama, ...). Concrete HTTP clients implement
//! [`AnalysisService`]; the engine batches, caches, and merges around it.

pub mod provider;
pub mod types;

// Re-export main types
pub use provider::{AnalysisService, DEFAULT_SCHEMA_ID};
pub use types::*;
