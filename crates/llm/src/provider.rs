//! Analysis Service Trait
//!
//! Defines the common interface for every analysis backend. Concrete HTTP
//! clients live outside this workspace; the engine only talks to this trait.

use async_trait::async_trait;
use prompt_coach_core::{AnalysisContext, AnalysisResult, BatchLimits};

use super::types::ServiceResult;

/// Schema id used when a backend does not declare one.
pub const DEFAULT_SCHEMA_ID: &str = "full";

/// Trait that all analysis backends must implement.
///
/// Provides a unified interface for:
/// - Identification (name, model, output schema)
/// - Availability checking
/// - Analyzing one batch of prompts
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Returns the backend name for identification.
    fn name(&self) -> &str;

    /// Returns the model the backend analyzes with.
    fn model(&self) -> &str;

    /// Identifies the shape of the output this backend produces.
    ///
    /// Part of every per-prompt fingerprint, so switching schema never serves
    /// a stale result.
    fn schema_id(&self) -> &str {
        DEFAULT_SCHEMA_ID
    }

    /// The instruction template sent alongside the prompts.
    ///
    /// Only its hash is used by the caches.
    fn instruction_template(&self) -> &str {
        ""
    }

    /// Whether the backend can currently serve requests.
    async fn is_available(&self) -> bool;

    /// Analyze one batch of prompts for the given date.
    async fn analyze(
        &self,
        prompts: &[String],
        date: &str,
        context: Option<&AnalysisContext>,
    ) -> ServiceResult<AnalysisResult>;

    /// Per-call input limits, or `None` to use the analyzer default.
    fn batch_limits(&self) -> Option<BatchLimits> {
        None
    }
}
