//! Analysis Result Models
//!
//! The report shape produced by an analysis backend for one batch of prompts,
//! and by the merge step for a whole run. JSON field names are camelCase so
//! cached files stay readable by other tools of the suite.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Maximum number of patterns kept in one result
pub const MAX_PATTERNS: usize = 5;

/// Maximum number of example prompts kept per pattern
pub const MAX_EXAMPLES: usize = 3;

/// Upper bound of `AnalysisStats::overall_score`
pub const MAX_SCORE: f64 = 10.0;

/// How serious a recurring issue is.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
}

/// A before/after rewrite illustrating a suggestion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeforeAfter {
    pub before: String,
    pub after: String,
}

/// A recurring quality issue found across prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPattern {
    /// Stable identifier, unique within one result (e.g. `vague_request`)
    pub id: String,
    /// Human readable name
    pub name: String,
    /// Share of prompts exhibiting the issue, in `[0, 1]`
    pub frequency: f64,
    pub severity: Severity,
    /// Up to [`MAX_EXAMPLES`] offending prompts
    #[serde(default)]
    pub examples: Vec<String>,
    pub suggestion: String,
    #[serde(default)]
    pub before_after: BeforeAfter,
}

/// Aggregate counters for a result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisStats {
    pub total_prompts: u64,
    pub prompts_with_issues: u64,
    /// Overall quality score in `[0, 10]`
    pub overall_score: f64,
}

/// Analysis report for a set of prompts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Calendar date (or date label) the report covers
    pub date: String,
    /// At most [`MAX_PATTERNS`] patterns, most relevant first
    #[serde(default)]
    pub patterns: Vec<AnalysisPattern>,
    #[serde(default)]
    pub stats: AnalysisStats,
    #[serde(default)]
    pub top_suggestion: String,
}

impl AnalysisResult {
    /// An empty report for the given date.
    pub fn empty(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..Default::default()
        }
    }

    /// Bring backend output within the documented bounds.
    ///
    /// Clamps frequencies and the overall score, caps examples and patterns,
    /// and drops repeated pattern ids (the first occurrence wins).
    pub fn normalized(mut self) -> Self {
        let mut seen = HashSet::new();
        self.patterns.retain(|p| seen.insert(p.id.clone()));
        self.patterns.truncate(MAX_PATTERNS);

        for pattern in &mut self.patterns {
            pattern.frequency = clamp_or_zero(pattern.frequency, 0.0, 1.0);
            pattern.examples.truncate(MAX_EXAMPLES);
        }

        self.stats.overall_score = clamp_or_zero(self.stats.overall_score, 0.0, MAX_SCORE);
        self
    }

    /// Whether the report found nothing to say.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty() && self.stats.total_prompts == 0
    }
}

fn clamp_or_zero(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}
