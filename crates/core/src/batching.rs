//! Batch Limit Types
//!
//! Describes how much input an analysis backend accepts per call and in which
//! order prompts should be packed into batches.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Order in which prompts are packed into batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Prioritization {
    /// Fill from the most expensive remaining prompt first.
    ///
    /// Used for constrained backends so systemic issues surface early.
    LongestFirst,
    /// Preserve input order.
    #[default]
    Chronological,
}

/// Per-call input limits of an analysis backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchLimits {
    /// Upper bound on the summed estimated cost of one batch
    pub max_cost_per_batch: usize,
    /// Optional upper bound on the number of prompts in one batch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items_per_batch: Option<usize>,
    #[serde(default)]
    pub prioritization: Prioritization,
}

impl BatchLimits {
    /// Limits bounded by cost only, in chronological order.
    pub fn new(max_cost_per_batch: usize) -> Self {
        Self {
            max_cost_per_batch,
            max_items_per_batch: None,
            prioritization: Prioritization::Chronological,
        }
    }

    /// Set the item bound.
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items_per_batch = Some(max_items);
        self
    }

    /// Set the packing order.
    pub fn with_prioritization(mut self, prioritization: Prioritization) -> Self {
        self.prioritization = prioritization;
        self
    }

    /// Reject limits that could never admit a prompt.
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_cost_per_batch == 0 {
            return Err(CoreError::validation("max_cost_per_batch must be greater than 0"));
        }
        Ok(())
    }
}
