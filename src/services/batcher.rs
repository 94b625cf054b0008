//! Prompt Batching
//!
//! Splits prompts into batches that respect a backend's input limits.
//! Cost is an estimate of tokens: roughly one unit per four characters.

use std::borrow::Cow;

use prompt_coach_core::{BatchLimits, Prioritization};

/// Characters per estimated cost unit
const CHARS_PER_UNIT: usize = 4;

/// An ordered, non-empty group of prompts sent to the backend in one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub prompts: Vec<String>,
    /// Sum of the prompts' estimated costs
    pub cost: usize,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

/// Estimated cost of a prompt, rounded up.
pub fn estimate_cost(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_UNIT)
}

/// Greedily pack prompts into batches.
///
/// A new batch starts whenever adding the next prompt would exceed either the
/// cost bound or the item bound. A prompt whose cost alone exceeds the bound
/// becomes a singleton batch. `max_items_per_batch = Some(0)` means no item
/// bound.
pub fn split(prompts: &[String], limits: &BatchLimits) -> Vec<Batch> {
    if prompts.is_empty() {
        return Vec::new();
    }

    let max_cost = limits.max_cost_per_batch;
    let max_items = limits
        .max_items_per_batch
        .filter(|&n| n > 0)
        .unwrap_or(usize::MAX);

    let costed: Vec<(&String, usize)> = prompts.iter().map(|p| (p, estimate_cost(p))).collect();
    let ordered: Cow<'_, [(&String, usize)]> = match limits.prioritization {
        Prioritization::Chronological => Cow::Borrowed(costed.as_slice()),
        Prioritization::LongestFirst => {
            let mut sorted = costed.clone();
            // sort_by is stable, so equal costs keep input order
            sorted.sort_by(|a, b| b.1.cmp(&a.1));
            Cow::Owned(sorted)
        }
    };

    let total: usize = ordered.iter().map(|(_, c)| c).sum();
    if total <= max_cost && ordered.len() <= max_items {
        return vec![Batch {
            prompts: ordered.iter().map(|(p, _)| (*p).clone()).collect(),
            cost: total,
        }];
    }

    let mut batches = Vec::new();
    let mut current = Batch {
        prompts: Vec::new(),
        cost: 0,
    };

    for (prompt, cost) in ordered.iter() {
        let would_overflow =
            current.cost + cost > max_cost || current.prompts.len() + 1 > max_items;
        if !current.is_empty() && would_overflow {
            batches.push(std::mem::replace(
                &mut current,
                Batch {
                    prompts: Vec::new(),
                    cost: 0,
                },
            ));
        }
        current.prompts.push((*prompt).clone());
        current.cost += cost;
    }

    if !current.is_empty() {
        batches.push(current);
    }

    tracing::debug!(
        prompts = prompts.len(),
        batches = batches.len(),
        max_cost,
        "Split prompts into batches"
    );
    batches
}
