//! Duplicate Emission Guard
//!
//! Bounded set of recently emitted prompt identities. Eviction is by
//! insertion order (oldest first), not by recency of lookup.

use std::collections::{HashSet, VecDeque};

use prompt_coach_core::EmissionKey;

/// FIFO-bounded set of emitted `(project, session_id, timestamp)` keys.
#[derive(Debug)]
pub struct RecentEmissions {
    capacity: usize,
    order: VecDeque<EmissionKey>,
    seen: HashSet<EmissionKey>,
}

impl RecentEmissions {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
        }
    }

    /// Record a key. Returns `false` if it was already present.
    pub fn insert(&mut self, key: EmissionKey) -> bool {
        if self.seen.contains(&key) {
            return false;
        }
        if self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.seen.insert(key.clone());
        self.order.push_back(key);
        true
    }

    pub fn contains(&self, key: &EmissionKey) -> bool {
        self.seen.contains(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
