//! Operation counters for host-side reporting.

use std::collections::BTreeMap;

/// Tallies of operation outcomes, keyed by a short label such as
/// `"verify.ok"` or `"verify.duplicate_action"`.
#[derive(Debug, Default, Clone)]
pub struct OpCounters {
    counters: BTreeMap<String, u64>,
}

impl OpCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, name: impl Into<String>) {
        *self.counters.entry(name.into()).or_insert(0) += 1;
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    /// Sum of all counters.
    pub fn total(&self) -> u64 {
        self.counters.values().sum()
    }

    /// Counters in label order.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.counters.clone()
    }
}
