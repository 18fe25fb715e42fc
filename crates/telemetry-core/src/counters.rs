//! Per-kind error tally (SPEC_FULL.md §4.9, §7): "decode errors counted by
//! kind", "apply-invariant violations counted" are both an instance of the
//! same shape — a small map from a `Copy + Eq + Hash` discriminant to a
//! running count, read back by the observability tick (§4.11) without ever
//! blocking the writer that increments it.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;

pub struct ErrorTally<K> {
    counts: Mutex<HashMap<K, u64>>,
}

impl<K> Default for ErrorTally<K> {
    fn default() -> Self {
        Self {
            counts: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Copy + Eq + Hash> ErrorTally<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, kind: K) {
        let mut guard = match self.counts.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard.entry(kind).or_insert(0) += 1;
    }

    pub fn total(&self) -> u64 {
        let guard = match self.counts.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.values().sum()
    }

    pub fn snapshot(&self) -> Vec<(K, u64)> {
        let guard = match self.counts.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.iter().map(|(k, v)| (*k, *v)).collect()
    }
}
