//! Pairwise fact incompatibilities declared by mutex groups.

use std::collections::HashSet;

use crate::core::types::FactPair;

/// Per-fact sets of facts that never co-occur in a reachable state.
///
/// Only facts on different variables are stored. Same-variable exclusion
/// follows from single-valuedness and is answered without a lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutexTable {
    /// Indexed by `[var][value]`.
    inconsistent: Vec<Vec<HashSet<FactPair>>>,
}

impl MutexTable {
    /// Empty table shaped after the given domain sizes.
    pub fn new(domain_sizes: impl IntoIterator<Item = usize>) -> Self {
        Self {
            inconsistent: domain_sizes
                .into_iter()
                .map(|size| vec![HashSet::new(); size])
                .collect(),
        }
    }

    /// Record every cross-variable pair of `group` in both directions.
    ///
    /// Groups may overlap; the per-fact sets keep each pair once. Callers must
    /// bounds-check the group against the table's shape first.
    pub fn add_group(&mut self, group: &[FactPair]) {
        for fact1 in group {
            for fact2 in group {
                if fact1.var != fact2.var {
                    self.inconsistent[fact1.var][fact1.value].insert(*fact2);
                }
            }
        }
    }

    pub fn are_mutex(&self, fact1: FactPair, fact2: FactPair) -> bool {
        if fact1.var == fact2.var {
            return fact1.value != fact2.value;
        }
        self.inconsistent[fact1.var][fact1.value].contains(&fact2)
    }

    /// Facts recorded as mutex with `fact` (cross-variable entries only).
    pub fn mutexes_of(&self, fact: FactPair) -> &HashSet<FactPair> {
        &self.inconsistent[fact.var][fact.value]
    }

    /// Number of stored directed entries.
    pub fn len(&self) -> usize {
        self.inconsistent
            .iter()
            .flat_map(|values| values.iter())
            .map(HashSet::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
