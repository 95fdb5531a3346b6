//! Candidate operator sequences for macro composition.

use serde::{Deserialize, Serialize};

use crate::core::types::Operator;

/// Proposes operator index sequences worth composing into macros.
///
/// Sequences may be illegal; legality is decided by
/// [`compose_macro`](crate::core::compose::compose_macro).
pub trait CandidateGenerator {
    fn candidates(&self, operators: &[Operator]) -> Vec<Vec<usize>>;
}

/// Every ordered pair of operators, including an operator paired with itself.
///
/// Quadratic in the operator count. A learned generator is expected to replace
/// it rather than an optimized enumeration.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairwiseCandidates;

impl CandidateGenerator for PairwiseCandidates {
    fn candidates(&self, operators: &[Operator]) -> Vec<Vec<usize>> {
        let count = operators.len();
        (0..count)
            .flat_map(|first| (0..count).map(move |second| vec![first, second]))
            .collect()
    }
}

/// Candidate generator selectable from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    #[default]
    Pairwise,
}

impl GeneratorKind {
    pub fn generator(self) -> Box<dyn CandidateGenerator> {
        match self {
            GeneratorKind::Pairwise => Box::new(PairwiseCandidates),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::op;

    #[test]
    fn pairwise_enumerates_all_ordered_pairs_in_order() {
        let ops = vec![op("a", &[], &[], 1), op("b", &[], &[], 1)];
        let pairs = PairwiseCandidates.candidates(&ops);
        assert_eq!(pairs, vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]);
    }

    #[test]
    fn pairwise_of_nothing_is_nothing() {
        assert!(PairwiseCandidates.candidates(&[]).is_empty());
    }
}
