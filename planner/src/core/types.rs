//! Shared deterministic types for the planning task model.
//!
//! These types are the vocabulary of every other module: the parser produces
//! them, the macro engine composes them, and the frozen task hands them out
//! through its query interface. They carry no I/O and no interior mutability.

use std::fmt;

use serde::Serialize;

/// Name given to every axiom rule; rules carry no name on the wire.
pub const AXIOM_NAME: &str = "<axiom>";

/// Assignment of one value to one finite-domain variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FactPair {
    pub var: usize,
    pub value: usize,
}

impl FactPair {
    pub const fn new(var: usize, value: usize) -> Self {
        Self { var, value }
    }

    /// True when both facts talk about the same variable but disagree on its value.
    pub fn contradicts(&self, other: &FactPair) -> bool {
        self.var == other.var && self.value != other.value
    }
}

impl fmt::Display for FactPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.var, self.value)
    }
}

impl From<(usize, usize)> for FactPair {
    fn from((var, value): (usize, usize)) -> Self {
        Self::new(var, value)
    }
}

/// Finite-domain state variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variable {
    pub name: String,
    pub domain_size: usize,
    /// One name per value, in value order.
    pub fact_names: Vec<String>,
    /// Layer for derived variables; `None` for variables changed by operators.
    pub axiom_layer: Option<usize>,
    /// Value a derived variable takes when no axiom fires.
    pub axiom_default_value: usize,
}

impl Variable {
    pub fn is_derived(&self) -> bool {
        self.axiom_layer.is_some()
    }
}

/// Post-assignment that fires only when all of its conditions hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Effect {
    pub fact: FactPair,
    pub conditions: Vec<FactPair>,
}

impl Effect {
    pub fn new(fact: FactPair, conditions: Vec<FactPair>) -> Self {
        Self { fact, conditions }
    }

    pub fn unconditional(fact: FactPair) -> Self {
        Self::new(fact, Vec::new())
    }
}

/// Named, costed transition, or an axiom rule when `is_axiom` is set.
///
/// Preconditions form a conjunction and mention each variable at most once.
/// Two unconditional effects on one variable are not rejected here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operator {
    pub name: String,
    pub preconditions: Vec<FactPair>,
    pub effects: Vec<Effect>,
    pub cost: u32,
    pub is_axiom: bool,
}

impl Operator {
    /// Every fact the operator mentions: preconditions, effect targets and
    /// effect conditions.
    pub fn facts(&self) -> impl Iterator<Item = &FactPair> {
        self.preconditions.iter().chain(
            self.effects
                .iter()
                .flat_map(|eff| std::iter::once(&eff.fact).chain(eff.conditions.iter())),
        )
    }
}

/// Addresses an entry of either the operator list or the axiom list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "index")]
pub enum OpRef {
    Operator(usize),
    Axiom(usize),
}

impl OpRef {
    pub fn index(self) -> usize {
        match self {
            OpRef::Operator(index) | OpRef::Axiom(index) => index,
        }
    }

    pub fn is_axiom(self) -> bool {
        matches!(self, OpRef::Axiom(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contradicts_requires_same_variable_and_different_value() {
        let fact = FactPair::new(1, 0);
        assert!(fact.contradicts(&FactPair::new(1, 1)));
        assert!(!fact.contradicts(&FactPair::new(1, 0)));
        assert!(!fact.contradicts(&FactPair::new(2, 1)));
    }

    #[test]
    fn op_ref_exposes_index_and_list() {
        assert_eq!(OpRef::Operator(3).index(), 3);
        assert!(!OpRef::Operator(3).is_axiom());
        assert_eq!(OpRef::Axiom(1).index(), 1);
        assert!(OpRef::Axiom(1).is_axiom());
    }

    #[test]
    fn operator_facts_cover_conditions_and_targets() {
        let op = Operator {
            name: "op".to_string(),
            preconditions: vec![FactPair::new(0, 0)],
            effects: vec![Effect::new(FactPair::new(1, 1), vec![FactPair::new(2, 0)])],
            cost: 1,
            is_axiom: false,
        };
        let facts: Vec<FactPair> = op.facts().copied().collect();
        assert_eq!(
            facts,
            vec![FactPair::new(0, 0), FactPair::new(1, 1), FactPair::new(2, 0)]
        );
    }
}
