//! Macro-operator composition.
//!
//! A macro fuses a fixed sequence of operators into one operator whose
//! preconditions are what must hold before the first step and whose effects
//! are what holds after the last. Composition is a single abstract pass over
//! the sequence that tracks which facts are already guaranteed and rejects the
//! sequence as soon as a step's precondition contradicts one of them.

use tracing::trace;

use crate::core::types::{Effect, FactPair, Operator};

/// Result of composing one candidate sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroOutcome {
    Valid(Operator),
    Invalid(Rejection),
}

impl MacroOutcome {
    pub fn into_operator(self) -> Option<Operator> {
        match self {
            MacroOutcome::Valid(op) => Some(op),
            MacroOutcome::Invalid(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, MacroOutcome::Valid(_))
    }
}

/// Why a sequence cannot execute in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    EmptySequence,
    /// Step `step` requires `precondition`, but `guaranteed` already holds at
    /// that point.
    Conflict {
        step: usize,
        precondition: FactPair,
        guaranteed: FactPair,
    },
}

/// Compose `sequence` into a single operator, or reject it.
///
/// Cost and the axiom flag are taken from the first operator. Effects keep the
/// conditions of the operator that produced them.
pub fn compose_macro(sequence: &[&Operator]) -> MacroOutcome {
    let Some(first) = sequence.first() else {
        return MacroOutcome::Invalid(Rejection::EmptySequence);
    };

    let mut name = String::new();
    let mut preconds: Vec<FactPair> = Vec::new();
    let mut effects: Vec<Effect> = Vec::new();

    for (step, op) in sequence.iter().enumerate() {
        let post_vars: Vec<usize> = effects.iter().map(|eff| eff.fact.var).collect();
        let guaranteed: Vec<FactPair> = effects
            .iter()
            .map(|eff| eff.fact)
            .chain(
                preconds
                    .iter()
                    .filter(|pre| !post_vars.contains(&pre.var))
                    .copied(),
            )
            .collect();

        for pre in &op.preconditions {
            if let Some(held) = guaranteed.iter().find(|held| held.contradicts(pre)) {
                return MacroOutcome::Invalid(Rejection::Conflict {
                    step,
                    precondition: *pre,
                    guaranteed: *held,
                });
            }
            if !post_vars.contains(&pre.var) && !preconds.contains(pre) {
                preconds.push(*pre);
            }
        }

        for eff in &op.effects {
            let blocked = eff
                .conditions
                .iter()
                .any(|cond| guaranteed.iter().any(|held| held.contradicts(cond)));
            if blocked {
                // The macro stays valid; this effect just cannot fire here.
                trace!(step, operator = %op.name, fact = %eff.fact, "effect suppressed");
                continue;
            }
            effects.retain(|existing| existing.fact.var != eff.fact.var);
            effects.push(eff.clone());
        }

        name.push_str(&op.name);
    }

    let post_vars: Vec<usize> = effects.iter().map(|eff| eff.fact.var).collect();
    let (prevails, residual): (Vec<FactPair>, Vec<FactPair>) =
        preconds.into_iter().partition(|pre| {
            !post_vars.contains(&pre.var) || effects.iter().any(|eff| eff.fact == *pre)
        });

    effects.retain(|eff| !prevails.contains(&eff.fact));

    let mut preconditions = prevails;
    preconditions.extend(residual);

    MacroOutcome::Valid(Operator {
        name,
        preconditions,
        effects,
        cost: first.cost,
        is_axiom: first.is_axiom,
    })
}
