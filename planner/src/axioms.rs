//! Derived-variable resolution for the initial state.

use std::collections::BTreeSet;

use tracing::debug;

use crate::core::types::Operator;
use crate::task::Task;

/// Resolves axiom-layer variables of `values` to their fixpoint in place.
///
/// Called once per task, after the operator and axiom lists are final.
pub trait AxiomEvaluator {
    fn evaluate(&self, task: &Task, values: &mut [usize]);
}

/// Leaves every value untouched. Suitable for tasks without derived variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAxiomEvaluator;

impl AxiomEvaluator for NoopAxiomEvaluator {
    fn evaluate(&self, _task: &Task, _values: &mut [usize]) {}
}

/// Evaluates rules layer by layer in ascending order.
///
/// Derived variables start at their default value. Within a layer, every rule
/// whose conditions hold derives its head, repeated until nothing changes. A
/// variable moves away from its default at most once, so each layer
/// terminates. Lower layers are final once a higher layer starts.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayeredAxiomEvaluator;

impl AxiomEvaluator for LayeredAxiomEvaluator {
    fn evaluate(&self, task: &Task, values: &mut [usize]) {
        let variables = task.variables();
        let mut layers = BTreeSet::new();
        for (var, variable) in variables.iter().enumerate() {
            if let Some(layer) = variable.axiom_layer {
                values[var] = variable.axiom_default_value;
                layers.insert(layer);
            }
        }

        for layer in layers {
            let rules: Vec<&Operator> = task
                .axioms()
                .iter()
                .filter(|rule| {
                    rule.effects
                        .iter()
                        .any(|eff| variables[eff.fact.var].axiom_layer == Some(layer))
                })
                .collect();

            let mut rounds = 0;
            loop {
                let mut changed = false;
                for rule in &rules {
                    for eff in &rule.effects {
                        let fires = eff
                            .conditions
                            .iter()
                            .all(|cond| values[cond.var] == cond.value);
                        let var = eff.fact.var;
                        let at_default = values[var] == variables[var].axiom_default_value;
                        if fires && at_default && values[var] != eff.fact.value {
                            values[var] = eff.fact.value;
                            changed = true;
                        }
                    }
                }
                rounds += 1;
                if !changed {
                    break;
                }
            }
            debug!(layer, rules = rules.len(), rounds, "axiom layer resolved");
        }
    }
}
