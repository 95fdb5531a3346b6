//! The planning task aggregate and its read-only query interface.
//!
//! A task goes through two stages:
//!
//! - [`ParsedTask`]: produced by the parser. Its operator list may still grow
//!   by appended macros; nothing else changes.
//! - [`Task`]: frozen after axiom resolution. It has no mutating API and is
//!   shared by reference with heuristics and search.

use serde::Serialize;
use tracing::{debug, info};

use crate::axioms::AxiomEvaluator;
use crate::core::candidates::CandidateGenerator;
use crate::core::compose::compose_macro;
use crate::core::mutex::MutexTable;
use crate::core::types::{Effect, FactPair, OpRef, Operator, Variable};

/// Marks which representation a caller's indices and states belong to.
///
/// Only the root representation exists in this crate. Transformed views
/// wrapping a root task translate their own indices before reaching it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskLayer {
    Root,
    Transformed,
}

/// Task as read from input, before macros and axiom resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTask {
    pub variables: Vec<Variable>,
    pub mutexes: MutexTable,
    pub operators: Vec<Operator>,
    pub axioms: Vec<Operator>,
    pub initial_state: Vec<usize>,
    pub goal: Vec<FactPair>,
    primitive_count: usize,
    macro_sequences: Vec<Vec<usize>>,
}

impl ParsedTask {
    pub fn new(
        variables: Vec<Variable>,
        mutexes: MutexTable,
        operators: Vec<Operator>,
        axioms: Vec<Operator>,
        initial_state: Vec<usize>,
        goal: Vec<FactPair>,
    ) -> Self {
        let primitive_count = operators.len();
        Self {
            variables,
            mutexes,
            operators,
            axioms,
            initial_state,
            goal,
            primitive_count,
            macro_sequences: Vec::new(),
        }
    }

    pub fn primitive_operators(&self) -> &[Operator] {
        &self.operators[..self.primitive_count]
    }

    /// Compose every candidate sequence over the primitive operators and
    /// append the valid macros, in candidate order.
    ///
    /// Primitive operators keep their indices. Returns how many macros were
    /// appended.
    pub fn append_macros(&mut self, generator: &dyn CandidateGenerator) -> usize {
        let candidates = generator.candidates(self.primitive_operators());
        let candidate_count = candidates.len();
        let mut appended = Vec::new();
        for sequence in candidates {
            let steps: Vec<&Operator> = sequence
                .iter()
                .map(|&index| &self.operators[index])
                .collect();
            if let Some(composed) = compose_macro(&steps).into_operator() {
                appended.push((composed, sequence));
            }
        }

        let count = appended.len();
        for (composed, sequence) in appended {
            self.operators.push(composed);
            self.macro_sequences.push(sequence);
        }
        info!(
            candidates = candidate_count,
            macros = count,
            operators = self.operators.len(),
            "macro composition finished"
        );
        count
    }

    /// Resolve derived initial values and freeze the task.
    pub fn freeze(self, evaluator: &dyn AxiomEvaluator) -> Task {
        let mut task = Task {
            variables: self.variables,
            mutexes: self.mutexes,
            operators: self.operators,
            axioms: self.axioms,
            initial_state: self.initial_state,
            goal: self.goal,
            primitive_count: self.primitive_count,
            macro_sequences: self.macro_sequences,
        };
        let mut values = task.initial_state.clone();
        evaluator.evaluate(&task, &mut values);
        task.initial_state = values;

        for (index, op) in task.operators.iter().enumerate() {
            debug!(
                index,
                name = %op.name,
                preconditions = %format_facts(&op.preconditions),
                effects = %format_facts(op.effects.iter().map(|eff| &eff.fact)),
                cost = op.cost,
                "operator"
            );
        }
        task
    }
}

/// Frozen planning task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    variables: Vec<Variable>,
    mutexes: MutexTable,
    operators: Vec<Operator>,
    axioms: Vec<Operator>,
    initial_state: Vec<usize>,
    goal: Vec<FactPair>,
    primitive_count: usize,
    macro_sequences: Vec<Vec<usize>>,
}

impl Task {
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    pub fn axioms(&self) -> &[Operator] {
        &self.axioms
    }

    pub fn goal(&self) -> &[FactPair] {
        &self.goal
    }

    pub fn mutexes(&self) -> &MutexTable {
        &self.mutexes
    }

    pub fn num_primitive_operators(&self) -> usize {
        self.primitive_count
    }

    pub fn is_macro(&self, index: usize) -> bool {
        assert!(
            index < self.operators.len(),
            "operator index {index} out of range"
        );
        index >= self.primitive_count
    }

    /// Primitive operator indices a macro was composed from.
    pub fn macro_sequence(&self, index: usize) -> Option<&[usize]> {
        index
            .checked_sub(self.primitive_count)
            .and_then(|offset| self.macro_sequences.get(offset))
            .map(Vec::as_slice)
    }

    fn variable(&self, var: usize) -> &Variable {
        assert!(var < self.variables.len(), "variable {var} out of range");
        &self.variables[var]
    }

    fn operator_or_axiom(&self, op: OpRef) -> &Operator {
        let (list, kind) = if op.is_axiom() {
            (&self.axioms, "axiom")
        } else {
            (&self.operators, "operator")
        };
        let index = op.index();
        assert!(index < list.len(), "{kind} index {index} out of range");
        &list[index]
    }

    fn effect(&self, op: OpRef, eff_index: usize) -> &Effect {
        let effects = &self.operator_or_axiom(op).effects;
        assert!(
            eff_index < effects.len(),
            "effect index {eff_index} out of range for {op:?}"
        );
        &effects[eff_index]
    }
}

/// Read-only queries consumed by heuristics and search.
///
/// Index arguments out of range are caller bugs and panic.
pub trait TaskView {
    fn layer(&self) -> TaskLayer;

    fn num_variables(&self) -> usize;
    fn variable_name(&self, var: usize) -> &str;
    fn variable_domain_size(&self, var: usize) -> usize;
    fn variable_axiom_layer(&self, var: usize) -> Option<usize>;
    fn variable_default_axiom_value(&self, var: usize) -> usize;
    fn fact_name(&self, fact: FactPair) -> &str;
    fn are_facts_mutex(&self, fact1: FactPair, fact2: FactPair) -> bool;

    fn num_operators(&self) -> usize;
    fn num_axioms(&self) -> usize;
    fn operator_cost(&self, op: OpRef) -> u32;
    fn operator_name(&self, op: OpRef) -> &str;
    fn num_operator_preconditions(&self, op: OpRef) -> usize;
    fn operator_precondition(&self, op: OpRef, fact_index: usize) -> FactPair;
    fn num_operator_effects(&self, op: OpRef) -> usize;
    fn operator_effect(&self, op: OpRef, eff_index: usize) -> FactPair;
    fn num_operator_effect_conditions(&self, op: OpRef, eff_index: usize) -> usize;
    fn operator_effect_condition(&self, op: OpRef, eff_index: usize, cond_index: usize)
    -> FactPair;

    /// Map an operator index of `ancestor` to this representation.
    fn convert_operator_index(&self, index: usize, ancestor: TaskLayer) -> usize;

    fn num_goals(&self) -> usize;
    fn goal_fact(&self, index: usize) -> FactPair;

    fn initial_state_values(&self) -> Vec<usize>;
    /// Rewrite state values of `ancestor` into this representation in place.
    fn convert_ancestor_state_values(&self, values: &mut [usize], ancestor: TaskLayer);
}

impl TaskView for Task {
    fn layer(&self) -> TaskLayer {
        TaskLayer::Root
    }

    fn num_variables(&self) -> usize {
        self.variables.len()
    }

    fn variable_name(&self, var: usize) -> &str {
        &self.variable(var).name
    }

    fn variable_domain_size(&self, var: usize) -> usize {
        self.variable(var).domain_size
    }

    fn variable_axiom_layer(&self, var: usize) -> Option<usize> {
        self.variable(var).axiom_layer
    }

    fn variable_default_axiom_value(&self, var: usize) -> usize {
        self.variable(var).axiom_default_value
    }

    fn fact_name(&self, fact: FactPair) -> &str {
        let names = &self.variable(fact.var).fact_names;
        assert!(
            fact.value < names.len(),
            "value {} out of range for variable {}",
            fact.value,
            fact.var
        );
        &names[fact.value]
    }

    fn are_facts_mutex(&self, fact1: FactPair, fact2: FactPair) -> bool {
        self.mutexes.are_mutex(fact1, fact2)
    }

    fn num_operators(&self) -> usize {
        self.operators.len()
    }

    fn num_axioms(&self) -> usize {
        self.axioms.len()
    }

    fn operator_cost(&self, op: OpRef) -> u32 {
        self.operator_or_axiom(op).cost
    }

    fn operator_name(&self, op: OpRef) -> &str {
        &self.operator_or_axiom(op).name
    }

    fn num_operator_preconditions(&self, op: OpRef) -> usize {
        self.operator_or_axiom(op).preconditions.len()
    }

    fn operator_precondition(&self, op: OpRef, fact_index: usize) -> FactPair {
        let preconditions = &self.operator_or_axiom(op).preconditions;
        assert!(
            fact_index < preconditions.len(),
            "precondition index {fact_index} out of range for {op:?}"
        );
        preconditions[fact_index]
    }

    fn num_operator_effects(&self, op: OpRef) -> usize {
        self.operator_or_axiom(op).effects.len()
    }

    fn operator_effect(&self, op: OpRef, eff_index: usize) -> FactPair {
        self.effect(op, eff_index).fact
    }

    fn num_operator_effect_conditions(&self, op: OpRef, eff_index: usize) -> usize {
        self.effect(op, eff_index).conditions.len()
    }

    fn operator_effect_condition(
        &self,
        op: OpRef,
        eff_index: usize,
        cond_index: usize,
    ) -> FactPair {
        let conditions = &self.effect(op, eff_index).conditions;
        assert!(
            cond_index < conditions.len(),
            "condition index {cond_index} out of range for {op:?} effect {eff_index}"
        );
        conditions[cond_index]
    }

    fn convert_operator_index(&self, index: usize, ancestor: TaskLayer) -> usize {
        assert!(
            ancestor == TaskLayer::Root,
            "invalid operator index conversion from {ancestor:?} layer"
        );
        index
    }

    fn num_goals(&self) -> usize {
        self.goal.len()
    }

    fn goal_fact(&self, index: usize) -> FactPair {
        assert!(index < self.goal.len(), "goal index {index} out of range");
        self.goal[index]
    }

    fn initial_state_values(&self) -> Vec<usize> {
        self.initial_state.clone()
    }

    fn convert_ancestor_state_values(&self, _values: &mut [usize], ancestor: TaskLayer) {
        assert!(
            ancestor == TaskLayer::Root,
            "invalid state conversion from {ancestor:?} layer"
        );
    }
}

/// Render facts as `[var=value, ...]` for logs and CLI output.
pub fn format_facts<'a>(facts: impl IntoIterator<Item = &'a FactPair>) -> String {
    let parts: Vec<String> = facts.into_iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(", "))
}
