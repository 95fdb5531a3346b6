//! Task construction pipeline: parse, append macros, resolve axioms, freeze.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, instrument};

use crate::axioms::{AxiomEvaluator, LayeredAxiomEvaluator};
use crate::core::types::{FactPair, Operator};
use crate::io::config::PlannerConfig;
use crate::io::sas::read_task_file;
use crate::task::{ParsedTask, Task, TaskView};

/// Finish a parsed task: optional macro synthesis, then axiom resolution.
pub fn build_task(
    mut parsed: ParsedTask,
    config: &PlannerConfig,
    evaluator: &dyn AxiomEvaluator,
) -> Task {
    if config.macros.enabled {
        let generator = config.macros.generator.generator();
        parsed.append_macros(generator.as_ref());
    } else {
        info!("macro composition disabled");
    }
    parsed.freeze(evaluator)
}

/// Read a task file and run the full pipeline with the layered axiom evaluator.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_task(path: &Path, config: &PlannerConfig) -> Result<Task> {
    let parsed = read_task_file(path).context("load task")?;
    let task = build_task(parsed, config, &LayeredAxiomEvaluator);
    info!(
        variables = task.num_variables(),
        operators = task.num_operators(),
        macros = task.num_operators() - task.num_primitive_operators(),
        axioms = task.num_axioms(),
        "task ready"
    );
    Ok(task)
}

/// Size summary of a frozen task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    pub variables: usize,
    pub derived_variables: usize,
    pub mutex_entries: usize,
    pub primitive_operators: usize,
    pub macros: usize,
    pub axioms: usize,
    pub goals: usize,
}

impl TaskSummary {
    pub fn of(task: &Task) -> Self {
        Self {
            variables: task.num_variables(),
            derived_variables: task
                .variables()
                .iter()
                .filter(|variable| variable.is_derived())
                .count(),
            mutex_entries: task.mutexes().len(),
            primitive_operators: task.num_primitive_operators(),
            macros: task.num_operators() - task.num_primitive_operators(),
            axioms: task.num_axioms(),
            goals: task.num_goals(),
        }
    }
}

/// One operator as shown by `planner inspect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorReport {
    pub index: usize,
    pub name: String,
    pub cost: u32,
    pub preconditions: Vec<FactPair>,
    pub effects: Vec<FactPair>,
    /// Primitive operator indices, for macros.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<Vec<usize>>,
}

/// Full `planner inspect --json` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskReport {
    pub summary: TaskSummary,
    pub initial_state: Vec<usize>,
    pub goal: Vec<FactPair>,
    pub operators: Vec<OperatorReport>,
}

impl TaskReport {
    pub fn of(task: &Task) -> Self {
        let operators = task
            .operators()
            .iter()
            .enumerate()
            .map(|(index, op)| operator_report(task, index, op))
            .collect();
        Self {
            summary: TaskSummary::of(task),
            initial_state: task.initial_state_values(),
            goal: task.goal().to_vec(),
            operators,
        }
    }
}

fn operator_report(task: &Task, index: usize, op: &Operator) -> OperatorReport {
    OperatorReport {
        index,
        name: op.name.clone(),
        cost: op.cost,
        preconditions: op.preconditions.clone(),
        effects: op.effects.iter().map(|eff| eff.fact).collect(),
        sequence: task.macro_sequence(index).map(<[usize]>::to_vec),
    }
}
