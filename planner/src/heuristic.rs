//! Heuristics consuming the task query interface.

use tracing::debug;

use crate::task::{TaskLayer, TaskView};

/// Estimate reported for a state identical to the initial state.
pub const DEFAULT_SAME_STATE_ESTIMATE: u32 = 999;

/// Goal-distance estimate for a state of the task it was built for.
pub trait Heuristic {
    fn compute(&self, state: &[usize]) -> u32;
}

/// Counts non-derived variables whose value differs from the initial state.
///
/// Action costs are ignored. A state equal to the initial state gets the
/// configured sentinel instead of zero.
pub struct EffSizeHeuristic<'a, T: TaskView> {
    task: &'a T,
    initial_state: Vec<usize>,
    same_state_estimate: u32,
}

impl<'a, T: TaskView> EffSizeHeuristic<'a, T> {
    pub fn new(task: &'a T, same_state_estimate: u32) -> Self {
        debug!("initializing effect size heuristic");
        Self {
            task,
            initial_state: task.initial_state_values(),
            same_state_estimate,
        }
    }
}

impl<T: TaskView> Heuristic for EffSizeHeuristic<'_, T> {
    fn compute(&self, ancestor_state: &[usize]) -> u32 {
        assert_eq!(
            ancestor_state.len(),
            self.initial_state.len(),
            "state has wrong number of variables"
        );
        let mut state = ancestor_state.to_vec();
        self.task
            .convert_ancestor_state_values(&mut state, TaskLayer::Root);

        let differing = self
            .initial_state
            .iter()
            .zip(&state)
            .enumerate()
            .filter(|&(var, (initial, current))| {
                self.task.variable_axiom_layer(var).is_none() && initial != current
            })
            .count();

        if differing == 0 {
            return self.same_state_estimate;
        }
        differing as u32
    }
}
