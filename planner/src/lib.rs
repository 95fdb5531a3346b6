//! Planning task ingestion, representation and macro-operator synthesis.
//!
//! The crate reads grounded translator output (variables, mutex groups,
//! operators with conditional effects, axiom rules, initial state, goal) into
//! an immutable task model and extends the operator list with macro-operators
//! composed from pairs of primitive operators.
//!
//! - **[`core`]**: Pure, deterministic logic (fact model, mutex table,
//!   invariants, macro composition). No I/O.
//! - **[`io`]**: Task file parsing and configuration.
//!
//! [`build`] wires the stages together; [`task`] exposes the frozen task
//! through the [`task::TaskView`] query trait consumed by [`heuristic`].

pub mod axioms;
pub mod build;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod heuristic;
pub mod io;
pub mod logging;
pub mod task;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
