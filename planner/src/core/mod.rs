//! Deterministic, pure logic over the planning task model.
//!
//! Core modules are free of I/O. They operate on in-memory facts and operators
//! and return deterministic outputs suitable for tests.

pub mod candidates;
pub mod compose;
pub mod invariants;
pub mod mutex;
pub mod types;
