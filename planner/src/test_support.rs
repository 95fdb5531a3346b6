//! Test-only helpers for constructing operators, variables and small tasks.

use std::fs;
use std::path::PathBuf;

use crate::core::types::{Effect, FactPair, Operator, Variable};
use crate::io::sas::parse_task;
use crate::task::ParsedTask;

/// Path of a file under `tests/fixtures/`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Contents of a file under `tests/fixtures/`.
pub fn load_fixture(name: &str) -> String {
    let path = fixture_path(name);
    fs::read_to_string(&path).unwrap_or_else(|err| panic!("read {}: {err}", path.display()))
}

/// Two independent switches; goal is switch `a` on. Two primitive operators.
pub fn two_switches() -> ParsedTask {
    parse_task(&load_fixture("two_switches.sas")).expect("two_switches fixture parses")
}

/// A switch, a derived lamp (layer 0) and a derived room brightness (layer 1).
pub fn derived_lamp() -> ParsedTask {
    parse_task(&load_fixture("derived_lamp.sas")).expect("derived_lamp fixture parses")
}

/// Create a non-axiom operator with unconditional effects.
pub fn op(name: &str, pre: &[(usize, usize)], effects: &[(usize, usize)], cost: u32) -> Operator {
    Operator {
        name: name.to_string(),
        preconditions: pre.iter().copied().map(FactPair::from).collect(),
        effects: effects
            .iter()
            .copied()
            .map(|fact| Effect::unconditional(fact.into()))
            .collect(),
        cost,
        is_axiom: false,
    }
}

/// Create a non-derived variable with generated fact names.
pub fn variable(name: &str, domain_size: usize) -> Variable {
    Variable {
        name: name.to_string(),
        domain_size,
        fact_names: (0..domain_size).map(|value| format!("{name}={value}")).collect(),
        axiom_layer: None,
        axiom_default_value: 0,
    }
}
