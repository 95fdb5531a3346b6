//! Referential invariants of a task: every fact must lie inside the declared
//! variable domains.

use crate::core::types::{FactPair, Operator, Variable};
use crate::error::InputError;

/// Check that `fact` names an existing variable and a value in its domain.
pub fn check_fact(fact: &FactPair, variables: &[Variable]) -> Result<(), InputError> {
    let Some(variable) = variables.get(fact.var) else {
        return Err(InputError::InvalidVariable {
            var: fact.var as i64,
        });
    };
    if fact.value >= variable.domain_size {
        return Err(InputError::InvalidValue {
            var: fact.var,
            value: fact.value as i64,
        });
    }
    Ok(())
}

pub fn check_facts<'a>(
    facts: impl IntoIterator<Item = &'a FactPair>,
    variables: &[Variable],
) -> Result<(), InputError> {
    facts
        .into_iter()
        .try_for_each(|fact| check_fact(fact, variables))
}

/// Check preconditions, effect targets and effect conditions of `op`.
pub fn check_operator(op: &Operator, variables: &[Variable]) -> Result<(), InputError> {
    check_facts(op.facts(), variables)
}

/// Check the initial state vector: one in-domain value per variable.
pub fn check_state(values: &[usize], variables: &[Variable]) -> Result<(), InputError> {
    values
        .iter()
        .enumerate()
        .try_for_each(|(var, &value)| check_fact(&FactPair::new(var, value), variables))
}

/// Sweep every fact-bearing part of a task and report all violations.
///
/// The parser stops at the first violation; this sweep is for tasks that were
/// assembled or altered after parsing (for example by macro composition).
pub fn validate_invariants<'a>(
    variables: &[Variable],
    goal: &[FactPair],
    operators: impl IntoIterator<Item = &'a Operator>,
    axioms: impl IntoIterator<Item = &'a Operator>,
) -> Vec<String> {
    let mut errors = Vec::new();

    if goal.is_empty() {
        errors.push("goal must not be empty".to_string());
    }
    for fact in goal {
        if let Err(err) = check_fact(fact, variables) {
            errors.push(format!("goal: {err}"));
        }
    }

    for (index, op) in operators.into_iter().enumerate() {
        let label = format!("operator {index} '{}'", op.name);
        collect_operator_errors(op, &label, variables, &mut errors);
    }

    for (index, axiom) in axioms.into_iter().enumerate() {
        if axiom.effects.len() != 1 {
            errors.push(format!(
                "axiom {index}: expected exactly one effect, got {}",
                axiom.effects.len()
            ));
        }
        if axiom.cost != 0 {
            errors.push(format!("axiom {index}: cost must be 0"));
        }
        collect_operator_errors(axiom, &format!("axiom {index}"), variables, &mut errors);
    }

    errors
}

fn collect_operator_errors(
    op: &Operator,
    label: &str,
    variables: &[Variable],
    errors: &mut Vec<String>,
) {
    for fact in op.facts() {
        if let Err(err) = check_fact(fact, variables) {
            errors.push(format!("{label}: {err}"));
        }
    }

    let mut seen = Vec::with_capacity(op.preconditions.len());
    for pre in &op.preconditions {
        if seen.contains(&pre.var) {
            errors.push(format!("{label}: variable {} has two preconditions", pre.var));
        }
        seen.push(pre.var);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Effect;
    use crate::test_support::{op, variable};

    #[test]
    fn check_fact_rejects_unknown_variable_and_value() {
        let variables = vec![variable("v0", 2)];
        assert_eq!(check_fact(&FactPair::new(0, 1), &variables), Ok(()));
        assert_eq!(
            check_fact(&FactPair::new(1, 0), &variables),
            Err(InputError::InvalidVariable { var: 1 })
        );
        assert_eq!(
            check_fact(&FactPair::new(0, 2), &variables),
            Err(InputError::InvalidValue { var: 0, value: 2 })
        );
    }

    #[test]
    fn check_operator_visits_effect_conditions() {
        let variables = vec![variable("v0", 2), variable("v1", 2)];
        let mut bad = op("bad", &[(0, 0)], &[(1, 1)], 1);
        bad.effects[0] = Effect::new(FactPair::new(1, 1), vec![FactPair::new(0, 7)]);
        assert_eq!(
            check_operator(&bad, &variables),
            Err(InputError::InvalidValue { var: 0, value: 7 })
        );
    }

    #[test]
    fn validate_invariants_reports_all_errors() {
        let variables = vec![variable("v0", 2)];
        let ops = vec![
            op("dup-pre", &[(0, 0), (0, 1)], &[], 1),
            op("oob", &[], &[(3, 0)], 1),
        ];
        let no_axioms: Vec<Operator> = Vec::new();
        let errors = validate_invariants(&variables, &[], &ops, &no_axioms);

        assert!(errors.iter().any(|err| err.contains("goal must not be empty")));
        assert!(errors.iter().any(|err| err.contains("two preconditions")));
        assert!(errors.iter().any(|err| err.contains("invalid variable id: 3")));
    }
}
