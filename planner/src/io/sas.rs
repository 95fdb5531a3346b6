//! Reader for translator output (`output.sas`, protocol version 3).
//!
//! The format is a sequence of marker-delimited blocks in fixed order:
//! version, metric, variables, mutex groups, initial state, goal, operators and
//! axiom rules. Numbers and markers are whitespace-separated tokens; variable
//! fact names and operator names occupy whole lines.
//!
//! Every fact is bounds-checked against the declared variables. The first
//! violation aborts parsing; no partial task is returned.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::core::invariants::{check_facts, check_operator, check_state};
use crate::core::mutex::MutexTable;
use crate::core::types::{AXIOM_NAME, Effect, FactPair, Operator, Variable};
use crate::error::InputError;
use crate::task::ParsedTask;

/// Translator output version this reader understands.
pub const PRE_FILE_VERSION: i64 = 3;

/// Read and parse a task file.
pub fn read_task_file(path: &Path) -> Result<ParsedTask> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let task = parse_task(&contents).with_context(|| format!("parse {}", path.display()))?;
    Ok(task)
}

/// Parse a complete task from translator output.
#[instrument(skip_all, fields(bytes = input.len()))]
pub fn parse_task(input: &str) -> Result<ParsedTask, InputError> {
    let mut reader = Reader::new(input);

    read_and_verify_version(&mut reader)?;
    let use_metric = read_metric(&mut reader)?;
    let mut variables = read_variables(&mut reader)?;
    let mutexes = read_mutexes(&mut reader, &variables)?;
    let initial_state = read_initial_state(&mut reader, &variables)?;
    for (variable, &value) in variables.iter_mut().zip(&initial_state) {
        variable.axiom_default_value = value;
    }
    let goal = read_goal(&mut reader, &variables)?;
    let operators = read_actions(&mut reader, false, use_metric, &variables)?;
    let axioms = read_actions(&mut reader, true, use_metric, &variables)?;
    reader.finish()?;

    debug!(
        variables = variables.len(),
        mutexes = mutexes.len(),
        goals = goal.len(),
        operators = operators.len(),
        axioms = axioms.len(),
        use_metric,
        "task parsed"
    );
    Ok(ParsedTask::new(
        variables,
        mutexes,
        operators,
        axioms,
        initial_state,
        goal,
    ))
}

fn read_and_verify_version(reader: &mut Reader<'_>) -> Result<(), InputError> {
    reader.magic("begin_version")?;
    let version = reader.int("version number")?;
    reader.magic("end_version")?;
    if version != PRE_FILE_VERSION {
        return Err(InputError::VersionMismatch {
            expected: PRE_FILE_VERSION,
            found: version,
        });
    }
    Ok(())
}

fn read_metric(reader: &mut Reader<'_>) -> Result<bool, InputError> {
    reader.magic("begin_metric")?;
    let use_metric = reader.flag("metric flag (0 or 1)")?;
    reader.magic("end_metric")?;
    Ok(use_metric)
}

fn read_variables(reader: &mut Reader<'_>) -> Result<Vec<Variable>, InputError> {
    let count = reader.count("variable count")?;
    let mut variables = Vec::new();
    for _ in 0..count {
        variables.push(read_variable(reader)?);
    }
    Ok(variables)
}

fn read_variable(reader: &mut Reader<'_>) -> Result<Variable, InputError> {
    reader.magic("begin_variable")?;
    let name = reader.token("variable name")?.to_string();
    let axiom_layer = match reader.int("axiom layer")? {
        -1 => None,
        layer if layer >= 0 => Some(layer as usize),
        layer => {
            return Err(reader.invalid("axiom layer (-1 or non-negative)", layer));
        }
    };
    let domain_size = reader.count("domain size")?;
    if domain_size == 0 {
        return Err(InputError::EmptyDomain { name });
    }
    reader.skip_whitespace();
    let mut fact_names = Vec::new();
    for _ in 0..domain_size {
        fact_names.push(reader.read_line("fact name")?.to_string());
    }
    reader.magic("end_variable")?;
    Ok(Variable {
        name,
        domain_size,
        fact_names,
        axiom_layer,
        axiom_default_value: 0,
    })
}

fn read_mutexes(reader: &mut Reader<'_>, variables: &[Variable]) -> Result<MutexTable, InputError> {
    let mut table = MutexTable::new(variables.iter().map(|variable| variable.domain_size));
    let count = reader.count("mutex group count")?;
    for _ in 0..count {
        reader.magic("begin_mutex_group")?;
        let group = reader.facts()?;
        reader.magic("end_mutex_group")?;
        check_facts(&group, variables)?;
        table.add_group(&group);
    }
    Ok(table)
}

fn read_initial_state(
    reader: &mut Reader<'_>,
    variables: &[Variable],
) -> Result<Vec<usize>, InputError> {
    reader.magic("begin_state")?;
    let mut values = Vec::with_capacity(variables.len());
    for var in 0..variables.len() {
        let value = reader.int("initial state value")?;
        values.push(value_index(var, value)?);
    }
    reader.magic("end_state")?;
    check_state(&values, variables)?;
    Ok(values)
}

fn read_goal(reader: &mut Reader<'_>, variables: &[Variable]) -> Result<Vec<FactPair>, InputError> {
    reader.magic("begin_goal")?;
    let goal = reader.facts()?;
    reader.magic("end_goal")?;
    if goal.is_empty() {
        return Err(InputError::EmptyGoal);
    }
    check_facts(&goal, variables)?;
    Ok(goal)
}

fn read_actions(
    reader: &mut Reader<'_>,
    is_axiom: bool,
    use_metric: bool,
    variables: &[Variable],
) -> Result<Vec<Operator>, InputError> {
    let what = if is_axiom { "axiom count" } else { "operator count" };
    let count = reader.count(what)?;
    let mut actions = Vec::new();
    for _ in 0..count {
        let action = if is_axiom {
            read_axiom(reader)?
        } else {
            read_operator(reader, use_metric)?
        };
        check_operator(&action, variables)?;
        actions.push(action);
    }
    Ok(actions)
}

fn read_operator(reader: &mut Reader<'_>, use_metric: bool) -> Result<Operator, InputError> {
    reader.magic("begin_operator")?;
    reader.skip_whitespace();
    let name = reader.read_line("operator name")?.to_string();
    let mut preconditions = reader.facts()?;
    let count = reader.count("effect count")?;
    let mut effects = Vec::new();
    for _ in 0..count {
        effects.push(read_pre_post(reader, &mut preconditions)?);
    }
    let declared = reader.int("operator cost")?;
    let cost = if use_metric {
        u32::try_from(declared).map_err(|_| reader.invalid("non-negative operator cost", declared))?
    } else {
        1
    };
    reader.magic("end_operator")?;
    Ok(Operator {
        name,
        preconditions,
        effects,
        cost,
        is_axiom: false,
    })
}

fn read_axiom(reader: &mut Reader<'_>) -> Result<Operator, InputError> {
    reader.magic("begin_rule")?;
    let mut preconditions = Vec::new();
    let effect = read_pre_post(reader, &mut preconditions)?;
    reader.magic("end_rule")?;
    Ok(Operator {
        name: AXIOM_NAME.to_string(),
        preconditions,
        effects: vec![effect],
        cost: 0,
        is_axiom: true,
    })
}

/// Read `conditions var pre post`; a `pre` of `-1` adds no precondition.
fn read_pre_post(
    reader: &mut Reader<'_>,
    preconditions: &mut Vec<FactPair>,
) -> Result<Effect, InputError> {
    let conditions = reader.facts()?;
    let var = var_index(reader.int("effect variable")?)?;
    let pre = reader.int("effect precondition value")?;
    let post = reader.int("effect value")?;
    if pre != -1 {
        preconditions.push(FactPair::new(var, value_index(var, pre)?));
    }
    Ok(Effect::new(
        FactPair::new(var, value_index(var, post)?),
        conditions,
    ))
}

fn var_index(var: i64) -> Result<usize, InputError> {
    usize::try_from(var).map_err(|_| InputError::InvalidVariable { var })
}

fn value_index(var: usize, value: i64) -> Result<usize, InputError> {
    usize::try_from(value).map_err(|_| InputError::InvalidValue { var, value })
}

/// Forward-only cursor over the input mixing token and line reads.
struct Reader<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        let skipped = &rest[..rest.len() - trimmed.len()];
        self.line += skipped.matches('\n').count();
        self.pos += skipped.len();
    }

    fn token(&mut self, expected: &'static str) -> Result<&'a str, InputError> {
        self.skip_whitespace();
        let rest = self.rest();
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        if end == 0 {
            return Err(InputError::UnexpectedEof { expected });
        }
        self.pos += end;
        Ok(&rest[..end])
    }

    /// Rest of the current line, without its terminator.
    fn read_line(&mut self, expected: &'static str) -> Result<&'a str, InputError> {
        let rest = self.rest();
        if rest.is_empty() {
            return Err(InputError::UnexpectedEof { expected });
        }
        let (line, consumed) = match rest.find('\n') {
            Some(end) => (&rest[..end], end + 1),
            None => (rest, rest.len()),
        };
        self.pos += consumed;
        if consumed > line.len() {
            self.line += 1;
        }
        Ok(line.strip_suffix('\r').unwrap_or(line))
    }

    fn magic(&mut self, word: &'static str) -> Result<(), InputError> {
        let line = self.next_line_number();
        let found = self.token(word)?;
        if found != word {
            return Err(InputError::MagicMismatch {
                expected: word,
                found: found.to_string(),
                line,
            });
        }
        Ok(())
    }

    fn int(&mut self, expected: &'static str) -> Result<i64, InputError> {
        let line = self.next_line_number();
        let token = self.token(expected)?;
        token.parse().map_err(|_| InputError::InvalidToken {
            expected,
            found: token.to_string(),
            line,
        })
    }

    fn count(&mut self, expected: &'static str) -> Result<usize, InputError> {
        let value = self.int(expected)?;
        usize::try_from(value).map_err(|_| self.invalid(expected, value))
    }

    fn flag(&mut self, expected: &'static str) -> Result<bool, InputError> {
        match self.int(expected)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(self.invalid(expected, other)),
        }
    }

    fn facts(&mut self) -> Result<Vec<FactPair>, InputError> {
        let count = self.count("fact count")?;
        let mut facts = Vec::new();
        for _ in 0..count {
            let var = var_index(self.int("fact variable")?)?;
            let value = value_index(var, self.int("fact value")?)?;
            facts.push(FactPair::new(var, value));
        }
        Ok(facts)
    }

    /// Reject anything but whitespace after the last block.
    fn finish(&mut self) -> Result<(), InputError> {
        self.skip_whitespace();
        let rest = self.rest();
        if rest.is_empty() {
            return Ok(());
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        Err(InputError::TrailingInput {
            found: rest[..end].to_string(),
            line: self.line,
        })
    }

    fn invalid(&self, expected: &'static str, value: i64) -> InputError {
        InputError::InvalidToken {
            expected,
            found: value.to_string(),
            line: self.line,
        }
    }

    /// Line of the next token, for diagnostics.
    fn next_line_number(&self) -> usize {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.line + rest[..rest.len() - trimmed.len()].matches('\n').count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InputErrorKind;
    use crate::test_support::load_fixture;

    fn fact(var: usize, value: usize) -> FactPair {
        FactPair::new(var, value)
    }

    fn parse_err(input: &str) -> InputError {
        parse_task(input).expect_err("input should be rejected")
    }

    #[test]
    fn parses_two_switch_task() {
        let task = parse_task(&load_fixture("two_switches.sas")).expect("parse");

        assert_eq!(task.variables.len(), 2);
        assert_eq!(task.variables[0].name, "var0");
        assert_eq!(
            task.variables[0].fact_names,
            vec!["Atom off(a)".to_string(), "Atom on(a)".to_string()]
        );
        assert_eq!(task.variables[0].axiom_layer, None);
        assert_eq!(task.initial_state, vec![0, 0]);
        assert_eq!(task.goal, vec![fact(0, 1)]);
        assert_eq!(task.operators.len(), 2);
        assert!(task.axioms.is_empty());

        let op_a = &task.operators[0];
        assert_eq!(op_a.name, "op_a");
        assert_eq!(op_a.preconditions, vec![fact(0, 0)]);
        assert_eq!(op_a.effects, vec![Effect::unconditional(fact(0, 1))]);
        assert!(!op_a.is_axiom);
    }

    #[test]
    fn mutex_groups_are_recorded_in_both_directions() {
        let task = parse_task(&load_fixture("two_switches.sas")).expect("parse");
        assert!(task.mutexes.are_mutex(fact(0, 1), fact(1, 1)));
        assert!(task.mutexes.are_mutex(fact(1, 1), fact(0, 1)));
        assert!(!task.mutexes.are_mutex(fact(0, 0), fact(1, 0)));
    }

    #[test]
    fn metric_off_coerces_costs_to_one() {
        let task = parse_task(&load_fixture("two_switches.sas")).expect("parse");
        let costs: Vec<u32> = task.operators.iter().map(|op| op.cost).collect();
        assert_eq!(costs, vec![1, 1]);
    }

    #[test]
    fn metric_on_keeps_declared_costs() {
        let input = load_fixture("two_switches.sas").replace("begin_metric\n0", "begin_metric\n1");
        let task = parse_task(&input).expect("parse");
        let costs: Vec<u32> = task.operators.iter().map(|op| op.cost).collect();
        assert_eq!(costs, vec![3, 7]);
    }

    #[test]
    fn parses_axioms_and_layers() {
        let task = parse_task(&load_fixture("derived_lamp.sas")).expect("parse");

        assert_eq!(task.variables[1].axiom_layer, Some(0));
        assert_eq!(task.variables[2].axiom_layer, Some(1));
        assert_eq!(task.variables[1].axiom_default_value, 0);
        assert_eq!(task.axioms.len(), 2);

        let rule = &task.axioms[0];
        assert!(rule.is_axiom);
        assert_eq!(rule.name, AXIOM_NAME);
        assert_eq!(rule.cost, 0);
        assert_eq!(rule.preconditions, vec![fact(1, 0)]);
        assert_eq!(
            rule.effects,
            vec![Effect::new(fact(1, 1), vec![fact(0, 1)])]
        );
    }

    #[test]
    fn conditional_effect_without_precondition() {
        let task = parse_task(&load_fixture("derived_lamp.sas")).expect("parse");
        let toggle = &task.operators[0];
        assert_eq!(toggle.name, "switch on");
        assert!(toggle.preconditions.is_empty());
        assert_eq!(toggle.effects, vec![Effect::unconditional(fact(0, 1))]);
    }

    #[test]
    fn every_parsed_fact_is_in_bounds() {
        for name in ["two_switches.sas", "derived_lamp.sas"] {
            let task = parse_task(&load_fixture(name)).expect("parse");
            let in_bounds = |f: &FactPair| {
                f.var < task.variables.len() && f.value < task.variables[f.var].domain_size
            };
            assert!(task.goal.iter().all(in_bounds));
            for op in task.operators.iter().chain(&task.axioms) {
                assert!(op.facts().all(in_bounds), "{name}: {}", op.name);
            }
            for (var, variable) in task.variables.iter().enumerate() {
                for value in 0..variable.domain_size {
                    assert!(task.mutexes.mutexes_of(fact(var, value)).iter().all(in_bounds));
                }
            }
        }
    }

    #[test]
    fn version_mismatch_is_fatal() {
        let input = load_fixture("two_switches.sas").replacen("3", "2", 1);
        let err = parse_err(&input);
        assert_eq!(
            err,
            InputError::VersionMismatch {
                expected: 3,
                found: 2
            }
        );
        assert!(err.to_string().contains("older translator"));
    }

    #[test]
    fn wrong_marker_reports_expected_and_found() {
        let input = load_fixture("two_switches.sas").replace("begin_goal", "begin_gaol");
        let err = parse_err(&input);
        assert_eq!(err.kind(), InputErrorKind::Protocol);
        match err {
            InputError::MagicMismatch {
                expected, found, ..
            } => {
                assert_eq!(expected, "begin_goal");
                assert_eq!(found, "begin_gaol");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_version_block_hints_at_stale_translator() {
        let err = parse_err("begin_metric\n0\nend_metric\n");
        assert!(err.to_string().contains("older version"));
    }

    #[test]
    fn empty_goal_is_fatal() {
        let input = load_fixture("two_switches.sas")
            .replace("begin_goal\n1\n0 1\n", "begin_goal\n0\n");
        assert_eq!(parse_err(&input), InputError::EmptyGoal);
    }

    #[test]
    fn out_of_range_goal_value_is_fatal() {
        let input = load_fixture("two_switches.sas")
            .replace("begin_goal\n1\n0 1\n", "begin_goal\n1\n0 2\n");
        assert_eq!(
            parse_err(&input),
            InputError::InvalidValue { var: 0, value: 2 }
        );
    }

    #[test]
    fn out_of_range_effect_variable_is_fatal() {
        let input = load_fixture("two_switches.sas").replace("0 1 0 1", "0 5 0 1");
        let err = parse_err(&input);
        assert_eq!(err, InputError::InvalidVariable { var: 5 });
        assert_eq!(err.kind(), InputErrorKind::Bounds);
    }

    #[test]
    fn out_of_range_mutex_member_is_fatal() {
        let input = load_fixture("two_switches.sas")
            .replace("2\n0 1\n1 1\nend_mutex_group", "2\n0 1\n1 4\nend_mutex_group");
        assert_eq!(
            parse_err(&input),
            InputError::InvalidValue { var: 1, value: 4 }
        );
    }

    #[test]
    fn negative_value_is_fatal() {
        let input = load_fixture("two_switches.sas")
            .replace("begin_state\n0\n0", "begin_state\n0\n-2");
        assert_eq!(
            parse_err(&input),
            InputError::InvalidValue { var: 1, value: -2 }
        );
    }

    #[test]
    fn empty_domain_is_fatal() {
        let input = load_fixture("two_switches.sas").replacen(
            "var1\n-1\n2\nAtom off(b)\nAtom on(b)\n",
            "var1\n-1\n0\n",
            1,
        );
        assert_eq!(
            parse_err(&input),
            InputError::EmptyDomain {
                name: "var1".to_string()
            }
        );
    }

    #[test]
    fn truncated_input_is_fatal() {
        let input = load_fixture("two_switches.sas");
        let cut = input.find("begin_operator").expect("operator block");
        let err = parse_err(&input[..cut]);
        assert!(matches!(err, InputError::UnexpectedEof { .. }));
    }

    const HUGE_COUNT: &str = "9223372036854775807";

    #[test]
    fn huge_variable_count_runs_out_of_input() {
        let input =
            format!("begin_version\n3\nend_version\nbegin_metric\n0\nend_metric\n{HUGE_COUNT}\n");
        assert_eq!(
            parse_err(&input),
            InputError::UnexpectedEof {
                expected: "begin_variable"
            }
        );
    }

    #[test]
    fn huge_goal_count_runs_out_of_input() {
        let input = load_fixture("two_switches.sas");
        let cut = input.find("begin_goal").expect("goal block");
        let input = format!("{}begin_goal\n{HUGE_COUNT}\n", &input[..cut]);
        assert!(matches!(
            parse_err(&input),
            InputError::UnexpectedEof { .. }
        ));
    }

    #[test]
    fn huge_domain_size_runs_out_of_input() {
        let input = format!(
            "begin_version\n3\nend_version\nbegin_metric\n0\nend_metric\n1\n\
             begin_variable\nvar0\n-1\n{HUGE_COUNT}\nAtom off(a)\n"
        );
        assert_eq!(
            parse_err(&input),
            InputError::UnexpectedEof {
                expected: "fact name"
            }
        );
    }

    #[test]
    fn huge_effect_count_is_an_input_error() {
        let input = load_fixture("two_switches.sas").replacen(
            "0\n1\n0 0 0 1",
            &format!("0\n{HUGE_COUNT}\n0 0 0 1"),
            1,
        );
        assert_eq!(parse_err(&input).kind(), InputErrorKind::Protocol);
    }

    #[test]
    fn trailing_input_is_fatal() {
        let input = format!("{}\nbegin_operator\n", load_fixture("two_switches.sas"));
        assert!(matches!(
            parse_err(&input),
            InputError::TrailingInput { found, .. } if found == "begin_operator"
        ));
    }

    #[test]
    fn non_numeric_token_reports_line() {
        let input = load_fixture("two_switches.sas")
            .replace("begin_metric\n0", "begin_metric\nyes");
        match parse_err(&input) {
            InputError::InvalidToken { found, line, .. } => {
                assert_eq!(found, "yes");
                assert_eq!(line, 5);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn read_task_file_wraps_input_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("bad.sas");
        fs::write(&path, "begin_version\n2\nend_version\n").expect("write");

        let err = read_task_file(&path).expect_err("stale version");
        assert!(err.chain().any(|cause| cause.is::<InputError>()));
    }
}
