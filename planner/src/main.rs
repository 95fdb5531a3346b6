//! Planning task loader and macro-operator synthesizer.
//!
//! Reads translator output, composes macro-operators, resolves derived
//! initial values and reports on the resulting task. Malformed task input
//! exits with [`exit_codes::INPUT_ERROR`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use planner::build::{TaskReport, TaskSummary, load_task};
use planner::core::invariants::validate_invariants;
use planner::error::InputError;
use planner::exit_codes;
use planner::heuristic::{EffSizeHeuristic, Heuristic};
use planner::io::config::{PlannerConfig, load_config, write_config};
use planner::logging;
use planner::task::{Task, TaskView, format_facts};

#[derive(Parser)]
#[command(
    name = "planner",
    version,
    about = "Planning task loader and macro-operator synthesizer"
)]
struct Cli {
    /// Planner configuration (TOML). Defaults apply when the file is missing.
    #[arg(long, global = true, default_value = "planner.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the default configuration to the `--config` path.
    Init {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// Load a task and check it; prints a one-line summary.
    Validate {
        /// Translator output file.
        task: PathBuf,
    },
    /// Print every operator, macros included.
    Inspect {
        /// Translator output file.
        task: PathBuf,
        /// Emit a JSON document instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Evaluate the effect-size heuristic on a state.
    Estimate {
        /// Translator output file.
        task: PathBuf,
        /// Comma-separated value per variable; defaults to the initial state.
        #[arg(long, value_delimiter = ',')]
        state: Option<Vec<usize>>,
    },
}

fn main() {
    logging::init();
    let code = match run() {
        Ok(()) => exit_codes::OK,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_code_for(&err)
        }
    };
    std::process::exit(code);
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => cmd_init(&cli.config, force),
        Command::Validate { task } => cmd_validate(&task, &load_config(&cli.config)?),
        Command::Inspect { task, json } => cmd_inspect(&task, &load_config(&cli.config)?, json),
        Command::Estimate { task, state } => {
            cmd_estimate(&task, &load_config(&cli.config)?, state)
        }
    }
}

/// Malformed task input gets its own status; everything else is `INVALID`.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.chain().any(|cause| cause.is::<InputError>()) {
        exit_codes::INPUT_ERROR
    } else {
        exit_codes::INVALID
    }
}

fn cmd_init(config_path: &Path, force: bool) -> Result<()> {
    if !force && config_path.exists() {
        bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }
    write_config(config_path, &PlannerConfig::default())
        .with_context(|| format!("write {}", config_path.display()))?;
    println!("init: wrote {}", config_path.display());
    Ok(())
}

fn cmd_validate(path: &Path, config: &PlannerConfig) -> Result<()> {
    let task = load_task(path, config)?;
    let errors = validate_invariants(
        task.variables(),
        task.goal(),
        task.operators(),
        task.axioms(),
    );
    if !errors.is_empty() {
        bail!("invariant violations:\n- {}", errors.join("\n- "));
    }
    let summary = TaskSummary::of(&task);
    println!(
        "ok: variables={} derived={} mutexes={} operators={} macros={} axioms={} goals={}",
        summary.variables,
        summary.derived_variables,
        summary.mutex_entries,
        summary.primitive_operators,
        summary.macros,
        summary.axioms,
        summary.goals
    );
    Ok(())
}

fn cmd_inspect(path: &Path, config: &PlannerConfig, json: bool) -> Result<()> {
    let task = load_task(path, config)?;
    let report = TaskReport::of(&task);
    if json {
        let payload = serde_json::to_string_pretty(&report).context("serialize report")?;
        println!("{payload}");
        return Ok(());
    }
    println!("initial state: {:?}", report.initial_state);
    println!("goal: {}", format_facts(&report.goal));
    for op in &report.operators {
        let mut line = format!(
            "{} {} pre={} eff={} cost={}",
            op.index,
            op.name,
            format_facts(&op.preconditions),
            format_facts(&op.effects),
            op.cost
        );
        if let Some(sequence) = &op.sequence {
            line.push_str(&format!(" macro={sequence:?}"));
        }
        println!("{line}");
    }
    Ok(())
}

fn cmd_estimate(path: &Path, config: &PlannerConfig, state: Option<Vec<usize>>) -> Result<()> {
    let task = load_task(path, config)?;
    let state = match state {
        Some(values) => {
            check_state_arg(&task, &values)?;
            values
        }
        None => task.initial_state_values(),
    };
    let heuristic = EffSizeHeuristic::new(&task, config.heuristic.same_state_estimate);
    println!("estimate: {}", heuristic.compute(&state));
    Ok(())
}

fn check_state_arg(task: &Task, values: &[usize]) -> Result<()> {
    if values.len() != task.num_variables() {
        bail!(
            "--state has {} values but the task has {} variables",
            values.len(),
            task.num_variables()
        );
    }
    for (var, &value) in values.iter().enumerate() {
        if value >= task.variable_domain_size(var) {
            bail!(
                "--state value {} out of range for variable {} ({})",
                value,
                var,
                task.variable_name(var)
            );
        }
    }
    Ok(())
}
