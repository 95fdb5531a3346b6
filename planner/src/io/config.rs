//! Planner configuration (TOML), passed with `--config`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::candidates::GeneratorKind;
use crate::heuristic::DEFAULT_SAME_STATE_ESTIMATE;

/// Planner configuration (TOML).
///
/// Missing fields fall back to the defaults below, so an empty file is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct PlannerConfig {
    pub macros: MacroConfig,
    pub heuristic: HeuristicConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MacroConfig {
    /// Compose macros and append them to the operator list.
    pub enabled: bool,

    /// Candidate sequence generator.
    pub generator: GeneratorKind,
}

impl Default for MacroConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            generator: GeneratorKind::Pairwise,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HeuristicConfig {
    /// Estimate the effect-size heuristic reports for the initial state.
    pub same_state_estimate: u32,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            same_state_estimate: DEFAULT_SAME_STATE_ESTIMATE,
        }
    }
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.heuristic.same_state_estimate == 0 {
            return Err(anyhow!("heuristic.same_state_estimate must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `PlannerConfig::default()`.
pub fn load_config(path: &Path) -> Result<PlannerConfig> {
    if !path.exists() {
        let cfg = PlannerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: PlannerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &PlannerConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, PlannerConfig::default());
        assert!(cfg.macros.enabled);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("planner.toml");
        fs::write(&path, "[macros]\nenabled = false\n").expect("write");

        let cfg = load_config(&path).expect("load");
        assert!(!cfg.macros.enabled);
        assert_eq!(cfg.macros.generator, GeneratorKind::Pairwise);
        assert_eq!(cfg.heuristic.same_state_estimate, 999);
    }

    #[test]
    fn zero_estimate_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("planner.toml");
        fs::write(&path, "[heuristic]\nsame_state_estimate = 0\n").expect("write");

        let err = load_config(&path).expect_err("zero estimate");
        assert!(err.to_string().contains("same_state_estimate"));
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested").join("planner.toml");
        let cfg = PlannerConfig::default();
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }
}
