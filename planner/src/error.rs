//! Classified errors for malformed task input.
//!
//! Input is produced by a deterministic translator stage, so every error here
//! is fatal: the pipeline stops and the binary exits with
//! [`crate::exit_codes::INPUT_ERROR`].

use thiserror::Error;

/// Coarse classification used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputErrorKind {
    /// Missing or mismatched markers, bad tokens, truncated or trailing input.
    Protocol,
    /// A variable or value reference outside the declared domains.
    Bounds,
    /// Structurally valid input describing an unusable task.
    Semantic,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error(
        "line {line}: failed to match magic word '{expected}', got '{found}'{}",
        stale_hint(.expected)
    )]
    MagicMismatch {
        expected: &'static str,
        found: String,
        line: usize,
    },
    #[error(
        "expected translator output file version {expected}, got {found}; \
         possible cause: the file was produced by an older translator"
    )]
    VersionMismatch { expected: i64, found: i64 },
    #[error("line {line}: expected {expected}, got '{found}'")]
    InvalidToken {
        expected: &'static str,
        found: String,
        line: usize,
    },
    #[error("unexpected end of input while reading {expected}")]
    UnexpectedEof { expected: &'static str },
    #[error("line {line}: unexpected trailing input '{found}' after the axiom block")]
    TrailingInput { found: String, line: usize },
    #[error("invalid variable id: {var}")]
    InvalidVariable { var: i64 },
    #[error("invalid value for variable {var}: {value}")]
    InvalidValue { var: usize, value: i64 },
    #[error("variable '{name}' has empty domain")]
    EmptyDomain { name: String },
    #[error("task has no goal condition")]
    EmptyGoal,
}

impl InputError {
    pub fn kind(&self) -> InputErrorKind {
        match self {
            InputError::MagicMismatch { .. }
            | InputError::VersionMismatch { .. }
            | InputError::InvalidToken { .. }
            | InputError::UnexpectedEof { .. }
            | InputError::TrailingInput { .. } => InputErrorKind::Protocol,
            InputError::InvalidVariable { .. } | InputError::InvalidValue { .. } => {
                InputErrorKind::Bounds
            }
            InputError::EmptyDomain { .. } | InputError::EmptyGoal => InputErrorKind::Semantic,
        }
    }
}

fn stale_hint(expected: &str) -> &'static str {
    if expected == "begin_version" {
        " (possible cause: running the planner on translator output from an older version)"
    } else {
        ""
    }
}
