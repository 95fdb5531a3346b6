//! Stable exit codes for planner CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed for reasons other than task input: unreadable files, invalid
/// config, bad command-line state.
pub const INVALID: i32 = 1;
/// The task input was malformed (protocol, bounds or semantic error).
pub const INPUT_ERROR: i32 = 33;
