//! I/O helpers: task files and configuration.

pub mod config;
pub mod sas;
