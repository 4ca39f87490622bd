//! CLI module - command-line interface
//!
//! Subcommands for inspecting the planning protocol and configuration.

pub mod commands;

pub use commands::{run_command, Command};
