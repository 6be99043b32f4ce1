//! Library component for the Reframe CLI application.
//!
//! This contains the argument definitions and command logic that the binary
//! uses, kept in a library so they can be tested directly.

/// Command-line interface definitions using clap
pub mod cli;

/// Command implementations for each subcommand
pub mod commands;

/// Result alias and exit codes
pub mod error;

/// Logging utilities and helper functions
pub mod logging;

// Re-exports for convenience
pub use cli::{Cli, Commands, RunArgs, parse_cli, parse_cli_from};
pub use commands::run::run_transform;
