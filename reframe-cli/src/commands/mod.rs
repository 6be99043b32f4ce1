//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Module containing the implementation of the `run` command.
/// This command trims, rotates and reframes every video in a folder.
pub mod run;
