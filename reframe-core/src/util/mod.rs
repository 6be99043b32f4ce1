//! Process execution helpers shared by the external tool wrappers.

pub mod command;

pub use command::{CommandError, log_command, run_command_with_timeout};
