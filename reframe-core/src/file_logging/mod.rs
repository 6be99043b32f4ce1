//! Run log written to a timestamped file.

pub mod setup;

pub use setup::{run_log_path, setup_file_logging};
