//! Main entry point for the Reframe CLI application.
//!
//! This handles command-line argument parsing, logging setup, and dispatching
//! to the command handlers. Progress goes to the terminal or, with
//! `--progress-json`, as JSON events on stdout.
//!
//! Exit status: 0 when every file was processed, 1 when the run could not
//! start (including argument errors), 2 when some files were skipped or
//! failed.

use reframe::error::{error_suggestion, error_title, exit_code_for, usage_exit_status};
use reframe::logging::get_timestamp;
use reframe::{Commands, parse_cli, run_transform};
use reframe_core::file_logging::{run_log_path, setup_file_logging};
use reframe_core::reporting::{JsonReporter, Reporter, ReporterError, TerminalReporter};

use log::LevelFilter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli_args = match parse_cli() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(usage_exit_status(&e));
        }
    };

    // Determine log level based on verbose flag
    let log_level = if cli_args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    match cli_args.command {
        Commands::Run(args) => {
            let reporter: Box<dyn Reporter> = if args.progress_json {
                Box::new(JsonReporter::new())
            } else {
                Box::new(TerminalReporter::new())
            };

            if !args.no_log {
                let log_path = run_log_path(&args.log_dir, &get_timestamp());
                match setup_file_logging(&log_path, log_level) {
                    Ok(()) => {
                        log::info!("Reframe starting");
                        log::info!("Log file: {}", log_path.display());
                        if log_level == LevelFilter::Debug {
                            log::info!("Debug level logging enabled");
                        }
                    }
                    // A missing log file never stops the batch.
                    Err(e) => reporter.warning(&format!(
                        "Could not write log file {}: {e:#}",
                        log_path.display()
                    )),
                }
            }

            let result = run_transform(&args, reporter.as_ref());

            if let Err(e) = &result {
                log::error!("Run aborted: {e}");
                reporter.error(&ReporterError {
                    title: error_title(e).to_string(),
                    message: e.to_string(),
                    context: Some(format!("Input folder: {}", args.input_dir.display())),
                    suggestion: error_suggestion(e),
                });
            }

            exit_code_for(&result)
        }
    }
}
