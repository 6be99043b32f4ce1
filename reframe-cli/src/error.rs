// ============================================================================
// reframe-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Result alias and process exit codes
//
// The CLI reuses the core error type. Exit codes separate a run that could
// not start from a run that finished with some files skipped or failed.

use reframe_core::{CoreError, CoreResult};
use reframe_core::processing::BatchSummary;

use std::process::ExitCode;

/// Type alias for CLI results using CoreError.
pub type CliResult<T> = CoreResult<T>;

/// Every file was transcoded.
pub const EXIT_SUCCESS: u8 = 0;

/// The run could not start (bad arguments, no input, missing tools).
pub const EXIT_FATAL: u8 = 1;

/// The run finished but at least one file was skipped or failed, or the
/// batch was cancelled.
pub const EXIT_INCOMPLETE: u8 = 2;

/// Maps the outcome of a run to the process exit status.
pub fn exit_status_for(result: &CliResult<BatchSummary>) -> u8 {
    match result {
        Ok(summary) if summary.is_clean() => EXIT_SUCCESS,
        Ok(_) => EXIT_INCOMPLETE,
        Err(_) => EXIT_FATAL,
    }
}

/// [`exit_status_for`] as an [`ExitCode`] for `main`.
pub fn exit_code_for(result: &CliResult<BatchSummary>) -> ExitCode {
    ExitCode::from(exit_status_for(result))
}

/// Exit status for an argument parsing error.
///
/// `--help` and `--version` are successes; every usage error means the run
/// could not start.
pub fn usage_exit_status(error: &clap::Error) -> u8 {
    if error.use_stderr() {
        EXIT_FATAL
    } else {
        EXIT_SUCCESS
    }
}

/// Short title shown above a fatal error.
pub fn error_title(error: &CoreError) -> &'static str {
    match error {
        CoreError::Config(_) => "Configuration error",
        _ => "Run failed",
    }
}

/// Hint for the user, when one applies.
pub fn error_suggestion(error: &CoreError) -> Option<String> {
    use reframe_core::ConfigError;

    match error {
        CoreError::Config(ConfigError::NoFilesFound(_)) => Some(format!(
            "Supported extensions: {}",
            reframe_core::config::VIDEO_EXTENSIONS.join(", ")
        )),
        CoreError::Config(ConfigError::DependencyNotFound(tool)) => Some(format!(
            "Install {tool} or point --ffmpeg/--ffprobe at the binary"
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reframe_core::{ConfigError, ExecError};
    use reframe_core::processing::{FileOutcome, FileReport};
    use std::path::PathBuf;
    use std::time::Duration;

    fn summary(outcome: FileOutcome, cancelled: bool) -> BatchSummary {
        BatchSummary::from_reports(
            vec![FileReport {
                file_name: "a.mp4".to_string(),
                outcome,
            }],
            1,
            Duration::ZERO,
            cancelled,
        )
    }

    #[test]
    fn exit_codes_distinguish_fatal_from_incomplete() {
        let ok = summary(
            FileOutcome::Succeeded {
                output_path: PathBuf::from("out/processed_a.mp4"),
                output_size: 1,
            },
            false,
        );
        assert_eq!(exit_status_for(&Ok(ok.clone())), EXIT_SUCCESS);

        let skipped = summary(
            FileOutcome::Skipped {
                reason: "too short".to_string(),
            },
            false,
        );
        assert_eq!(exit_status_for(&Ok(skipped)), EXIT_INCOMPLETE);

        let cancelled = BatchSummary {
            cancelled: true,
            ..ok
        };
        assert_eq!(exit_status_for(&Ok(cancelled)), EXIT_INCOMPLETE);

        let fatal: CliResult<BatchSummary> =
            Err(ConfigError::NoFilesFound(PathBuf::from("in")).into());
        assert_eq!(exit_status_for(&fatal), EXIT_FATAL);
    }

    #[test]
    fn usage_errors_are_fatal_help_is_not() {
        use crate::cli::parse_cli_from;

        let status = |argv: &[&str]| match parse_cli_from(argv.iter().copied()) {
            Ok(_) => panic!("{argv:?} should not parse"),
            Err(e) => usage_exit_status(&e),
        };

        assert_eq!(status(&["reframe", "run", "-i", "in"]), EXIT_FATAL);
        assert_eq!(
            status(&["reframe", "run", "-i", "in", "-o", "out", "--timeout", "abc"]),
            EXIT_FATAL
        );
        assert_eq!(status(&["reframe", "bogus"]), EXIT_FATAL);
        assert_eq!(status(&["reframe", "--help"]), EXIT_SUCCESS);
        assert_eq!(status(&["reframe", "--version"]), EXIT_SUCCESS);
    }

    #[test]
    fn per_file_errors_get_a_generic_title() {
        let err: CoreError = ExecError::OutputMissing(PathBuf::from("out/x.mp4")).into();
        assert_eq!(error_title(&err), "Run failed");
        assert!(!err.is_fatal());
    }

    #[test]
    fn missing_tool_has_a_suggestion() {
        let err: CoreError = ConfigError::DependencyNotFound("ffmpeg".to_string()).into();
        assert_eq!(error_title(&err), "Configuration error");
        assert!(error_suggestion(&err).is_some_and(|s| s.contains("--ffmpeg")));
    }
}
