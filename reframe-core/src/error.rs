// ============================================================================
// reframe-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error Types for the Reframe Core Library
//
// Errors are split by the stage that produces them so the batch orchestrator
// can decide, by type alone, whether a failure aborts the run or only the
// current file:
//
// - ConfigError: fatal, raised before any file is touched
// - ProbeError:  per-file, the file is skipped
// - PlanError:   per-file, the file is skipped
// - ExecError:   per-file, the file is recorded as failed
//
// CoreError aggregates all of them for callers that only need `?`.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Invalid run configuration. Always fatal to the whole run.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {field}: '{value}' is not a valid number")]
    NotANumber { field: &'static str, value: String },

    #[error("Invalid {field}: {reason}")]
    OutOfRange { field: &'static str, reason: String },

    #[error("Input folder '{0}' does not exist or is not a directory")]
    InputFolderMissing(PathBuf),

    #[error("Failed to read input folder '{path}': {source}")]
    ReadInputFolder {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No video files found in '{0}'")]
    NoFilesFound(PathBuf),

    #[error("Required external tool '{0}' was not found")]
    DependencyNotFound(String),

    #[error("Failed to start dependency check for '{tool}': {source}")]
    DependencyCheck {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create output folder '{path}': {source}")]
    OutputFolder {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// The inspection tool could not describe the file.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{tool} did not finish within {}s", .timeout.as_secs())]
    TimedOut { tool: String, timeout: Duration },

    #[error("Failed to parse ffprobe output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No video stream found")]
    NoVideoStream,

    #[error("Video stream is missing {0}")]
    MissingField(&'static str),

    #[error("Invalid {field} value '{value}'")]
    InvalidField { field: &'static str, value: String },

    #[error("Unsupported rotation of {0} degrees")]
    UnsupportedRotation(i64),
}

/// The requested transform cannot be applied to the probed file.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("Video is too short: duration {duration:.3}s is less than the start offset {start_offset:.3}s")]
    TooShort { duration: f64, start_offset: f64 },

    #[error("Nothing left to encode: start offset {start_offset:.3}s equals the video duration")]
    EmptyWindow { start_offset: f64 },
}

/// The encode tool did not produce the expected output.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read ffmpeg output: {0}")]
    Events(String),

    #[error("Failed waiting for ffmpeg to exit: {0}")]
    Wait(#[source] io::Error),

    #[error("ffmpeg exited with {status}: {stderr}")]
    ToolFailed { status: ExitStatus, stderr: String },

    #[error("ffmpeg reported success but '{0}' was not created")]
    OutputMissing(PathBuf),

    #[error("ffmpeg did not finish within {}s and was stopped", .0.as_secs())]
    TimedOut(Duration),

    #[error("Failed to read size of '{path}': {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Top-level error type for the core library.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Exec(#[from] ExecError),
}

impl CoreError {
    /// Whether this error aborts a whole run rather than a single file.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, CoreError::Config(_))
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
