//! Core library for batch trimming, rotation correction and reframing of
//! video files using ffmpeg and ffprobe.
//!
//! Every file in the input folder is probed, planned and transcoded in turn:
//! trimmed to a time window, transposed when its container records a
//! quarter-turn rotation, scaled to cover the target frame and center-cropped
//! to exactly the target size. A failing file never stops the batch.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use reframe_core::{CancellationToken, CoreConfig, TransformRequest, run_batch};
//! use reframe_core::external::{CommandFfprobeExecutor, SidecarSpawner, StdFsMetadataProvider};
//! use reframe_core::reporting::NullReporter;
//! use std::path::PathBuf;
//!
//! let config = CoreConfig::new(PathBuf::from("/path/to/input"), PathBuf::from("/path/to/output"));
//! let request = TransformRequest::from_strs("0", "20", "1200", "1600").unwrap();
//! let ffprobe = CommandFfprobeExecutor::new(&config.ffprobe_path, config.tool_timeout);
//!
//! let summary = run_batch(
//!     &ffprobe,
//!     &SidecarSpawner,
//!     &StdFsMetadataProvider,
//!     &NullReporter,
//!     &config,
//!     &request,
//!     &CancellationToken::new(),
//! )
//! .unwrap();
//! println!("{} succeeded, {} skipped, {} failed", summary.succeeded, summary.skipped, summary.failed);
//! ```

pub mod cancel;
pub mod config;
pub mod discovery;
pub mod error;
pub mod external;
pub mod file_logging;
pub mod processing;
pub mod reporting;
pub mod util;
pub mod utils;

// Re-exports for public API
pub use cancel::CancellationToken;
pub use config::{CoreConfig, TransformRequest};
pub use discovery::{find_processable_files, is_video_file};
pub use error::{ConfigError, CoreError, CoreResult, ExecError, PlanError, ProbeError};
pub use processing::{
    BatchSummary, FileOutcome, FileReport, FileState, FilterOp, TransformPlan, VideoProbeResult,
    plan, run_batch,
};
pub use utils::{format_bytes, format_duration, parse_ffmpeg_time};
