// ============================================================================
// reframe-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with ffprobe, ffmpeg and the File System
//
// Every call out of the process goes through a trait defined here or in a
// submodule so that the batch orchestrator can be driven by mocks in tests.
//
// KEY COMPONENTS:
// - FfprobeExecutor / CommandFfprobeExecutor: media inspection
// - FfmpegSpawner / SidecarSpawner: transcode process control
// - VideoFilterChain: `-vf` expression assembly
// - FileMetadataProvider: output existence and size checks
// - check_dependency: up-front availability check for a binary

use crate::error::ConfigError;

use log::{debug, error, warn};
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Transcode command construction and execution
pub mod ffmpeg;

/// `-vf` filter chain assembly
pub mod ffmpeg_builder;

/// Traits and implementations for spawning and driving ffmpeg
pub mod ffmpeg_executor;

/// Traits and implementations for running ffprobe
pub mod ffprobe_executor;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ffmpeg::{EncodeParams, TranscodeResult, build_transcode_command, run_transcode};
pub use ffmpeg_builder::VideoFilterChain;
pub use ffmpeg_executor::{FfmpegProcess, FfmpegSpawner, SidecarProcess, SidecarSpawner};
pub use ffprobe_executor::{CommandFfprobeExecutor, FfprobeExecutor, parse_probe_output};

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks that `binary` can be started.
///
/// Runs `<binary> -version` with output discarded. Only a failure to start
/// counts; the exit status is ignored since some builds return non-zero for
/// `-version`.
pub fn check_dependency(binary: &Path) -> Result<(), ConfigError> {
    let tool = binary.display().to_string();

    let result = Command::new(binary)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            debug!("Found dependency: {tool}");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("Dependency '{tool}' not found.");
            Err(ConfigError::DependencyNotFound(tool))
        }
        Err(e) => {
            error!("Failed to start dependency check command '{tool}': {e}");
            Err(ConfigError::DependencyCheck { tool, source: e })
        }
    }
}

// ============================================================================
// FILE METADATA ACCESS
// ============================================================================

/// Abstraction over the file system checks made after a transcode.
///
/// # Examples
///
/// ```rust
/// use reframe_core::external::FileMetadataProvider;
/// use std::io;
/// use std::path::Path;
///
/// struct FixedSize;
///
/// impl FileMetadataProvider for FixedSize {
///     fn get_size(&self, _path: &Path) -> io::Result<u64> {
///         Ok(1_000_000)
///     }
///
///     fn exists(&self, _path: &Path) -> bool {
///         true
///     }
/// }
///
/// assert_eq!(FixedSize.get_size(Path::new("/fake")).unwrap(), 1_000_000);
/// ```
pub trait FileMetadataProvider {
    /// Size of the file at `path` in bytes.
    fn get_size(&self, path: &Path) -> io::Result<u64>;

    /// Whether a regular file exists at `path`.
    fn exists(&self, path: &Path) -> bool;
}

/// [`FileMetadataProvider`] backed by `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct StdFsMetadataProvider;

impl FileMetadataProvider for StdFsMetadataProvider {
    fn get_size(&self, path: &Path) -> io::Result<u64> {
        Ok(std::fs::metadata(path)?.len())
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}
