//! Configuration structures and constants for the reframe-core library.
//!
//! Two values drive a run:
//!
//! - [`TransformRequest`]: the user-supplied trim window and target frame
//!   size, constant for the whole batch and validated before any file is
//!   touched.
//! - [`CoreConfig`]: where to read and write, which external binaries to run,
//!   and how to name the output files.

use crate::error::ConfigError;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::time::Duration;

// Default constants

/// Default number of seconds trimmed from the start of every video.
pub const DEFAULT_START_OFFSET_SECS: f64 = 0.0;

/// Default maximum length of every output, in seconds.
pub const DEFAULT_TARGET_DURATION_SECS: f64 = 20.0;

/// Default output frame width in pixels.
pub const DEFAULT_TARGET_WIDTH: u32 = 1200;

/// Default output frame height in pixels.
pub const DEFAULT_TARGET_HEIGHT: u32 = 1600;

/// Marker prepended to each input filename to form its output filename.
pub const DEFAULT_OUTPUT_PREFIX: &str = "processed_";

/// Video encoder passed to ffmpeg via `-c:v`.
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";

/// ffmpeg binary looked up on `PATH` when no explicit path is configured.
pub const DEFAULT_FFMPEG_BINARY: &str = "ffmpeg";

/// ffprobe binary looked up on `PATH` when no explicit path is configured.
pub const DEFAULT_FFPROBE_BINARY: &str = "ffprobe";

/// Container extensions (compared case-insensitively) treated as input videos.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv"];

/// Trim window and target frame size applied to every file in a batch.
///
/// Fields are private so that every instance has passed validation: the start
/// offset is finite and non-negative, the duration is finite and positive,
/// and both dimensions are positive.
///
/// # Examples
///
/// ```rust
/// use reframe_core::TransformRequest;
///
/// let request = TransformRequest::from_strs("2.5", "20", "1200", "1600").unwrap();
/// assert_eq!(request.target_width(), 1200);
///
/// assert!(TransformRequest::from_strs("-1", "20", "1200", "1600").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformRequest {
    start_offset_secs: f64,
    target_duration_secs: f64,
    target_width: u32,
    target_height: u32,
}

impl TransformRequest {
    /// Builds a request from typed values, validating each field.
    pub fn new(
        start_offset_secs: f64,
        target_duration_secs: f64,
        target_width: u32,
        target_height: u32,
    ) -> Result<Self, ConfigError> {
        let request = Self {
            start_offset_secs,
            target_duration_secs,
            target_width,
            target_height,
        };
        request.validate()?;
        Ok(request)
    }

    /// Builds a request from the raw text a form or command line supplies.
    ///
    /// Offsets and durations accept decimal seconds; dimensions must be whole
    /// pixel counts.
    pub fn from_strs(
        start_offset: &str,
        target_duration: &str,
        target_width: &str,
        target_height: &str,
    ) -> Result<Self, ConfigError> {
        let start_offset_secs = parse_seconds("start offset", start_offset)?;
        let target_duration_secs = parse_seconds("target duration", target_duration)?;
        let target_width = parse_pixels("target width", target_width)?;
        let target_height = parse_pixels("target height", target_height)?;
        Self::new(
            start_offset_secs,
            target_duration_secs,
            target_width,
            target_height,
        )
    }

    /// Checks every field independently.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.start_offset_secs.is_finite() || self.start_offset_secs < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "start offset",
                reason: format!(
                    "must be a non-negative number of seconds, got {}",
                    self.start_offset_secs
                ),
            });
        }

        if !self.target_duration_secs.is_finite() || self.target_duration_secs <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "target duration",
                reason: format!(
                    "must be a positive number of seconds, got {}",
                    self.target_duration_secs
                ),
            });
        }

        if self.target_width == 0 {
            return Err(ConfigError::OutOfRange {
                field: "target width",
                reason: "must be a positive number of pixels, got 0".to_string(),
            });
        }

        if self.target_height == 0 {
            return Err(ConfigError::OutOfRange {
                field: "target height",
                reason: "must be a positive number of pixels, got 0".to_string(),
            });
        }

        Ok(())
    }

    pub fn start_offset_secs(&self) -> f64 {
        self.start_offset_secs
    }

    pub fn target_duration_secs(&self) -> f64 {
        self.target_duration_secs
    }

    pub fn target_width(&self) -> u32 {
        self.target_width
    }

    pub fn target_height(&self) -> u32 {
        self.target_height
    }

    /// Target width divided by target height.
    pub fn target_aspect(&self) -> f64 {
        f64::from(self.target_width) / f64::from(self.target_height)
    }
}

impl Default for TransformRequest {
    fn default() -> Self {
        Self {
            start_offset_secs: DEFAULT_START_OFFSET_SECS,
            target_duration_secs: DEFAULT_TARGET_DURATION_SECS,
            target_width: DEFAULT_TARGET_WIDTH,
            target_height: DEFAULT_TARGET_HEIGHT,
        }
    }
}

fn parse_seconds(field: &'static str, raw: &str) -> Result<f64, ConfigError> {
    let trimmed = raw.trim();
    let value = trimmed.parse::<f64>().map_err(|_| ConfigError::NotANumber {
        field,
        value: trimmed.to_string(),
    })?;
    if !value.is_finite() {
        return Err(ConfigError::NotANumber {
            field,
            value: trimmed.to_string(),
        });
    }
    Ok(value)
}

fn parse_pixels(field: &'static str, raw: &str) -> Result<u32, ConfigError> {
    let trimmed = raw.trim();
    let value = trimmed.parse::<i64>().map_err(|_| ConfigError::NotANumber {
        field,
        value: trimmed.to_string(),
    })?;
    if value <= 0 {
        return Err(ConfigError::OutOfRange {
            field,
            reason: format!("must be a positive number of pixels, got {value}"),
        });
    }
    u32::try_from(value).map_err(|_| ConfigError::OutOfRange {
        field,
        reason: format!("{value} pixels is too large"),
    })
}

/// Run configuration: folders, external tools and output naming.
///
/// # Examples
///
/// ```rust
/// use reframe_core::CoreConfig;
/// use std::path::PathBuf;
///
/// let mut config = CoreConfig::new(PathBuf::from("/videos/in"), PathBuf::from("/videos/out"));
/// config.sort_files = true;
/// config.validate().unwrap();
///
/// assert_eq!(
///     config.output_path_for("clip.mp4"),
///     PathBuf::from("/videos/out/processed_clip.mp4")
/// );
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Folder scanned (non-recursively) for input videos
    pub input_dir: PathBuf,

    /// Folder receiving the processed videos, created when missing
    pub output_dir: PathBuf,

    /// ffmpeg binary used for encoding
    pub ffmpeg_path: PathBuf,

    /// ffprobe binary used for inspection
    pub ffprobe_path: PathBuf,

    /// Encoder passed to `-c:v`
    pub video_codec: String,

    /// Prefix prepended to each input filename
    pub output_prefix: String,

    /// Upper bound on each external tool invocation; `None` waits forever
    pub tool_timeout: Option<Duration>,

    /// Process files in lexical order instead of directory order
    pub sort_files: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            ffmpeg_path: PathBuf::from(DEFAULT_FFMPEG_BINARY),
            ffprobe_path: PathBuf::from(DEFAULT_FFPROBE_BINARY),
            video_codec: DEFAULT_VIDEO_CODEC.to_string(),
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            tool_timeout: None,
            sort_files: false,
        }
    }
}

impl CoreConfig {
    /// Creates config with required paths. Other fields use defaults.
    pub fn new(input_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            input_dir,
            output_dir,
            ..Default::default()
        }
    }

    /// Validates the codec, output prefix and timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.video_codec.trim().is_empty() {
            return Err(ConfigError::Invalid("video codec must not be empty".to_string()));
        }

        if self.output_prefix.is_empty() {
            return Err(ConfigError::Invalid(
                "output prefix must not be empty (outputs would overwrite their inputs' names)"
                    .to_string(),
            ));
        }

        if self.output_prefix.contains(['/', '\\']) {
            return Err(ConfigError::Invalid(format!(
                "output prefix '{}' must not contain path separators",
                self.output_prefix
            )));
        }

        if self.tool_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::Invalid(
                "tool timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Output path for an input filename: `<output_dir>/<prefix><filename>`.
    ///
    /// The filename is joined as an `OsStr`, so names that are not valid
    /// UTF-8 are kept byte for byte.
    pub fn output_path_for(&self, filename: impl AsRef<OsStr>) -> PathBuf {
        let mut name = OsString::from(&self.output_prefix);
        name.push(filename);
        self.output_dir.join(name)
    }
}
