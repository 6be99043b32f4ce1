//! FFprobe integration for reading stream geometry, duration and rotation.
//!
//! The JSON report is deserialized into a strict schema: width, height and a
//! duration are required, and anything missing or malformed is a
//! [`ProbeError`] rather than a silent default.

use crate::error::{ConfigError, ProbeError};
use crate::external::check_dependency;
use crate::processing::video_properties::{SUPPORTED_ROTATIONS, VideoProbeResult};
use crate::util::command::{CommandError, run_command_with_timeout};

use log::{debug, error};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// Side-data entry type carrying the display rotation matrix.
const DISPLAY_MATRIX: &str = "Display Matrix";

/// Display-matrix rotation values are scaled by this factor.
const DISPLAY_MATRIX_SCALE: f64 = 1000.0;

/// Reads the properties the planner needs from a video file.
pub trait FfprobeExecutor {
    /// Probes the first video stream of `input_path`.
    fn probe_video(&self, input_path: &Path) -> Result<VideoProbeResult, ProbeError>;

    /// Verifies the inspection tool can be started. Mocks keep the default.
    fn ensure_available(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// [`FfprobeExecutor`] that runs an ffprobe binary.
#[derive(Debug, Clone)]
pub struct CommandFfprobeExecutor {
    binary: PathBuf,
    timeout: Option<Duration>,
}

impl CommandFfprobeExecutor {
    pub fn new(binary: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    fn tool_name(&self) -> String {
        self.binary.display().to_string()
    }

    fn build_command(&self, input_path: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,duration:stream_tags=rotate:stream_side_data:format=duration",
            "-of",
            "json",
        ])
        .arg(input_path);
        cmd
    }
}

impl FfprobeExecutor for CommandFfprobeExecutor {
    fn probe_video(&self, input_path: &Path) -> Result<VideoProbeResult, ProbeError> {
        debug!("Running ffprobe for video properties on: {}", input_path.display());

        let mut cmd = self.build_command(input_path);
        let output = run_command_with_timeout(&mut cmd, self.timeout).map_err(|e| match e {
            CommandError::Spawn(source) | CommandError::Wait(source) => ProbeError::Spawn {
                tool: self.tool_name(),
                source,
            },
            CommandError::TimedOut(timeout) => ProbeError::TimedOut {
                tool: self.tool_name(),
                timeout,
            },
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(
                "ffprobe failed for {}: {} {}",
                input_path.display(),
                output.status,
                stderr
            );
            return Err(ProbeError::ToolFailed {
                tool: self.tool_name(),
                status: output.status,
                stderr,
            });
        }

        let result = parse_probe_output(&output.stdout)?;
        debug!(
            "Probed {}: {}x{}, {:.3}s, rotation {}",
            input_path.display(),
            result.width,
            result.height,
            result.duration_secs,
            result.rotation_degrees
        );
        Ok(result)
    }

    fn ensure_available(&self) -> Result<(), ConfigError> {
        check_dependency(&self.binary)
    }
}

// ============================================================================
// PROBE OUTPUT SCHEMA
// ============================================================================

#[derive(Debug, Deserialize)]
struct ProbeReport {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    #[serde(default)]
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<i64>,
    height: Option<i64>,
    duration: Option<String>,
    #[serde(default)]
    tags: Option<ProbeTags>,
    #[serde(default)]
    side_data_list: Vec<ProbeSideData>,
}

#[derive(Debug, Deserialize)]
struct ProbeTags {
    rotate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeSideData {
    side_data_type: Option<String>,
    rotation: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Parses the JSON report produced by [`CommandFfprobeExecutor`].
///
/// Stream duration falls back to the container duration when the stream
/// does not carry one.
///
/// # Examples
///
/// ```rust
/// use reframe_core::external::parse_probe_output;
///
/// let json = br#"{"streams":[{"width":1080,"height":1920,"duration":"12.5",
///     "tags":{"rotate":"90"}}]}"#;
/// let probe = parse_probe_output(json).unwrap();
/// assert_eq!((probe.width, probe.height), (1080, 1920));
/// assert_eq!(probe.rotation_degrees, 90);
/// ```
pub fn parse_probe_output(stdout: &[u8]) -> Result<VideoProbeResult, ProbeError> {
    let report: ProbeReport = serde_json::from_slice(stdout)?;
    let stream = report.streams.first().ok_or(ProbeError::NoVideoStream)?;

    let width = positive_dimension("width", stream.width)?;
    let height = positive_dimension("height", stream.height)?;

    let duration_secs = match parse_duration(stream.duration.as_deref())? {
        Some(duration) => duration,
        None => report
            .format
            .as_ref()
            .map(|format| parse_duration(format.duration.as_deref()))
            .transpose()?
            .flatten()
            .ok_or(ProbeError::MissingField("duration"))?,
    };

    let rotation_degrees = resolve_rotation(stream)?;

    Ok(VideoProbeResult {
        width,
        height,
        duration_secs,
        rotation_degrees,
    })
}

fn positive_dimension(field: &'static str, value: Option<i64>) -> Result<u32, ProbeError> {
    let value = value.ok_or(ProbeError::MissingField(field))?;
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| ProbeError::InvalidField {
            field,
            value: value.to_string(),
        })
}

/// `None` for an absent or "N/A" duration.
fn parse_duration(raw: Option<&str>) -> Result<Option<f64>, ProbeError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty() && *s != "N/A") else {
        return Ok(None);
    };
    match raw.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => Ok(Some(secs)),
        _ => Err(ProbeError::InvalidField {
            field: "duration",
            value: raw.to_string(),
        }),
    }
}

/// Rotate tag first, then the first display-matrix side data, else 0.
fn resolve_rotation(stream: &ProbeStream) -> Result<i32, ProbeError> {
    let raw = if let Some(tag) = stream.tags.as_ref().and_then(|t| t.rotate.as_deref()) {
        tag.trim()
            .parse::<i64>()
            .map_err(|_| ProbeError::InvalidField {
                field: "rotate tag",
                value: tag.to_string(),
            })?
    } else if let Some(entry) = stream
        .side_data_list
        .iter()
        .find(|entry| entry.side_data_type.as_deref() == Some(DISPLAY_MATRIX))
    {
        let rotation = entry
            .rotation
            .ok_or(ProbeError::MissingField("display matrix rotation"))?;
        (rotation / DISPLAY_MATRIX_SCALE).trunc() as i64
    } else {
        0
    };

    i32::try_from(raw)
        .ok()
        .filter(|degrees| SUPPORTED_ROTATIONS.contains(degrees))
        .ok_or(ProbeError::UnsupportedRotation(raw))
}
