//! Probe result for a single input video.
//!
//! Produced once per file by an [`FfprobeExecutor`](crate::external::FfprobeExecutor)
//! and consumed by the planner.

/// Rotations a probe result may carry, in degrees.
pub const SUPPORTED_ROTATIONS: [i32; 6] = [0, 90, 180, 270, -90, -270];

/// Stream geometry, length and recorded rotation of a video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoProbeResult {
    /// Stored frame width in pixels
    pub width: u32,

    /// Stored frame height in pixels
    pub height: u32,

    /// Duration of the video in seconds
    pub duration_secs: f64,

    /// Display rotation recorded in the container, one of [`SUPPORTED_ROTATIONS`]
    pub rotation_degrees: i32,
}

impl VideoProbeResult {
    /// Whether the stored frame is sideways relative to display orientation.
    #[must_use]
    pub fn is_quarter_turn(&self) -> bool {
        matches!(self.rotation_degrees.abs(), 90 | 270)
    }
}
