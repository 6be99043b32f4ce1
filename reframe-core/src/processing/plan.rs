//! Per-file transform planning.
//!
//! [`plan`] turns a probe result and the batch's [`TransformRequest`] into a
//! trim window and an ordered filter chain. It is a pure function: the same
//! inputs always give the same plan.
//!
//! The chain is always:
//!
//! 1. an optional transpose undoing a quarter-turn rotation,
//! 2. exactly one scale that fits the constraining dimension,
//! 3. exactly one centered crop that removes the excess of the other one.
//!
//! Crop offsets are expressed against `in_w`/`in_h`, so they are evaluated by
//! ffmpeg on the post-scale frame. No letterboxing is ever added.

use crate::config::TransformRequest;
use crate::error::PlanError;
use crate::external::ffmpeg_builder::VideoFilterChain;
use crate::processing::video_properties::VideoProbeResult;

use std::fmt;

/// One geometric step of the filter chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Rotate 90° clockwise (`transpose=1`)
    TransposeClockwise,
    /// Rotate 90° counter-clockwise (`transpose=2`)
    TransposeCounterClockwise,
    /// Scale to this width, height proportional
    ScaleToWidth(u32),
    /// Scale to this height, width proportional
    ScaleToHeight(u32),
    /// Crop to `width`x`height` at x = 0, centered vertically
    CropCenterVertical { width: u32, height: u32 },
    /// Crop to `width`x`height` at y = 0, centered horizontally
    CropCenterHorizontal { width: u32, height: u32 },
}

impl FilterOp {
    #[must_use]
    pub fn is_rotation(&self) -> bool {
        matches!(
            self,
            FilterOp::TransposeClockwise | FilterOp::TransposeCounterClockwise
        )
    }

    #[must_use]
    pub fn is_scale(&self) -> bool {
        matches!(self, FilterOp::ScaleToWidth(_) | FilterOp::ScaleToHeight(_))
    }

    #[must_use]
    pub fn is_crop(&self) -> bool {
        matches!(
            self,
            FilterOp::CropCenterVertical { .. } | FilterOp::CropCenterHorizontal { .. }
        )
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            FilterOp::TransposeClockwise => write!(f, "transpose=1"),
            FilterOp::TransposeCounterClockwise => write!(f, "transpose=2"),
            FilterOp::ScaleToWidth(width) => write!(f, "scale={width}:-1"),
            FilterOp::ScaleToHeight(height) => write!(f, "scale=-1:{height}"),
            FilterOp::CropCenterVertical { width, height } => {
                write!(f, "crop={width}:{height}:0:((in_h-{height})/2)")
            }
            FilterOp::CropCenterHorizontal { width, height } => {
                write!(f, "crop={width}:{height}:((in_w-{width})/2):0")
            }
        }
    }
}

/// Trim window and filter chain for one file.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformPlan {
    /// Seek position in seconds
    pub trim_start: f64,

    /// Length of the output in seconds, always > 0
    pub trim_duration: f64,

    /// Rotation step (optional), then scale, then crop
    pub filter_chain: Vec<FilterOp>,

    /// Source width in display orientation
    pub effective_width: u32,

    /// Source height in display orientation
    pub effective_height: u32,

    /// Approximate frame width after the scale step
    pub scaled_width: u32,

    /// Approximate frame height after the scale step
    pub scaled_height: u32,
}

impl TransformPlan {
    /// The chain as an ffmpeg `-vf` expression, steps joined with `,`.
    #[must_use]
    pub fn filter_expression(&self) -> String {
        self.filter_chain
            .iter()
            .fold(VideoFilterChain::new(), |chain, op| chain.add_filter(*op))
            .build()
            .unwrap_or_default()
    }

    /// The rotation-correction step, if any.
    #[must_use]
    pub fn rotation_step(&self) -> Option<FilterOp> {
        self.filter_chain.first().copied().filter(FilterOp::is_rotation)
    }

    /// Whether the crop box is larger than the scaled frame in either
    /// dimension. ffmpeg rejects such a crop at encode time.
    #[must_use]
    pub fn crop_exceeds_scaled_frame(&self) -> bool {
        self.filter_chain.iter().any(|op| match *op {
            FilterOp::CropCenterVertical { width, height }
            | FilterOp::CropCenterHorizontal { width, height } => {
                width > self.scaled_width || height > self.scaled_height
            }
            _ => false,
        })
    }
}

/// Display-oriented dimensions: swapped for quarter-turn rotations.
#[must_use]
pub fn effective_dimensions(probe: &VideoProbeResult) -> (u32, u32) {
    if probe.is_quarter_turn() {
        (probe.height, probe.width)
    } else {
        (probe.width, probe.height)
    }
}

/// Transpose that undoes the recorded rotation. 0° and 180° get none.
#[must_use]
pub fn rotation_correction(rotation_degrees: i32) -> Option<FilterOp> {
    match rotation_degrees.abs() {
        90 => Some(FilterOp::TransposeClockwise),
        270 => Some(FilterOp::TransposeCounterClockwise),
        _ => None,
    }
}

/// Plans the transform of one file.
///
/// # Errors
///
/// * [`PlanError::TooShort`] if the video ends before the start offset
/// * [`PlanError::EmptyWindow`] if it ends exactly at the start offset
///
/// # Examples
///
/// ```rust
/// use reframe_core::processing::plan::plan;
/// use reframe_core::{TransformRequest, VideoProbeResult};
///
/// let probe = VideoProbeResult {
///     width: 1920,
///     height: 1080,
///     duration_secs: 60.0,
///     rotation_degrees: 0,
/// };
/// let request = TransformRequest::new(5.0, 20.0, 1200, 1600).unwrap();
///
/// let plan = plan(&probe, &request).unwrap();
/// assert_eq!(plan.trim_duration, 20.0);
/// assert_eq!(
///     plan.filter_expression(),
///     "scale=1200:-1,crop=1200:1600:0:((in_h-1600)/2)"
/// );
/// ```
pub fn plan(probe: &VideoProbeResult, request: &TransformRequest) -> Result<TransformPlan, PlanError> {
    let trim_start = request.start_offset_secs();
    if probe.duration_secs < trim_start {
        return Err(PlanError::TooShort {
            duration: probe.duration_secs,
            start_offset: trim_start,
        });
    }

    let trim_duration = (probe.duration_secs - trim_start).min(request.target_duration_secs());
    if trim_duration <= 0.0 {
        return Err(PlanError::EmptyWindow {
            start_offset: trim_start,
        });
    }

    let (effective_width, effective_height) = effective_dimensions(probe);
    let (target_width, target_height) = (request.target_width(), request.target_height());

    let effective_aspect = f64::from(effective_width) / f64::from(effective_height);
    let target_aspect = request.target_aspect();

    let mut filter_chain = Vec::with_capacity(3);
    filter_chain.extend(rotation_correction(probe.rotation_degrees));

    let (scaled_width, scaled_height) = if effective_aspect > target_aspect {
        filter_chain.push(FilterOp::ScaleToWidth(target_width));
        filter_chain.push(FilterOp::CropCenterVertical {
            width: target_width,
            height: target_height,
        });
        (
            target_width,
            proportional(effective_height, target_width, effective_width),
        )
    } else {
        filter_chain.push(FilterOp::ScaleToHeight(target_height));
        filter_chain.push(FilterOp::CropCenterHorizontal {
            width: target_width,
            height: target_height,
        });
        (
            proportional(effective_width, target_height, effective_height),
            target_height,
        )
    };

    Ok(TransformPlan {
        trim_start,
        trim_duration,
        filter_chain,
        effective_width,
        effective_height,
        scaled_width,
        scaled_height,
    })
}

/// `value * numerator / denominator`, rounded.
fn proportional(value: u32, numerator: u32, denominator: u32) -> u32 {
    let scaled = (u64::from(value) * u64::from(numerator) + u64::from(denominator) / 2)
        / u64::from(denominator);
    u32::try_from(scaled).unwrap_or(u32::MAX)
}
