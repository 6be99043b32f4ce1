//! Per-file planning and batch orchestration.
//!
//! - [`video_properties`]: what a probe tells us about a file
//! - [`plan`]: pure trim/rotate/scale/crop planning
//! - [`batch`]: the sequential Probe -> Plan -> Transcode loop

pub mod batch;
pub mod plan;
pub mod video_properties;

pub use batch::{BatchRun, BatchSummary, FileOutcome, FileReport, FileState, run_batch};
pub use plan::{FilterOp, TransformPlan, plan};
pub use video_properties::VideoProbeResult;
