// ============================================================================
// reframe-core/src/processing/batch.rs
// ============================================================================
//
// BATCH ORCHESTRATION: Probe -> Plan -> Transcode for every input file
//
// WORKFLOW:
// 1. Validate the run configuration and the transform request
// 2. Discover candidate files (fatal when there are none)
// 3. Check that ffprobe and ffmpeg can be started
// 4. Create the output folder
// 5. For each file, strictly one at a time:
//    a. Probe stream geometry, duration and rotation (failure: Skipped)
//    b. Plan trim window and filter chain (failure: Skipped)
//    c. Transcode and verify the output (failure: Failed)
//    d. Record the outcome and emit batch progress
// 6. Report the summary
//
// Per-file errors never leave this module. Only configuration problems that
// are detected before the first file is touched abort the run.

use crate::cancel::CancellationToken;
use crate::config::{CoreConfig, TransformRequest};
use crate::discovery::find_processable_files;
use crate::error::{ConfigError, CoreResult, ExecError, PlanError, ProbeError};
use crate::external::ffmpeg::{EncodeParams, run_transcode};
use crate::external::{FfmpegSpawner, FfprobeExecutor, FileMetadataProvider};
use crate::processing::plan::{TransformPlan, plan};
use crate::processing::video_properties::VideoProbeResult;
use crate::reporting::{BatchProgress, BatchStartInfo, FileContext, PlanSummary, Reporter};
use crate::utils::{file_name_lossy, format_bytes, format_duration};

use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

// ============================================================================
// PER-FILE STATE
// ============================================================================

/// Lifecycle of one file. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Pending,
    Probing,
    Planning,
    Transcoding,
    Succeeded,
    Skipped,
    Failed,
}

impl FileState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, FileState::Succeeded | FileState::Skipped | FileState::Failed)
    }

    /// Whether `next` is a legal successor of `self`.
    #[must_use]
    pub fn can_advance_to(self, next: FileState) -> bool {
        use FileState::*;
        matches!(
            (self, next),
            (Pending, Probing)
                | (Probing, Planning)
                | (Probing, Skipped)
                | (Planning, Transcoding)
                | (Planning, Skipped)
                | (Transcoding, Succeeded)
                | (Transcoding, Failed)
        )
    }
}

/// Final result for one file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Succeeded { output_path: PathBuf, output_size: u64 },
    /// Probe or plan failure
    Skipped { reason: String },
    /// Transcode failure
    Failed { reason: String },
}

impl FileOutcome {
    #[must_use]
    pub fn state(&self) -> FileState {
        match self {
            FileOutcome::Succeeded { .. } => FileState::Succeeded,
            FileOutcome::Skipped { .. } => FileState::Skipped,
            FileOutcome::Failed { .. } => FileState::Failed,
        }
    }
}

/// Outcome of one file, keyed by its input filename.
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    pub file_name: String,
    pub outcome: FileOutcome,
}

/// Tracks one file through its states, logging each transition.
struct FileTracker<'a> {
    file_name: &'a str,
    state: FileState,
}

impl<'a> FileTracker<'a> {
    fn new(file_name: &'a str) -> Self {
        Self {
            file_name,
            state: FileState::Pending,
        }
    }

    fn advance(&mut self, next: FileState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!("{}: {:?} -> {:?}", self.file_name, self.state, next);
        self.state = next;
    }

    fn finish(mut self, outcome: FileOutcome) -> FileOutcome {
        self.advance(outcome.state());
        outcome
    }
}

// ============================================================================
// RUN STATE AND SUMMARY
// ============================================================================

/// Process-scoped record of a run in progress.
#[derive(Debug)]
pub struct BatchRun {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub total_files: usize,
    pub completed_index: usize,
    reports: Vec<FileReport>,
}

impl BatchRun {
    pub fn new(input_dir: PathBuf, output_dir: PathBuf, total_files: usize) -> Self {
        Self {
            input_dir,
            output_dir,
            total_files,
            completed_index: 0,
            reports: Vec::with_capacity(total_files),
        }
    }

    /// Stores a finished file and returns the updated progress.
    pub fn record(&mut self, report: FileReport) -> BatchProgress {
        self.reports.push(report);
        self.completed_index += 1;
        BatchProgress {
            completed: self.completed_index,
            total: self.total_files,
        }
    }

    /// Outcomes so far, in processing order.
    pub fn reports(&self) -> &[FileReport] {
        &self.reports
    }

    fn into_summary(self, elapsed: Duration, cancelled: bool) -> BatchSummary {
        BatchSummary::from_reports(self.reports, self.total_files, elapsed, cancelled)
    }
}

/// Result of a completed (or cancelled) run.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    /// Per-file outcomes in processing order
    pub reports: Vec<FileReport>,
    pub total_files: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total_output_bytes: u64,
    pub elapsed: Duration,
    /// Whether files were left unprocessed because of cancellation
    pub cancelled: bool,
}

impl BatchSummary {
    pub fn from_reports(
        reports: Vec<FileReport>,
        total_files: usize,
        elapsed: Duration,
        cancelled: bool,
    ) -> Self {
        let mut summary = Self {
            reports: Vec::new(),
            total_files,
            succeeded: 0,
            skipped: 0,
            failed: 0,
            total_output_bytes: 0,
            elapsed,
            cancelled,
        };
        for report in &reports {
            match &report.outcome {
                FileOutcome::Succeeded { output_size, .. } => {
                    summary.succeeded += 1;
                    summary.total_output_bytes += output_size;
                }
                FileOutcome::Skipped { .. } => summary.skipped += 1,
                FileOutcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary.reports = reports;
        summary
    }

    /// True when every discovered file was transcoded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.cancelled && self.succeeded == self.total_files
    }

    /// Outcome recorded for an input filename.
    pub fn outcome_for(&self, file_name: &str) -> Option<&FileOutcome> {
        self.reports
            .iter()
            .find(|report| report.file_name == file_name)
            .map(|report| &report.outcome)
    }
}

// ============================================================================
// ORCHESTRATION
// ============================================================================

/// Runs the whole batch.
///
/// Returns `Err` only for configuration problems found before any file is
/// processed. Every per-file failure is captured in the summary instead.
///
/// # Examples
///
/// ```rust,no_run
/// use reframe_core::{CancellationToken, CoreConfig, TransformRequest, run_batch};
/// use reframe_core::external::{CommandFfprobeExecutor, SidecarSpawner, StdFsMetadataProvider};
/// use reframe_core::reporting::TerminalReporter;
/// use std::path::PathBuf;
///
/// let config = CoreConfig::new(PathBuf::from("/videos/in"), PathBuf::from("/videos/out"));
/// let request = TransformRequest::default();
/// let ffprobe = CommandFfprobeExecutor::new(&config.ffprobe_path, None);
///
/// let summary = run_batch(
///     &ffprobe,
///     &SidecarSpawner,
///     &StdFsMetadataProvider,
///     &TerminalReporter::new(),
///     &config,
///     &request,
///     &CancellationToken::new(),
/// )?;
/// println!("{} of {} succeeded", summary.succeeded, summary.total_files);
/// # Ok::<(), reframe_core::CoreError>(())
/// ```
pub fn run_batch<P, S, M>(
    ffprobe: &P,
    spawner: &S,
    metadata: &M,
    reporter: &dyn Reporter,
    config: &CoreConfig,
    request: &TransformRequest,
    cancel: &CancellationToken,
) -> CoreResult<BatchSummary>
where
    P: FfprobeExecutor + ?Sized,
    S: FfmpegSpawner,
    M: FileMetadataProvider + ?Sized,
{
    config.validate()?;
    request.validate()?;

    let files = find_processable_files(&config.input_dir, config.sort_files)?;

    ffprobe.ensure_available()?;
    spawner.ensure_available(&config.ffmpeg_path)?;

    std::fs::create_dir_all(&config.output_dir).map_err(|source| ConfigError::OutputFolder {
        path: config.output_dir.clone(),
        source,
    })?;

    let total_files = files.len();
    let file_names: Vec<String> = files.iter().map(|path| file_name_lossy(path)).collect::<Vec<_>>();

    info!(
        "Starting batch: {} file(s) from {} -> {}",
        total_files,
        config.input_dir.display(),
        config.output_dir.display()
    );
    info!(
        "Request: start {:.3}s, duration {:.3}s, target {}x{}",
        request.start_offset_secs(),
        request.target_duration_secs(),
        request.target_width(),
        request.target_height()
    );

    reporter.batch_started(&BatchStartInfo {
        total_files,
        file_list: file_names.clone(),
        input_dir: config.input_dir.display().to_string(),
        output_dir: config.output_dir.display().to_string(),
    });

    let batch_start = Instant::now();
    let mut run = BatchRun::new(config.input_dir.clone(), config.output_dir.clone(), total_files);
    let mut cancelled = false;

    for (index, (input_path, file_name)) in files.iter().zip(file_names).enumerate() {
        if cancel.is_cancelled() {
            warn!(
                "Cancellation requested; {} file(s) left unprocessed",
                total_files - index
            );
            reporter.warning(&format!(
                "Cancelled: {} file(s) left unprocessed",
                total_files - index
            ));
            cancelled = true;
            break;
        }

        info!("----------------------------------------");
        info!("File {}/{}: {}", index + 1, total_files, file_name);

        let context = FileContext {
            index: index + 1,
            total_files,
            file_name: file_name.clone(),
        };
        reporter.file_started(&context);

        let outcome = process_file(
            ffprobe, spawner, metadata, reporter, config, request, input_path, &context,
        );

        let report = FileReport {
            file_name,
            outcome,
        };
        reporter.file_finished(&report);

        let progress = run.record(report);
        info!(
            "Batch progress: {}/{} ({:.0}%)",
            progress.completed,
            progress.total,
            progress.fraction() * 100.0
        );
        reporter.batch_progress(&progress);
    }

    let summary = run.into_summary(batch_start.elapsed(), cancelled);

    info!("========================================");
    info!(
        "Batch finished in {}: {} succeeded, {} skipped, {} failed of {} ({} written)",
        format_duration(summary.elapsed.as_secs_f64()),
        summary.succeeded,
        summary.skipped,
        summary.failed,
        summary.total_files,
        format_bytes(summary.total_output_bytes)
    );

    reporter.batch_complete(&summary);
    Ok(summary)
}

/// Probe, plan and transcode one file. Never fails; errors become outcomes.
#[allow(clippy::too_many_arguments)]
fn process_file<P, S, M>(
    ffprobe: &P,
    spawner: &S,
    metadata: &M,
    reporter: &dyn Reporter,
    config: &CoreConfig,
    request: &TransformRequest,
    input_path: &Path,
    context: &FileContext,
) -> FileOutcome
where
    P: FfprobeExecutor + ?Sized,
    S: FfmpegSpawner,
    M: FileMetadataProvider + ?Sized,
{
    let file_name = context.file_name.as_str();
    let mut tracker = FileTracker::new(file_name);

    tracker.advance(FileState::Probing);
    let probe = match ffprobe.probe_video(input_path) {
        Ok(probe) => probe,
        Err(e) => return tracker.finish(skip_for_probe(file_name, &e)),
    };
    info!(
        "Probed {}: {}x{}, {:.3}s, rotation {}",
        file_name, probe.width, probe.height, probe.duration_secs, probe.rotation_degrees
    );

    tracker.advance(FileState::Planning);
    let plan = match plan(&probe, request) {
        Ok(plan) => plan,
        Err(e) => return tracker.finish(skip_for_plan(file_name, &e)),
    };
    report_plan(reporter, file_name, &probe, &plan);

    tracker.advance(FileState::Transcoding);
    let params = EncodeParams {
        ffmpeg_path: config.ffmpeg_path.clone(),
        input_path: input_path.to_path_buf(),
        output_path: config.output_path_for(input_path.file_name().unwrap_or(input_path.as_os_str())),
        video_codec: config.video_codec.clone(),
        timeout: config.tool_timeout,
    };

    reporter.encoding_started(context);
    let result = run_transcode(spawner, metadata, &params, &plan, |progress| {
        reporter.encoding_progress(&progress);
    });

    let outcome = match result {
        Ok(result) => {
            info!(
                "Succeeded: {} -> {} ({})",
                file_name,
                result.output_path.display(),
                format_bytes(result.output_size)
            );
            FileOutcome::Succeeded {
                output_path: result.output_path,
                output_size: result.output_size,
            }
        }
        Err(e) => fail_for_exec(file_name, &e),
    };
    tracker.finish(outcome)
}

fn report_plan(
    reporter: &dyn Reporter,
    file_name: &str,
    probe: &VideoProbeResult,
    plan: &TransformPlan,
) {
    let filter_expression = plan.filter_expression();
    info!(
        "Plan for {}: trim {:.3}s + {:.3}s, filters {}",
        file_name, plan.trim_start, plan.trim_duration, filter_expression
    );
    match plan.rotation_step() {
        Some(step) => debug!(
            "{file_name}: correcting {} degree rotation with {step}",
            probe.rotation_degrees
        ),
        None => debug!(
            "{file_name}: no transpose needed (rotation {})",
            probe.rotation_degrees
        ),
    }

    if plan.crop_exceeds_scaled_frame() {
        let message = format!(
            "{file_name}: crop box exceeds the scaled frame (about {}x{}); ffmpeg may reject it",
            plan.scaled_width, plan.scaled_height
        );
        warn!("{message}");
        reporter.warning(&message);
    }

    reporter.file_planned(&PlanSummary {
        file_name: file_name.to_string(),
        source_resolution: format!("{}x{}", probe.width, probe.height),
        rotation_degrees: probe.rotation_degrees,
        trim_start: plan.trim_start,
        trim_duration: plan.trim_duration,
        filter_expression,
    });
}

fn skip_for_probe(file_name: &str, err: &ProbeError) -> FileOutcome {
    error!("Skipping {file_name}: probe failed: {err}");
    FileOutcome::Skipped {
        reason: format!("probe failed: {err}"),
    }
}

fn skip_for_plan(file_name: &str, err: &PlanError) -> FileOutcome {
    warn!("Skipping {file_name}: {err}");
    FileOutcome::Skipped {
        reason: err.to_string(),
    }
}

fn fail_for_exec(file_name: &str, err: &ExecError) -> FileOutcome {
    error!("Failed {file_name}: {err}");
    FileOutcome::Failed {
        reason: err.to_string(),
    }
}
