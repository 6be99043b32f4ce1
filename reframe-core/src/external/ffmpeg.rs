//! FFmpeg command building and execution for the trim/reframe transcode.
//!
//! A transcode succeeds only when ffmpeg exits zero AND the output file
//! exists afterwards. The two failure modes are reported as distinct
//! [`ExecError`] variants.

use crate::error::ExecError;
use crate::external::FileMetadataProvider;
use crate::external::ffmpeg_builder::FfmpegCommandBuilder;
use crate::external::ffmpeg_executor::{FfmpegProcess, FfmpegSpawner};
use crate::processing::plan::TransformPlan;
use crate::reporting::EncodeProgress;
use crate::utils::parse_ffmpeg_time;

use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, FfmpegProgress, LogLevel as FfmpegLogLevel};
use log::{debug, error, info, warn};

use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Number of ffmpeg error lines kept for the failure message.
const ERROR_TAIL_LINES: usize = 10;

/// Minimum percent change between two forwarded progress updates.
const PROGRESS_STEP_PERCENT: f32 = 1.0;

/// Parameters required for running one transcode.
#[derive(Debug, Clone)]
pub struct EncodeParams {
    pub ffmpeg_path: PathBuf,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub video_codec: String,
    /// Upper bound on the whole transcode
    pub timeout: Option<Duration>,
}

/// Outcome of a successful transcode.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeResult {
    pub output_path: PathBuf,
    pub output_size: u64,
    pub elapsed: Duration,
}

/// Builds the ffmpeg command for one planned transcode.
///
/// Argument order: input, seek, duration, drop audio, filter chain, codec,
/// overwrite, output. Seeking after `-i` keeps the trim frame-accurate.
pub fn build_transcode_command(params: &EncodeParams, plan: &TransformPlan) -> FfmpegCommand {
    let mut cmd = FfmpegCommandBuilder::new(&params.ffmpeg_path).build();

    cmd.arg("-i").arg(&params.input_path);
    cmd.args(["-ss", &format_seconds(plan.trim_start)]);
    cmd.args(["-t", &format_seconds(plan.trim_duration)]);
    cmd.arg("-an");
    cmd.args(["-vf", &plan.filter_expression()]);
    cmd.args(["-c:v", &params.video_codec]);
    cmd.overwrite();
    cmd.arg(&params.output_path);

    cmd
}

fn format_seconds(secs: f64) -> String {
    format!("{secs:.3}")
}

/// Runs one transcode and verifies its output.
///
/// `on_progress` receives throttled progress updates, measured against the
/// plan's trim duration.
///
/// # Errors
///
/// * [`ExecError::Spawn`] if ffmpeg cannot be started
/// * [`ExecError::TimedOut`] if `params.timeout` passes (ffmpeg is killed)
/// * [`ExecError::ToolFailed`] on a non-zero exit, with ffmpeg's last error lines
/// * [`ExecError::OutputMissing`] on a zero exit without an output file
pub fn run_transcode<S, M, F>(
    spawner: &S,
    metadata: &M,
    params: &EncodeParams,
    plan: &TransformPlan,
    mut on_progress: F,
) -> Result<TranscodeResult, ExecError>
where
    S: FfmpegSpawner,
    M: FileMetadataProvider + ?Sized,
    F: FnMut(EncodeProgress),
{
    info!(
        "Starting transcode: {} -> {}",
        params.input_path.display(),
        params.output_path.display()
    );

    let mut cmd = build_transcode_command(params, plan);
    log_transcode_command(&mut cmd);

    let start_time = Instant::now();
    let mut process = spawner.spawn(cmd)?;
    let mut handler = TranscodeProgressHandler::new(plan.trim_duration);

    let events_result = process.handle_events(params.timeout, |event| {
        handler.handle_event(event, &mut on_progress);
        Ok(())
    });

    if let Err(e) = events_result {
        error!("Transcode of {} aborted: {e}", params.input_path.display());
        if let Err(kill_err) = process.kill() {
            warn!("Could not stop ffmpeg cleanly: {kill_err}");
        }
        return Err(e);
    }

    let status = process.wait()?;
    let elapsed = start_time.elapsed();

    if !status.success() {
        let stderr = handler.error_tail();
        error!(
            "ffmpeg exited with {status} for {}: {stderr}",
            params.input_path.display()
        );
        return Err(ExecError::ToolFailed { status, stderr });
    }

    if !metadata.exists(&params.output_path) {
        error!(
            "ffmpeg exited successfully but {} does not exist",
            params.output_path.display()
        );
        return Err(ExecError::OutputMissing(params.output_path.clone()));
    }

    let output_size = metadata
        .get_size(&params.output_path)
        .map_err(|source| ExecError::Metadata {
            path: params.output_path.clone(),
            source,
        })?;

    info!(
        "Transcode finished in {:.1}s: {} ({} bytes)",
        elapsed.as_secs_f64(),
        params.output_path.display(),
        output_size
    );

    Ok(TranscodeResult {
        output_path: params.output_path.clone(),
        output_size,
        elapsed,
    })
}

fn log_transcode_command(cmd: &mut FfmpegCommand) {
    let inner = cmd.as_inner();
    let args: Vec<String> = inner
        .get_args()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    debug!(
        "FFmpeg command: {} {}",
        inner.get_program().to_string_lossy(),
        args.join(" ")
    );
}

/// Turns ffmpeg events into progress updates and an error transcript.
struct TranscodeProgressHandler {
    total_secs: f64,
    last_percent: Option<f32>,
    error_lines: VecDeque<String>,
}

impl TranscodeProgressHandler {
    fn new(total_secs: f64) -> Self {
        Self {
            total_secs,
            last_percent: None,
            error_lines: VecDeque::with_capacity(ERROR_TAIL_LINES),
        }
    }

    fn handle_event<F: FnMut(EncodeProgress)>(&mut self, event: FfmpegEvent, on_progress: &mut F) {
        match event {
            FfmpegEvent::Progress(progress) => self.handle_progress(&progress, on_progress),
            FfmpegEvent::Log(level, message) => self.handle_log(level, message),
            FfmpegEvent::Error(message) => {
                debug!(target: "ffmpeg_log", "{message}");
                self.push_error(message);
            }
            _ => {}
        }
    }

    fn handle_progress<F: FnMut(EncodeProgress)>(&mut self, progress: &FfmpegProgress, on_progress: &mut F) {
        let current_secs = parse_ffmpeg_time(&progress.time).unwrap_or(0.0);
        let percent = if self.total_secs > 0.0 {
            ((current_secs / self.total_secs) * 100.0).clamp(0.0, 100.0) as f32
        } else {
            0.0
        };

        let due = match self.last_percent {
            None => true,
            Some(last) => percent >= last + PROGRESS_STEP_PERCENT || (percent >= 100.0 && last < 100.0),
        };
        if !due {
            return;
        }

        self.last_percent = Some(percent);
        on_progress(EncodeProgress {
            percent,
            current_secs,
            total_secs: self.total_secs,
            speed: progress.speed,
        });
    }

    fn handle_log(&mut self, level: FfmpegLogLevel, message: String) {
        match level {
            FfmpegLogLevel::Error | FfmpegLogLevel::Fatal => {
                debug!(target: "ffmpeg_log", "{message}");
                self.push_error(message);
            }
            FfmpegLogLevel::Warning => debug!(target: "ffmpeg_log", "warning: {message}"),
            _ => {}
        }
    }

    fn push_error(&mut self, line: String) {
        if self.error_lines.len() == ERROR_TAIL_LINES {
            self.error_lines.pop_front();
        }
        self.error_lines.push_back(line);
    }

    fn error_tail(&self) -> String {
        if self.error_lines.is_empty() {
            "no error output".to_string()
        } else {
            self.error_lines
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}
