// reframe-core/tests/common/mod.rs
//
// Hand-written mocks for driving run_batch without real ffmpeg/ffprobe.

#![allow(dead_code)]

use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, FfmpegProgress};
use reframe_core::CancellationToken;
use reframe_core::error::{ExecError, ProbeError};
use reframe_core::external::{FfmpegProcess, FfmpegSpawner, FfprobeExecutor};
use reframe_core::processing::batch::{BatchSummary, FileOutcome, FileReport};
use reframe_core::processing::video_properties::VideoProbeResult;
use reframe_core::reporting::{
    BatchProgress, BatchStartInfo, EncodeProgress, FileContext, PlanSummary, Reporter,
    ReporterError,
};

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::rc::Rc;
use std::sync::Mutex;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Creates a small placeholder file and returns its path.
pub fn create_dummy_file(dir: &Path, filename: &str) -> PathBuf {
    let file_path = dir.join(filename);
    let mut file = File::create(&file_path).expect("Failed to create dummy file");
    file.write_all(b"dummy content")
        .expect("Failed to write dummy content");
    file_path
}

pub fn probe(width: u32, height: u32, duration_secs: f64, rotation_degrees: i32) -> VideoProbeResult {
    VideoProbeResult {
        width,
        height,
        duration_secs,
        rotation_degrees,
    }
}

pub fn progress_event(time: &str) -> FfmpegEvent {
    FfmpegEvent::Progress(FfmpegProgress {
        frame: 0,
        fps: 30.0,
        q: 0.0,
        size_kb: 0,
        time: time.to_string(),
        bitrate_kbps: 0.0,
        speed: 2.0,
        raw_log_message: String::new(),
    })
}

// ---------------------------------------------------------------------------
// ffprobe
// ---------------------------------------------------------------------------

/// Mock ffprobe keyed by input filename.
#[derive(Default)]
pub struct MockFfprobeExecutor {
    results: RefCell<HashMap<String, Result<VideoProbeResult, ProbeError>>>,
    calls: RefCell<Vec<PathBuf>>,
}

impl MockFfprobeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect(&self, file_name: &str, result: Result<VideoProbeResult, ProbeError>) {
        self.results
            .borrow_mut()
            .insert(file_name.to_string(), result);
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.borrow().clone()
    }
}

impl FfprobeExecutor for MockFfprobeExecutor {
    fn probe_video(&self, input_path: &Path) -> Result<VideoProbeResult, ProbeError> {
        self.calls.borrow_mut().push(input_path.to_path_buf());
        let file_name = input_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.results
            .borrow_mut()
            .remove(&file_name)
            .unwrap_or_else(|| panic!("MockFfprobeExecutor: no expectation for {file_name}"))
    }
}

// ---------------------------------------------------------------------------
// ffmpeg
// ---------------------------------------------------------------------------

pub struct MockFfmpegProcess {
    events: Vec<FfmpegEvent>,
    exit_status: ExitStatus,
    delay: Duration,
    killed: Rc<Cell<bool>>,
}

impl FfmpegProcess for MockFfmpegProcess {
    fn handle_events<F>(&mut self, timeout: Option<Duration>, mut handler: F) -> Result<(), ExecError>
    where
        F: FnMut(FfmpegEvent) -> Result<(), ExecError>,
    {
        // Silent until `delay`, like an ffmpeg stuck before its first line.
        match timeout {
            Some(limit) if limit <= self.delay => {
                std::thread::sleep(limit);
                return Err(ExecError::TimedOut(limit));
            }
            _ => std::thread::sleep(self.delay),
        }
        for event in self.events.drain(..) {
            handler(event)?;
        }
        Ok(())
    }

    fn wait(&mut self) -> Result<ExitStatus, ExecError> {
        Ok(self.exit_status)
    }

    fn kill(&mut self) -> Result<(), ExecError> {
        self.killed.set(true);
        Ok(())
    }
}

enum MockResult {
    Run {
        events: Vec<FfmpegEvent>,
        exit_code: i32,
        create_output: bool,
        delay: Duration,
    },
    SpawnError,
}

struct MockFfmpegExpectation {
    arg_pattern: String,
    result: MockResult,
}

/// Mock ffmpeg matching expectations by a substring of any argument.
#[derive(Default)]
pub struct MockFfmpegSpawner {
    expectations: RefCell<Vec<MockFfmpegExpectation>>,
    received_calls: RefCell<Vec<Vec<String>>>,
    killed: Rc<Cell<bool>>,
}

impl MockFfmpegSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, arg_pattern: &str, result: MockResult) {
        self.expectations.borrow_mut().push(MockFfmpegExpectation {
            arg_pattern: arg_pattern.to_string(),
            result,
        });
    }

    /// Exit 0, writing the output file when `create_output` is set.
    pub fn add_success_expectation(&self, arg_pattern: &str, events: Vec<FfmpegEvent>, create_output: bool) {
        self.push(
            arg_pattern,
            MockResult::Run {
                events,
                exit_code: 0,
                create_output,
                delay: Duration::ZERO,
            },
        );
    }

    pub fn add_exit_error_expectation(&self, arg_pattern: &str, events: Vec<FfmpegEvent>, exit_code: i32) {
        self.push(
            arg_pattern,
            MockResult::Run {
                events,
                exit_code,
                create_output: false,
                delay: Duration::ZERO,
            },
        );
    }

    /// Stays silent for `delay` before delivering `events`, for timeout tests.
    pub fn add_slow_expectation(&self, arg_pattern: &str, events: Vec<FfmpegEvent>, delay: Duration) {
        self.push(
            arg_pattern,
            MockResult::Run {
                events,
                exit_code: 0,
                create_output: true,
                delay,
            },
        );
    }

    pub fn add_spawn_error_expectation(&self, arg_pattern: &str) {
        self.push(arg_pattern, MockResult::SpawnError);
    }

    pub fn get_received_calls(&self) -> Vec<Vec<String>> {
        self.received_calls.borrow().clone()
    }

    pub fn was_killed(&self) -> bool {
        self.killed.get()
    }
}

impl FfmpegSpawner for MockFfmpegSpawner {
    type Process = MockFfmpegProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> Result<Self::Process, ExecError> {
        let args: Vec<String> = cmd
            .as_inner()
            .get_args()
            .map(|s| s.to_string_lossy().into_owned())
            .collect();
        self.received_calls.borrow_mut().push(args.clone());

        let mut expectations = self.expectations.borrow_mut();
        let index = expectations
            .iter()
            .position(|exp| args.iter().any(|arg| arg.contains(&exp.arg_pattern)))
            .unwrap_or_else(|| panic!("MockFfmpegSpawner: no expectation for args {args:?}"));
        let expectation = expectations.remove(index);

        match expectation.result {
            MockResult::SpawnError => Err(ExecError::Spawn {
                tool: "ffmpeg".to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "mock spawn failure"),
            }),
            MockResult::Run {
                events,
                exit_code,
                create_output,
                delay,
            } => {
                if create_output {
                    let output_path = PathBuf::from(cmd.as_inner().get_args().last().expect("output argument"));
                    std::fs::write(&output_path, b"transcoded").expect("write mock output");
                }
                Ok(MockFfmpegProcess {
                    events,
                    exit_status: ExitStatus::from_raw(exit_code << 8),
                    delay,
                    killed: Rc::clone(&self.killed),
                })
            }
        }
    }
}

/// Value following `flag` in an argument list.
pub fn arg_after(args: &[String], flag: &str) -> Option<String> {
    let index = args.iter().position(|a| a == flag)?;
    args.get(index + 1).cloned()
}

// ---------------------------------------------------------------------------
// Reporter
// ---------------------------------------------------------------------------

/// Records every reporter call as a short string.
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<String>>,
    progress: Mutex<Vec<BatchProgress>>,
    cancel_after_files: Option<(usize, CancellationToken)>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels `token` once `files` files have finished.
    pub fn cancelling_after(files: usize, token: CancellationToken) -> Self {
        Self {
            cancel_after_files: Some((files, token)),
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn progress(&self) -> Vec<BatchProgress> {
        self.progress.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

fn outcome_label(outcome: &FileOutcome) -> &'static str {
    match outcome {
        FileOutcome::Succeeded { .. } => "succeeded",
        FileOutcome::Skipped { .. } => "skipped",
        FileOutcome::Failed { .. } => "failed",
    }
}

impl Reporter for RecordingReporter {
    fn batch_started(&self, info: &BatchStartInfo) {
        self.push(format!("batch_started:{}", info.total_files));
    }

    fn file_started(&self, context: &FileContext) {
        self.push(format!(
            "file_started:{}/{}:{}",
            context.index, context.total_files, context.file_name
        ));
    }

    fn file_planned(&self, summary: &PlanSummary) {
        self.push(format!("file_planned:{}:{}", summary.file_name, summary.filter_expression));
    }

    fn encoding_started(&self, context: &FileContext) {
        self.push(format!("encoding_started:{}", context.file_name));
    }

    fn encoding_progress(&self, progress: &EncodeProgress) {
        self.push(format!("encoding_progress:{:.0}", progress.percent));
    }

    fn file_finished(&self, report: &FileReport) {
        self.push(format!(
            "file_finished:{}:{}",
            report.file_name,
            outcome_label(&report.outcome)
        ));
    }

    fn batch_progress(&self, progress: &BatchProgress) {
        self.push(format!("batch_progress:{}/{}", progress.completed, progress.total));
        self.progress.lock().unwrap().push(*progress);
        if let Some((files, token)) = &self.cancel_after_files {
            if progress.completed >= *files {
                token.cancel();
            }
        }
    }

    fn warning(&self, message: &str) {
        self.push(format!("warning:{message}"));
    }

    fn error(&self, error: &ReporterError) {
        self.push(format!("error:{}", error.title));
    }

    fn batch_complete(&self, summary: &BatchSummary) {
        self.push(format!(
            "batch_complete:{}/{}/{}",
            summary.succeeded, summary.skipped, summary.failed
        ));
    }
}
