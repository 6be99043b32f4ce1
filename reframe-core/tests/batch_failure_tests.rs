// reframe-core/tests/batch_failure_tests.rs

#![cfg(unix)]

mod common;

use common::{
    MockFfmpegSpawner, MockFfprobeExecutor, RecordingReporter, create_dummy_file, probe,
    progress_event,
};
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use reframe_core::external::StdFsMetadataProvider;
use reframe_core::{
    CancellationToken, CoreConfig, FileOutcome, FileState, ProbeError, TransformRequest, run_batch,
};
use std::time::Duration;
use tempfile::tempdir;

fn reason_of(outcome: Option<&FileOutcome>) -> String {
    match outcome {
        Some(FileOutcome::Skipped { reason }) | Some(FileOutcome::Failed { reason }) => {
            reason.clone()
        }
        other => panic!("expected a skipped or failed outcome, got {other:?}"),
    }
}

#[test]
fn test_failures_are_isolated_per_file() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let output_dir = tempdir()?;

    for name in [
        "a_probe_fails.mp4",
        "b_too_short.mp4",
        "c_exit_error.mp4",
        "d_no_output.mp4",
        "e_good.mp4",
    ] {
        create_dummy_file(input_dir.path(), name);
    }

    let mut config = CoreConfig::new(
        input_dir.path().to_path_buf(),
        output_dir.path().to_path_buf(),
    );
    config.sort_files = true;
    let request = TransformRequest::new(15.0, 20.0, 1200, 1600)?;

    let ffprobe = MockFfprobeExecutor::new();
    ffprobe.expect("a_probe_fails.mp4", Err(ProbeError::NoVideoStream));
    ffprobe.expect("b_too_short.mp4", Ok(probe(1920, 1080, 10.0, 0)));
    ffprobe.expect("c_exit_error.mp4", Ok(probe(1920, 1080, 60.0, 0)));
    ffprobe.expect("d_no_output.mp4", Ok(probe(1920, 1080, 60.0, 0)));
    ffprobe.expect("e_good.mp4", Ok(probe(1920, 1080, 60.0, 0)));

    let spawner = MockFfmpegSpawner::new();
    spawner.add_exit_error_expectation(
        "c_exit_error.mp4",
        vec![FfmpegEvent::Log(
            LogLevel::Error,
            "Invalid data found when processing input".to_string(),
        )],
        1,
    );
    spawner.add_success_expectation("d_no_output.mp4", vec![], false);
    spawner.add_success_expectation("e_good.mp4", vec![progress_event("00:00:20.00")], true);

    let reporter = RecordingReporter::new();
    let summary = run_batch(
        &ffprobe,
        &spawner,
        &StdFsMetadataProvider,
        &reporter,
        &config,
        &request,
        &CancellationToken::new(),
    )?;

    assert_eq!(summary.total_files, 5);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.failed, 2);
    assert!(!summary.is_clean());
    assert_eq!(summary.reports.len(), 5);

    let probe_reason = reason_of(summary.outcome_for("a_probe_fails.mp4"));
    assert!(probe_reason.starts_with("probe failed"), "{probe_reason}");
    assert_eq!(
        summary.outcome_for("a_probe_fails.mp4").map(FileOutcome::state),
        Some(FileState::Skipped)
    );

    let short_reason = reason_of(summary.outcome_for("b_too_short.mp4"));
    assert!(short_reason.contains("too short"), "{short_reason}");
    assert_eq!(
        summary.outcome_for("b_too_short.mp4").map(FileOutcome::state),
        Some(FileState::Skipped)
    );

    let exit_reason = reason_of(summary.outcome_for("c_exit_error.mp4"));
    assert!(exit_reason.contains("Invalid data found"), "{exit_reason}");
    assert_eq!(
        summary.outcome_for("c_exit_error.mp4").map(FileOutcome::state),
        Some(FileState::Failed)
    );

    let missing_reason = reason_of(summary.outcome_for("d_no_output.mp4"));
    assert!(missing_reason.contains("was not created"), "{missing_reason}");

    assert_eq!(
        summary.outcome_for("e_good.mp4").map(FileOutcome::state),
        Some(FileState::Succeeded)
    );
    assert!(output_dir.path().join("processed_e_good.mp4").is_file());
    assert!(!output_dir.path().join("processed_c_exit_error.mp4").exists());

    // Skipped files never reach ffmpeg.
    let calls = spawner.get_received_calls();
    assert_eq!(calls.len(), 3);
    assert!(
        !calls
            .iter()
            .flatten()
            .any(|arg| arg.contains("a_probe_fails") || arg.contains("b_too_short"))
    );

    // Every file still advances the batch progress.
    let progress = reporter.progress();
    assert_eq!(progress.len(), 5);
    assert_eq!(progress.last().map(|p| p.completed), Some(5));
    assert_eq!(
        reporter.events().last().map(String::as_str),
        Some("batch_complete:1/2/2")
    );

    Ok(())
}

#[test]
fn test_spawn_failure_marks_file_failed() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let output_dir = tempdir()?;
    create_dummy_file(input_dir.path(), "clip.mp4");

    let config = CoreConfig::new(
        input_dir.path().to_path_buf(),
        output_dir.path().to_path_buf(),
    );

    let ffprobe = MockFfprobeExecutor::new();
    ffprobe.expect("clip.mp4", Ok(probe(1920, 1080, 60.0, 0)));

    let spawner = MockFfmpegSpawner::new();
    spawner.add_spawn_error_expectation("clip.mp4");

    let summary = run_batch(
        &ffprobe,
        &spawner,
        &StdFsMetadataProvider,
        &RecordingReporter::new(),
        &config,
        &TransformRequest::default(),
        &CancellationToken::new(),
    )?;

    assert_eq!(summary.failed, 1);
    let reason = reason_of(summary.outcome_for("clip.mp4"));
    assert!(reason.contains("Failed to start"), "{reason}");

    Ok(())
}

#[test]
fn test_transcode_timeout_kills_ffmpeg() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let output_dir = tempdir()?;
    create_dummy_file(input_dir.path(), "slow.mp4");

    let mut config = CoreConfig::new(
        input_dir.path().to_path_buf(),
        output_dir.path().to_path_buf(),
    );
    config.tool_timeout = Some(Duration::from_nanos(1));

    let ffprobe = MockFfprobeExecutor::new();
    ffprobe.expect("slow.mp4", Ok(probe(1920, 1080, 60.0, 0)));

    let spawner = MockFfmpegSpawner::new();
    spawner.add_slow_expectation(
        "slow.mp4",
        vec![progress_event("00:00:01.00")],
        Duration::from_millis(20),
    );

    let summary = run_batch(
        &ffprobe,
        &spawner,
        &StdFsMetadataProvider,
        &RecordingReporter::new(),
        &config,
        &TransformRequest::default(),
        &CancellationToken::new(),
    )?;

    assert_eq!(summary.failed, 1);
    let reason = reason_of(summary.outcome_for("slow.mp4"));
    assert!(reason.contains("did not finish"), "{reason}");
    assert!(spawner.was_killed());

    Ok(())
}

#[test]
fn test_cancellation_stops_before_next_file() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let output_dir = tempdir()?;
    create_dummy_file(input_dir.path(), "first.mp4");
    create_dummy_file(input_dir.path(), "second.mp4");

    let mut config = CoreConfig::new(
        input_dir.path().to_path_buf(),
        output_dir.path().to_path_buf(),
    );
    config.sort_files = true;

    let ffprobe = MockFfprobeExecutor::new();
    ffprobe.expect("first.mp4", Ok(probe(1920, 1080, 60.0, 0)));

    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation("first.mp4", vec![], true);

    let cancel = CancellationToken::new();
    let reporter = RecordingReporter::cancelling_after(1, cancel.clone());

    let summary = run_batch(
        &ffprobe,
        &spawner,
        &StdFsMetadataProvider,
        &reporter,
        &config,
        &TransformRequest::default(),
        &cancel,
    )?;

    assert!(summary.cancelled);
    assert!(!summary.is_clean());
    assert_eq!(summary.total_files, 2);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.reports.len(), 1);
    assert!(summary.outcome_for("second.mp4").is_none());
    assert_eq!(ffprobe.calls().len(), 1);
    assert!(
        reporter
            .events()
            .iter()
            .any(|e| e.starts_with("warning:Cancelled: 1 file(s)"))
    );

    Ok(())
}

#[test]
fn test_cancelled_before_start_processes_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let output_dir = tempdir()?;
    create_dummy_file(input_dir.path(), "clip.mp4");

    let config = CoreConfig::new(
        input_dir.path().to_path_buf(),
        output_dir.path().to_path_buf(),
    );

    let cancel = CancellationToken::new();
    cancel.cancel();

    let ffprobe = MockFfprobeExecutor::new();
    let spawner = MockFfmpegSpawner::new();
    let summary = run_batch(
        &ffprobe,
        &spawner,
        &StdFsMetadataProvider,
        &RecordingReporter::new(),
        &config,
        &TransformRequest::default(),
        &cancel,
    )?;

    assert!(summary.cancelled);
    assert!(summary.reports.is_empty());
    assert!(ffprobe.calls().is_empty());
    assert!(spawner.get_received_calls().is_empty());

    Ok(())
}
