//! Implementation of the 'run' subcommand.
//!
//! Turns the parsed arguments into a core configuration and transform
//! request, wires up the real ffprobe/ffmpeg executors and hands the batch to
//! reframe-core. Ctrl-C cancels the batch once the current file is done.

use crate::cli::RunArgs;
use crate::error::CliResult;

use reframe_core::external::{CommandFfprobeExecutor, SidecarSpawner, StdFsMetadataProvider};
use reframe_core::processing::BatchSummary;
use reframe_core::reporting::Reporter;
use reframe_core::{CancellationToken, CoreConfig, TransformRequest, run_batch};

use log::{debug, info, warn};
use std::thread;
use std::time::Duration;

/// Validates the four numeric request fields.
pub fn build_request(args: &RunArgs) -> CliResult<TransformRequest> {
    let request = TransformRequest::from_strs(
        &args.start_offset,
        &args.target_duration,
        &args.target_width,
        &args.target_height,
    )?;
    Ok(request)
}

/// Creates and configures CoreConfig from CLI arguments.
pub fn build_config(args: &RunArgs) -> CliResult<CoreConfig> {
    let mut config = CoreConfig::new(args.input_dir.clone(), args.output_dir.clone());
    config.ffmpeg_path = args.ffmpeg_path.clone();
    config.ffprobe_path = args.ffprobe_path.clone();
    config.video_codec = args.video_codec.clone();
    config.output_prefix = args.output_prefix.clone();
    config.tool_timeout = args.timeout_secs.map(Duration::from_secs);
    config.sort_files = args.sort;

    config.validate()?;
    Ok(config)
}

/// Runs the batch with the real external tools.
pub fn run_transform(args: &RunArgs, reporter: &dyn Reporter) -> CliResult<BatchSummary> {
    let request = build_request(args)?;
    let config = build_config(args)?;

    debug!("Run configuration: {config:?}");
    info!("Run started: {}", chrono::Local::now());

    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    let ffprobe = CommandFfprobeExecutor::new(&config.ffprobe_path, config.tool_timeout);
    let summary = run_batch(
        &ffprobe,
        &SidecarSpawner,
        &StdFsMetadataProvider,
        reporter,
        &config,
        &request,
        &cancel,
    )?;

    info!("Run finished: {}", chrono::Local::now());
    Ok(summary)
}

/// Cancels `token` on the first Ctrl-C.
///
/// The signal is awaited on a single-threaded tokio runtime in a background
/// thread. Once installed, Ctrl-C no longer kills the process, so the batch
/// still ends with a summary.
fn cancel_on_interrupt(token: CancellationToken) {
    let spawned = thread::Builder::new()
        .name("reframe-interrupt".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!("Ctrl-C handling unavailable: {e}");
                    return;
                }
            };
            match runtime.block_on(tokio::signal::ctrl_c()) {
                Ok(()) => {
                    warn!("Interrupt received; stopping after the current file");
                    token.cancel();
                }
                Err(e) => warn!("Ctrl-C handling unavailable: {e}"),
            }
        });

    if let Err(e) = spawned {
        warn!("Could not start the interrupt watcher: {e}");
    }
}
