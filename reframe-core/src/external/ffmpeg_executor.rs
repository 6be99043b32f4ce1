// ============================================================================
// reframe-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: FFmpeg Process Management and Abstraction
//
// Traits for spawning an ffmpeg process and consuming its event stream,
// plus the production implementation on top of ffmpeg-sidecar. Tests supply
// their own spawner that never starts a real process.
//
// KEY COMPONENTS:
// - FfmpegProcess: an active ffmpeg process
// - FfmpegSpawner: creates FfmpegProcess values from a built command
// - SidecarSpawner / SidecarProcess: ffmpeg-sidecar backed implementation
//
// A timeout is enforced while waiting for the next event, so an ffmpeg that
// stops writing to stderr is still stopped at the deadline.

use crate::error::{ConfigError, ExecError};
use crate::external::check_dependency;

use ffmpeg_sidecar::child::FfmpegChild as SidecarChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use log::{debug, error, warn};
use std::path::Path;
use std::process::ExitStatus;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

// --- FFmpeg Execution Abstraction ---

/// Trait representing an active ffmpeg process instance.
pub trait FfmpegProcess {
    /// Processes events from the running command using a provided handler closure.
    ///
    /// Returning an error from the handler stops event processing and
    /// propagates the error. With a `timeout`, [`ExecError::TimedOut`] is
    /// returned once it passes, whether or not ffmpeg is still emitting
    /// events. The caller is responsible for killing the process.
    fn handle_events<F>(&mut self, timeout: Option<Duration>, handler: F) -> Result<(), ExecError>
    where
        F: FnMut(FfmpegEvent) -> Result<(), ExecError>;

    /// Waits for the command to complete and returns its exit status.
    fn wait(&mut self) -> Result<ExitStatus, ExecError>;

    /// Stops the process. Used when a timeout expires.
    fn kill(&mut self) -> Result<(), ExecError>;
}

/// Trait representing something that can spawn an FfmpegProcess.
pub trait FfmpegSpawner {
    type Process: FfmpegProcess;

    /// Spawns the ffmpeg command, consuming the command object.
    fn spawn(&self, cmd: FfmpegCommand) -> Result<Self::Process, ExecError>;

    /// Verifies the ffmpeg binary can be started. Mocks keep the default.
    fn ensure_available(&self, _ffmpeg_path: &Path) -> Result<(), ConfigError> {
        Ok(())
    }
}

// --- Concrete Implementation using ffmpeg-sidecar ---

/// Wrapper around `ffmpeg_sidecar::child::FfmpegChild` implementing `FfmpegProcess`.
pub struct SidecarProcess(SidecarChild);

impl FfmpegProcess for SidecarProcess {
    fn handle_events<F>(&mut self, timeout: Option<Duration>, mut handler: F) -> Result<(), ExecError>
    where
        F: FnMut(FfmpegEvent) -> Result<(), ExecError>,
    {
        let iterator = self.0.iter().map_err(|e| {
            error!("Failed to get ffmpeg event iterator: {e}");
            ExecError::Events(e.to_string())
        })?;

        let Some(limit) = timeout else {
            for event in iterator {
                handler(event)?;
            }
            return Ok(());
        };

        // The iterator blocks on ffmpeg's stderr, so it is drained on its own
        // thread and the deadline is applied to the receiving side.
        let deadline = Instant::now() + limit;
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for event in iterator {
                if tx.send(event).is_err() {
                    break;
                }
            }
        });

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(event) => handler(event)?,
                Err(RecvTimeoutError::Timeout) => {
                    debug!("No ffmpeg completion within {limit:?}");
                    return Err(ExecError::TimedOut(limit));
                }
                Err(RecvTimeoutError::Disconnected) => return Ok(()),
            }
        }
    }

    fn wait(&mut self) -> Result<ExitStatus, ExecError> {
        self.0.wait().map_err(ExecError::Wait)
    }

    fn kill(&mut self) -> Result<(), ExecError> {
        if let Err(e) = self.0.kill() {
            warn!("Failed to kill ffmpeg: {e}");
            return Err(ExecError::Wait(e));
        }
        // Reap the child so it does not linger as a zombie.
        self.0.wait().map(|_| ()).map_err(ExecError::Wait)
    }
}

/// Concrete implementation of `FfmpegSpawner` using `ffmpeg-sidecar`.
#[derive(Debug, Clone, Default)]
pub struct SidecarSpawner;

impl FfmpegSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> Result<Self::Process, ExecError> {
        let tool = cmd.as_inner().get_program().to_string_lossy().into_owned();
        cmd.spawn()
            .map(SidecarProcess)
            .map_err(|source| ExecError::Spawn { tool, source })
    }

    fn ensure_available(&self, ffmpeg_path: &Path) -> Result<(), ConfigError> {
        check_dependency(ffmpeg_path)
    }
}
