//! Bounded execution of short-lived external commands.
//!
//! Used for ffprobe, whose whole output is needed at once. stdout and stderr
//! are drained on reader threads so a chatty tool cannot block on a full pipe
//! while we poll for exit.

use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Command execution errors
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Failed to start command: {0}")]
    Spawn(#[source] io::Error),

    #[error("Command timed out after {} seconds", .0.as_secs())]
    TimedOut(Duration),

    #[error("Error waiting for process: {0}")]
    Wait(#[source] io::Error),
}

/// Logs the full command line at debug level.
pub fn log_command(cmd: &Command) {
    let args: Vec<String> = cmd
        .get_args()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    debug!(
        "Running command: {} {}",
        cmd.get_program().to_string_lossy(),
        args.join(" ")
    );
}

/// Runs `cmd` to completion and captures its output.
///
/// With a timeout, the child is killed once the limit passes and
/// [`CommandError::TimedOut`] is returned. A non-zero exit is not an error
/// here; callers inspect [`Output::status`].
pub fn run_command_with_timeout(
    cmd: &mut Command,
    timeout: Option<Duration>,
) -> Result<Output, CommandError> {
    log_command(cmd);

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(CommandError::Spawn)?;

    let stdout_handle = drain(child.stdout.take());
    let stderr_handle = drain(child.stderr.take());

    let status = match timeout {
        Some(limit) => wait_with_deadline(&mut child, limit)?,
        None => child.wait().map_err(CommandError::Wait)?,
    };

    Ok(Output {
        status,
        stdout: join_reader(stdout_handle),
        stderr: join_reader(stderr_handle),
    })
}

fn wait_with_deadline(child: &mut Child, limit: Duration) -> Result<ExitStatus, CommandError> {
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if start.elapsed() >= limit => {
                warn!("Command exceeded {}s, killing it", limit.as_secs());
                let _ = child.kill();
                let _ = child.wait();
                return Err(CommandError::TimedOut(limit));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => return Err(CommandError::Wait(e)),
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut reader| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = reader.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_reader(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}
