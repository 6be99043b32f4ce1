// reframe-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Reframe: batch trim, rotate and crop videos",
    long_about = "Trims every video in a folder to a time window, undoes recorded \
                  rotation, then scales and center-crops it to a fixed frame size \
                  using ffmpeg via the reframe-core library."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug-level logging in the run log
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Processes every video in an input folder into an output folder
    Run(RunArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Folder containing the source videos (top level only)
    #[arg(short = 'i', long = "input", required = true, value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Folder where processed videos are written (created if missing)
    #[arg(short = 'o', long = "output", required = true, value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    // --- Transform Request ---
    // Kept as text so that bad numbers are reported by the core validator.
    /// Seconds to skip at the start of each video
    #[arg(long = "start", value_name = "SECONDS", default_value = "0", allow_hyphen_values = true)]
    pub start_offset: String,

    /// Maximum length of each output in seconds
    #[arg(long = "duration", value_name = "SECONDS", default_value = "20", allow_hyphen_values = true)]
    pub target_duration: String,

    /// Output frame width in pixels
    #[arg(long = "width", value_name = "PIXELS", default_value = "1200", allow_hyphen_values = true)]
    pub target_width: String,

    /// Output frame height in pixels
    #[arg(long = "height", value_name = "PIXELS", default_value = "1600", allow_hyphen_values = true)]
    pub target_height: String,

    // --- External Tools ---
    /// ffmpeg binary to run
    #[arg(long = "ffmpeg", value_name = "PATH", env = "REFRAME_FFMPEG", default_value = "ffmpeg")]
    pub ffmpeg_path: PathBuf,

    /// ffprobe binary to run
    #[arg(long = "ffprobe", value_name = "PATH", env = "REFRAME_FFPROBE", default_value = "ffprobe")]
    pub ffprobe_path: PathBuf,

    /// Video encoder passed to ffmpeg's -c:v
    #[arg(long = "codec", value_name = "ENCODER", default_value = "libx264")]
    pub video_codec: String,

    /// Prefix added to each output filename
    #[arg(long = "prefix", value_name = "PREFIX", default_value = "processed_")]
    pub output_prefix: String,

    /// Stop any single ffprobe/ffmpeg call after this many seconds
    #[arg(long = "timeout", value_name = "SECONDS")]
    pub timeout_secs: Option<u64>,

    /// Process files in name order instead of directory order
    #[arg(long, default_value_t = false)]
    pub sort: bool,

    // --- Output ---
    /// Emit machine-readable JSON progress events on stdout
    #[arg(long, default_value_t = false)]
    pub progress_json: bool,

    /// Directory for the run log file
    #[arg(short, long, value_name = "LOG_DIR", default_value = ".")]
    pub log_dir: PathBuf,

    /// Do not write a run log file
    #[arg(long, default_value_t = false)]
    pub no_log: bool,
}

/// Parses the process arguments.
///
/// Errors are returned rather than exiting, so that `main` decides the exit
/// status (clap's own choice of 2 would read as an incomplete run).
pub fn parse_cli() -> Result<Cli, clap::Error> {
    Cli::try_parse()
}

/// Parses an explicit argument list (first item is the program name).
pub fn parse_cli_from<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args)
}
