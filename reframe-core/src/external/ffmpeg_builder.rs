//! FFmpeg command builder utilities
//!
//! Builders for the pieces of a transcode command line that have structure
//! of their own: the common command prefix and the `-vf` filter chain.

use crate::processing::plan::FilterOp;
use ffmpeg_sidecar::command::FfmpegCommand;
use std::path::Path;

/// Builder for creating `FFmpeg` commands with common configurations
pub struct FfmpegCommandBuilder {
    cmd: FfmpegCommand,
}

impl FfmpegCommandBuilder {
    /// Starts a command for the ffmpeg binary at `ffmpeg_path`
    #[must_use]
    pub fn new(ffmpeg_path: &Path) -> Self {
        Self {
            cmd: FfmpegCommand::new_with_path(ffmpeg_path),
        }
    }

    /// Builds the `FFmpeg` command with the banner suppressed
    #[must_use]
    pub fn build(mut self) -> FfmpegCommand {
        self.cmd.arg("-hide_banner");
        self.cmd
    }
}

/// Builder for constructing video filter chains
#[derive(Default)]
pub struct VideoFilterChain {
    filters: Vec<String>,
}

impl VideoFilterChain {
    /// Creates a new empty filter chain
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a planned geometric step
    #[must_use]
    pub fn add_filter(mut self, filter: FilterOp) -> Self {
        self.filters.push(filter.to_string());
        self
    }

    /// Builds the filter chain into a single filter string
    #[must_use]
    pub fn build(self) -> Option<String> {
        if self.filters.is_empty() {
            None
        } else {
            Some(self.filters.join(","))
        }
    }
}
