use anyhow::{Context, Result};
use log::LevelFilter;
use log4rs::{
    append::file::FileAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};
use std::path::{Path, PathBuf};

/// Prefix of every run log filename.
pub const LOG_FILE_PREFIX: &str = "reframe_run_";

/// Path of the log file for a run started at `timestamp` (`YYYYMMDD_HHMMSS`).
pub fn run_log_path(log_dir: &Path, timestamp: &str) -> PathBuf {
    log_dir.join(format!("{LOG_FILE_PREFIX}{timestamp}.log"))
}

/// Installs a log4rs file appender as the global logger.
///
/// Can only succeed once per process.
pub fn setup_file_logging(log_file: &Path, log_level: LevelFilter) -> Result<()> {
    if let Some(parent) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] {m}{n}",
        )))
        .build(log_file)
        .with_context(|| format!("opening log file {}", log_file.display()))?;

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(file_appender)))
        .build(Root::builder().appender("file").build(log_level))?;

    log4rs::init_config(config)?;

    Ok(())
}
