//! Progress and status reporting.
//!
//! The batch orchestrator emits every user-visible event through the
//! [`Reporter`] trait, synchronously and in order. Three implementations are
//! provided: [`NullReporter`] for embedding and tests, [`TerminalReporter`]
//! for humans, and [`JsonReporter`] for one-event-per-line machine output.

use crate::processing::batch::{BatchSummary, FileOutcome, FileReport};
use crate::utils::{format_bytes, format_duration};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Batch start metadata.
#[derive(Clone, Debug)]
pub struct BatchStartInfo {
    pub total_files: usize,
    pub file_list: Vec<String>,
    pub input_dir: String,
    pub output_dir: String,
}

/// Position of a file within the batch (1-based).
#[derive(Clone, Debug)]
pub struct FileContext {
    pub index: usize,
    pub total_files: usize,
    pub file_name: String,
}

/// What is about to be done to a file.
#[derive(Clone, Debug)]
pub struct PlanSummary {
    pub file_name: String,
    pub source_resolution: String,
    pub rotation_degrees: i32,
    pub trim_start: f64,
    pub trim_duration: f64,
    pub filter_expression: String,
}

/// Snapshot of transcode progress for the current file.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodeProgress {
    pub percent: f32,
    pub current_secs: f64,
    pub total_secs: f64,
    pub speed: f32,
}

/// Fraction of the batch that has been processed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
}

impl BatchProgress {
    /// `completed / total`, 0 for an empty batch.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// High-level warning/error message.
#[derive(Clone, Debug)]
pub struct ReporterError {
    pub title: String,
    pub message: String,
    pub context: Option<String>,
    pub suggestion: Option<String>,
}

/// Reporter interface implemented by both human-readable and JSON reporters.
pub trait Reporter: Send + Sync {
    fn batch_started(&self, _info: &BatchStartInfo) {}
    fn file_started(&self, _context: &FileContext) {}
    fn file_planned(&self, _summary: &PlanSummary) {}
    fn encoding_started(&self, _context: &FileContext) {}
    fn encoding_progress(&self, _progress: &EncodeProgress) {}
    fn file_finished(&self, _report: &FileReport) {}
    fn batch_progress(&self, _progress: &BatchProgress) {}
    fn warning(&self, _message: &str) {}
    fn error(&self, _error: &ReporterError) {}
    fn batch_complete(&self, _summary: &BatchSummary) {}
}

/// No-op reporter that discards all updates.
pub struct NullReporter;

impl Reporter for NullReporter {}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Human-friendly reporter that prints concise text output.
pub struct TerminalReporter {
    progress: Mutex<Option<ProgressBar>>,
    max_percent: Mutex<f32>,
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self {
            progress: Mutex::new(None),
            max_percent: Mutex::new(0.0),
        }
    }

    fn finish_progress(&self) {
        if let Some(pb) = lock(&self.progress).take() {
            pb.finish_and_clear();
        }
        *lock(&self.max_percent) = 0.0;
    }

    fn update_progress_bar(&self, progress: &EncodeProgress) {
        let guard = lock(&self.progress);
        let Some(pb) = guard.as_ref() else {
            return;
        };
        let mut max_percent = lock(&self.max_percent);

        let clamped = progress.percent.clamp(0.0, 100.0);
        if clamped >= *max_percent {
            *max_percent = clamped;
            pb.set_position(clamped as u64);
        }

        pb.set_message(format!(
            "{} / {}, speed {:.1}x",
            format_duration(progress.current_secs),
            format_duration(progress.total_secs),
            progress.speed
        ));
    }
}

impl Reporter for TerminalReporter {
    fn batch_started(&self, info: &BatchStartInfo) {
        println!("\n{}", style("BATCH").bold().cyan());
        println!(
            "  Processing {} files from {} -> {}",
            info.total_files,
            info.input_dir,
            style(&info.output_dir).bold()
        );
        for (idx, name) in info.file_list.iter().enumerate() {
            println!("  {}. {}", idx + 1, name);
        }
    }

    fn file_started(&self, context: &FileContext) {
        println!(
            "\nFile {} of {}: {}",
            style(context.index.to_string()).bold(),
            context.total_files,
            style(&context.file_name).bold()
        );
    }

    fn file_planned(&self, summary: &PlanSummary) {
        println!(
            "  {:<10} {} (rotation {}°)",
            style("Source:").bold(),
            summary.source_resolution,
            summary.rotation_degrees
        );
        println!(
            "  {:<10} {:.3}s for {:.3}s",
            style("Trim:").bold(),
            summary.trim_start,
            summary.trim_duration
        );
        println!("  {:<10} {}", style("Filters:").bold(), summary.filter_expression);
    }

    fn encoding_started(&self, _context: &FileContext) {
        self.finish_progress();
        let pb = ProgressBar::new(100);
        let style = ProgressStyle::default_bar()
            .template("Encoding [{bar:40}] {percent:>3}% | {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(120));
        *lock(&self.progress) = Some(pb);
    }

    fn encoding_progress(&self, progress: &EncodeProgress) {
        self.update_progress_bar(progress);
    }

    fn file_finished(&self, report: &FileReport) {
        self.finish_progress();
        match &report.outcome {
            FileOutcome::Succeeded {
                output_path,
                output_size,
            } => println!(
                "  {} {} ({})",
                style("✓").green().bold(),
                style(output_path.display()).green(),
                format_bytes(*output_size)
            ),
            FileOutcome::Skipped { reason } => {
                println!("  {} {}", style("skipped:").yellow().bold(), reason);
            }
            FileOutcome::Failed { reason } => {
                println!("  {} {}", style("failed:").red().bold(), reason);
            }
        }
    }

    fn batch_progress(&self, progress: &BatchProgress) {
        println!(
            "  Batch: {}/{} ({:.0}%)",
            progress.completed,
            progress.total,
            progress.fraction() * 100.0
        );
    }

    fn warning(&self, message: &str) {
        println!("{}", style(format!("WARN: {message}")).yellow().bold());
    }

    fn error(&self, error: &ReporterError) {
        self.finish_progress();
        eprintln!(
            "\n{} {}",
            style("ERROR").red().bold(),
            style(&error.title).red().bold()
        );
        eprintln!("  {}", error.message);
        if let Some(ctx) = &error.context {
            eprintln!("  Context: {ctx}");
        }
        if let Some(suggestion) = &error.suggestion {
            eprintln!("  Suggestion: {suggestion}");
        }
    }

    fn batch_complete(&self, summary: &BatchSummary) {
        self.finish_progress();
        println!("\n{}", style("BATCH SUMMARY").bold().cyan());
        println!(
            "  {}",
            style(format!(
                "{} of {} succeeded",
                summary.succeeded, summary.total_files
            ))
            .bold()
        );
        println!(
            "  Skipped: {}, failed: {}",
            style(summary.skipped.to_string()).yellow(),
            style(summary.failed.to_string()).red()
        );
        if summary.cancelled {
            println!(
                "  {}",
                style(format!(
                    "Cancelled with {} file(s) not processed",
                    summary.total_files - summary.reports.len()
                ))
                .yellow()
            );
        }
        println!("  Output: {}", format_bytes(summary.total_output_bytes));
        println!("  Time: {}", format_duration(summary.elapsed.as_secs_f64()));
        for report in &summary.reports {
            let status = match &report.outcome {
                FileOutcome::Succeeded { .. } => style("ok").green(),
                FileOutcome::Skipped { .. } => style("skipped").yellow(),
                FileOutcome::Failed { .. } => style("failed").red().bold(),
            };
            println!("  - {}: {}", report.file_name, status);
        }
    }
}

/// Reporter writing one JSON object per line.
pub struct JsonReporter {
    writer: Mutex<Box<dyn Write + Send>>,
    last_progress_bucket: Mutex<i32>,
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonReporter {
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
            last_progress_bucket: Mutex::new(-1),
        }
    }

    fn timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    fn write_value(&self, value: serde_json::Value) {
        let mut writer = lock(&self.writer);
        let _ = writeln!(writer, "{value}");
        let _ = writer.flush();
    }
}

fn outcome_json(outcome: &FileOutcome) -> serde_json::Value {
    match outcome {
        FileOutcome::Succeeded {
            output_path,
            output_size,
        } => json!({
            "status": "succeeded",
            "output_path": output_path.display().to_string(),
            "output_size": output_size,
        }),
        FileOutcome::Skipped { reason } => json!({
            "status": "skipped",
            "reason": reason,
        }),
        FileOutcome::Failed { reason } => json!({
            "status": "failed",
            "reason": reason,
        }),
    }
}

impl Reporter for JsonReporter {
    fn batch_started(&self, info: &BatchStartInfo) {
        self.write_value(json!({
            "type": "batch_started",
            "total_files": info.total_files,
            "files": info.file_list,
            "input_dir": info.input_dir,
            "output_dir": info.output_dir,
            "timestamp": Self::timestamp(),
        }));
    }

    fn file_started(&self, context: &FileContext) {
        self.write_value(json!({
            "type": "file_started",
            "index": context.index,
            "total_files": context.total_files,
            "file": context.file_name,
            "timestamp": Self::timestamp(),
        }));
    }

    fn file_planned(&self, summary: &PlanSummary) {
        self.write_value(json!({
            "type": "file_planned",
            "file": summary.file_name,
            "source_resolution": summary.source_resolution,
            "rotation_degrees": summary.rotation_degrees,
            "trim_start": summary.trim_start,
            "trim_duration": summary.trim_duration,
            "filters": summary.filter_expression,
            "timestamp": Self::timestamp(),
        }));
    }

    fn encoding_started(&self, _context: &FileContext) {
        *lock(&self.last_progress_bucket) = -1;
    }

    fn encoding_progress(&self, progress: &EncodeProgress) {
        let bucket = (progress.percent as i32) / 5;
        {
            let mut guard = lock(&self.last_progress_bucket);
            if bucket <= *guard && progress.percent < 99.0 {
                return;
            }
            *guard = bucket;
        }

        self.write_value(json!({
            "type": "encoding_progress",
            "percent": progress.percent,
            "current_seconds": progress.current_secs,
            "total_seconds": progress.total_secs,
            "speed": progress.speed,
            "timestamp": Self::timestamp(),
        }));
    }

    fn file_finished(&self, report: &FileReport) {
        self.write_value(json!({
            "type": "file_finished",
            "file": report.file_name,
            "outcome": outcome_json(&report.outcome),
            "timestamp": Self::timestamp(),
        }));
    }

    fn batch_progress(&self, progress: &BatchProgress) {
        self.write_value(json!({
            "type": "batch_progress",
            "completed": progress.completed,
            "total": progress.total,
            "fraction": progress.fraction(),
            "timestamp": Self::timestamp(),
        }));
    }

    fn warning(&self, message: &str) {
        self.write_value(json!({
            "type": "warning",
            "message": message,
            "timestamp": Self::timestamp(),
        }));
    }

    fn error(&self, error: &ReporterError) {
        self.write_value(json!({
            "type": "error",
            "title": error.title,
            "message": error.message,
            "context": error.context,
            "suggestion": error.suggestion,
            "timestamp": Self::timestamp(),
        }));
    }

    fn batch_complete(&self, summary: &BatchSummary) {
        let files: Vec<_> = summary
            .reports
            .iter()
            .map(|report| {
                json!({
                    "file": report.file_name,
                    "outcome": outcome_json(&report.outcome),
                })
            })
            .collect();

        self.write_value(json!({
            "type": "batch_complete",
            "total_files": summary.total_files,
            "succeeded": summary.succeeded,
            "skipped": summary.skipped,
            "failed": summary.failed,
            "cancelled": summary.cancelled,
            "total_output_bytes": summary.total_output_bytes,
            "duration_seconds": summary.elapsed.as_secs_f64(),
            "files": files,
            "timestamp": Self::timestamp(),
        }));
    }
}
