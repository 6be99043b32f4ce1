// ============================================================================
// reframe-cli/src/logging.rs
// ============================================================================
//
// LOGGING UTILITIES: Helper Functions for Logging
//
// The run log itself is configured by reframe-core's file_logging module
// (log4rs). This module only supplies the timestamp used in its filename.

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
///
/// # Example
/// ```
/// let stamp = reframe::logging::get_timestamp();
/// assert_eq!(stamp.len(), 15);
/// ```
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}
