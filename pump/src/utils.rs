//! Utility functions

/// Timestamp used to name one run's output subdirectory
pub fn run_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d-%H:%M:%S").to_string()
}
