//! Logging module for unstatic
//!
//! Writes a timestamped trace of configuration loading, unit parsing,
//! detection and fix application to a file for debugging. Every function is
//! a no-op until [`init_logger`] has been called.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Global logger instance
static LOGGER: Mutex<Option<FileLogger>> = Mutex::new(None);

/// Logger writing to one file
pub struct FileLogger {
    file: File,
}

impl FileLogger {
    /// Create a new logger writing to the specified path
    pub fn new(log_path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_path)?;

        Ok(Self { file })
    }

    /// Write a log message
    pub fn log(&mut self, message: &str) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let _ = writeln!(self.file, "[{}] {}", timestamp, message);
        let _ = self.file.flush();
    }

    /// Log a section header
    pub fn section(&mut self, title: &str) {
        let separator = "=".repeat(60);
        self.log(&separator);
        self.log(title);
        self.log(&separator);
    }
}

/// Initialize the global logger
///
/// Without a path, logs go to a timestamped file in the temp directory.
pub fn init_logger(log_path: Option<&Path>) -> std::io::Result<PathBuf> {
    let path = log_path.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        std::env::temp_dir().join(format!("unstatic-{}.log", timestamp))
    });

    let logger = FileLogger::new(&path)?;

    if let Ok(mut guard) = LOGGER.lock() {
        *guard = Some(logger);
    }

    Ok(path)
}

/// Log a message to the global logger
pub fn log(message: &str) {
    if let Ok(mut guard) = LOGGER.lock() {
        if let Some(ref mut logger) = *guard {
            logger.log(message);
        }
    }
}

/// Log a section header
pub fn section(title: &str) {
    if let Ok(mut guard) = LOGGER.lock() {
        if let Some(ref mut logger) = *guard {
            logger.section(title);
        }
    }
}

/// Check if logging is enabled
pub fn is_enabled() -> bool {
    if let Ok(guard) = LOGGER.lock() {
        guard.is_some()
    } else {
        false
    }
}

/// Log configuration loading
pub fn log_config_load(path: &Path) {
    section("CONFIGURATION LOADING");
    log(&format!("Loading config from: {}", path.display()));
}

/// Log the effective run settings
pub fn log_run_settings(mode: &str, rules: &[String], member_kinds: &[&str]) {
    section("RUN SETTINGS");
    log(&format!("Mode: {}", mode));
    log(&format!("Rules: {}", rules.join(", ")));
    log(&format!("Member kinds: {}", member_kinds.join(", ")));
}

/// Log units loaded into the project set
pub fn log_units_loaded(loaded: usize, failed: usize) {
    section("UNITS LOADED");
    log(&format!("Parsed {} units", loaded));
    if failed > 0 {
        log(&format!("Failed to load {} units", failed));
    }
}

/// Log one diagnostic
pub fn log_diagnostic(location: &str, message: &str) {
    log(&format!("DIAGNOSTIC: {} - {}", location, message));
}

/// Log fixes applied across the project
pub fn log_fixes_applied(titles: &[&str]) {
    section("FIXES APPLIED");
    for (index, title) in titles.iter().enumerate() {
        log(&format!("  [{}] {}", index + 1, title));
    }
}

/// Log a file written back to disk
pub fn log_file_written(path: &Path) {
    log(&format!("Wrote {}", path.display()));
}
