#![deny(missing_docs)]
//! Shared logging utilities for the worker workspace.
//!
//! This crate provides the `worker_*` logging macros used across the codebase,
//! a per-thread job context that prefixes log lines, and logger initialization.

use std::cell::RefCell;
use std::fs::File;
use std::path::Path;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

thread_local! {
    /// Id of the job being executed on the current thread, if any.
    static CURRENT_JOB: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Marks `id` as the job being executed on the current thread.
pub fn set_current_job(id: impl Into<String>) {
    CURRENT_JOB.with(|job| *job.borrow_mut() = Some(id.into()));
}

/// Clears the job context of the current thread.
pub fn clear_current_job() {
    CURRENT_JOB.with(|job| *job.borrow_mut() = None);
}

/// Returns the id of the job executing on the current thread.
pub fn current_job() -> Option<String> {
    CURRENT_JOB.with(|job| job.borrow().clone())
}

/// Scoped job context: marks a job as current until dropped, then restores
/// whatever context was active before.
#[must_use = "the job context ends when the guard is dropped"]
#[derive(Debug)]
pub struct JobContext {
    previous: Option<String>,
}

impl JobContext {
    /// Enters the context of job `id` on the current thread.
    pub fn enter(id: impl Into<String>) -> Self {
        let previous = CURRENT_JOB.with(|job| job.borrow_mut().replace(id.into()));
        Self { previous }
    }
}

impl Drop for JobContext {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT_JOB.with(|job| *job.borrow_mut() = previous);
    }
}

/// Prefix prepended to log lines by the `worker_*` macros.
#[doc(hidden)]
pub fn job_prefix() -> String {
    match current_job() {
        Some(id) => format!("[job {id}] "),
        None => String::new(),
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! worker_trace {
    ($($arg:tt)*) => {{
        log::trace!("{}{}", $crate::job_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! worker_debug {
    ($($arg:tt)*) => {{
        log::debug!("{}{}", $crate::job_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! worker_info {
    ($($arg:tt)*) => {{
        log::info!("{}{}", $crate::job_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! worker_warn {
    ($($arg:tt)*) => {{
        log::warn!("{}{}", $crate::job_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! worker_error {
    ($($arg:tt)*) => {{
        log::error!("{}{}", $crate::job_prefix(), format_args!($($arg)*));
    }};
}

/// Destination for log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    /// Write to the terminal (stderr, so stdout stays free for results).
    Terminal,
    /// Write to the given file.
    File(std::path::PathBuf),
    /// Write to both the terminal and the given file.
    Both(std::path::PathBuf),
}

/// Initializes the global logger with the given destination and level.
///
/// Safe to call more than once; later calls are ignored.
pub fn initialize(destination: LogDestination, level: LevelFilter) {
    let config = build_config();

    let loggers: Vec<Box<dyn SharedLogger>> = match destination {
        LogDestination::Terminal => vec![terminal_logger(level, config)],
        LogDestination::File(path) => match create_file_logger(&path, level, config) {
            Some(file_logger) => vec![file_logger],
            None => return,
        },
        LogDestination::Both(path) => {
            let mut loggers = vec![terminal_logger(level, config.clone())];
            if let Some(file_logger) = create_file_logger(&path, level, config) {
                loggers.push(file_logger);
            }
            loggers
        }
    };

    let _ = CombinedLogger::init(loggers);
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )]);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn terminal_logger(level: LevelFilter, config: Config) -> Box<dyn SharedLogger> {
    TermLogger::new(level, config, TerminalMode::Stderr, ColorChoice::Auto)
}

fn create_file_logger(
    path: &Path,
    level: LevelFilter,
    config: Config,
) -> Option<Box<dyn SharedLogger>> {
    match File::create(path) {
        Ok(file) => {
            let logger: Box<dyn SharedLogger> = WriteLogger::new(level, config, file);
            Some(logger)
        }
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", path, err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_context_is_per_thread() {
        set_current_job("job-7");
        assert_eq!(current_job().as_deref(), Some("job-7"));
        assert_eq!(job_prefix(), "[job job-7] ");

        let other = std::thread::spawn(current_job).join().unwrap();
        assert_eq!(other, None);

        clear_current_job();
        assert_eq!(current_job(), None);
        assert_eq!(job_prefix(), "");
    }

    #[test]
    fn job_context_guard_restores_previous_job() {
        clear_current_job();
        {
            let _outer = JobContext::enter("outer");
            {
                let _inner = JobContext::enter("inner");
                assert_eq!(current_job().as_deref(), Some("inner"));
            }
            assert_eq!(current_job().as_deref(), Some("outer"));
        }
        assert_eq!(current_job(), None);
    }

    #[test]
    fn macros_expand_without_a_logger() {
        initialize_for_tests();
        worker_info!("plain {}", 1);
        set_current_job("job-8");
        worker_debug!("with context {}", "x");
        clear_current_job();
    }
}
