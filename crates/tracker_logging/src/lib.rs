#![deny(missing_docs)]
//! Shared logging utilities for the tracker workspace.
//!
//! This crate provides the `tracker_*` logging macros used by the engine and
//! the app, plus a minimal test initializer for the global logger.

/// Log target used by every `tracker_*` macro.
///
/// Lets an application raise or lower the tracker's verbosity independently
/// of its own logging.
pub const TARGET: &str = "ingest_tracker";

/// Logs a trace-level message under the tracker target.
#[macro_export]
macro_rules! tracker_trace {
    ($($arg:tt)*) => {{
        log::trace!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs a debug-level message under the tracker target.
#[macro_export]
macro_rules! tracker_debug {
    ($($arg:tt)*) => {{
        log::debug!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs an info-level message under the tracker target.
#[macro_export]
macro_rules! tracker_info {
    ($($arg:tt)*) => {{
        log::info!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs a warn-level message under the tracker target.
#[macro_export]
macro_rules! tracker_warn {
    ($($arg:tt)*) => {{
        log::warn!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs an error-level message under the tracker target.
#[macro_export]
macro_rules! tracker_error {
    ($($arg:tt)*) => {{
        log::error!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized, so every
/// test may call it.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
