//! Logging infrastructure for narrsync.
//!
//! This module provides:
//! - Per-run loggers with file output mirrored to `tracing`
//! - Compact mode with progress filtering
//! - Tail buffer of media tool output for error diagnosis
//! - Global `tracing` subscriber setup for the binary
//!
//! # Example
//!
//! ```no_run
//! use narrsync_core::logging::{LogConfig, RunLogger};
//!
//! let logger = RunLogger::new("final_video", ".logs", LogConfig::default()).unwrap();
//!
//! logger.phase("Segments");
//! logger.item(3, "rendered 45 frames");
//! logger.progress("Segments", 3, 10);
//! logger.success("Run completed");
//! ```

mod run_logger;
mod types;

pub use run_logger::RunLogger;
pub(crate) use run_logger::sanitize_filename;
pub use types::{LogConfig, LogLevel, MessagePrefix};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// - Respects the RUST_LOG environment variable
/// - Falls back to the provided default level
/// - Outputs to stderr
///
/// Should be called once at application startup.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_filter_str(default_level)));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

/// Convert LogLevel to filter string.
fn level_to_filter_str(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}
