//! Per-run logger with file and tracing output.
//!
//! Each pipeline run gets its own logger that:
//! - Writes to a dedicated log file
//! - Mirrors every line to `tracing`
//! - Supports compact mode with progress filtering
//! - Maintains a tail buffer of media tool output for error diagnosis
//!
//! The logger is shared by worker threads, so all mutable state sits
//! behind `parking_lot` mutexes.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogConfig, LogLevel, MessagePrefix};

/// Per-run logger with dual output (file + tracing).
pub struct RunLogger {
    /// Run name for identification.
    run_name: String,
    /// Path to log file (None when file output is disabled).
    log_path: Option<PathBuf>,
    /// File writer (buffered).
    file_writer: Mutex<Option<BufWriter<File>>>,
    /// Logging configuration.
    config: LogConfig,
    /// Recent tool output lines.
    tail_buffer: Mutex<VecDeque<String>>,
    /// Last progress value logged (for compact mode filtering).
    last_progress: Mutex<Option<u32>>,
}

impl RunLogger {
    /// Create a run logger writing to `<log_dir>/<run_name>.log`.
    pub fn new(
        run_name: impl Into<String>,
        log_dir: impl AsRef<Path>,
        config: LogConfig,
    ) -> std::io::Result<Self> {
        let run_name = run_name.into();
        let log_dir = log_dir.as_ref();

        fs::create_dir_all(log_dir)?;
        let log_path = log_dir.join(format!("{}.log", sanitize_filename(&run_name)));
        let file = File::create(&log_path)?;

        Ok(Self {
            run_name,
            log_path: Some(log_path),
            file_writer: Mutex::new(Some(BufWriter::new(file))),
            config: config.clone(),
            tail_buffer: Mutex::new(VecDeque::with_capacity(config.error_tail)),
            last_progress: Mutex::new(None),
        })
    }

    /// Create a logger that only forwards to `tracing`.
    pub fn tracing_only(run_name: impl Into<String>, config: LogConfig) -> Self {
        Self {
            run_name: run_name.into(),
            log_path: None,
            file_writer: Mutex::new(None),
            tail_buffer: Mutex::new(VecDeque::with_capacity(config.error_tail)),
            config,
            last_progress: Mutex::new(None),
        }
    }

    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    /// Get the log file path, if writing to a file.
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Log a message at the specified level.
    pub fn log(&self, level: LogLevel, message: &str) {
        if self.config.mirror_to_tracing {
            mirror(level, &self.run_name, message);
        }

        if level < self.config.level {
            return;
        }
        self.write_line(&self.format_message(message));
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, &MessagePrefix::Warning.format(message));
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, &MessagePrefix::Error.format(message));
    }

    /// Log a media tool invocation.
    pub fn command(&self, command: &str) {
        self.log(LogLevel::Debug, &MessagePrefix::Command.format(command));
    }

    /// Log a phase (pipeline step) marker.
    pub fn phase(&self, phase_name: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Phase.format(phase_name));
    }

    /// Log a section marker.
    pub fn section(&self, section_name: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Section.format(section_name));
    }

    pub fn success(&self, message: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Success.format(message));
    }

    /// Log a message about one narration item.
    pub fn item(&self, item_id: i64, message: &str) {
        self.info(&format!("  [item {:>3}] {}", item_id, message));
    }

    /// Log a warning about one narration item.
    pub fn item_warn(&self, item_id: i64, message: &str) {
        self.warn(&format!("[item {}] {}", item_id, message));
    }

    /// Log `done` of `total` units finished (filtered in compact mode).
    ///
    /// Returns true if the line was logged.
    pub fn progress(&self, label: &str, done: usize, total: usize) -> bool {
        let percent = if total == 0 {
            100
        } else {
            ((done as f64 / total as f64) * 100.0) as u32
        };

        if self.config.compact {
            let mut last = self.last_progress.lock();
            let step = self.config.progress_step.max(1);
            let current_step = percent / step;

            if let Some(prev) = *last {
                if current_step <= prev / step && percent < 100 {
                    return false;
                }
            }
            *last = Some(percent);
        }

        self.info(&format!("{}: {}/{} ({}%)", label, done, total, percent));
        true
    }

    /// Reset progress filtering (call between steps).
    pub fn reset_progress(&self) {
        *self.last_progress.lock() = None;
    }

    /// Record an output line from an external tool.
    ///
    /// In compact mode, lines only go to the tail buffer.
    pub fn output_line(&self, line: &str, is_stderr: bool) {
        {
            let mut buffer = self.tail_buffer.lock();
            if self.config.error_tail > 0 && buffer.len() >= self.config.error_tail {
                buffer.pop_front();
            }
            if self.config.error_tail > 0 {
                buffer.push_back(line.to_string());
            }
        }

        if self.config.compact {
            return;
        }

        let prefix = if is_stderr { "[stderr] " } else { "" };
        self.debug(&format!("{}{}", prefix, line));
    }

    /// Record every line of a tool's captured output.
    pub fn output_block(&self, text: &str, is_stderr: bool) {
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            self.output_line(line, is_stderr);
        }
    }

    /// Show the tail buffer (typically after an error).
    pub fn show_tail(&self, header: &str) {
        let lines = self.get_tail();
        if lines.is_empty() {
            return;
        }

        self.log(LogLevel::Error, &format!("[{}/tail]", header));
        for line in lines {
            self.log(LogLevel::Error, &line);
        }
    }

    pub fn clear_tail(&self) {
        self.tail_buffer.lock().clear();
    }

    /// Get the current tail buffer contents.
    pub fn get_tail(&self) -> Vec<String> {
        self.tail_buffer.lock().iter().cloned().collect()
    }

    /// Flush the log file.
    pub fn flush(&self) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writer.flush();
        }
    }

    /// Close the log file.
    pub fn close(&self) {
        self.flush();
        *self.file_writer.lock() = None;
    }

    fn format_message(&self, message: &str) -> String {
        if self.config.show_timestamps {
            let timestamp = Local::now().format("%H:%M:%S");
            format!("[{}] {}", timestamp, message)
        } else {
            message.to_string()
        }
    }

    fn write_line(&self, formatted: &str) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writeln!(writer, "{}", formatted);
        }
    }
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        self.close();
    }
}

fn mirror(level: LogLevel, run: &str, message: &str) {
    match level {
        LogLevel::Trace => tracing::trace!(run, "{}", message),
        LogLevel::Debug => tracing::debug!(run, "{}", message),
        LogLevel::Info => tracing::info!(run, "{}", message),
        LogLevel::Warn => tracing::warn!(run, "{}", message),
        LogLevel::Error => tracing::error!(run, "{}", message),
    }
}

/// Sanitize a string to be safe for use as a filename.
pub(crate) fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ' ' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn quiet() -> LogConfig {
        LogConfig {
            mirror_to_tracing: false,
            ..LogConfig::default()
        }
    }

    #[test]
    fn creates_log_file() {
        let dir = tempdir().unwrap();
        let logger = RunLogger::new("final_video", dir.path(), quiet()).unwrap();

        let path = logger.log_path().unwrap();
        assert!(path.exists());
        assert!(path.to_string_lossy().ends_with("final_video.log"));
    }

    #[test]
    fn writes_prefixed_lines_to_file() {
        let dir = tempdir().unwrap();
        let logger = RunLogger::new("run", dir.path(), quiet()).unwrap();

        logger.phase("Segments");
        logger.item(7, "rendered 45 frames");
        logger.warn("image skipped");
        logger.flush();

        let content = fs::read_to_string(logger.log_path().unwrap()).unwrap();
        assert!(content.contains("=== Segments ==="));
        assert!(content.contains("[item   7] rendered 45 frames"));
        assert!(content.contains("[WARNING] image skipped"));
    }

    #[test]
    fn level_filters_debug_lines() {
        let dir = tempdir().unwrap();
        let logger = RunLogger::new("run", dir.path(), quiet()).unwrap();

        logger.command("ffmpeg -version");
        logger.flush();

        let content = fs::read_to_string(logger.log_path().unwrap()).unwrap();
        assert!(!content.contains("ffmpeg -version"));
    }

    #[test]
    fn compact_mode_filters_progress() {
        let config = LogConfig {
            compact: true,
            progress_step: 20,
            ..quiet()
        };
        let logger = RunLogger::tracing_only("run", config);

        assert!(logger.progress("Segments", 0, 20));
        assert!(!logger.progress("Segments", 1, 20)); // 5%
        assert!(!logger.progress("Segments", 3, 20)); // 15%
        assert!(logger.progress("Segments", 4, 20)); // 20%
        assert!(!logger.progress("Segments", 5, 20)); // 25%
        assert!(logger.progress("Segments", 20, 20)); // 100%
    }

    #[test]
    fn reset_progress_allows_next_step_to_start_at_zero() {
        let logger = RunLogger::tracing_only("run", quiet());
        assert!(logger.progress("Audio", 2, 2));
        logger.reset_progress();
        assert!(logger.progress("Segments", 0, 2));
    }

    #[test]
    fn tail_buffer_maintains_limit() {
        let config = LogConfig {
            compact: true,
            error_tail: 5,
            ..quiet()
        };
        let logger = RunLogger::tracing_only("run", config);

        for i in 0..10 {
            logger.output_line(&format!("Line {}", i), false);
        }

        let tail = logger.get_tail();
        assert_eq!(tail.len(), 5);
        assert_eq!(tail[0], "Line 5");
        assert_eq!(tail[4], "Line 9");
    }

    #[test]
    fn output_block_skips_blank_lines() {
        let logger = RunLogger::tracing_only("run", quiet());
        logger.output_block("first\n\n  \nsecond\n", true);
        assert_eq!(logger.get_tail(), vec!["first", "second"]);
    }

    #[test]
    fn sanitizes_filename() {
        assert_eq!(sanitize_filename("normal_name"), "normal_name");
        assert_eq!(sanitize_filename("has/slash"), "has_slash");
        assert_eq!(sanitize_filename("my video"), "my_video");
    }
}
