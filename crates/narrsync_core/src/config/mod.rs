//! Configuration management for narrsync.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Validation on load with automatic defaults
//!
//! # Example
//!
//! ```no_run
//! use narrsync_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new("narrsync.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Output: {}", config.settings().paths.output_file);
//!
//! config.settings_mut().pipeline.workers = 2;
//! config.update_section(ConfigSection::Pipeline).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{parse_and_validate, ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    AudioSettings, ConfigSection, LoggingSettings, PathSettings, PipelineSettings, Settings,
    SubtitleSettings, VideoSettings,
};
