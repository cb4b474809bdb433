//! narrsync command line
//!
//! Builds the final video from a narration file, its audio clips and a
//! folder of stills. Settings come from a TOML file (created with defaults
//! on first run); flags override individual settings for one invocation.
//!
//! Usage:
//!   narrsync --narration facts.json --audio-dir audio --images-dir images \
//!            --output out/final_video.mp4

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use narrsync_core::config::{ConfigManager, Settings};
use narrsync_core::logging::{init_tracing, LogConfig, LogLevel, RunLogger};
use narrsync_core::media::{FfmpegToolkit, ToolPaths};
use narrsync_core::orchestrator::{self, PipelineError, RunSummary};

/// Assemble a narrated slideshow video with burned-in captions
#[derive(Parser, Debug)]
#[command(name = "narrsync", version)]
struct Args {
    /// Config file (created with defaults if missing)
    #[arg(long, short, value_name = "FILE", default_value = "narrsync.toml", env = "NARRSYNC_CONFIG")]
    config: PathBuf,

    /// Narration records (JSON array)
    #[arg(long, value_name = "FILE")]
    narration: Option<PathBuf>,

    /// Directory holding narration_NN.<ext> clips
    #[arg(long, value_name = "DIR")]
    audio_dir: Option<PathBuf>,

    /// Directory of still images
    #[arg(long, value_name = "DIR")]
    images_dir: Option<PathBuf>,

    /// Final MP4 path
    #[arg(long, short, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Directory containing ffmpeg and ffprobe (default: PATH)
    #[arg(long, value_name = "DIR")]
    tools_dir: Option<PathBuf>,

    /// Worker threads for per-item work (0 = automatic)
    #[arg(long)]
    workers: Option<usize>,

    /// Keep the scratch directory after a successful run
    #[arg(long)]
    keep_scratch: bool,

    /// Run name used for the scratch directory and log file
    /// (defaults to the output file name)
    #[arg(long)]
    name: Option<String>,

    /// Debug logging, no compact progress
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(if args.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    });

    match run(&args) {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {:#}", err);
            let code = err
                .downcast_ref::<PipelineError>()
                .map(|e| e.exit_code())
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn run(args: &Args) -> Result<RunSummary> {
    let mut manager = ConfigManager::new(&args.config);
    manager
        .load_or_create()
        .with_context(|| format!("loading config {}", args.config.display()))?;
    let mut settings = manager.into_settings();
    apply_overrides(&mut settings, args);
    settings
        .validate()
        .map_err(|errors| anyhow!("invalid settings: {}", errors.join("; ")))?;

    let run_name = args.name.clone().unwrap_or_else(|| {
        settings
            .paths
            .output_path()
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "narrsync".to_string())
    });

    let mut log_config = LogConfig::from(&settings.logging);
    if args.verbose {
        log_config.level = LogLevel::Debug;
        log_config.compact = false;
    }
    let logger = RunLogger::new(&run_name, &settings.paths.logs_folder, log_config)
        .with_context(|| format!("creating log file in {}", settings.paths.logs_folder))?;
    if let Some(path) = logger.log_path() {
        tracing::info!("Logging to {}", path.display());
    }

    let tools = ToolPaths::from_setting(&settings.paths.tools_dir);
    tracing::debug!("Using {} and {}", tools.ffmpeg.display(), tools.ffprobe.display());
    let toolkit = Arc::new(FfmpegToolkit::new(tools));
    let summary = orchestrator::run(settings, toolkit, Arc::new(logger), &run_name)?;
    Ok(summary)
}

fn apply_overrides(settings: &mut Settings, args: &Args) {
    let as_string = |p: &PathBuf| p.to_string_lossy().to_string();
    if let Some(path) = &args.narration {
        settings.paths.narration_file = as_string(path);
    }
    if let Some(dir) = &args.audio_dir {
        settings.paths.audio_dir = as_string(dir);
    }
    if let Some(dir) = &args.images_dir {
        settings.paths.images_dir = as_string(dir);
    }
    if let Some(path) = &args.output {
        settings.paths.output_file = as_string(path);
    }
    if let Some(dir) = &args.tools_dir {
        settings.paths.tools_dir = as_string(dir);
    }
    if let Some(workers) = args.workers {
        settings.pipeline.workers = workers;
    }
    if args.keep_scratch {
        settings.pipeline.keep_scratch = true;
    }
}

fn print_summary(summary: &RunSummary) {
    println!(
        "Done: {} item(s), {:.2}s of narration",
        summary.items, summary.total_seconds
    );
    if !summary.placeholders.is_empty() {
        let ids: Vec<String> = summary.placeholders.iter().map(|id| id.to_string()).collect();
        println!("Silence used for item(s): {}", ids.join(", "));
    }
    if summary.skipped_records > 0 {
        println!("Skipped narration records: {}", summary.skipped_records);
    }
    println!(
        "Output: {} ({} bytes)",
        summary.output.display(),
        summary.output_bytes
    );
    if let Some(scratch) = &summary.scratch {
        println!("Scratch kept: {}", scratch.display());
    }
}
