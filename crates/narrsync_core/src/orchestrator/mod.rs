//! Pipeline orchestrator for coordinating a narration video run.
//!
//! This module provides the infrastructure for running the multi-step
//! assembly pipeline. A run is a sequence of steps that validate, execute,
//! and record their results in a shared [`RunState`] manifest.
//!
//! # Architecture
//!
//! ```text
//! Pipeline
//!     ├── Step: Preflight        (tools, images)
//!     ├── Step: Load narration
//!     ├── Step: Prepare audio    (normalize / measure / silence, pooled)
//!     ├── Step: Render segments  (pooled)
//!     ├── Step: Concat audio
//!     ├── Step: Concat video
//!     ├── Step: Subtitles
//!     └── Step: Mux
//! ```
//!
//! # Example
//!
//! ```ignore
//! use narrsync_core::orchestrator::run;
//!
//! let summary = run(settings, toolkit, logger, "final_video")?;
//! println!("{} items, {:.1}s", summary.items, summary.total_seconds);
//! ```

mod errors;
#[cfg(test)]
pub(crate) mod fixture;
mod pipeline;
mod pool;
mod step;
pub mod steps;
mod types;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use errors::{ErrorKind, PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{Pipeline, PipelineRunResult};
pub use pool::{with_retry, WorkerPool};
pub use step::PipelineStep;
pub use steps::{
    ConcatAudioStep, ConcatVideoStep, LoadNarrationStep, MuxStep, PreflightStep,
    PrepareAudioStep, RenderSegmentsStep, SubtitlesStep,
};
pub use types::{manifest_path, Context, MergedAudio, MuxOutput, RunState, StepOutcome};

use crate::config::Settings;
use crate::logging::{sanitize_filename, RunLogger};
use crate::media::MediaToolkit;

/// Create a standard pipeline with all steps in the correct order.
///
/// The standard pipeline executes these steps:
/// 1. Preflight - check media tools and images
/// 2. Load narration - read and order narration records
/// 3. Prepare audio - one canonical chunk per item, silence for gaps
/// 4. Render segments - one still-image clip per item
/// 5. Concat audio - join chunks into the narration track
/// 6. Concat video - join segments into one silent video
/// 7. Subtitles - cue timeline and SRT
/// 8. Mux - final MP4 with burned-in captions
pub fn create_standard_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(PreflightStep)
        .with_step(LoadNarrationStep)
        .with_step(PrepareAudioStep)
        .with_step(RenderSegmentsStep)
        .with_step(ConcatAudioStep)
        .with_step(ConcatVideoStep)
        .with_step(SubtitlesStep)
        .with_step(MuxStep)
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_name: String,
    /// Narration items in the video.
    pub items: usize,
    /// Records dropped while loading.
    pub skipped_records: usize,
    /// Items that got placeholder silence.
    pub placeholders: Vec<i64>,
    /// Length of the narration track.
    pub total_seconds: f64,
    pub output: PathBuf,
    pub output_bytes: u64,
    /// Scratch directory, if it was kept.
    pub scratch: Option<PathBuf>,
}

/// Run the standard pipeline once.
///
/// Scratch files live in `<temp_root>/<run_name>/`. A manifest left there
/// by an earlier run lets unchanged segments be reused. On success the
/// scratch directory is removed unless `keep_scratch` is set; on failure it
/// is kept together with the manifest of whatever was finished. A run that
/// fails in preflight or while loading narration writes nothing at all.
pub fn run(
    settings: Settings,
    toolkit: Arc<dyn MediaToolkit>,
    logger: Arc<RunLogger>,
    run_name: &str,
) -> PipelineResult<RunSummary> {
    let work_dir = Path::new(&settings.paths.temp_root).join(sanitize_filename(run_name));
    let manifest = manifest_path(&work_dir);
    let previous = RunState::load(&manifest);
    if let Some(prev) = &previous {
        logger.info(&format!(
            "Found manifest from {} ({} segment(s))",
            prev.started_at.as_deref().unwrap_or("an earlier run"),
            prev.segments.len()
        ));
    }

    let keep_scratch = settings.pipeline.keep_scratch;
    let ctx = Context::new(settings, run_name, work_dir.clone(), Arc::clone(&logger), toolkit)
        .with_previous(previous);
    let mut state = RunState::new(run_name);

    logger.section(&format!("Run '{}'", run_name));
    if let Err(e) = create_standard_pipeline().run(&ctx, &mut state) {
        if state.audio.is_empty() {
            // No audio was recorded; leave any earlier manifest untouched.
            logger.error("Run failed before audio was prepared; no manifest written");
        } else {
            carry_forward_segments(&mut state, ctx.previous.as_ref());
            if let Err(io) = state.save(&manifest) {
                logger.warn(&format!("Could not save manifest: {}", io));
            }
            logger.error(&format!(
                "Run failed; scratch kept in {}",
                work_dir.display()
            ));
        }
        logger.flush();
        return Err(e);
    }

    let output = state
        .output
        .clone()
        .ok_or_else(|| PipelineError::validation_failed(run_name, "no output recorded"))?;

    let scratch = if keep_scratch {
        if let Err(io) = state.save(&manifest) {
            logger.warn(&format!("Could not save manifest: {}", io));
        }
        logger.info(&format!("Scratch kept in {}", work_dir.display()));
        Some(work_dir)
    } else {
        if let Err(io) = fs::remove_dir_all(&work_dir) {
            logger.warn(&format!(
                "Could not remove scratch {}: {}",
                work_dir.display(),
                io
            ));
        }
        None
    };

    let summary = RunSummary {
        run_name: run_name.to_string(),
        items: state.items.len(),
        skipped_records: state.skipped_records,
        placeholders: state.placeholder_ids(),
        total_seconds: state.total_duration(),
        output: output.path,
        output_bytes: output.size_bytes,
        scratch,
    };
    logger.success(&format!(
        "{} item(s), {:.2}s -> {}",
        summary.items,
        summary.total_seconds,
        summary.output.display()
    ));
    logger.flush();
    Ok(summary)
}

/// Keep fingerprints of segments an earlier run rendered and this one never
/// got to, so the next attempt can still reuse them.
fn carry_forward_segments(state: &mut RunState, previous: Option<&RunState>) {
    let Some(previous) = previous else {
        return;
    };
    for segment in &previous.segments {
        if !state.segments.iter().any(|s| s.item_id == segment.item_id) {
            state.segments.push(segment.clone());
        }
    }
}
