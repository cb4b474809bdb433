//! Render segments step - one still-image clip per item.
//!
//! Clip lengths come from the cumulative audio timeline so the joined video
//! stays within half a frame of the narration track. Segments whose
//! fingerprint matches the previous run's manifest are kept as they are.

use std::collections::HashSet;
use std::fs;

use super::{log_failure, log_report};
use crate::media::MediaError;
use crate::models::VideoSegment;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::pool::WorkerPool;
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome};
use crate::video::SegmentRequest;

pub struct RenderSegmentsStep;

impl PipelineStep for RenderSegmentsStep {
    fn name(&self) -> &str {
        "Render segments"
    }

    fn description(&self) -> &str {
        "Render one faded still-image clip per narration item"
    }

    fn validate_input(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.images.is_empty() {
            return Err(StepError::missing_input("no usable images"));
        }
        if state.audio.is_empty() || state.audio.len() != state.items.len() {
            return Err(StepError::precondition_failed(
                "audio must be prepared for every item",
            ));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let planner = ctx.segment_planner();
        let requests = planner.plan(&state.audio, &state.images, &ctx.work_dir)?;
        let fingerprints: Vec<String> = requests.iter().map(|r| r.fingerprint()).collect();
        let previous = ctx.previous_fingerprints();

        let to_render: Vec<SegmentRequest> = requests
            .iter()
            .zip(&fingerprints)
            .filter(|(request, fingerprint)| {
                let unchanged = previous.get(&request.item_id) == Some(*fingerprint);
                let on_disk = fs::metadata(&request.output_path)
                    .map(|m| m.len() > 0)
                    .unwrap_or(false);
                !(unchanged && on_disk)
            })
            .map(|(request, _)| request.clone())
            .collect();

        ctx.logger.info(&format!(
            "{} segment(s) at {}: {} to render, {} reused",
            requests.len(),
            planner.frame(),
            to_render.len(),
            requests.len() - to_render.len()
        ));

        let mut failure: Option<StepError> = None;
        let mut failed_ids = HashSet::new();
        if !to_render.is_empty() {
            let pool = WorkerPool::new(
                ctx.settings.pipeline.worker_count(),
                ctx.settings.pipeline.retries,
            )?;
            let results = pool.map(
                &ctx.logger,
                "Segments",
                &to_render,
                |request| ctx.toolkit.render_segment(request),
                |e: &MediaError| !e.is_structural(),
            );

            for (request, result) in to_render.iter().zip(results) {
                match result {
                    Ok(report) => {
                        log_report(&ctx.logger, &report);
                        ctx.logger.item(
                            request.item_id,
                            &format!(
                                "{} frames from {}",
                                request.frame_count,
                                request.image_path.display()
                            ),
                        );
                    }
                    Err(e) => {
                        log_failure(&ctx.logger, &e);
                        ctx.logger
                            .item_warn(request.item_id, &format!("render failed: {}", e));
                        failed_ids.insert(request.item_id);
                        if failure.is_none() {
                            failure = Some(StepError::media_for(request.item_id, e));
                        }
                    }
                }
            }
        }

        // Record everything on disk, even after a failure, so a re-run can
        // reuse it.
        state.segments = requests
            .into_iter()
            .zip(fingerprints)
            .zip(&state.audio)
            .filter(|((request, _), _)| !failed_ids.contains(&request.item_id))
            .map(|((request, fingerprint), asset)| VideoSegment {
                item_id: request.item_id,
                image_path: request.image_path,
                duration_seconds: asset.duration_seconds,
                output_path: request.output_path,
                frame_count: request.frame_count,
                frame: request.frame,
                fingerprint,
            })
            .collect();

        if let Some(err) = failure {
            return Err(err);
        }
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.segments.len() != state.audio.len() {
            return Err(StepError::invalid_output(format!(
                "{} segments for {} audio chunks",
                state.segments.len(),
                state.audio.len()
            )));
        }
        if let Some(empty) = state.segments.iter().find(|s| s.frame_count == 0) {
            return Err(StepError::invalid_output(format!(
                "segment for item {} has no frames",
                empty.item_id
            )));
        }

        let frame = ctx.segment_planner().frame();
        let frames: u64 = state.segments.iter().map(|s| s.frame_count).sum();
        let drift = frame.duration_of(frames) - state.total_duration();
        if drift.abs() > frame.frame_duration() / 2.0 + 1e-9 {
            ctx.logger.warn(&format!(
                "video runs {:+.3}s against the narration (very short items)",
                drift
            ));
        }
        Ok(())
    }
}
