//! Preflight step - checks tools, still images and the audio directory
//! before any work starts.

use crate::media::MediaError;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome};
use crate::video::list_images;

/// Fails fast on anything that would make the run pointless: missing media
/// tools, an image directory with nothing usable in it, or no audio
/// directory at all. A present but empty audio directory is fine; every
/// item then gets placeholder silence.
pub struct PreflightStep;

impl PipelineStep for PreflightStep {
    fn name(&self) -> &str {
        "Preflight"
    }

    fn description(&self) -> &str {
        "Check media tools, still images and audio directory"
    }

    fn validate_input(&self, _ctx: &Context, _state: &RunState) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        ctx.logger
            .info(&format!("Checking media tools ({})", ctx.toolkit.name()));
        ctx.toolkit.check_available().map_err(|e| match e {
            MediaError::ToolNotFound(tool) => StepError::ToolUnavailable(tool),
            other => StepError::ToolUnavailable(other.to_string()),
        })?;

        let dir = ctx.images_dir();
        let images = list_images(&dir, &ctx.settings.video.image_extensions)?;
        ctx.logger.info(&format!(
            "Found {} image(s) in {}",
            images.len(),
            dir.display()
        ));
        state.images = images;

        let resolver = ctx.resolver();
        if !resolver.dir().is_dir() {
            return Err(StepError::missing_input(format!(
                "audio directory not found: {}",
                resolver.dir().display()
            )));
        }

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.images.is_empty() {
            return Err(StepError::invalid_output("No images recorded"));
        }
        Ok(())
    }
}
