//! Concat audio step - joins the item chunks into the narration track.

use crate::audio::concat_audio;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, MergedAudio, RunState, StepOutcome};

pub struct ConcatAudioStep;

impl PipelineStep for ConcatAudioStep {
    fn name(&self) -> &str {
        "Concat audio"
    }

    fn description(&self) -> &str {
        "Join audio chunks in item order without gaps"
    }

    fn validate_input(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.audio.is_empty() {
            return Err(StepError::precondition_failed("No audio chunks prepared"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let format = ctx.settings.audio.format();
        let path = ctx.merged_audio_path();
        let summary = concat_audio(&state.audio, &format, &path)?;

        ctx.logger.info(&format!(
            "Joined {} chunk(s): {} frames, {:.3}s",
            summary.chunks, summary.frames, summary.duration_seconds
        ));
        state.merged_audio = Some(MergedAudio {
            path,
            frames: summary.frames,
            duration_seconds: summary.duration_seconds,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        let merged = state
            .merged_audio
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Merged audio not recorded"))?;

        let expected: u64 = state.audio.iter().map(|a| a.frames).sum();
        if merged.frames != expected {
            return Err(StepError::invalid_output(format!(
                "merged track has {} frames, chunks add up to {}",
                merged.frames, expected
            )));
        }
        Ok(())
    }
}
