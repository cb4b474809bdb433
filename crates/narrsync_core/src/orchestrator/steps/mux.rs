//! Mux step - combines video, narration and burned-in captions.

use std::fs;

use super::{log_failure, log_report};
use crate::mux::{format_args_pretty, MuxArgsBuilder, MuxRequest};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, MuxOutput, RunState, StepOutcome};

/// Produces the deliverable through the media toolkit's muxer.
///
/// Output length is the shorter of the two tracks, which the frame-accurate
/// segment plan keeps within half a frame of the narration.
pub struct MuxStep;

impl MuxStep {
    fn request(ctx: &Context, state: &RunState) -> StepResult<MuxRequest> {
        let video = state
            .concat_video
            .clone()
            .ok_or_else(|| StepError::precondition_failed("No joined video"))?;
        let audio = state
            .merged_audio
            .as_ref()
            .map(|m| m.path.clone())
            .ok_or_else(|| StepError::precondition_failed("No merged audio"))?;
        let captions = state
            .captions
            .clone()
            .ok_or_else(|| StepError::precondition_failed("No captions"))?;

        Ok(MuxRequest::new(
            video,
            audio,
            captions,
            ctx.output_path.clone(),
            &ctx.settings,
        ))
    }
}

impl PipelineStep for MuxStep {
    fn name(&self) -> &str {
        "Mux"
    }

    fn description(&self) -> &str {
        "Encode the final MP4 with narration and burned-in captions"
    }

    fn validate_input(&self, ctx: &Context, state: &RunState) -> StepResult<()> {
        let request = Self::request(ctx, state)?;
        for input in [&request.video, &request.audio, &request.subtitles] {
            if !input.exists() {
                return Err(StepError::precondition_failed(format!(
                    "mux input missing: {}",
                    input.display()
                )));
            }
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let request = Self::request(ctx, state)?;
        ctx.logger
            .info(&format!("Output: {}", request.output.display()));
        if ctx.settings.logging.show_commands {
            let tokens = MuxArgsBuilder::new(&request).build(&request.output);
            ctx.logger.debug(&format_args_pretty(&tokens));
        }

        let report = ctx.toolkit.mux(&request).map_err(|e| {
            log_failure(&ctx.logger, &e);
            StepError::from(e)
        })?;
        log_report(&ctx.logger, &report);

        let size_bytes = fs::metadata(&request.output)
            .map(|m| m.len())
            .map_err(|e| StepError::io_error("reading output metadata", e))?;
        ctx.logger.success(&format!(
            "Muxed {} ({} bytes)",
            request
                .output
                .file_name()
                .unwrap_or_default()
                .to_string_lossy(),
            size_bytes
        ));

        state.output = Some(MuxOutput {
            path: request.output,
            size_bytes,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        let output = state
            .output
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Mux results not recorded"))?;

        if output.size_bytes == 0 || !output.path.exists() {
            return Err(StepError::invalid_output(format!(
                "Output file missing or empty: {}",
                output.path.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::fake::FakeToolkit;
    use crate::orchestrator::fixture::Fixture;
    use crate::orchestrator::types::MergedAudio;
    use std::sync::Arc;

    fn ready_state(fx: &Fixture) -> RunState {
        let work = fx.work_dir();
        fs::create_dir_all(&work).unwrap();
        for name in ["video_concat.mp4", "narration_merged.wav", "captions.srt"] {
            fs::write(work.join(name), "x").unwrap();
        }
        let mut state = RunState::new("t");
        state.concat_video = Some(work.join("video_concat.mp4"));
        state.merged_audio = Some(MergedAudio {
            path: work.join("narration_merged.wav"),
            frames: 1,
            duration_seconds: 1.0 / 44_100.0,
        });
        state.captions = Some(work.join("captions.srt"));
        state
    }

    #[test]
    fn writes_output_with_configured_style() {
        let mut fx = Fixture::new();
        fx.settings.subtitles.font_size = 28;
        let toolkit = Arc::new(FakeToolkit::new());
        let ctx = fx.context(toolkit.clone());
        let mut state = ready_state(&fx);

        MuxStep.validate_input(&ctx, &state).unwrap();
        MuxStep.execute(&ctx, &mut state).unwrap();
        MuxStep.validate_output(&ctx, &state).unwrap();

        let output = state.output.as_ref().unwrap();
        assert_eq!(output.path, fx.output_path());
        assert!(output.size_bytes > 0);

        let muxes = toolkit.muxes();
        assert_eq!(muxes.len(), 1);
        assert!(muxes[0].style.force_style().contains("FontSize=28"));
        assert_eq!(muxes[0].audio_bitrate, "192k");
    }

    #[test]
    fn missing_captions_fail_validation() {
        let fx = Fixture::new();
        let ctx = fx.context(Arc::new(FakeToolkit::new()));
        let mut state = ready_state(&fx);
        state.captions = None;

        assert!(MuxStep.validate_input(&ctx, &state).is_err());
    }
}
