//! Subtitles step - builds the caption timeline and writes it as SRT.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome};
use crate::subtitles::{build_cues, write_srt_file, TimelineOptions};

/// One cue per item, timed from the audio durations alone.
pub struct SubtitlesStep;

impl PipelineStep for SubtitlesStep {
    fn name(&self) -> &str {
        "Subtitles"
    }

    fn description(&self) -> &str {
        "Build caption cues from item durations and write SRT"
    }

    fn validate_input(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.audio.len() != state.items.len() || state.items.is_empty() {
            return Err(StepError::precondition_failed(
                "durations must be known for every item",
            ));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let options = TimelineOptions::from(&ctx.settings.subtitles);
        ctx.logger.debug(&format!(
            "Cue gap {:.3}s, wrap at {} chars",
            options.gap_seconds, options.wrap_width
        ));
        let cues = build_cues(&state.items, &state.durations(), &options);

        let path = ctx.captions_path();
        write_srt_file(&cues, &path).map_err(|e| StepError::io_error("writing captions", e))?;
        ctx.logger
            .info(&format!("Wrote {} cue(s) to {}", cues.len(), path.display()));

        state.cues = cues;
        state.captions = Some(path);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.cues.len() != state.items.len() {
            return Err(StepError::invalid_output(format!(
                "{} cues for {} items",
                state.cues.len(),
                state.items.len()
            )));
        }
        for pair in state.cues.windows(2) {
            if pair[0].end_seconds > pair[1].start_seconds {
                return Err(StepError::invalid_output(format!(
                    "cue {} overlaps cue {}",
                    pair[0].index, pair[1].index
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::fake::FakeToolkit;
    use crate::models::{AudioAsset, AudioFormat, NarrationItem};
    use crate::orchestrator::fixture::Fixture;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;

    #[test]
    fn cues_follow_durations_and_srt_is_written() {
        let fx = Fixture::new();
        let ctx = fx.context(Arc::new(FakeToolkit::new()));
        let fmt = AudioFormat::canonical();
        let mut state = RunState::new("t");
        for (id, seconds) in [(1, 2.0), (2, 3.5), (3, 1.0)] {
            state.items.push(NarrationItem::new(id, format!("Fact number {}", id)));
            state.audio.push(AudioAsset::new(
                id,
                PathBuf::from("x.wav"),
                &fmt,
                fmt.frames_for(seconds),
                false,
            ));
        }

        SubtitlesStep.validate_input(&ctx, &state).unwrap();
        SubtitlesStep.execute(&ctx, &mut state).unwrap();
        SubtitlesStep.validate_output(&ctx, &state).unwrap();

        let bounds: Vec<(f64, f64)> = state
            .cues
            .iter()
            .map(|c| {
                (
                    (c.start_seconds * 100.0).round() / 100.0,
                    (c.end_seconds * 100.0).round() / 100.0,
                )
            })
            .collect();
        assert_eq!(bounds, vec![(0.0, 1.96), (2.0, 5.46), (5.5, 6.46)]);

        let srt = fs::read_to_string(state.captions.as_ref().unwrap()).unwrap();
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:01,960\nFact number 1\n"));
        assert!(srt.contains("00:00:05,500 --> 00:00:06,460"));
    }
}
