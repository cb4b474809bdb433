//! Prepare audio step - gives every item exactly one canonical chunk.
//!
//! Present narration is normalized and measured on the worker pool. Items
//! whose audio is missing or unusable get placeholder silence sized by the
//! configured estimator from the items that are present.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::log_report;
use crate::audio::{
    normalize, placeholder_duration, synthesize_silence, AudioError, AudioResolver,
    DurationOracle, Resolution,
};
use crate::models::{AudioAsset, AudioFormat, NarrationItem};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::pool::WorkerPool;
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome};

/// Result of looking at one item's narration file.
enum Measured {
    Present(AudioAsset),
    Missing,
}

pub struct PrepareAudioStep;

impl PrepareAudioStep {
    /// Resolve, normalize and measure one item.
    fn measure(
        ctx: &Context,
        resolver: &AudioResolver,
        oracle: &DurationOracle,
        format: &AudioFormat,
        item: &NarrationItem,
    ) -> Result<Measured, AudioError> {
        let source = match resolver.resolve(item) {
            Resolution::Found(path) => path,
            Resolution::Missing => return Ok(Measured::Missing),
        };

        let output = ctx.normalized_path(item.id);
        let normalized = normalize(ctx.toolkit.as_ref(), &source, &output, format)?;
        if let Some(report) = &normalized.report {
            log_report(&ctx.logger, report);
        }

        let (seconds, strategy) =
            oracle
                .resolve(&output)
                .map_err(|reasons| AudioError::NoDuration {
                    path: output.clone(),
                    reasons,
                })?;

        ctx.logger.item(
            item.id,
            &format!(
                "{} -> {:.3}s via {}{}",
                file_name(&source),
                seconds,
                strategy,
                if normalized.reused { " (reused)" } else { "" }
            ),
        );
        let frames = format.frames_for(seconds);
        Ok(Measured::Present(AudioAsset::new(
            item.id, output, format, frames, false,
        )))
    }
}

impl PipelineStep for PrepareAudioStep {
    fn name(&self) -> &str {
        "Prepare audio"
    }

    fn description(&self) -> &str {
        "Normalize narration audio and synthesize silence for missing items"
    }

    fn validate_input(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.items.is_empty() {
            return Err(StepError::precondition_failed("No narration items loaded"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let format = ctx.settings.audio.format();
        let resolver = ctx.resolver();
        let oracle = DurationOracle::standard(Arc::clone(&ctx.toolkit));
        let pool = WorkerPool::new(
            ctx.settings.pipeline.worker_count(),
            ctx.settings.pipeline.retries,
        )?;
        fs::create_dir_all(&ctx.work_dir)
            .map_err(|e| StepError::io_error("creating scratch directory", e))?;

        ctx.logger.info(&format!(
            "Looking for narration in {} ({} workers, canonical {})",
            resolver.dir().display(),
            pool.workers(),
            format
        ));
        ctx.logger.debug(&format!(
            "Duration strategies: {}",
            oracle.strategy_names().join(" > ")
        ));

        let measured = pool.map(
            &ctx.logger,
            "Normalize",
            &state.items,
            |item| Self::measure(ctx, &resolver, &oracle, &format, item),
            AudioError::is_retryable,
        );

        let mut slots: Vec<Option<AudioAsset>> = Vec::with_capacity(state.items.len());
        for (item, result) in state.items.iter().zip(measured) {
            match result {
                Ok(Measured::Present(asset)) => slots.push(Some(asset)),
                Ok(Measured::Missing) => {
                    ctx.logger.item_warn(
                        item.id,
                        &format!(
                            "no narration audio ({}.*), using silence",
                            resolver.stem(item.id)
                        ),
                    );
                    slots.push(None);
                }
                Err(e) if e.is_tool_missing() => return Err(e.into()),
                Err(e) => {
                    ctx.logger
                        .item_warn(item.id, &format!("unusable audio, using silence: {}", e));
                    slots.push(None);
                }
            }
        }

        // (slot index, item id) of everything that needs silence
        let missing: Vec<(usize, i64)> = slots
            .iter()
            .zip(&state.items)
            .enumerate()
            .filter(|(_, (slot, _))| slot.is_none())
            .map(|(k, (_, item))| (k, item.id))
            .collect();

        if !missing.is_empty() {
            let present: Vec<f64> = slots.iter().flatten().map(|a| a.duration_seconds).collect();
            let fallback = ctx.settings.pipeline.fallback_duration_secs;
            let seconds = placeholder_duration(ctx.estimator.as_ref(), &present, fallback);
            ctx.logger.info(&format!(
                "{} item(s) without audio; placeholder {:.3}s ({} of {} present)",
                missing.len(),
                seconds,
                ctx.estimator.name(),
                present.len()
            ));

            let written = pool.map(
                &ctx.logger,
                "Silence",
                &missing,
                |(_, id)| synthesize_silence(&ctx.silence_path(*id), &format, seconds),
                AudioError::is_retryable,
            );

            for (&(k, id), result) in missing.iter().zip(written) {
                let silence = result.map_err(|e| match e {
                    AudioError::Media(m) => StepError::media_for(id, m),
                    other => StepError::from(other),
                })?;
                state.placeholder_seconds = Some(silence.duration_seconds);
                slots[k] = Some(AudioAsset::new(
                    id,
                    ctx.silence_path(id),
                    &format,
                    silence.frames,
                    true,
                ));
            }
        }

        let audio = slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| StepError::other("an item was left without audio"))?;
        state.audio = audio;

        ctx.logger.info(&format!(
            "{} chunk(s), {} placeholder(s), {:.3}s total",
            state.audio.len(),
            state.placeholder_ids().len(),
            state.total_duration()
        ));
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.audio.len() != state.items.len() {
            return Err(StepError::invalid_output(format!(
                "{} audio chunks for {} items",
                state.audio.len(),
                state.items.len()
            )));
        }
        for (item, asset) in state.items.iter().zip(&state.audio) {
            if item.id != asset.item_id {
                return Err(StepError::invalid_output(format!(
                    "audio for item {} recorded in place of item {}",
                    asset.item_id, item.id
                )));
            }
            if asset.frames == 0 || !asset.path.exists() {
                return Err(StepError::invalid_output(format!(
                    "audio chunk for item {} is empty or missing",
                    item.id
                )));
            }
        }
        Ok(())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::fake::FakeToolkit;
    use crate::models::PlaceholderPolicy;
    use crate::orchestrator::fixture::Fixture;

    fn items(ids: &[i64]) -> Vec<NarrationItem> {
        ids.iter()
            .map(|&id| NarrationItem::new(id, format!("fact {}", id)))
            .collect()
    }

    fn run(fx: &Fixture, toolkit: Arc<FakeToolkit>, ids: &[i64]) -> RunState {
        let ctx = fx.context(toolkit);
        let mut state = RunState::new("t");
        state.items = items(ids);
        PrepareAudioStep.validate_input(&ctx, &state).unwrap();
        PrepareAudioStep.execute(&ctx, &mut state).unwrap();
        PrepareAudioStep.validate_output(&ctx, &state).unwrap();
        state
    }

    #[test]
    fn present_audio_keeps_exact_durations() {
        let fx = Fixture::new();
        fx.audio(1, 2.0);
        fx.audio(2, 3.5);
        fx.audio(3, 1.0);

        let state = run(&fx, Arc::new(FakeToolkit::new()), &[1, 2, 3]);
        assert_eq!(state.durations(), vec![2.0, 3.5, 1.0]);
        assert!(state.placeholder_ids().is_empty());
        assert_eq!(state.placeholder_seconds, None);
        assert!(state.audio[1].path.ends_with("norm_002.wav"));
    }

    #[test]
    fn missing_item_gets_mean_of_present() {
        let fx = Fixture::new();
        fx.audio(1, 2.0);
        fx.audio(3, 1.0);

        let state = run(&fx, Arc::new(FakeToolkit::new()), &[1, 2, 3]);
        assert_eq!(state.placeholder_ids(), vec![2]);
        assert_eq!(state.placeholder_seconds, Some(1.5));

        let silence = &state.audio[1];
        assert!(silence.is_placeholder);
        assert_eq!(silence.frames, 66_150);
        assert_eq!(silence.duration_seconds, 1.5);
        assert!(silence.path.ends_with("silence_002.wav"));
    }

    #[test]
    fn nothing_present_uses_fixed_fallback() {
        let mut fx = Fixture::new();
        fx.settings.pipeline.fallback_duration_secs = 2.5;

        let state = run(&fx, Arc::new(FakeToolkit::new()), &[1, 2]);
        assert_eq!(state.durations(), vec![2.5, 2.5]);
        assert_eq!(state.placeholder_ids(), vec![1, 2]);
    }

    #[test]
    fn median_policy_is_honoured() {
        let mut fx = Fixture::new();
        fx.settings.pipeline.placeholder_policy = PlaceholderPolicy::Median;
        fx.audio(1, 1.0);
        fx.audio(2, 1.5);
        fx.audio(3, 5.0);

        let state = run(&fx, Arc::new(FakeToolkit::new()), &[1, 2, 3, 4]);
        assert_eq!(state.audio[3].duration_seconds, 1.5);
    }

    #[test]
    fn corrupt_audio_is_retried_then_demoted() {
        let fx = Fixture::new();
        fx.audio(1, 2.0);
        fs::write(fx.audio_path(2, "mp3"), b"definitely not audio").unwrap();
        fx.audio(3, 1.0);
        let toolkit = Arc::new(FakeToolkit::new());

        let state = run(&fx, Arc::clone(&toolkit), &[1, 2, 3]);
        assert_eq!(state.placeholder_ids(), vec![2]);
        assert_eq!(state.audio[1].duration_seconds, 1.5);
        assert_eq!(toolkit.call_count("normalize narration_02.mp3"), 2);
    }

    #[test]
    fn transient_failure_succeeds_on_retry() {
        let fx = Fixture::new();
        fx.audio(1, 2.0);
        let toolkit = Arc::new(FakeToolkit::new().fail_on("narration_01.wav", 1));

        let state = run(&fx, Arc::clone(&toolkit), &[1]);
        assert!(!state.audio[0].is_placeholder);
        assert_eq!(state.audio[0].duration_seconds, 2.0);
        assert_eq!(toolkit.call_count("normalize narration_01.wav"), 2);
    }

    #[test]
    fn non_canonical_source_is_converted() {
        let fx = Fixture::new();
        let mono = AudioFormat {
            sample_rate: 22_050,
            channels: 1,
            ..AudioFormat::canonical()
        };
        fx.audio_in(1, &mono, 2.0);

        let state = run(&fx, Arc::new(FakeToolkit::new()), &[1]);
        assert_eq!(state.audio[0].sample_rate, 44_100);
        assert_eq!(state.audio[0].channels, 2);
        assert_eq!(state.audio[0].duration_seconds, 2.0);
    }

    #[test]
    fn rerun_reuses_normalized_chunks() {
        let fx = Fixture::new();
        fx.audio(1, 2.0);
        let toolkit = Arc::new(FakeToolkit::new());

        run(&fx, Arc::clone(&toolkit), &[1]);
        run(&fx, Arc::clone(&toolkit), &[1]);
        assert_eq!(toolkit.call_count("normalize"), 1);
    }
}
