//! Concat video step - stream-copies the segments into one silent video.

use super::{log_failure, log_report};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome};
use crate::video::{check_segments, write_concat_list};

pub struct ConcatVideoStep;

impl PipelineStep for ConcatVideoStep {
    fn name(&self) -> &str {
        "Concat video"
    }

    fn description(&self) -> &str {
        "Join rendered segments in item order (stream copy)"
    }

    fn validate_input(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.segments.is_empty() {
            return Err(StepError::precondition_failed("No segments rendered"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        check_segments(&state.segments, &ctx.segment_planner().frame())?;

        let list = ctx.concat_list_path();
        write_concat_list(&state.segments, &list)?;

        let output = ctx.concat_video_path();
        let report = ctx.toolkit.concat_video(&list, &output).map_err(|e| {
            log_failure(&ctx.logger, &e);
            StepError::from(e)
        })?;
        log_report(&ctx.logger, &report);

        ctx.logger.info(&format!(
            "Joined {} segment(s) into {}",
            state.segments.len(),
            output.display()
        ));
        state.concat_video = Some(output);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        match &state.concat_video {
            Some(path) if path.exists() => Ok(()),
            Some(path) => Err(StepError::invalid_output(format!(
                "joined video not created: {}",
                path.display()
            ))),
            None => Err(StepError::invalid_output("Joined video not recorded")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::fake::FakeToolkit;
    use crate::models::{FrameSpec, VideoSegment};
    use crate::orchestrator::errors::ErrorKind;
    use crate::orchestrator::fixture::Fixture;
    use std::fs;
    use std::sync::Arc;

    fn segment(fx: &Fixture, id: i64, frame: FrameSpec) -> VideoSegment {
        let output_path = fx.work_dir().join(format!("seg_{:03}.mp4", id));
        fs::write(&output_path, format!("<{}>", id)).unwrap();
        VideoSegment {
            item_id: id,
            image_path: fx.root().join("images/img_01.png"),
            duration_seconds: 1.0,
            output_path,
            frame_count: 30,
            frame,
            fingerprint: String::new(),
        }
    }

    #[test]
    fn joins_segments_in_order() {
        let fx = Fixture::new();
        let toolkit = Arc::new(FakeToolkit::new());
        let ctx = fx.context(toolkit.clone());
        let mut state = RunState::new("t");
        state.segments = (1..=3)
            .map(|id| segment(&fx, id, FrameSpec::default()))
            .collect();

        ConcatVideoStep.execute(&ctx, &mut state).unwrap();
        ConcatVideoStep.validate_output(&ctx, &state).unwrap();

        let joined = fs::read_to_string(state.concat_video.as_ref().unwrap()).unwrap();
        assert_eq!(joined, "<1><2><3>");
        assert_eq!(toolkit.calls(), vec!["concat video_concat.mp4"]);
    }

    #[test]
    fn mismatched_segment_stops_before_joining() {
        let fx = Fixture::new();
        let toolkit = Arc::new(FakeToolkit::new());
        let ctx = fx.context(toolkit.clone());
        let mut state = RunState::new("t");
        state.segments = vec![
            segment(&fx, 1, FrameSpec::default()),
            segment(&fx, 2, FrameSpec::new(1920, 1080, 30)),
        ];

        let err = ConcatVideoStep.execute(&ctx, &mut state).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InternalFormatMismatch);
        assert!(err.to_string().contains("1920x1080@30"));
        assert!(toolkit.calls().is_empty());
    }
}
