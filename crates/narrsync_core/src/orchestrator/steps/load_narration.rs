//! Load narration step - reads and validates the narration records.

use crate::narration::load_narration;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome};

/// Loads narration items in presentation order.
///
/// Bad records are logged and skipped; only a missing file or a file with
/// nothing usable in it stops the run.
pub struct LoadNarrationStep;

impl PipelineStep for LoadNarrationStep {
    fn name(&self) -> &str {
        "Load narration"
    }

    fn description(&self) -> &str {
        "Read narration records into ordered items"
    }

    fn validate_input(&self, ctx: &Context, _state: &RunState) -> StepResult<()> {
        let path = ctx.narration_path();
        if !path.is_file() {
            return Err(StepError::missing_input(format!(
                "narration file not found: {}",
                path.display()
            )));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let path = ctx.narration_path();
        ctx.logger.info(&format!("Reading {}", path.display()));

        let loaded = load_narration(&path)?;
        for skipped in &loaded.skipped {
            ctx.logger.warn(&format!(
                "Skipping narration record #{}: {}",
                skipped.position, skipped.reason
            ));
        }
        if loaded.ids_from_position {
            ctx.logger
                .warn("Record ids missing or duplicated; numbering items by position");
        }

        ctx.logger.info(&format!(
            "Loaded {} narration item(s), {} skipped",
            loaded.items.len(),
            loaded.skipped.len()
        ));
        state.items = loaded.items;
        state.skipped_records = loaded.skipped.len();

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.items.is_empty() {
            return Err(StepError::invalid_output("No narration items loaded"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::fake::FakeToolkit;
    use crate::orchestrator::errors::ErrorKind;
    use crate::orchestrator::fixture::Fixture;
    use std::sync::Arc;

    #[test]
    fn loads_items_and_counts_skips() {
        let fx = Fixture::new();
        fx.narration_json(
            r#"[{"id": 2, "text": "second"}, {"id": 1, "text": "first"}, {"id": 3, "text": "  "}]"#,
        );
        let ctx = fx.context(Arc::new(FakeToolkit::new()));
        let mut state = RunState::new("t");

        LoadNarrationStep.validate_input(&ctx, &state).unwrap();
        LoadNarrationStep.execute(&ctx, &mut state).unwrap();
        LoadNarrationStep.validate_output(&ctx, &state).unwrap();

        let ids: Vec<i64> = state.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(state.skipped_records, 1);
    }

    #[test]
    fn absent_file_is_missing_input() {
        let fx = Fixture::new();
        let ctx = fx.context(Arc::new(FakeToolkit::new()));

        let err = LoadNarrationStep
            .validate_input(&ctx, &RunState::new("t"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingInput);
    }

    #[test]
    fn nothing_usable_is_missing_input() {
        let fx = Fixture::new();
        fx.narration_json(r#"[{"id": 1, "text": ""}]"#);
        let ctx = fx.context(Arc::new(FakeToolkit::new()));

        let err = LoadNarrationStep
            .execute(&ctx, &mut RunState::new("t"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingInput);
    }
}
