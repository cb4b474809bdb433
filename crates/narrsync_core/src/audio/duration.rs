//! Duration oracle and placeholder estimators.
//!
//! Durations of present audio come from an ordered list of
//! [`DurationStrategy`]s; the first one that resolves wins. Durations of
//! missing audio come from a [`PlaceholderEstimator`] applied to the
//! durations of everything that is present.

use std::path::Path;
use std::sync::Arc;

use crate::media::wav;
use crate::media::MediaToolkit;
use crate::models::PlaceholderPolicy;

/// Answer of one duration strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum DurationVerdict {
    Resolved(f64),
    /// The strategy could not tell; the reason is kept for diagnostics.
    Declined(String),
}

/// One way of finding out how long an audio file is.
pub trait DurationStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve(&self, path: &Path) -> DurationVerdict;
}

/// Exact duration from the WAV header (frames / sample rate).
pub struct WavHeaderStrategy;

impl DurationStrategy for WavHeaderStrategy {
    fn name(&self) -> &'static str {
        "wav-header"
    }

    fn resolve(&self, path: &Path) -> DurationVerdict {
        match wav::read_info(path) {
            Ok(info) => DurationVerdict::Resolved(info.duration_seconds()),
            Err(e) => DurationVerdict::Declined(e.to_string()),
        }
    }
}

/// Container duration reported by the media toolkit's prober.
pub struct ProbeStrategy {
    toolkit: Arc<dyn MediaToolkit>,
}

impl ProbeStrategy {
    pub fn new(toolkit: Arc<dyn MediaToolkit>) -> Self {
        Self { toolkit }
    }
}

impl DurationStrategy for ProbeStrategy {
    fn name(&self) -> &'static str {
        "probe"
    }

    fn resolve(&self, path: &Path) -> DurationVerdict {
        match self.toolkit.probe_duration(path) {
            Ok(Some(d)) => DurationVerdict::Resolved(d),
            Ok(None) => DurationVerdict::Declined("no duration reported".to_string()),
            Err(e) => DurationVerdict::Declined(e.to_string()),
        }
    }
}

/// Ordered chain of duration strategies.
pub struct DurationOracle {
    strategies: Vec<Box<dyn DurationStrategy>>,
}

impl DurationOracle {
    pub fn new(strategies: Vec<Box<dyn DurationStrategy>>) -> Self {
        Self { strategies }
    }

    /// WAV header first, then the toolkit's prober.
    pub fn standard(toolkit: Arc<dyn MediaToolkit>) -> Self {
        Self::new(vec![
            Box::new(WavHeaderStrategy),
            Box::new(ProbeStrategy::new(toolkit)),
        ])
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Resolve the duration of `path`.
    ///
    /// Returns the duration and the name of the strategy that produced it,
    /// or every strategy's reason for declining.
    pub fn resolve(&self, path: &Path) -> Result<(f64, &'static str), Vec<String>> {
        let mut reasons = Vec::new();
        for strategy in &self.strategies {
            match strategy.resolve(path) {
                DurationVerdict::Resolved(d) if d.is_finite() && d > 0.0 => {
                    return Ok((d, strategy.name()));
                }
                DurationVerdict::Resolved(d) => {
                    reasons.push(format!("{}: unusable duration {}", strategy.name(), d));
                }
                DurationVerdict::Declined(reason) => {
                    reasons.push(format!("{}: {}", strategy.name(), reason));
                }
            }
        }
        Err(reasons)
    }
}

/// Sizes placeholder silence from the durations of present items.
pub trait PlaceholderEstimator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Estimate a duration, or `None` if `present` gives nothing to go on.
    fn estimate(&self, present: &[f64]) -> Option<f64>;
}

/// Arithmetic mean of the present durations.
pub struct MeanEstimator;

impl PlaceholderEstimator for MeanEstimator {
    fn name(&self) -> &'static str {
        "mean"
    }

    fn estimate(&self, present: &[f64]) -> Option<f64> {
        if present.is_empty() {
            return None;
        }
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}

/// Median of the present durations (mean of the middle two for even counts).
pub struct MedianEstimator;

impl PlaceholderEstimator for MedianEstimator {
    fn name(&self) -> &'static str {
        "median"
    }

    fn estimate(&self, present: &[f64]) -> Option<f64> {
        if present.is_empty() {
            return None;
        }
        let mut sorted = present.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            Some((sorted[mid - 1] + sorted[mid]) / 2.0)
        } else {
            Some(sorted[mid])
        }
    }
}

/// Always the same duration.
pub struct FixedEstimator(pub f64);

impl PlaceholderEstimator for FixedEstimator {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn estimate(&self, _present: &[f64]) -> Option<f64> {
        Some(self.0)
    }
}

/// Create the estimator for a policy.
pub fn get_estimator(policy: PlaceholderPolicy, fallback: f64) -> Box<dyn PlaceholderEstimator> {
    match policy {
        PlaceholderPolicy::Mean => Box::new(MeanEstimator),
        PlaceholderPolicy::Median => Box::new(MedianEstimator),
        PlaceholderPolicy::Fixed => Box::new(FixedEstimator(fallback)),
    }
}

/// Placeholder duration: the estimate when usable, else `fallback`.
pub fn placeholder_duration(
    estimator: &dyn PlaceholderEstimator,
    present: &[f64],
    fallback: f64,
) -> f64 {
    estimator
        .estimate(present)
        .filter(|d| d.is_finite() && *d > 0.0)
        .unwrap_or(fallback)
}
