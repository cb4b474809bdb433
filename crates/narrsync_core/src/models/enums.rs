//! Core enums used throughout the pipeline.

use serde::{Deserialize, Serialize};

/// PCM sample encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    /// Signed integer samples.
    #[default]
    Int,
    /// IEEE float samples.
    Float,
}

impl SampleFormat {
    /// Short codec-style tag ("s16", "f32", ...).
    pub fn tag(&self, bits: u16) -> String {
        match self {
            SampleFormat::Int => format!("s{}", bits),
            SampleFormat::Float => format!("f{}", bits),
        }
    }
}

impl From<hound::SampleFormat> for SampleFormat {
    fn from(value: hound::SampleFormat) -> Self {
        match value {
            hound::SampleFormat::Int => SampleFormat::Int,
            hound::SampleFormat::Float => SampleFormat::Float,
        }
    }
}

impl From<SampleFormat> for hound::SampleFormat {
    fn from(value: SampleFormat) -> Self {
        match value {
            SampleFormat::Int => hound::SampleFormat::Int,
            SampleFormat::Float => hound::SampleFormat::Float,
        }
    }
}

/// Policy for sizing placeholder silence when an item has no audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderPolicy {
    /// Mean duration of the items that do have audio.
    #[default]
    Mean,
    /// Median duration of the items that do have audio.
    Median,
    /// Always the configured fallback duration.
    Fixed,
}

impl std::fmt::Display for PlaceholderPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaceholderPolicy::Mean => write!(f, "mean"),
            PlaceholderPolicy::Median => write!(f, "median"),
            PlaceholderPolicy::Fixed => write!(f, "fixed"),
        }
    }
}
