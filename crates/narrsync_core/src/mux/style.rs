//! Caption burn-in style.

use crate::config::SubtitleSettings;

/// ASS style overrides applied by the `subtitles` filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleStyle {
    pub font_name: String,
    pub font_size: u32,
    pub primary_colour: String,
    pub outline_colour: String,
    pub border_style: u32,
    pub outline: u32,
    pub shadow: u32,
    pub alignment: u32,
    pub margin_v: u32,
}

impl SubtitleStyle {
    /// `Key=Value` list for `force_style`.
    pub fn force_style(&self) -> String {
        [
            format!("FontName={}", self.font_name),
            format!("FontSize={}", self.font_size),
            format!("PrimaryColour={}", self.primary_colour),
            format!("OutlineColour={}", self.outline_colour),
            format!("BorderStyle={}", self.border_style),
            format!("Outline={}", self.outline),
            format!("Shadow={}", self.shadow),
            format!("Alignment={}", self.alignment),
            format!("MarginV={}", self.margin_v),
        ]
        .join(",")
    }
}

impl From<&SubtitleSettings> for SubtitleStyle {
    fn from(s: &SubtitleSettings) -> Self {
        Self {
            font_name: s.font_name.clone(),
            font_size: s.font_size,
            primary_colour: s.primary_colour.clone(),
            outline_colour: s.outline_colour.clone(),
            border_style: s.border_style,
            outline: s.outline,
            shadow: s.shadow,
            alignment: s.alignment,
            margin_v: s.margin_v,
        }
    }
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self::from(&SubtitleSettings::default())
    }
}
