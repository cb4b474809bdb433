//! Narration items.

use serde::{Deserialize, Serialize};

/// One beat of spoken content.
///
/// Created by the narration loader and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrationItem {
    /// Unique id; also keys the item's audio file name.
    pub id: i64,
    /// Spoken text, trimmed.
    pub text: String,
}

impl NarrationItem {
    pub fn new(id: i64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}
