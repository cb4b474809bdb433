//! Narration loader.
//!
//! Reads a JSON array of records and validates each one into a
//! [`NarrationItem`]. Bad records are skipped with a reason; only a missing
//! source or an empty result is fatal.
//!
//! # Record shape
//!
//! ```json
//! [
//!   {"id": 1, "text": "The station opened in 1925."},
//!   {"id": "2", "caption": "Rebuilt after the flood."}
//! ]
//! ```
//!
//! Text is taken from `text`, then `caption`, then `fact` (first non-blank).
//! Ids may be integers or strings holding integers.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::NarrationItem;

/// Fatal narration loading errors.
#[derive(Error, Debug)]
pub enum NarrationError {
    #[error("Narration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read narration file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Narration file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Narration input must be a JSON array of records")]
    NotAnArray,

    #[error("Narration input has no usable records ({skipped} skipped)")]
    Empty { skipped: usize },
}

/// A record that was dropped during loading.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    /// 1-based position in the input array.
    pub position: usize,
    pub reason: String,
}

/// Result of loading narration records.
#[derive(Debug, Clone)]
pub struct LoadedNarration {
    /// Items in presentation order.
    pub items: Vec<NarrationItem>,
    /// Records that were skipped, in input order.
    pub skipped: Vec<SkippedRecord>,
    /// True if ids were absent or duplicated and input positions were used.
    pub ids_from_position: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    id: Option<RawId>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    caption: Option<String>,
    #[serde(default)]
    fact: Option<String>,
}

/// A record that passed validation, before ordering.
struct Accepted {
    position: usize,
    id: Option<i64>,
    text: String,
}

/// Load narration items from a JSON file.
pub fn load_narration(path: &Path) -> Result<LoadedNarration, NarrationError> {
    if !path.is_file() {
        return Err(NarrationError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).map_err(|source| NarrationError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_narration(&content)
}

/// Parse and validate narration records from JSON text.
pub fn parse_narration(content: &str) -> Result<LoadedNarration, NarrationError> {
    let json: Value = serde_json::from_str(content)?;
    let Value::Array(records) = json else {
        return Err(NarrationError::NotAnArray);
    };

    let mut accepted = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();

    for (i, record) in records.into_iter().enumerate() {
        let position = i + 1;
        match validate_record(record) {
            Ok((id, text)) => accepted.push(Accepted { position, id, text }),
            Err(reason) => {
                tracing::warn!("Skipping narration record {}: {}", position, reason);
                skipped.push(SkippedRecord { position, reason });
            }
        }
    }

    if accepted.is_empty() {
        return Err(NarrationError::Empty {
            skipped: skipped.len(),
        });
    }

    let (items, ids_from_position) = order_items(accepted);
    Ok(LoadedNarration {
        items,
        skipped,
        ids_from_position,
    })
}

fn validate_record(record: Value) -> Result<(Option<i64>, String), String> {
    if !record.is_object() {
        return Err("record is not an object".to_string());
    }
    let raw: RawRecord = serde_json::from_value(record).map_err(|e| e.to_string())?;

    let id = match raw.id {
        None => None,
        Some(RawId::Int(id)) => Some(id),
        Some(RawId::Text(s)) => Some(
            s.trim()
                .parse::<i64>()
                .map_err(|_| format!("id '{}' is not an integer", s))?,
        ),
    };

    let text = [raw.text, raw.caption, raw.fact]
        .into_iter()
        .flatten()
        .map(|t| t.trim().to_string())
        .find(|t| !t.is_empty())
        .ok_or_else(|| "text is empty".to_string())?;

    Ok((id, text))
}

/// Order by id when every record has a unique id, else by input position.
fn order_items(mut accepted: Vec<Accepted>) -> (Vec<NarrationItem>, bool) {
    let mut seen = HashSet::new();
    let ids_usable = accepted
        .iter()
        .all(|a| a.id.is_some_and(|id| seen.insert(id)));

    if ids_usable {
        accepted.sort_by_key(|a| a.id);
        let items = accepted
            .into_iter()
            .map(|a| NarrationItem::new(a.id.unwrap_or_default(), a.text))
            .collect();
        (items, false)
    } else {
        let items = accepted
            .into_iter()
            .map(|a| NarrationItem::new(a.position as i64, a.text))
            .collect();
        (items, true)
    }
}
