//! Previous-performance snapshot loader.
//!
//! The engine consumes prior sets and template ranges as read-only
//! input; the host loads them from a JSON file produced by whatever
//! owns the workout history (database sync, another tool, a manual
//! export).

use crate::types::{ExerciseTemplate, PreviousSet};
use crate::Result;
use serde::Deserialize;
use std::path::Path;

/// Exercise history file format
#[derive(Debug, Deserialize, Default)]
pub struct ExerciseHistory {
    /// Template rep/RIR ranges, if the exercise defines them
    #[serde(default)]
    pub template: Option<ExerciseTemplate>,
    /// Prior sets in display order, aligned positionally to the new
    /// session's sets
    #[serde(default)]
    pub sets: Vec<PreviousSet>,
}

/// Load exercise history from a JSON file
///
/// Returns None if the file doesn't exist (no recorded history).
/// A malformed or unreadable file is ignored with a warning, since the
/// session works fine without fallback data.
pub fn load_exercise_history(path: &Path) -> Result<Option<ExerciseHistory>> {
    if !path.exists() {
        tracing::debug!("No exercise history file found at {:?}", path);
        return Ok(None);
    }

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!(
                "Failed to read exercise history at {:?}: {}. Ignoring history.",
                path,
                e
            );
            return Ok(None);
        }
    };

    let history: ExerciseHistory = match serde_json::from_str(&contents) {
        Ok(history) => history,
        Err(e) => {
            tracing::warn!(
                "Failed to parse exercise history at {:?}: {}. Ignoring history.",
                path,
                e
            );
            return Ok(None);
        }
    };

    tracing::info!(
        "Loaded exercise history: {} prior sets, template: {}",
        history.sets.len(),
        history.template.is_some()
    );

    Ok(Some(history))
}
