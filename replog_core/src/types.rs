//! Core domain types for the active workout session engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Sets and the per-exercise session state
//! - Previous-performance snapshots and exercise templates
//! - Timer modes
//! - Effects emitted by mutations for the host to execute

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Display id reserved for warmup sets, exempt from renumbering
pub const WARMUP_ID: &str = "W";

// ============================================================================
// Set and Session State
// ============================================================================

/// One recorded or planned repetition block within an exercise
///
/// `id` is `"W"` for warmup sets, otherwise a string-encoded positive
/// integer giving the display order among regular sets. `key` is a stable
/// identity token minted once at creation and never reassigned, even when
/// `id` changes during renumbering.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Set {
    pub id: String,
    pub key: String,
    pub weight: String,
    pub reps: String,
    pub rir: String,
    pub total: String,
    pub completed: bool,
}

impl Set {
    /// Create a blank set with the given display id and identity key
    pub fn blank(id: impl Into<String>, key: impl Into<String>) -> Self {
        Set {
            id: id.into(),
            key: key.into(),
            weight: String::new(),
            reps: String::new(),
            rir: String::new(),
            total: String::new(),
            completed: false,
        }
    }

    /// Whether this is a warmup set (excluded from renumbering and totals)
    pub fn is_warmup(&self) -> bool {
        self.id == WARMUP_ID
    }
}

/// The aggregate state persisted and reported for one exercise instance
///
/// `set_timers` maps set ids to textual durations (`M:SS` or partial
/// digits) and is populated only while per-set timer mode is active.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ExerciseSessionState {
    pub sets: Vec<Set>,
    pub notes: String,
    #[serde(default)]
    pub set_timers: BTreeMap<String, String>,
}

// ============================================================================
// External Inputs
// ============================================================================

/// One prior set from the previous-performance snapshot (read-only input)
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PreviousSet {
    pub weight: String,
    pub reps: String,
    pub rir: String,
}

/// Optional rep/RIR ranges defined on the exercise template
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct ExerciseTemplate {
    pub rep_range_min: Option<u32>,
    pub rep_range_max: Option<u32>,
    pub rir_range_min: Option<u32>,
    pub rir_range_max: Option<u32>,
}

impl ExerciseTemplate {
    /// Rep range formatted as `"min-max"`, if both bounds are defined
    pub fn rep_range(&self) -> Option<String> {
        match (self.rep_range_min, self.rep_range_max) {
            (Some(min), Some(max)) => Some(format!("{}-{}", min, max)),
            _ => None,
        }
    }

    /// RIR range formatted as `"min-max"`, if both bounds are defined
    pub fn rir_range(&self) -> Option<String> {
        match (self.rir_range_min, self.rir_range_max) {
            (Some(min), Some(max)) => Some(format!("{}-{}", min, max)),
            _ => None,
        }
    }
}

// ============================================================================
// Timers and Effects
// ============================================================================

/// Rest-timer configuration mode, selected externally
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    /// One workout-wide rest timer owned by the host
    Exercise,
    /// Per-set countdowns, at most one running at a time
    Set,
}

impl Default for TimerMode {
    fn default() -> Self {
        TimerMode::Exercise
    }
}

/// Advisory haptic feedback category
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Haptic {
    Light,
    Medium,
    Success,
}

/// Aggregate totals derived from the ledger (warmups excluded)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Totals {
    pub completed_sets: u32,
    pub total_volume: i64,
}

/// A cross-cutting side effect emitted by a mutation for the host to run
///
/// Mutations return these instead of performing I/O themselves; the engine
/// stays pure and the host decides how (or whether) to execute each one.
/// Timer start/stop effects have already been applied to the coordinator
/// when they appear in the list; for the host they are advisory.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Haptic/audio feedback request
    Haptic(Haptic),
    /// Focus the weight field of the set at `set_index`, after `delay_ms`.
    /// The delay sequences the focus change after the state write that
    /// produced it; the host must not reorder it ahead of that write.
    FocusWeightField { set_index: usize, delay_ms: u64 },
    /// Start the workout-wide rest timer (exercise-level mode only)
    StartRestTimer { seconds: u32 },
    /// A per-set countdown started for this id
    StartSetTimer { set_id: String },
    /// A per-set countdown stopped for this id
    StopSetTimer { set_id: String },
    /// Aggregate totals changed since the last emission
    TotalsChanged { totals: Totals },
    /// Session state content changed since the last emission
    StateChanged(ExerciseSessionState),
}

impl Effect {
    /// The state snapshot carried by a `StateChanged` effect, if any
    pub fn as_state_change(&self) -> Option<&ExerciseSessionState> {
        match self {
            Effect::StateChanged(state) => Some(state),
            _ => None,
        }
    }
}

// ============================================================================
// Journal Entry
// ============================================================================

/// One journaled snapshot emission, as appended by the host on
/// `StateChanged`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub instance_id: Uuid,
    pub exercise: String,
    pub recorded_at: DateTime<Utc>,
    pub state: ExerciseSessionState,
}
