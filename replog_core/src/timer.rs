//! Rest timer coordination for one exercise instance.
//!
//! Two mutually exclusive modes, selected by configuration:
//! - Exercise-level: a single configured duration; starting it is a
//!   fire-and-forget signal to a host-owned global countdown
//! - Per-set: a countdown pool with at most one active set at a time
//!
//! Ticks are explicit: the host calls [`RestTimerCoordinator::tick`]
//! once per second while a countdown is active. Cancellation is
//! synchronous, so a tick arriving after a stop is a no-op by
//! construction.

use crate::codec;
use crate::types::TimerMode;
use std::collections::{HashMap, HashSet};

/// Outcome of a once-per-second tick
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// No per-set countdown is active
    Idle,
    /// The active countdown decremented and keeps running
    Running { set_id: String, remaining: u32 },
    /// The active countdown reached zero and was cleared
    Expired { set_id: String },
}

/// Coordinates the exercise-level rest duration and the per-set
/// countdown pool
#[derive(Clone, Debug)]
pub struct RestTimerCoordinator {
    mode: TimerMode,
    rest_seconds: u32,
    adjust_step: u32,
    active_set_id: Option<String>,
    remaining: HashMap<String, u32>,
    seeded: HashSet<String>,
}

impl RestTimerCoordinator {
    pub fn new(mode: TimerMode, rest_seconds: u32, adjust_step: u32) -> Self {
        RestTimerCoordinator {
            mode,
            rest_seconds,
            adjust_step,
            active_set_id: None,
            remaining: HashMap::new(),
            seeded: HashSet::new(),
        }
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    /// Currently configured workout-wide rest duration
    pub fn rest_seconds(&self) -> u32 {
        self.rest_seconds
    }

    /// Adjust the workout-wide rest duration by one fixed step up or down
    pub fn adjust_rest(&mut self, increase: bool) -> u32 {
        self.rest_seconds = if increase {
            self.rest_seconds.saturating_add(self.adjust_step)
        } else {
            self.rest_seconds.saturating_sub(self.adjust_step)
        };
        self.rest_seconds
    }

    /// Set the workout-wide rest duration to a preset value
    pub fn set_rest_preset(&mut self, seconds: u32) {
        self.rest_seconds = seconds;
    }

    /// The set whose countdown is currently running, if any
    pub fn active_set_id(&self) -> Option<&str> {
        self.active_set_id.as_deref()
    }

    /// Whether this set's countdown is currently running
    pub fn is_running(&self, set_id: &str) -> bool {
        self.active_set_id.as_deref() == Some(set_id)
    }

    /// Remaining seconds for a set's countdown, if one was started
    pub fn remaining(&self, set_id: &str) -> Option<u32> {
        self.remaining.get(set_id).copied()
    }

    /// Start a per-set countdown from the set's stored duration text
    ///
    /// A different active countdown is stopped first (single-active
    /// invariant). A duration that parses to 0 is a no-op. Returns
    /// whether a countdown actually started.
    pub fn start_set_timer(&mut self, set_id: &str, duration_text: &str) -> bool {
        if let Some(active) = self.active_set_id.take() {
            if active != set_id {
                tracing::debug!("Stopping countdown for set {} before starting {}", active, set_id);
            }
            self.remaining.remove(&active);
        }

        let duration = codec::parse_duration(duration_text);
        if duration == 0 {
            tracing::debug!("Not starting zero-duration countdown for set {}", set_id);
            return false;
        }

        self.remaining.insert(set_id.to_string(), duration);
        self.active_set_id = Some(set_id.to_string());
        tracing::debug!("Started {}s countdown for set {}", duration, set_id);
        true
    }

    /// Stop a set's countdown; no-op unless that set is the active one
    pub fn stop_set_timer(&mut self, set_id: &str) {
        if self.active_set_id.as_deref() == Some(set_id) {
            self.active_set_id = None;
            self.remaining.remove(set_id);
            tracing::debug!("Stopped countdown for set {}", set_id);
        }
    }

    /// Advance the active countdown by one second
    pub fn tick(&mut self) -> TickOutcome {
        let Some(set_id) = self.active_set_id.clone() else {
            return TickOutcome::Idle;
        };

        let remaining = self
            .remaining
            .get(&set_id)
            .copied()
            .unwrap_or(0)
            .saturating_sub(1);

        if remaining == 0 {
            self.active_set_id = None;
            self.remaining.remove(&set_id);
            tracing::debug!("Countdown expired for set {}", set_id);
            return TickOutcome::Expired { set_id };
        }

        self.remaining.insert(set_id.clone(), remaining);
        TickOutcome::Running { set_id, remaining }
    }

    /// Record that a newly added set's timer has been seeded
    ///
    /// Returns true the first time a given id is seen; repeated calls for
    /// the same id return false so the caller seeds at most once.
    pub fn init_timer_for_new_set(&mut self, set_id: &str) -> bool {
        self.seeded.insert(set_id.to_string())
    }

    /// Mark an id as already seeded (restored sessions)
    pub fn mark_seeded(&mut self, set_id: &str) {
        self.seeded.insert(set_id.to_string());
    }

    /// Drop all countdown state for a deleted set
    pub fn remove_set(&mut self, set_id: &str) {
        self.stop_set_timer(set_id);
        self.remaining.remove(set_id);
        self.seeded.remove(set_id);
    }

    /// Follow a ledger renumbering: re-key runtime state from old ids to
    /// new ones
    pub fn apply_renames(&mut self, renames: &[(String, String)]) {
        for (old, new) in renames {
            if let Some(remaining) = self.remaining.remove(old) {
                self.remaining.insert(new.clone(), remaining);
            }
            if self.seeded.remove(old) {
                self.seeded.insert(new.clone());
            }
            if self.active_set_id.as_deref() == Some(old.as_str()) {
                self.active_set_id = Some(new.clone());
            }
        }
    }
}
