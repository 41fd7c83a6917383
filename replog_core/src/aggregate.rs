//! Derived totals and change detection for one exercise session.
//!
//! The aggregator observes the session state after every mutation and
//! decides which downstream notifications to emit:
//! - `TotalsChanged` when the completed-set count or total volume differ
//!   from the last emitted values
//! - `StateChanged` when the content fingerprint (set values, notes,
//!   timer map) differs from the last emitted one
//!
//! Both comparisons are by value, guarding the persistence collaborator
//! against redundant writes.

use crate::types::{Effect, ExerciseSessionState, Set, Totals};
use std::collections::BTreeMap;

/// Compute totals over the sets: completed non-warmup count and the sum
/// of their totals
pub fn compute_totals(sets: &[Set]) -> Totals {
    let mut totals = Totals::default();
    for set in sets {
        if set.completed && !set.is_warmup() {
            totals.completed_sets += 1;
            totals.total_volume += set.total.parse::<i64>().unwrap_or(0);
        }
    }
    totals
}

/// Content-level fingerprint of a session state
///
/// Covers id/weight/reps/rir/completed per set, the notes, and the timer
/// map. Deliberately excludes `key` and `total`: keys are identity, not
/// content, and totals are derived from weight/reps.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Fingerprint {
    rows: Vec<(String, String, String, String, bool)>,
    notes: String,
    timers: BTreeMap<String, String>,
}

impl Fingerprint {
    fn of(state: &ExerciseSessionState) -> Self {
        Fingerprint {
            rows: state
                .sets
                .iter()
                .map(|s| {
                    (
                        s.id.clone(),
                        s.weight.clone(),
                        s.reps.clone(),
                        s.rir.clone(),
                        s.completed,
                    )
                })
                .collect(),
            notes: state.notes.clone(),
            timers: state.set_timers.clone(),
        }
    }
}

/// Diffing layer between the ledger and the persistence collaborator
#[derive(Clone, Debug, Default)]
pub struct SessionAggregator {
    last_totals: Option<Totals>,
    last_fingerprint: Option<Fingerprint>,
}

impl SessionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current totals as of the last observation
    pub fn totals(&self) -> Totals {
        self.last_totals.unwrap_or_default()
    }

    /// Observe the state after a mutation and emit change notifications
    pub fn observe(&mut self, state: &ExerciseSessionState) -> Vec<Effect> {
        let mut effects = Vec::new();

        let totals = compute_totals(&state.sets);
        if self.last_totals != Some(totals) {
            self.last_totals = Some(totals);
            effects.push(Effect::TotalsChanged { totals });
        }

        let fingerprint = Fingerprint::of(state);
        if self.last_fingerprint.as_ref() != Some(&fingerprint) {
            self.last_fingerprint = Some(fingerprint);
            effects.push(Effect::StateChanged(state.clone()));
        }

        effects
    }
}
