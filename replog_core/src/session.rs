//! The per-exercise session engine.
//!
//! [`ExerciseSession`] wires the set ledger, rest timer coordinator and
//! aggregator for one exercise instance. Every mutating call returns a
//! list of [`Effect`]s for the host to execute; the engine itself
//! performs no I/O. After each mutation the aggregator appends
//! `TotalsChanged`/`StateChanged` notifications when (and only when) the
//! derived values actually differ.
//!
//! All mutations are synchronous. The only asynchronous primitive is the
//! once-per-second countdown, driven by the host through [`tick`].
//!
//! [`tick`]: ExerciseSession::tick

use crate::aggregate::{self, SessionAggregator};
use crate::codec;
use crate::completion::{toggle_completion, CompletionContext};
use crate::config::Config;
use crate::ledger::SetLedger;
use crate::timer::{RestTimerCoordinator, TickOutcome};
use crate::types::{
    Effect, ExerciseSessionState, ExerciseTemplate, Haptic, PreviousSet, Set, TimerMode, Totals,
};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Live session state for one exercise instance
///
/// Fully independent of any other instance: ledger, timer pool and
/// aggregator are owned here and share nothing.
#[derive(Clone, Debug)]
pub struct ExerciseSession {
    instance_id: Uuid,
    exercise: String,
    ledger: SetLedger,
    notes: String,
    set_timers: BTreeMap<String, String>,
    timers: RestTimerCoordinator,
    aggregator: SessionAggregator,
    template: Option<ExerciseTemplate>,
    previous: Vec<PreviousSet>,
    show_previous: bool,
    rest_timer_enabled: bool,
    default_set_timer_seconds: u32,
}

impl ExerciseSession {
    /// Start a fresh session, seeded from the previous-performance
    /// snapshot (one blank set per prior set) or a single blank set
    pub fn start(
        exercise: impl Into<String>,
        template: Option<ExerciseTemplate>,
        previous: Vec<PreviousSet>,
        config: &Config,
    ) -> Self {
        let mut session = Self::empty(exercise, template, previous, config);

        let seed_count = session.previous.len().max(1);
        for _ in 0..seed_count {
            let id = session.ledger.add_set();
            session.seed_set_timer(&id, None);
        }

        tracing::info!(
            "Started session for {} with {} seeded sets",
            session.exercise,
            seed_count
        );
        session
    }

    /// Restore a session from a persisted snapshot
    ///
    /// The ledger scans the restored keys so freshly minted ones never
    /// collide, and every restored set id counts as already
    /// timer-seeded.
    pub fn restore(
        exercise: impl Into<String>,
        state: ExerciseSessionState,
        template: Option<ExerciseTemplate>,
        previous: Vec<PreviousSet>,
        config: &Config,
    ) -> Self {
        let mut session = Self::empty(exercise, template, previous, config);
        for set in &state.sets {
            session.timers.mark_seeded(&set.id);
        }
        session.ledger = SetLedger::from_sets(state.sets);
        session.notes = state.notes;
        session.set_timers = state.set_timers;

        tracing::info!(
            "Restored session for {} with {} sets",
            session.exercise,
            session.ledger.sets().len()
        );
        session
    }

    fn empty(
        exercise: impl Into<String>,
        template: Option<ExerciseTemplate>,
        previous: Vec<PreviousSet>,
        config: &Config,
    ) -> Self {
        ExerciseSession {
            instance_id: Uuid::new_v4(),
            exercise: exercise.into(),
            ledger: SetLedger::new(),
            notes: String::new(),
            set_timers: BTreeMap::new(),
            timers: RestTimerCoordinator::new(
                config.features.timer_type,
                config.rest.default_seconds,
                config.rest.adjust_step_seconds,
            ),
            aggregator: SessionAggregator::new(),
            template,
            previous,
            show_previous: config.features.show_previous_performance,
            rest_timer_enabled: config.features.rest_timer_enabled,
            default_set_timer_seconds: config.rest.default_set_timer_seconds,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn exercise(&self) -> &str {
        &self.exercise
    }

    pub fn sets(&self) -> &[Set] {
        self.ledger.sets()
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Current aggregate totals (computed, not the last emitted values)
    pub fn totals(&self) -> Totals {
        aggregate::compute_totals(self.ledger.sets())
    }

    pub fn timer_mode(&self) -> TimerMode {
        self.timers.mode()
    }

    pub fn rest_seconds(&self) -> u32 {
        self.timers.rest_seconds()
    }

    pub fn active_set_timer(&self) -> Option<&str> {
        self.timers.active_set_id()
    }

    pub fn timer_remaining(&self, set_id: &str) -> Option<u32> {
        self.timers.remaining(set_id)
    }

    pub fn timer_text(&self, set_id: &str) -> Option<&str> {
        self.set_timers.get(set_id).map(String::as_str)
    }

    /// Serializable snapshot of the current session state
    pub fn state(&self) -> ExerciseSessionState {
        ExerciseSessionState {
            sets: self.ledger.sets().to_vec(),
            notes: self.notes.clone(),
            set_timers: self.set_timers.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Ledger mutations
    // ------------------------------------------------------------------

    /// Append a blank set, seeding its per-set timer when that mode is
    /// active. Returns the new set's id alongside the effects.
    pub fn add_set(&mut self) -> (String, Vec<Effect>) {
        let inherited = self
            .ledger
            .sets()
            .iter()
            .rev()
            .find_map(|s| self.set_timers.get(&s.id).cloned());

        let id = self.ledger.add_set();
        self.seed_set_timer(&id, inherited);

        let effects = self.finish(vec![Effect::Haptic(Haptic::Medium)]);
        (id, effects)
    }

    /// Delete a set by id; remaining regular sets renumber contiguously
    /// and all timer state follows the renames
    pub fn delete_set(&mut self, id: &str) -> Vec<Effect> {
        let Some(renames) = self.ledger.delete_set(id) else {
            return Vec::new();
        };

        self.set_timers.remove(id);
        self.timers.remove_set(id);

        for (old, new) in &renames {
            if let Some(text) = self.set_timers.remove(old) {
                self.set_timers.insert(new.clone(), text);
            }
        }
        self.timers.apply_renames(&renames);

        self.finish(vec![Effect::Haptic(Haptic::Medium)])
    }

    pub fn set_weight(&mut self, id: &str, raw: &str) -> Vec<Effect> {
        self.ledger.set_weight(id, raw);
        self.finish(Vec::new())
    }

    pub fn set_reps(&mut self, id: &str, raw: &str) -> Vec<Effect> {
        self.ledger.set_reps(id, raw);
        self.finish(Vec::new())
    }

    pub fn set_rir(&mut self, id: &str, raw: &str) -> Vec<Effect> {
        self.ledger.set_rir(id, raw);
        self.finish(Vec::new())
    }

    pub fn set_notes(&mut self, text: &str) -> Vec<Effect> {
        self.notes = text.to_string();
        self.finish(Vec::new())
    }

    /// Toggle completion for the set at `index`
    ///
    /// `field_focused` reports whether one of this set's inputs held
    /// focus at toggle time; the focus-advance signal is emitted only
    /// then.
    pub fn toggle_completion(&mut self, index: usize, field_focused: bool) -> Vec<Effect> {
        let Some(set) = self.ledger.at(index).cloned() else {
            return Vec::new();
        };

        let ctx = CompletionContext {
            template: self.template.as_ref(),
            previous: self.previous.get(index),
            show_previous: self.show_previous,
            rest_timer_enabled: self.rest_timer_enabled,
            timer_mode: self.timers.mode(),
            rest_seconds: self.timers.rest_seconds(),
            field_focused,
            next_incomplete_index: self.ledger.next_incomplete_after(index),
        };

        let (updated, effects) = toggle_completion(&set, &ctx);
        self.ledger.replace_at(index, updated);

        let effects = self.apply_timer_effects(effects);
        self.finish(effects)
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    /// Edit a set's stored duration; re-formats the raw digit input
    ///
    /// No-op outside per-set timer mode (the stored map exists only
    /// there), while that set's own countdown is running, and for ids
    /// the session does not know.
    pub fn set_timer_change(&mut self, id: &str, raw: &str) -> Vec<Effect> {
        if !self.rest_timer_enabled || self.timers.mode() != TimerMode::Set {
            return Vec::new();
        }
        if self.ledger.get(id).is_none() || self.timers.is_running(id) {
            return Vec::new();
        }

        self.set_timers
            .insert(id.to_string(), codec::format_timer_input(raw));
        self.finish(Vec::new())
    }

    /// Manually start a set's countdown from its stored duration
    pub fn start_set_timer(&mut self, id: &str) -> Vec<Effect> {
        let text = self.set_timers.get(id).cloned().unwrap_or_default();
        let mut effects = Vec::new();
        if self.timers.start_set_timer(id, &text) {
            effects.push(Effect::StartSetTimer {
                set_id: id.to_string(),
            });
        }
        self.finish(effects)
    }

    /// Stop a set's countdown; no-op unless it is the active one
    pub fn stop_set_timer(&mut self, id: &str) -> Vec<Effect> {
        self.timers.stop_set_timer(id);
        self.finish(Vec::new())
    }

    /// Advance the active countdown by one second
    ///
    /// On expiry: clears the countdown, emits completion feedback, and
    /// normalizes a bare 1-2 digit stored value to `00:SS`.
    pub fn tick(&mut self) -> Vec<Effect> {
        match self.timers.tick() {
            TickOutcome::Idle | TickOutcome::Running { .. } => Vec::new(),
            TickOutcome::Expired { set_id } => {
                let mut effects = vec![Effect::Haptic(Haptic::Success)];

                if let Some(text) = self.set_timers.get(&set_id) {
                    if let Some(normalized) = codec::normalize_expired(text) {
                        self.set_timers.insert(set_id.clone(), normalized);
                    }
                }

                effects.push(Effect::StopSetTimer { set_id });
                self.finish(effects)
            }
        }
    }

    /// Adjust the workout-wide rest duration by one configured step
    pub fn adjust_rest(&mut self, increase: bool) -> u32 {
        self.timers.adjust_rest(increase)
    }

    /// Set the workout-wide rest duration to a preset
    pub fn set_rest_preset(&mut self, seconds: u32) {
        self.timers.set_rest_preset(seconds);
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Seed a per-set timer value for a newly added set, once per id
    fn seed_set_timer(&mut self, id: &str, inherited: Option<String>) {
        if !self.rest_timer_enabled || self.timers.mode() != TimerMode::Set {
            return;
        }
        if !self.timers.init_timer_for_new_set(id) {
            return;
        }

        let text =
            inherited.unwrap_or_else(|| codec::format_seconds(self.default_set_timer_seconds));
        self.set_timers.insert(id.to_string(), text);
    }

    /// Run per-set timer start/stop effects against the coordinator,
    /// dropping a start that turned out to be a no-op (zero duration)
    fn apply_timer_effects(&mut self, effects: Vec<Effect>) -> Vec<Effect> {
        effects
            .into_iter()
            .filter(|effect| match effect {
                Effect::StartSetTimer { set_id } => {
                    let text = self.set_timers.get(set_id).cloned().unwrap_or_default();
                    self.timers.start_set_timer(set_id, &text)
                }
                Effect::StopSetTimer { set_id } => {
                    self.timers.stop_set_timer(set_id);
                    true
                }
                _ => true,
            })
            .collect()
    }

    /// Append the aggregator's change notifications after a mutation
    fn finish(&mut self, mut effects: Vec<Effect>) -> Vec<Effect> {
        effects.extend(self.aggregator.observe(&self.state()));
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn exercise_mode_config() -> Config {
        Config::default()
    }

    fn per_set_config() -> Config {
        let mut config = Config::default();
        config.features.timer_type = TimerMode::Set;
        config
    }

    fn previous(entries: &[(&str, &str, &str)]) -> Vec<PreviousSet> {
        entries
            .iter()
            .map(|(w, r, rir)| PreviousSet {
                weight: (*w).into(),
                reps: (*r).into(),
                rir: (*rir).into(),
            })
            .collect()
    }

    #[test]
    fn test_seeds_one_blank_set_without_previous() {
        let session =
            ExerciseSession::start("Bench Press", None, Vec::new(), &exercise_mode_config());
        assert_eq!(session.sets().len(), 1);
        assert_eq!(session.sets()[0].id, "1");
    }

    #[test]
    fn test_seeds_one_set_per_previous_set() {
        let session = ExerciseSession::start(
            "Squat",
            None,
            previous(&[("100", "5", "2"), ("100", "5", "2"), ("105", "3", "1")]),
            &exercise_mode_config(),
        );
        assert_eq!(session.sets().len(), 3);
        assert!(session.sets().iter().all(|s| s.weight.is_empty()));
    }

    #[test]
    fn test_add_add_delete_scenario() {
        let mut session =
            ExerciseSession::start("Row", None, Vec::new(), &exercise_mode_config());
        // Seeded with one set already; work against a clean slate.
        session.delete_set("1");

        let (id1, _) = session.add_set();
        assert_eq!(id1, "1");
        let k1 = session.sets()[0].key.clone();

        let (id2, _) = session.add_set();
        assert_eq!(id2, "2");
        let k2 = session.sets()[1].key.clone();
        assert_ne!(k1, k2);

        session.delete_set("1");
        assert_eq!(session.sets().len(), 1);
        assert_eq!(session.sets()[0].id, "1");
        assert_eq!(session.sets()[0].key, k2);
    }

    #[test]
    fn test_add_and_delete_emit_medium_feedback() {
        let mut session =
            ExerciseSession::start("Row", None, Vec::new(), &exercise_mode_config());

        let (_, effects) = session.add_set();
        assert!(effects.contains(&Effect::Haptic(Haptic::Medium)));

        let effects = session.delete_set("1");
        assert!(effects.contains(&Effect::Haptic(Haptic::Medium)));

        // Unknown id stays a silent no-op.
        assert!(session.delete_set("9").is_empty());
    }

    #[test]
    fn test_restore_scans_keys() {
        let config = exercise_mode_config();
        let mut state = ExerciseSessionState::default();
        state.sets.push(Set::blank("1", "k5"));

        let mut session = ExerciseSession::restore("Deadlift", state, None, Vec::new(), &config);
        let (_, _) = session.add_set();
        assert_eq!(session.sets()[1].key, "k6");
    }

    #[test]
    fn test_completion_emits_rest_start_with_configured_duration() {
        let mut session =
            ExerciseSession::start("Bench Press", None, Vec::new(), &exercise_mode_config());
        session.set_weight("1", "50");
        session.set_reps("1", "10");

        let effects = session.toggle_completion(0, false);
        assert!(effects.contains(&Effect::StartRestTimer { seconds: 150 }));
    }

    #[test]
    fn test_rest_adjustment_feeds_completion() {
        let mut session =
            ExerciseSession::start("Bench Press", None, Vec::new(), &exercise_mode_config());
        session.set_weight("1", "50");
        session.set_reps("1", "10");
        session.adjust_rest(true);
        session.adjust_rest(true);

        let effects = session.toggle_completion(0, false);
        assert!(effects.contains(&Effect::StartRestTimer { seconds: 170 }));
    }

    #[test]
    fn test_per_set_mode_seeds_and_starts_timers() {
        let mut session = ExerciseSession::start("Curl", None, Vec::new(), &per_set_config());
        assert_eq!(session.timer_text("1"), Some("2:30"));

        session.set_weight("1", "20");
        session.set_reps("1", "12");
        let effects = session.toggle_completion(0, false);

        assert!(effects.contains(&Effect::StartSetTimer {
            set_id: "1".into()
        }));
        assert_eq!(session.active_set_timer(), Some("1"));
        assert_eq!(session.timer_remaining("1"), Some(150));
    }

    #[test]
    fn test_new_set_inherits_timer_text() {
        let mut session = ExerciseSession::start("Curl", None, Vec::new(), &per_set_config());
        session.set_timer_change("1", "930");
        assert_eq!(session.timer_text("1"), Some("9:30"));

        let (id, _) = session.add_set();
        assert_eq!(session.timer_text(&id), Some("9:30"));
    }

    #[test]
    fn test_timer_change_scenarios() {
        let mut session = ExerciseSession::start("Curl", None, Vec::new(), &per_set_config());

        session.set_timer_change("1", "930");
        assert_eq!(session.timer_text("1"), Some("9:30"));

        session.set_timer_change("1", "30");
        assert_eq!(session.timer_text("1"), Some("30"));
    }

    #[test]
    fn test_timer_edit_ignored_in_exercise_mode() {
        let mut session = ExerciseSession::start("Curl", None, Vec::new(), &exercise_mode_config());

        session.set_timer_change("1", "930");

        assert_eq!(session.timer_text("1"), None);
        assert!(session.state().set_timers.is_empty());
    }

    #[test]
    fn test_timer_edit_ignored_while_running() {
        let mut session = ExerciseSession::start("Curl", None, Vec::new(), &per_set_config());
        session.set_timer_change("1", "30");
        session.start_set_timer("1");

        session.set_timer_change("1", "900");
        assert_eq!(session.timer_text("1"), Some("30"));
    }

    #[test]
    fn test_starting_second_timer_stops_first() {
        let mut session = ExerciseSession::start("Curl", None, Vec::new(), &per_set_config());
        session.add_set();
        session.set_timer_change("1", "100");
        session.set_timer_change("2", "100");

        session.start_set_timer("1");
        assert_eq!(session.active_set_timer(), Some("1"));

        session.start_set_timer("2");
        assert_eq!(session.active_set_timer(), Some("2"));
        assert_eq!(session.timer_remaining("1"), None);
    }

    #[test]
    fn test_expiry_normalizes_bare_seconds() {
        let mut session = ExerciseSession::start("Curl", None, Vec::new(), &per_set_config());
        session.set_timer_change("1", "2");
        session.start_set_timer("1");

        let first = session.tick();
        assert!(first.is_empty());

        let effects = session.tick();
        assert!(effects.contains(&Effect::Haptic(Haptic::Success)));
        assert_eq!(session.timer_text("1"), Some("00:02"));
        assert_eq!(session.active_set_timer(), None);
    }

    #[test]
    fn test_uncomplete_stops_countdown() {
        let mut session = ExerciseSession::start("Curl", None, Vec::new(), &per_set_config());
        session.set_weight("1", "20");
        session.set_reps("1", "12");
        session.toggle_completion(0, false);
        assert_eq!(session.active_set_timer(), Some("1"));

        let effects = session.toggle_completion(0, false);
        assert!(effects.contains(&Effect::Haptic(Haptic::Light)));
        assert_eq!(session.active_set_timer(), None);
    }

    #[test]
    fn test_delete_remaps_timer_state() {
        let mut session = ExerciseSession::start("Curl", None, Vec::new(), &per_set_config());
        session.add_set();
        session.set_timer_change("2", "500");

        session.delete_set("1");
        assert_eq!(session.timer_text("1"), Some("5:00"));
        assert_eq!(session.timer_text("2"), None);
    }

    #[test]
    fn test_totals_and_state_emitted_once_per_change() {
        let mut session =
            ExerciseSession::start("Bench Press", None, Vec::new(), &exercise_mode_config());

        let effects = session.set_weight("1", "50");
        assert!(effects.iter().any(|e| matches!(e, Effect::StateChanged(_))));

        // Same sanitized value again: nothing new to report.
        let effects = session.set_weight("1", "50");
        assert!(effects.is_empty());
    }

    #[test]
    fn test_focus_advance_targets_next_incomplete() {
        let mut session =
            ExerciseSession::start("Bench Press", None, Vec::new(), &exercise_mode_config());
        session.add_set();
        session.set_weight("1", "50");
        session.set_reps("1", "10");

        let effects = session.toggle_completion(0, true);
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::FocusWeightField { set_index: 1, .. }
        )));
    }

    #[test]
    fn test_fill_from_previous_at_matching_position() {
        let mut config = exercise_mode_config();
        config.features.rest_timer_enabled = false;

        let mut session = ExerciseSession::start(
            "Squat",
            None,
            previous(&[("100", "5", "2"), ("105", "3", "1")]),
            &config,
        );

        session.toggle_completion(1, false);
        let set = &session.sets()[1];
        assert_eq!(set.weight, "105");
        assert_eq!(set.reps, "3");
        assert_eq!(set.rir, "1");
        assert_eq!(set.total, "315");
    }

    #[test]
    fn test_unknown_index_toggle_is_noop() {
        let mut session =
            ExerciseSession::start("Bench Press", None, Vec::new(), &exercise_mode_config());
        assert!(session.toggle_completion(7, false).is_empty());
    }
}
