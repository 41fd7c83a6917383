//! Completion toggle workflow for a single set.
//!
//! This module implements the completion cascade:
//! - Fill empty fields: template range first, then previous performance
//! - Never overwrite a field that already holds a value
//! - Collapse ranges to their lower bound on completion
//! - Recompute the total and emit cross-cutting effects
//!
//! The function is pure over one `Set`: the caller writes the result back
//! and executes the returned effects.

use crate::codec;
use crate::types::{Effect, ExerciseTemplate, Haptic, PreviousSet, Set, TimerMode};

/// Delay before the focus-advance effect, so the host applies it after
/// the state write that produced it
pub const FOCUS_ADVANCE_DELAY_MS: u64 = 100;

/// Caller-supplied context for a completion toggle
#[derive(Clone, Debug)]
pub struct CompletionContext<'a> {
    /// Template rep/RIR ranges, if the exercise defines them
    pub template: Option<&'a ExerciseTemplate>,
    /// Previous-performance value aligned to this set's position
    pub previous: Option<&'a PreviousSet>,
    /// Whether previous-performance fallback is enabled
    pub show_previous: bool,
    /// Whether rest-timer functionality is enabled at all
    pub rest_timer_enabled: bool,
    /// Which timer mode is configured
    pub timer_mode: TimerMode,
    /// Configured workout-wide rest duration (exercise-level mode)
    pub rest_seconds: u32,
    /// Whether one of this set's inputs currently holds focus
    pub field_focused: bool,
    /// Index of the next incomplete set, for the focus-advance signal
    pub next_incomplete_index: Option<usize>,
}

/// Toggle a set's completion state, returning the updated set and the
/// effects the host should execute
pub fn toggle_completion(set: &Set, ctx: &CompletionContext) -> (Set, Vec<Effect>) {
    if set.completed {
        uncomplete(set, ctx)
    } else {
        complete(set, ctx)
    }
}

fn complete(set: &Set, ctx: &CompletionContext) -> (Set, Vec<Effect>) {
    let mut updated = set.clone();
    updated.completed = true;

    // Auto-fill only populates blanks; template range wins over the
    // previous-performance value.
    if updated.weight.is_empty() {
        if let Some(weight) = previous_field(ctx, |p| &p.weight) {
            updated.weight = weight;
        }
    }
    if updated.reps.is_empty() {
        if let Some(range) = ctx.template.and_then(|t| t.rep_range()) {
            updated.reps = range;
        } else if let Some(reps) = previous_field(ctx, |p| &p.reps) {
            updated.reps = reps;
        }
    }
    if updated.rir.is_empty() {
        if let Some(range) = ctx.template.and_then(|t| t.rir_range()) {
            updated.rir = range;
        } else if let Some(rir) = previous_field(ctx, |p| &p.rir) {
            updated.rir = rir;
        }
    }

    // A completed set records a single value, not a range.
    updated.reps = codec::collapse_range(&updated.reps);
    updated.rir = codec::collapse_range(&updated.rir);
    updated.total = codec::derive_total(&updated.weight, &updated.reps);

    tracing::debug!(
        "Completed set id={}: weight={} reps={} total={}",
        updated.id,
        updated.weight,
        updated.reps,
        updated.total
    );

    let mut effects = vec![Effect::Haptic(Haptic::Success)];

    if ctx.field_focused {
        if let Some(set_index) = ctx.next_incomplete_index {
            effects.push(Effect::FocusWeightField {
                set_index,
                delay_ms: FOCUS_ADVANCE_DELAY_MS,
            });
        }
    }

    if ctx.rest_timer_enabled {
        match ctx.timer_mode {
            TimerMode::Exercise => effects.push(Effect::StartRestTimer {
                seconds: ctx.rest_seconds,
            }),
            TimerMode::Set => effects.push(Effect::StartSetTimer {
                set_id: updated.id.clone(),
            }),
        }
    }

    (updated, effects)
}

fn uncomplete(set: &Set, ctx: &CompletionContext) -> (Set, Vec<Effect>) {
    let mut updated = set.clone();
    updated.completed = false;

    let mut effects = vec![Effect::Haptic(Haptic::Light)];
    if ctx.timer_mode == TimerMode::Set {
        // Idempotent on the coordinator side if nothing is running.
        effects.push(Effect::StopSetTimer {
            set_id: updated.id.clone(),
        });
    }

    (updated, effects)
}

fn previous_field<'a>(
    ctx: &CompletionContext<'a>,
    field: impl Fn(&'a PreviousSet) -> &'a String,
) -> Option<String> {
    if !ctx.show_previous {
        return None;
    }
    ctx.previous
        .map(field)
        .filter(|v| !v.is_empty())
        .cloned()
}
