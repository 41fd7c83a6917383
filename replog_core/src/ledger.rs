//! Ordered set collection for one exercise instance.
//!
//! The ledger owns the sets, their display ids (renumbered to stay
//! contiguous), and the private monotonic counter behind every set's
//! stable identity key. Unknown ids are silent no-ops throughout.

use crate::codec;
use crate::types::{Set, WARMUP_ID};

/// Prefix for ledger-minted identity keys (`k1`, `k2`, ...)
const KEY_PREFIX: &str = "k";

/// Owns the ordered sets of one exercise instance
#[derive(Clone, Debug)]
pub struct SetLedger {
    sets: Vec<Set>,
    next_key: u64,
}

impl SetLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        SetLedger {
            sets: Vec::new(),
            next_key: 1,
        }
    }

    /// Create a ledger from externally supplied sets (e.g. a restored
    /// session)
    ///
    /// Scans the supplied keys and advances the internal counter past the
    /// highest one seen, so freshly minted keys never collide with
    /// restored ones.
    pub fn from_sets(sets: Vec<Set>) -> Self {
        let highest = sets
            .iter()
            .filter_map(|s| parse_key(&s.key))
            .max()
            .unwrap_or(0);

        SetLedger {
            sets,
            next_key: highest + 1,
        }
    }

    /// All sets in display order
    pub fn sets(&self) -> &[Set] {
        &self.sets
    }

    /// Look up a set by display id
    pub fn get(&self, id: &str) -> Option<&Set> {
        self.sets.iter().find(|s| s.id == id)
    }

    /// The set at a positional index
    pub fn at(&self, index: usize) -> Option<&Set> {
        self.sets.get(index)
    }

    /// Replace the set at `index` (completion workflow writeback)
    pub fn replace_at(&mut self, index: usize, set: Set) {
        if let Some(slot) = self.sets.get_mut(index) {
            *slot = set;
        }
    }

    /// Mint the next identity key
    fn mint_key(&mut self) -> String {
        let key = format!("{}{}", KEY_PREFIX, self.next_key);
        self.next_key += 1;
        key
    }

    /// Append a blank regular set with the next sequential id
    ///
    /// The id is one past the highest current non-warmup id, or `"1"`
    /// when no regular sets exist. Returns the new set's id.
    pub fn add_set(&mut self) -> String {
        let next_id = self
            .sets
            .iter()
            .filter(|s| !s.is_warmup())
            .filter_map(|s| s.id.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;

        let id = next_id.to_string();
        let key = self.mint_key();
        tracing::debug!("Adding set id={} key={}", id, key);
        self.sets.push(Set::blank(id.clone(), key));
        id
    }

    /// Remove the set with the given id and renumber the remaining
    /// regular sets to a contiguous `1..N` sequence
    ///
    /// Warmup sets keep their `"W"` id and are excluded from the count;
    /// every surviving set's key is untouched. Returns the resulting
    /// `(old_id, new_id)` renames, or `None` if the id was unknown.
    pub fn delete_set(&mut self, id: &str) -> Option<Vec<(String, String)>> {
        let index = self.sets.iter().position(|s| s.id == id)?;
        let removed = self.sets.remove(index);
        tracing::debug!("Deleted set id={} key={}", removed.id, removed.key);

        let mut renames = Vec::new();
        let mut next = 1u32;
        for set in &mut self.sets {
            if set.is_warmup() {
                continue;
            }
            let new_id = next.to_string();
            next += 1;
            if set.id != new_id {
                renames.push((set.id.clone(), new_id.clone()));
                set.id = new_id;
            }
        }

        Some(renames)
    }

    /// Sanitize and store a weight edit, recomputing the total
    pub fn set_weight(&mut self, id: &str, raw: &str) {
        if let Some(set) = self.sets.iter_mut().find(|s| s.id == id) {
            set.weight = codec::sanitize_weight(raw);
            set.total = codec::derive_total(&set.weight, &set.reps);
        }
    }

    /// Sanitize and store a reps edit, recomputing the total
    pub fn set_reps(&mut self, id: &str, raw: &str) {
        if let Some(set) = self.sets.iter_mut().find(|s| s.id == id) {
            set.reps = codec::sanitize_reps(raw);
            set.total = codec::derive_total(&set.weight, &set.reps);
        }
    }

    /// Sanitize and store an RIR edit (never affects the total)
    pub fn set_rir(&mut self, id: &str, raw: &str) {
        if let Some(set) = self.sets.iter_mut().find(|s| s.id == id) {
            set.rir = codec::sanitize_rir(raw);
        }
    }

    /// Index of the first incomplete set strictly after `index`
    pub fn next_incomplete_after(&self, index: usize) -> Option<usize> {
        self.sets
            .iter()
            .enumerate()
            .skip(index + 1)
            .find(|(_, s)| !s.completed)
            .map(|(i, _)| i)
    }
}

impl Default for SetLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a ledger-minted key (`k<N>`) or a bare numeric key back to its
/// counter value
fn parse_key(key: &str) -> Option<u64> {
    key.strip_prefix(KEY_PREFIX)
        .unwrap_or(key)
        .parse::<u64>()
        .ok()
}
