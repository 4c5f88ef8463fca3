//! Per-player specials state.
//!
//! ## Invariants
//!
//! - Every applied id is also completed: the engine marks both together.
//! - Totals only count bonuses whose id is applied. A stored bonus for an
//!   id that is not applied contributes nothing.
//! - A bonus entry is replaced, never accumulated. Stacking happens across
//!   distinct ids at aggregation time.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::core::EntityId;

/// A speed bonus contributed by one applied special.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeedBonus {
    pub percent: f64,
    pub skip_seconds: i32,
}

impl SpeedBonus {
    /// Create a new bonus.
    #[must_use]
    pub const fn new(percent: f64, skip_seconds: i32) -> Self {
        Self {
            percent,
            skip_seconds,
        }
    }
}

/// Accumulated specials state of one player.
///
/// ## Example
///
/// ```
/// use progress_specials::record::BonusRecord;
///
/// let mut record = BonusRecord::new();
/// record.add_or_update_bonus("emerald", 800.0, 0);
/// assert_eq!(record.total_percent(), 0.0); // not applied yet
///
/// record.mark_completed("emerald");
/// record.mark_applied("emerald");
/// assert_eq!(record.total_percent(), 800.0);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BonusRecord {
    completed: FxHashSet<String>,
    applied: FxHashSet<String>,
    bonuses: FxHashMap<String, SpeedBonus>,
    encounters: FxHashMap<String, FxHashSet<EntityId>>,
}

impl BonusRecord {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a special's trigger was satisfied. Idempotent.
    pub fn mark_completed(&mut self, id: &str) {
        if !self.completed.contains(id) {
            self.completed.insert(id.to_string());
        }
    }

    /// Record that a special's reward was granted. Idempotent.
    pub fn mark_applied(&mut self, id: &str) {
        if !self.applied.contains(id) {
            self.applied.insert(id.to_string());
        }
    }

    #[must_use]
    pub fn is_completed(&self, id: &str) -> bool {
        self.completed.contains(id)
    }

    #[must_use]
    pub fn is_applied(&self, id: &str) -> bool {
        self.applied.contains(id)
    }

    /// Store the bonus of a special, replacing any previous entry.
    pub fn add_or_update_bonus(&mut self, id: &str, percent: f64, skip_seconds: i32) {
        self.bonuses
            .insert(id.to_string(), SpeedBonus::new(percent, skip_seconds));
    }

    /// The stored bonus of a special.
    #[must_use]
    pub fn bonus(&self, id: &str) -> Option<SpeedBonus> {
        self.bonuses.get(id).copied()
    }

    /// Record a distinct victim under a tracking key.
    ///
    /// Returns `true` only the first time `victim` is seen for `key`.
    pub fn record_unique_encounter(&mut self, key: &str, victim: EntityId) -> bool {
        self.encounters.entry(key.to_string()).or_default().insert(victim)
    }

    /// Number of distinct victims recorded under a key.
    #[must_use]
    pub fn encounter_count(&self, key: &str) -> usize {
        self.encounters.get(key).map_or(0, FxHashSet::len)
    }

    /// Remove a special's applied marker and bonus, and optionally its
    /// completion. Returns whether anything changed.
    pub fn remove_special(&mut self, id: &str, also_clear_completion: bool) -> bool {
        let mut changed = self.applied.remove(id);
        changed |= self.bonuses.remove(id).is_some();
        if also_clear_completion {
            changed |= self.completed.remove(id);
        }
        changed
    }

    /// Sum of bonus percents over applied specials.
    #[must_use]
    pub fn total_percent(&self) -> f64 {
        self.bonuses
            .iter()
            .filter(|(id, _)| self.applied.contains(*id))
            .map(|(_, bonus)| bonus.percent)
            .sum()
    }

    /// Sum of bonus skip seconds over applied specials.
    #[must_use]
    pub fn total_skip_seconds(&self) -> i32 {
        self.bonuses
            .iter()
            .filter(|(id, _)| self.applied.contains(*id))
            .map(|(_, bonus)| bonus.skip_seconds)
            .sum()
    }

    /// Completed specials that have not been applied yet, sorted.
    #[must_use]
    pub fn pending(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .completed
            .iter()
            .filter(|id| !self.applied.contains(*id))
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn completed(&self) -> impl Iterator<Item = &str> {
        self.completed.iter().map(String::as_str)
    }

    pub fn applied(&self) -> impl Iterator<Item = &str> {
        self.applied.iter().map(String::as_str)
    }

    pub fn bonuses(&self) -> impl Iterator<Item = (&str, SpeedBonus)> {
        self.bonuses.iter().map(|(id, bonus)| (id.as_str(), *bonus))
    }

    pub fn encounters(&self) -> impl Iterator<Item = (&str, &FxHashSet<EntityId>)> {
        self.encounters.iter().map(|(key, set)| (key.as_str(), set))
    }

    /// Is there nothing recorded at all?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
            && self.applied.is_empty()
            && self.bonuses.is_empty()
            && self.encounters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_idempotent() {
        let mut record = BonusRecord::new();
        record.mark_completed("a");
        record.mark_completed("a");
        record.mark_applied("a");
        record.mark_applied("a");

        assert_eq!(record.completed().count(), 1);
        assert_eq!(record.applied().count(), 1);
        assert!(record.is_completed("a"));
        assert!(record.is_applied("a"));
    }

    #[test]
    fn test_bonus_replaced_not_accumulated() {
        let mut record = BonusRecord::new();
        record.mark_applied("a");
        record.add_or_update_bonus("a", 50.0, 2);
        record.add_or_update_bonus("a", 20.0, 1);

        assert_eq!(record.bonus("a"), Some(SpeedBonus::new(20.0, 1)));
        assert_eq!(record.total_percent(), 20.0);
        assert_eq!(record.total_skip_seconds(), 1);
    }

    #[test]
    fn test_totals_only_count_applied() {
        let mut record = BonusRecord::new();
        record.add_or_update_bonus("applied", 800.0, 2);
        record.add_or_update_bonus("pending", 50.0, 3);
        record.mark_completed("applied");
        record.mark_applied("applied");
        record.mark_completed("pending");

        assert_eq!(record.total_percent(), 800.0);
        assert_eq!(record.total_skip_seconds(), 2);
        assert_eq!(record.pending(), vec!["pending".to_string()]);
    }

    #[test]
    fn test_stacking_across_ids() {
        let mut record = BonusRecord::new();
        for (id, pct, skip) in [("a", 800.0, 2), ("b", 50.0, 3)] {
            record.mark_completed(id);
            record.mark_applied(id);
            record.add_or_update_bonus(id, pct, skip);
        }

        assert_eq!(record.total_percent(), 850.0);
        assert_eq!(record.total_skip_seconds(), 5);
    }

    #[test]
    fn test_unique_encounters() {
        let mut record = BonusRecord::new();
        let victim = EntityId::new(9);

        assert!(record.record_unique_encounter("duel", victim));
        assert!(!record.record_unique_encounter("duel", victim));
        assert!(record.record_unique_encounter("duel", EntityId::new(10)));
        assert!(record.record_unique_encounter("other", victim));

        assert_eq!(record.encounter_count("duel"), 2);
        assert_eq!(record.encounter_count("other"), 1);
        assert_eq!(record.encounter_count("missing"), 0);
    }

    #[test]
    fn test_remove_special() {
        let mut record = BonusRecord::new();
        record.mark_completed("a");
        record.mark_applied("a");
        record.add_or_update_bonus("a", 10.0, 0);

        assert!(record.remove_special("a", false));
        assert!(record.is_completed("a"));
        assert!(!record.is_applied("a"));
        assert_eq!(record.bonus("a"), None);

        assert!(record.remove_special("a", true));
        assert!(!record.is_completed("a"));

        assert!(!record.remove_special("a", true));
    }

    #[test]
    fn test_is_empty() {
        let mut record = BonusRecord::new();
        assert!(record.is_empty());
        record.record_unique_encounter("k", EntityId::new(1));
        assert!(!record.is_empty());
    }
}
