//! On-disk forms of player records and server locks.
//!
//! ```json
//! {
//!   "speed-bonuses": { "emerald": { "percent": 800.0, "skip-seconds": 10 } },
//!   "completed-specials": ["emerald", "wood"],
//!   "applied-specials": ["emerald"],
//!   "unique-encounters": { "duels": ["123e4567-e89b-12d3-a456-426614174000"] }
//! }
//! ```
//!
//! Lists and maps are written sorted so files diff cleanly.

use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::core::{EntityId, PlayerId};
use crate::record::{BonusRecord, GlobalLocks};

/// A stored speed bonus.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BonusEntry {
    #[serde(default)]
    pub percent: f64,
    #[serde(default)]
    pub skip_seconds: i32,
}

/// Persisted form of a [`BonusRecord`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PlayerFile {
    pub speed_bonuses: BTreeMap<String, BonusEntry>,
    pub completed_specials: Vec<String>,

    /// Absent in files written before the applied set was stored. Such
    /// files count every completed special with a stored bonus as applied.
    pub applied_specials: Option<Vec<String>>,

    pub unique_encounters: BTreeMap<String, Vec<String>>,
}

impl PlayerFile {
    /// Capture a record.
    #[must_use]
    pub fn from_record(record: &BonusRecord) -> Self {
        let mut completed: Vec<String> = record.completed().map(str::to_string).collect();
        completed.sort();
        let mut applied: Vec<String> = record.applied().map(str::to_string).collect();
        applied.sort();

        let speed_bonuses = record
            .bonuses()
            .map(|(id, bonus)| {
                (
                    id.to_string(),
                    BonusEntry {
                        percent: bonus.percent,
                        skip_seconds: bonus.skip_seconds,
                    },
                )
            })
            .collect();

        let unique_encounters = record
            .encounters()
            .map(|(key, victims)| {
                let mut ids: Vec<EntityId> = victims.iter().copied().collect();
                ids.sort();
                (key.to_string(), ids.iter().map(ToString::to_string).collect())
            })
            .collect();

        Self {
            speed_bonuses,
            completed_specials: completed,
            applied_specials: Some(applied),
            unique_encounters,
        }
    }

    /// Rebuild a record. Invalid victim ids are skipped with a warning.
    #[must_use]
    pub fn into_record(self, player: PlayerId) -> BonusRecord {
        let mut record = BonusRecord::new();

        for (id, bonus) in &self.speed_bonuses {
            record.add_or_update_bonus(id, bonus.percent, bonus.skip_seconds);
        }
        for id in &self.completed_specials {
            record.mark_completed(id);
        }
        match &self.applied_specials {
            Some(applied) => {
                for id in applied {
                    record.mark_completed(id);
                    record.mark_applied(id);
                }
            }
            None => {
                for id in &self.completed_specials {
                    if self.speed_bonuses.contains_key(id) {
                        record.mark_applied(id);
                    }
                }
            }
        }

        for (key, victims) in &self.unique_encounters {
            for raw in victims {
                match raw.parse::<EntityId>() {
                    Ok(victim) => {
                        record.record_unique_encounter(key, victim);
                    }
                    Err(err) => warn!("Skipping encounter {key} of {player}: {err}"),
                }
            }
        }

        record
    }
}

/// Persisted form of [`GlobalLocks`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GlobalFile {
    pub completed_specials_server: Vec<String>,
    /// Lock holders, by special id.
    pub lock_holders: BTreeMap<String, String>,
}

impl GlobalFile {
    #[must_use]
    pub fn from_locks(locks: &GlobalLocks) -> Self {
        let mut completed: Vec<String> = locks.iter().map(str::to_string).collect();
        completed.sort();
        Self {
            completed_specials_server: completed,
            lock_holders: locks
                .holders()
                .map(|(id, holder)| (id.to_string(), holder.to_string()))
                .collect(),
        }
    }

    /// Rebuild the locks. Invalid holder ids keep the lock with no holder.
    #[must_use]
    pub fn into_locks(self) -> GlobalLocks {
        let mut locks = GlobalLocks::new();
        for id in self.completed_specials_server {
            let holder = self.lock_holders.get(&id).and_then(|raw| match raw.parse::<PlayerId>() {
                Ok(player) => Some(player),
                Err(err) => {
                    warn!("Ignoring holder of server lock {id}: {err}");
                    None
                }
            });
            locks.restore(id, holder);
        }
        locks
    }
}
