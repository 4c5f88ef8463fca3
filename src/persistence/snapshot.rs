//! Binary snapshot of the whole persisted state.
//!
//! Used for periodic saves into memory or a blob store, where one compact
//! value is handier than a directory of JSON files. The snapshot carries the
//! same forms as the JSON files, so both paths restore identically.

use serde::{Deserialize, Serialize};

use crate::core::PlayerId;
use crate::engine::{ProgressionHost, TriggerEngine};

use super::record_file::{GlobalFile, PlayerFile};
use super::store::StoreError;

/// Every player record plus the server locks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Records sorted by player.
    pub players: Vec<(PlayerId, PlayerFile)>,
    pub global: GlobalFile,
}

impl EngineSnapshot {
    /// Capture an engine's persisted state.
    #[must_use]
    pub fn capture<H: ProgressionHost>(engine: &TriggerEngine<H>) -> Self {
        let mut players: Vec<(PlayerId, PlayerFile)> = engine
            .records()
            .map(|(player, record)| (player, PlayerFile::from_record(record)))
            .collect();
        players.sort_by_key(|(player, _)| *player);

        Self {
            players,
            global: GlobalFile::from_locks(engine.locks()),
        }
    }

    /// Replace an engine's records and locks with this snapshot.
    pub fn restore_into<H: ProgressionHost>(self, engine: &mut TriggerEngine<H>) {
        let records = self
            .players
            .into_iter()
            .map(|(player, file)| (player, file.into_record(player)))
            .collect();
        engine.restore(records, self.global.into_locks());
    }

    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from bincode.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityId;
    use crate::record::BonusRecord;

    #[test]
    fn test_bytes_roundtrip() {
        let mut record = BonusRecord::new();
        record.mark_completed("emerald");
        record.mark_applied("emerald");
        record.add_or_update_bonus("emerald", 800.0, 10);
        record.record_unique_encounter("duels", EntityId::new(5));

        let snapshot = EngineSnapshot {
            players: vec![(PlayerId::new(1), PlayerFile::from_record(&record))],
            global: GlobalFile {
                completed_specials_server: vec!["dragon".to_string()],
                ..GlobalFile::default()
            },
        };

        let bytes = snapshot.to_bytes().unwrap();
        assert_eq!(EngineSnapshot::from_bytes(&bytes).unwrap(), snapshot);
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            EngineSnapshot::from_bytes(&[0xff; 3]),
            Err(StoreError::Snapshot(_))
        ));
    }
}
