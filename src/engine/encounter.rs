//! Distinct-encounter rules.
//!
//! A rule counts distinct victims of one entity type per player. Each new
//! victim up to the cap grants an immediate session skip; later victims are
//! still remembered but grant nothing. A player never counts as their own
//! victim.

use log::debug;

use crate::core::{ContextEntity, PlayerId};
use crate::specials::EncounterEntry;

use super::host::ProgressionHost;
use super::trigger::TriggerEngine;

/// One configured distinct-encounter rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncounterRule {
    /// Tracking key in the player's record.
    pub key: String,
    /// Victim entity type, lower-cased.
    pub victim_type: String,
    /// Number of distinct victims that grant a skip.
    pub cap: u32,
    pub session_skip_seconds: i32,
    /// Message template, `{player}` and `{count}` substituted.
    pub message: String,
}

impl EncounterRule {
    /// Build a rule from its configuration entry.
    pub fn from_entry(key: impl Into<String>, entry: &EncounterEntry) -> Self {
        Self {
            key: key.into(),
            victim_type: entry.victim_type.trim().to_ascii_lowercase(),
            cap: entry.cap,
            session_skip_seconds: entry.session_time_skip_seconds,
            message: entry.message.clone(),
        }
    }

    #[must_use]
    pub fn matches(&self, victim_type: &str) -> bool {
        self.victim_type.eq_ignore_ascii_case(victim_type)
    }
}

/// A granted encounter step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncounterGrant {
    pub key: String,
    /// Distinct victims recorded so far, this one included.
    pub count: usize,
}

impl<H: ProgressionHost> TriggerEngine<H> {
    /// Record a victim against every matching encounter rule.
    pub(crate) fn record_encounters(
        &mut self,
        player: PlayerId,
        victim: &ContextEntity,
    ) -> Vec<EncounterGrant> {
        if victim.id.is_player(player) {
            return Vec::new();
        }

        let mut grants = Vec::new();
        for rule in &self.encounters {
            if !rule.matches(&victim.entity_type) {
                continue;
            }

            let record = self.records.entry(player).or_default();
            if !record.record_unique_encounter(&rule.key, victim.id) {
                continue;
            }
            let count = record.encounter_count(&rule.key);
            if count > rule.cap as usize {
                debug!("Encounter {} for {player} past cap ({count})", rule.key);
                continue;
            }

            let reason = self.settings.reason_for(&rule.key);
            self.speed
                .session_skip(player, rule.session_skip_seconds, &reason);
            if !rule.message.is_empty() {
                let name = self.host.player_name(player);
                let message = rule
                    .message
                    .replace("{player}", &name)
                    .replace("{count}", &count.to_string());
                self.host.send_message(player, &message);
            }

            grants.push(EncounterGrant {
                key: rule.key.clone(),
                count,
            });
        }
        grants
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_entry_normalizes_type() {
        let entry = EncounterEntry {
            victim_type: " PLAYER ".to_string(),
            cap: 3,
            session_time_skip_seconds: 60,
            message: String::new(),
        };
        let rule = EncounterRule::from_entry("duels", &entry);

        assert_eq!(rule.victim_type, "player");
        assert!(rule.matches("Player"));
        assert!(!rule.matches("zombie"));
    }
}
