//! Configuration schema for specials.
//!
//! This is the raw, serde-facing shape of the configuration. It is
//! deliberately permissive: every field is optional or defaulted, and
//! validation happens when the catalog is built from it.
//!
//! ## Example
//!
//! ```
//! use progress_specials::specials::SpecialsConfig;
//!
//! let config = SpecialsConfig::from_json(r#"{
//!     "specials": {
//!         "wood_boost": {
//!             "trigger": { "type": "item_pickup", "item-type": "oak_log" },
//!             "section": { "allowed-sections": ["special:wood"] },
//!             "reward": { "speed-bonus-percent": 50.0 }
//!         }
//!     }
//! }"#).unwrap();
//!
//! assert_eq!(config.specials.len(), 1);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::EngineSettings;

/// Root of the specials configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SpecialsConfig {
    /// Rule entries keyed by id.
    #[serde(default)]
    pub specials: BTreeMap<String, SpecialEntry>,

    /// Distinct-encounter rules keyed by tracking key.
    #[serde(default)]
    pub encounters: BTreeMap<String, EncounterEntry>,

    /// Stage activity hooks keyed by hook name.
    #[serde(default)]
    pub activity: BTreeMap<String, ActivityEntry>,

    /// Engine policy settings.
    #[serde(default)]
    pub settings: EngineSettings,
}

impl SpecialsConfig {
    /// Parse a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not match the schema.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// One configured special.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SpecialEntry {
    pub trigger: Option<TriggerEntry>,
    pub section: Option<SectionEntry>,
    #[serde(default)]
    pub reward: RewardEntry,
    #[serde(default)]
    pub scope: ScopeEntry,
    #[serde(default)]
    pub messages: MessagesEntry,
    pub potion_requirement: Option<PotionRequirementEntry>,
}

/// `trigger` block.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TriggerEntry {
    /// Trigger kind name; `unlock_entry` when absent.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub entity_type: Option<String>,
    pub killer_must_be_player: Option<bool>,
    pub item_type: Option<String>,
    pub entry_id: Option<String>,
    /// Status effect for `status_effect` triggers.
    pub effect: Option<String>,
    pub min_amplifier: Option<i32>,
    #[serde(default)]
    pub command_activatable: bool,
}

/// `section` block (stage condition).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SectionEntry {
    pub require_type: Option<String>,
    pub min_index: Option<i32>,
    pub max_index: Option<i32>,
    #[serde(default)]
    pub applies_to_all_sections: bool,
    #[serde(default)]
    pub allowed_sections: Vec<String>,
}

/// `reward` block.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RewardEntry {
    pub speed_bonus_percent: f64,
    pub speed_bonus_skip_seconds: i32,
    pub session_time_skip_seconds: i32,
    pub auto_complete_section: bool,
    pub default_time_skip: bool,
}

/// `scope` block.
///
/// A missing block means neither flag; inside a block, `once-per-player`
/// defaults to on.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScopeEntry {
    #[serde(default = "default_true")]
    pub once_per_player: bool,
    #[serde(default)]
    pub once_per_server: bool,
}

/// `messages` block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagesEntry {
    pub player: String,
    pub broadcast: String,
}

/// `potion-requirement` block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PotionRequirementEntry {
    pub effect: String,
    #[serde(default)]
    pub min_amplifier: i32,
}

/// A distinct-encounter rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EncounterEntry {
    /// Victim entity type that counts; `player` when absent.
    #[serde(default = "default_victim_type")]
    pub victim_type: String,
    /// Maximum number of distinct victims that grant a skip.
    pub cap: u32,
    #[serde(default)]
    pub session_time_skip_seconds: i32,
    #[serde(default)]
    pub message: String,
}

fn default_victim_type() -> String {
    "player".to_string()
}

/// A stage activity hook.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ActivityEntry {
    /// Stage id the hook is active in.
    pub section: String,
    #[serde(default = "default_activity_skip")]
    pub skip_seconds: i32,
    #[serde(default = "default_activity_percent")]
    pub speed_percent: f64,
    #[serde(default = "default_activity_cooldown")]
    pub cooldown_millis: u64,
    #[serde(default = "default_true")]
    pub distinct_locations: bool,
}

fn default_activity_skip() -> i32 {
    1
}

fn default_activity_percent() -> f64 {
    5.0
}

fn default_activity_cooldown() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config() {
        let config = SpecialsConfig::from_json("{}").unwrap();
        assert!(config.specials.is_empty());
        assert!(config.encounters.is_empty());
        assert_eq!(config.settings, EngineSettings::default());
    }

    #[test]
    fn test_full_entry() {
        let json = r#"{
            "specials": {
                "zombie_slayer": {
                    "trigger": {
                        "type": "ENTITY_DEATH",
                        "entity-type": "zombie",
                        "killer-must-be-player": false
                    },
                    "section": {
                        "require-type": "SPECIAL",
                        "min-index": 2,
                        "max-index": 5,
                        "allowed-sections": ["special:wood"]
                    },
                    "reward": {
                        "speed-bonus-percent": 25.5,
                        "speed-bonus-skip-seconds": 4,
                        "session-time-skip-seconds": 30,
                        "auto-complete-section": true
                    },
                    "scope": { "once-per-server": true },
                    "messages": { "player": "Well done {player}" },
                    "potion-requirement": { "effect": "speed", "min-amplifier": 1 }
                }
            }
        }"#;
        let config = SpecialsConfig::from_json(json).unwrap();
        let entry = &config.specials["zombie_slayer"];

        let trigger = entry.trigger.as_ref().unwrap();
        assert_eq!(trigger.kind.as_deref(), Some("ENTITY_DEATH"));
        assert_eq!(trigger.killer_must_be_player, Some(false));

        let section = entry.section.as_ref().unwrap();
        assert_eq!(section.min_index, Some(2));
        assert!(!section.applies_to_all_sections);

        assert_eq!(entry.reward.speed_bonus_percent, 25.5);
        assert!(entry.reward.auto_complete_section);
        assert!(!entry.reward.default_time_skip);

        // once-per-player keeps its default when only once-per-server is given
        assert!(entry.scope.once_per_player);
        assert!(entry.scope.once_per_server);

        assert_eq!(entry.messages.broadcast, "");
        assert_eq!(entry.potion_requirement.as_ref().unwrap().min_amplifier, 1);
    }

    #[test]
    fn test_encounter_and_activity_defaults() {
        let json = r#"{
            "encounters": { "duelist": { "cap": 3 } },
            "activity": { "housing": { "section": "housing" } }
        }"#;
        let config = SpecialsConfig::from_json(json).unwrap();

        let duelist = &config.encounters["duelist"];
        assert_eq!(duelist.victim_type, "player");
        assert_eq!(duelist.session_time_skip_seconds, 0);

        let housing = &config.activity["housing"];
        assert_eq!(housing.skip_seconds, 1);
        assert_eq!(housing.speed_percent, 5.0);
        assert_eq!(housing.cooldown_millis, 1000);
        assert!(housing.distinct_locations);
    }

    #[test]
    fn test_scope_defaults() {
        let json = r#"{
            "specials": {
                "bare": {},
                "empty": { "scope": {} },
                "server": { "scope": { "once-per-server": true } }
            }
        }"#;
        let config = SpecialsConfig::from_json(json).unwrap();

        assert_eq!(config.specials["bare"].scope, ScopeEntry::default());
        assert!(!config.specials["bare"].scope.once_per_player);
        assert!(config.specials["empty"].scope.once_per_player);
        assert!(!config.specials["empty"].scope.once_per_server);
        assert!(config.specials["server"].scope.once_per_player);
        assert!(config.specials["server"].scope.once_per_server);
    }
}
