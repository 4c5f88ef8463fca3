//! Special catalog.
//!
//! The catalog holds every validated special and the trigger indices used
//! to route domain events to them. It is built in one pass from the
//! configuration and is immutable afterwards; reloading builds a fresh
//! catalog that replaces the old one wholesale.
//!
//! Invalid entries never abort a load. Each one is skipped, logged, and
//! reported as a [`CatalogWarning`].

use log::{info, warn};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use thiserror::Error;

use super::config::{SpecialEntry, SpecialsConfig};
use super::definition::{
    EffectRequirement, Messages, Reward, Scope, SpecialDefinition, StageCondition, TriggerKind,
    TriggerName, TriggerSpec,
};

/// Ids sharing one index key. Most keys have one or two specials.
type Bucket = SmallVec<[String; 2]>;

/// Why a configuration entry was skipped.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CatalogWarning {
    #[error("special {id} is missing its trigger section")]
    MissingTrigger { id: String },

    #[error("special {id} has invalid trigger type: {kind}")]
    UnknownTrigger { id: String, kind: String },

    #[error("special {id} has invalid {field}: {name}")]
    UnresolvedName {
        id: String,
        field: &'static str,
        name: String,
    },

    #[error("special {id} is an unlock_entry trigger without an entry-id")]
    MissingEntryId { id: String },

    #[error("special {id} is a status_effect trigger without an effect")]
    MissingEffect { id: String },

    #[error("special {id} is missing its section condition")]
    MissingStageCondition { id: String },

    #[error("special {id} neither applies to all sections nor lists allowed sections")]
    NoStageTarget { id: String },

    #[error("special {id} is defined more than once")]
    DuplicateId { id: String },
}

/// Host-provided resolution of configured names.
///
/// Returns the canonical name when the host knows it, `None` otherwise.
pub trait Vocabulary {
    fn entity_type(&self, name: &str) -> Option<String>;
    fn item_type(&self, name: &str) -> Option<String>;
    fn status_effect(&self, name: &str) -> Option<String>;
}

/// Accepts every non-empty name, lower-cased.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenVocabulary;

impl OpenVocabulary {
    fn normalize(name: &str) -> Option<String> {
        let trimmed = name.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_ascii_lowercase())
    }
}

impl Vocabulary for OpenVocabulary {
    fn entity_type(&self, name: &str) -> Option<String> {
        Self::normalize(name)
    }

    fn item_type(&self, name: &str) -> Option<String> {
        Self::normalize(name)
    }

    fn status_effect(&self, name: &str) -> Option<String> {
        Self::normalize(name)
    }
}

fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Catalog of validated specials with trigger indices.
///
/// ## Example
///
/// ```
/// use progress_specials::specials::{OpenVocabulary, SpecialCatalog, SpecialsConfig};
///
/// let config = SpecialsConfig::from_json(r#"{
///     "specials": {
///         "first_zombie": {
///             "trigger": { "type": "entity_death", "entity-type": "zombie" },
///             "section": { "applies-to-all-sections": true }
///         },
///         "broken": { "trigger": { "type": "teleport" } }
///     }
/// }"#).unwrap();
///
/// let (catalog, warnings) = SpecialCatalog::load(&config, &OpenVocabulary);
/// assert_eq!(catalog.len(), 1);
/// assert_eq!(warnings.len(), 1);
/// assert_eq!(catalog.deaths_for("zombie", false).len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct SpecialCatalog {
    /// All specials by id.
    specials: FxHashMap<String, SpecialDefinition>,

    /// Load order, for deterministic iteration.
    order: Vec<String>,

    /// Death triggers by victim entity type.
    death_by_type: FxHashMap<String, Bucket>,

    /// Death triggers without an entity filter. Never matched by player victims.
    death_wildcard: Bucket,

    /// Pickup triggers by item type.
    pickup_by_item: FxHashMap<String, Bucket>,

    /// Pickup triggers without an item filter.
    pickup_wildcard: Bucket,

    /// Unlock triggers by entry id.
    unlock_by_entry: FxHashMap<String, Bucket>,

    /// Specials sensitive to a status effect (trigger or requirement).
    by_effect: FxHashMap<String, Bucket>,
}

impl SpecialCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from configuration.
    ///
    /// Invalid entries are skipped; one warning is returned per skipped entry.
    pub fn load(
        config: &SpecialsConfig,
        vocabulary: &dyn Vocabulary,
    ) -> (Self, Vec<CatalogWarning>) {
        let mut catalog = Self::new();
        let mut warnings = Vec::new();

        for (id, entry) in &config.specials {
            match Self::parse_entry(id, entry, vocabulary) {
                Ok(def) => {
                    if let Err(warning) = catalog.insert(def) {
                        warnings.push(warning);
                    }
                }
                Err(warning) => warnings.push(warning),
            }
        }

        for warning in &warnings {
            warn!("{warning}");
        }
        info!("Loaded {} specials from config.", catalog.len());

        (catalog, warnings)
    }

    /// Build a catalog from already-validated definitions.
    ///
    /// Definitions whose id is already present, or that name no stage
    /// target, are skipped with a warning.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = SpecialDefinition>,
    ) -> (Self, Vec<CatalogWarning>) {
        let mut catalog = Self::new();
        let mut warnings = Vec::new();

        for def in definitions {
            if !def.stage.has_target() {
                warnings.push(CatalogWarning::NoStageTarget { id: def.id });
                continue;
            }
            if let Err(warning) = catalog.insert(def) {
                warnings.push(warning);
            }
        }

        for warning in &warnings {
            warn!("{warning}");
        }

        (catalog, warnings)
    }

    fn parse_entry(
        id: &str,
        entry: &SpecialEntry,
        vocabulary: &dyn Vocabulary,
    ) -> Result<SpecialDefinition, CatalogWarning> {
        let unresolved = |field: &'static str, name: &str| CatalogWarning::UnresolvedName {
            id: id.to_string(),
            field,
            name: name.to_string(),
        };

        // --- Trigger ---
        let trigger = entry.trigger.as_ref().ok_or_else(|| CatalogWarning::MissingTrigger {
            id: id.to_string(),
        })?;
        let kind_name = trigger.kind.as_deref().unwrap_or("unlock_entry");
        let name = TriggerKind::parse_name(kind_name).ok_or_else(|| {
            CatalogWarning::UnknownTrigger {
                id: id.to_string(),
                kind: kind_name.to_string(),
            }
        })?;

        let kind = match name {
            TriggerName::EntityDeath => {
                let entity_type = match trigger.entity_type.as_deref() {
                    Some(raw) => Some(
                        vocabulary
                            .entity_type(raw)
                            .ok_or_else(|| unresolved("entity-type", raw))?,
                    ),
                    None => None,
                };
                TriggerKind::EntityDeath {
                    entity_type,
                    killer_must_be_player: trigger.killer_must_be_player.unwrap_or(true),
                }
            }
            TriggerName::ItemPickup => {
                let item_type = match trigger.item_type.as_deref() {
                    Some(raw) => Some(
                        vocabulary
                            .item_type(raw)
                            .ok_or_else(|| unresolved("item-type", raw))?,
                    ),
                    None => None,
                };
                TriggerKind::ItemPickup { item_type }
            }
            TriggerName::UnlockEntry => {
                let entry_id = trigger
                    .entry_id
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| CatalogWarning::MissingEntryId { id: id.to_string() })?;
                TriggerKind::UnlockEntry {
                    entry_id: entry_id.to_string(),
                }
            }
            TriggerName::StatusEffect => {
                let raw = trigger
                    .effect
                    .as_deref()
                    .ok_or_else(|| CatalogWarning::MissingEffect { id: id.to_string() })?;
                TriggerKind::StatusEffect {
                    effect: vocabulary
                        .status_effect(raw)
                        .ok_or_else(|| unresolved("effect", raw))?,
                    min_amplifier: trigger.min_amplifier.unwrap_or(0),
                }
            }
            TriggerName::Command => TriggerKind::Command,
        };

        // --- Stage condition ---
        let section = entry.section.as_ref().ok_or_else(|| {
            CatalogWarning::MissingStageCondition { id: id.to_string() }
        })?;
        let stage = StageCondition {
            require_type: section.require_type.clone(),
            min_index: section.min_index,
            max_index: section.max_index,
            applies_to_all: section.applies_to_all_sections,
            allowed_stages: section.allowed_sections.clone(),
        };
        if !stage.has_target() {
            return Err(CatalogWarning::NoStageTarget { id: id.to_string() });
        }

        // --- Requirement ---
        let requirement = match &entry.potion_requirement {
            Some(req) => Some(EffectRequirement {
                effect: vocabulary
                    .status_effect(&req.effect)
                    .ok_or_else(|| unresolved("potion-requirement effect", &req.effect))?,
                min_amplifier: req.min_amplifier,
            }),
            None => None,
        };

        Ok(SpecialDefinition {
            id: id.to_string(),
            trigger: TriggerSpec {
                kind,
                command_activatable: trigger.command_activatable,
            },
            stage,
            reward: Reward {
                speed_bonus_percent: entry.reward.speed_bonus_percent,
                speed_bonus_skip_seconds: entry.reward.speed_bonus_skip_seconds,
                session_skip_seconds: entry.reward.session_time_skip_seconds,
                auto_complete_stage: entry.reward.auto_complete_section,
                default_time_skip: entry.reward.default_time_skip,
            },
            scope: Scope {
                once_per_player: entry.scope.once_per_player,
                once_per_server: entry.scope.once_per_server,
            },
            messages: Messages {
                player: entry.messages.player.clone(),
                broadcast: entry.messages.broadcast.clone(),
            },
            requirement,
        })
    }

    /// Add a definition and index it.
    fn insert(&mut self, def: SpecialDefinition) -> Result<(), CatalogWarning> {
        if self.specials.contains_key(&def.id) {
            return Err(CatalogWarning::DuplicateId { id: def.id });
        }

        let id = def.id.clone();
        match &def.trigger.kind {
            TriggerKind::EntityDeath { entity_type, .. } => match entity_type {
                Some(ty) => self.death_by_type.entry(key(ty)).or_default().push(id.clone()),
                None => self.death_wildcard.push(id.clone()),
            },
            TriggerKind::ItemPickup { item_type } => match item_type {
                Some(item) => self.pickup_by_item.entry(key(item)).or_default().push(id.clone()),
                None => self.pickup_wildcard.push(id.clone()),
            },
            TriggerKind::UnlockEntry { entry_id } => {
                self.unlock_by_entry
                    .entry(entry_id.clone())
                    .or_default()
                    .push(id.clone());
            }
            // Command triggers are reached by id only; status-effect
            // triggers are indexed below together with requirements.
            TriggerKind::StatusEffect { .. } | TriggerKind::Command => {}
        }

        let mut effects: SmallVec<[String; 2]> = SmallVec::new();
        if let TriggerKind::StatusEffect { effect, .. } = &def.trigger.kind {
            effects.push(key(effect));
        }
        if let Some(req) = &def.requirement {
            let req_key = key(&req.effect);
            if !effects.contains(&req_key) {
                effects.push(req_key);
            }
        }
        for effect in effects {
            self.by_effect.entry(effect).or_default().push(id.clone());
        }

        self.order.push(id.clone());
        self.specials.insert(id, def);
        Ok(())
    }

    fn resolve<'a>(&'a self, ids: impl IntoIterator<Item = &'a String>) -> Vec<&'a SpecialDefinition> {
        ids.into_iter()
            .filter_map(|id| self.specials.get(id))
            .collect()
    }

    /// Get a special by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&SpecialDefinition> {
        self.specials.get(id)
    }

    /// Check if a special id is defined.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.specials.contains_key(id)
    }

    /// Number of specials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.specials.len()
    }

    /// Check if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specials.is_empty()
    }

    /// Iterate specials in load order.
    pub fn iter(&self) -> impl Iterator<Item = &SpecialDefinition> {
        self.order.iter().filter_map(|id| self.specials.get(id))
    }

    /// Death-triggered specials for a victim type.
    ///
    /// Specials without an entity filter only match non-player victims, so
    /// a generic "kill anything" special is never confused with a
    /// player-kill special.
    #[must_use]
    pub fn deaths_for(&self, entity_type: &str, victim_is_player: bool) -> Vec<&SpecialDefinition> {
        let exact = self.death_by_type.get(&key(entity_type)).into_iter().flatten();
        if victim_is_player {
            self.resolve(exact)
        } else {
            self.resolve(exact.chain(self.death_wildcard.iter()))
        }
    }

    /// Pickup-triggered specials for an item type.
    #[must_use]
    pub fn pickups_for(&self, item_type: &str) -> Vec<&SpecialDefinition> {
        let exact = self.pickup_by_item.get(&key(item_type)).into_iter().flatten();
        self.resolve(exact.chain(self.pickup_wildcard.iter()))
    }

    /// Unlock-triggered specials for an entry id.
    #[must_use]
    pub fn unlocks_for(&self, entry_id: &str) -> Vec<&SpecialDefinition> {
        self.resolve(self.unlock_by_entry.get(entry_id).into_iter().flatten())
    }

    /// Specials whose trigger or requirement names a status effect.
    #[must_use]
    pub fn effect_related(&self, effect: &str) -> Vec<&SpecialDefinition> {
        self.resolve(self.by_effect.get(&key(effect)).into_iter().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(json: &str) -> (SpecialCatalog, Vec<CatalogWarning>) {
        let config = SpecialsConfig::from_json(json).unwrap();
        SpecialCatalog::load(&config, &OpenVocabulary)
    }

    /// Vocabulary that knows nothing.
    struct ClosedVocabulary;

    impl Vocabulary for ClosedVocabulary {
        fn entity_type(&self, _: &str) -> Option<String> {
            None
        }
        fn item_type(&self, _: &str) -> Option<String> {
            None
        }
        fn status_effect(&self, _: &str) -> Option<String> {
            None
        }
    }

    #[test]
    fn test_load_valid_entry() {
        let (catalog, warnings) = load(r#"{
            "specials": {
                "wood": {
                    "trigger": { "type": "item_pickup", "item-type": "OAK_LOG" },
                    "section": { "allowed-sections": ["special:wood"], "min-index": 1 },
                    "reward": { "speed-bonus-percent": 50.0, "speed-bonus-skip-seconds": 2 },
                    "scope": { "once-per-server": true },
                    "messages": { "player": "hi {player}" }
                }
            }
        }"#);

        assert!(warnings.is_empty());
        let def = catalog.get("wood").unwrap();
        assert_eq!(
            def.trigger.kind,
            TriggerKind::ItemPickup { item_type: Some("oak_log".into()) }
        );
        assert_eq!(def.stage.min_index, Some(1));
        assert_eq!(def.reward.speed_bonus_skip_seconds, 2);
        assert!(def.scope.once_per_player);
        assert!(def.scope.once_per_server);
        assert_eq!(def.messages.player, "hi {player}");
        assert_eq!(catalog.pickups_for("oak_log").len(), 1);
        assert_eq!(catalog.pickups_for("OAK_LOG").len(), 1);
    }

    #[test]
    fn test_missing_trigger_type_defaults_to_unlock() {
        let (catalog, warnings) = load(r#"{
            "specials": {
                "entry": {
                    "trigger": { "entry-id": "iron_pick" },
                    "section": { "applies-to-all-sections": true }
                }
            }
        }"#);

        assert!(warnings.is_empty());
        assert_eq!(catalog.unlocks_for("iron_pick").len(), 1);
        assert!(catalog.unlocks_for("stone_pick").is_empty());
    }

    #[test]
    fn test_invalid_entries_skipped() {
        let (catalog, warnings) = load(r#"{
            "specials": {
                "no_trigger": { "section": { "applies-to-all-sections": true } },
                "bad_kind": {
                    "trigger": { "type": "jump" },
                    "section": { "applies-to-all-sections": true }
                },
                "no_section": { "trigger": { "type": "command" } },
                "no_target": {
                    "trigger": { "type": "command" },
                    "section": { "require-type": "SPECIAL" }
                },
                "no_entry": {
                    "trigger": { "type": "unlock_entry" },
                    "section": { "applies-to-all-sections": true }
                },
                "no_effect": {
                    "trigger": { "type": "status_effect" },
                    "section": { "applies-to-all-sections": true }
                },
                "good": {
                    "trigger": { "type": "command" },
                    "section": { "applies-to-all-sections": true }
                }
            }
        }"#);

        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains("good"));
        assert_eq!(warnings.len(), 6);
        assert!(warnings.contains(&CatalogWarning::MissingTrigger { id: "no_trigger".into() }));
        assert!(warnings.contains(&CatalogWarning::UnknownTrigger {
            id: "bad_kind".into(),
            kind: "jump".into()
        }));
        assert!(warnings.contains(&CatalogWarning::MissingStageCondition { id: "no_section".into() }));
        assert!(warnings.contains(&CatalogWarning::NoStageTarget { id: "no_target".into() }));
        assert!(warnings.contains(&CatalogWarning::MissingEntryId { id: "no_entry".into() }));
        assert!(warnings.contains(&CatalogWarning::MissingEffect { id: "no_effect".into() }));
    }

    #[test]
    fn test_unresolvable_names_skipped() {
        let config = SpecialsConfig::from_json(r#"{
            "specials": {
                "mob": {
                    "trigger": { "type": "entity_death", "entity-type": "dragon" },
                    "section": { "applies-to-all-sections": true }
                },
                "gated": {
                    "trigger": { "type": "command" },
                    "section": { "applies-to-all-sections": true },
                    "potion-requirement": { "effect": "luck" }
                },
                "plain": {
                    "trigger": { "type": "command" },
                    "section": { "applies-to-all-sections": true }
                }
            }
        }"#).unwrap();

        let (catalog, warnings) = SpecialCatalog::load(&config, &ClosedVocabulary);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains("plain"));
        assert_eq!(warnings.len(), 2);
        assert!(matches!(
            &warnings[0],
            CatalogWarning::UnresolvedName { field: "potion-requirement effect", .. }
        ));
        assert!(matches!(
            &warnings[1],
            CatalogWarning::UnresolvedName { field: "entity-type", .. }
        ));
    }

    #[test]
    fn test_death_wildcard_excluded_for_players() {
        let (catalog, _) = load(r#"{
            "specials": {
                "any_kill": {
                    "trigger": { "type": "entity_death" },
                    "section": { "applies-to-all-sections": true }
                },
                "player_kill": {
                    "trigger": { "type": "entity_death", "entity-type": "player" },
                    "section": { "applies-to-all-sections": true }
                },
                "zombie_kill": {
                    "trigger": { "type": "entity_death", "entity-type": "zombie" },
                    "section": { "applies-to-all-sections": true }
                }
            }
        }"#);

        let zombie: Vec<_> = catalog.deaths_for("zombie", false).iter().map(|d| d.id.as_str()).collect();
        assert_eq!(zombie, vec!["zombie_kill", "any_kill"]);

        let player: Vec<_> = catalog.deaths_for("player", true).iter().map(|d| d.id.as_str()).collect();
        assert_eq!(player, vec!["player_kill"]);

        let skeleton: Vec<_> = catalog.deaths_for("skeleton", false).iter().map(|d| d.id.as_str()).collect();
        assert_eq!(skeleton, vec!["any_kill"]);
    }

    #[test]
    fn test_effect_index() {
        let (catalog, _) = load(r#"{
            "specials": {
                "haste_trigger": {
                    "trigger": { "type": "status_effect", "effect": "haste", "min-amplifier": 1 },
                    "section": { "applies-to-all-sections": true }
                },
                "haste_gated": {
                    "trigger": { "type": "unlock_entry", "entry-id": "x" },
                    "section": { "applies-to-all-sections": true },
                    "potion-requirement": { "effect": "HASTE", "min-amplifier": 0 }
                },
                "ungated": {
                    "trigger": { "type": "unlock_entry", "entry-id": "x" },
                    "section": { "applies-to-all-sections": true }
                }
            }
        }"#);

        let related: Vec<_> = catalog.effect_related("haste").iter().map(|d| d.id.as_str()).collect();
        assert_eq!(related, vec!["haste_gated", "haste_trigger"]);
        assert!(catalog.effect_related("speed").is_empty());
        assert_eq!(catalog.unlocks_for("x").len(), 2);
    }

    #[test]
    fn test_from_definitions_rejects_duplicates() {
        let def = SpecialDefinition::new(
            "dup",
            TriggerSpec::new(TriggerKind::Command),
            StageCondition::all_stages(),
        );
        let untargeted = SpecialDefinition::new(
            "nowhere",
            TriggerSpec::new(TriggerKind::Command),
            StageCondition::default(),
        );

        let (catalog, warnings) =
            SpecialCatalog::from_definitions([def.clone(), def, untargeted]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            warnings,
            vec![
                CatalogWarning::DuplicateId { id: "dup".into() },
                CatalogWarning::NoStageTarget { id: "nowhere".into() },
            ]
        );
    }

    #[test]
    fn test_iter_in_load_order() {
        let (catalog, _) = load(r#"{
            "specials": {
                "b": { "trigger": { "type": "command" }, "section": { "applies-to-all-sections": true } },
                "a": { "trigger": { "type": "command" }, "section": { "applies-to-all-sections": true } }
            }
        }"#);

        let ids: Vec<_> = catalog.iter().map(|d| d.id.as_str()).collect();
        // BTreeMap keys load in sorted order
        assert_eq!(ids, vec!["a", "b"]);
    }
}
