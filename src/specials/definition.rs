//! Special definitions - validated, immutable rule data.
//!
//! A `SpecialDefinition` is what a configuration entry becomes once the
//! catalog has validated it. Definitions never change after load; a reload
//! builds new ones.

use serde::{Deserialize, Serialize};

/// What kind of domain event fires a special, with the fields relevant to
/// that kind only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerKind {
    /// An entity died. `None` entity type matches any non-player victim.
    EntityDeath {
        entity_type: Option<String>,
        killer_must_be_player: bool,
    },

    /// A player picked up an item. `None` item type matches any item.
    ItemPickup { item_type: Option<String> },

    /// The host unlocked a progression entry for the player.
    UnlockEntry { entry_id: String },

    /// The player gained a status effect at or above an amplifier.
    StatusEffect { effect: String, min_amplifier: i32 },

    /// Only reachable through the `activate` command.
    Command,
}

impl TriggerKind {
    /// Parse a configured trigger kind name.
    ///
    /// Case-insensitive; `-` and `_` are interchangeable. `entity_pickup`
    /// is accepted as an alias of `item_pickup`.
    #[must_use]
    pub fn parse_name(name: &str) -> Option<TriggerName> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "entity_death" => Some(TriggerName::EntityDeath),
            "item_pickup" | "entity_pickup" => Some(TriggerName::ItemPickup),
            "unlock_entry" => Some(TriggerName::UnlockEntry),
            "status_effect" | "potion_effect" => Some(TriggerName::StatusEffect),
            "command" => Some(TriggerName::Command),
            _ => None,
        }
    }

    /// The tag of this trigger.
    #[must_use]
    pub fn name(&self) -> TriggerName {
        match self {
            Self::EntityDeath { .. } => TriggerName::EntityDeath,
            Self::ItemPickup { .. } => TriggerName::ItemPickup,
            Self::UnlockEntry { .. } => TriggerName::UnlockEntry,
            Self::StatusEffect { .. } => TriggerName::StatusEffect,
            Self::Command => TriggerName::Command,
        }
    }
}

/// Tag of a `TriggerKind`, used while parsing configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerName {
    EntityDeath,
    ItemPickup,
    UnlockEntry,
    StatusEffect,
    Command,
}

impl std::fmt::Display for TriggerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::EntityDeath => "entity_death",
            Self::ItemPickup => "item_pickup",
            Self::UnlockEntry => "unlock_entry",
            Self::StatusEffect => "status_effect",
            Self::Command => "command",
        };
        f.write_str(name)
    }
}

/// Trigger descriptor of a special.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerSpec {
    pub kind: TriggerKind,

    /// May the `activate` command grant this special directly?
    pub command_activatable: bool,
}

impl TriggerSpec {
    /// Create a trigger descriptor that is not command-activatable.
    #[must_use]
    pub fn new(kind: TriggerKind) -> Self {
        Self {
            kind,
            command_activatable: false,
        }
    }

    /// Allow activation by command (builder pattern).
    #[must_use]
    pub fn command_activatable(mut self) -> Self {
        self.command_activatable = true;
        self
    }

    /// Check whether the `activate` command may grant this special.
    #[must_use]
    pub fn allows_command(&self) -> bool {
        self.command_activatable || matches!(self.kind, TriggerKind::Command)
    }
}

/// Which stages a special may be applied in.
///
/// Bounds are inclusive and optional; an absent bound is unbounded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCondition {
    pub require_type: Option<String>,
    pub min_index: Option<i32>,
    pub max_index: Option<i32>,
    pub applies_to_all: bool,
    pub allowed_stages: Vec<String>,
}

impl StageCondition {
    /// A condition that allows every stage.
    #[must_use]
    pub fn all_stages() -> Self {
        Self {
            applies_to_all: true,
            ..Self::default()
        }
    }

    /// A condition restricted to a whitelist of stage ids.
    pub fn only(stages: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            allowed_stages: stages.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Require a stage type (builder pattern).
    #[must_use]
    pub fn with_type(mut self, stage_type: impl Into<String>) -> Self {
        self.require_type = Some(stage_type.into());
        self
    }

    /// Set inclusive index bounds (builder pattern).
    #[must_use]
    pub fn with_index_range(mut self, min: Option<i32>, max: Option<i32>) -> Self {
        self.min_index = min;
        self.max_index = max;
        self
    }

    /// Does this condition name any stage target at all?
    #[must_use]
    pub fn has_target(&self) -> bool {
        self.applies_to_all || !self.allowed_stages.is_empty()
    }
}

/// What a special grants when applied.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    /// Additive progress-speed bonus, in percent.
    pub speed_bonus_percent: f64,
    /// Seconds shaved off each timed stage, stacked with the percent.
    pub speed_bonus_skip_seconds: i32,
    /// One-off skip pushed when the special is applied.
    pub session_skip_seconds: i32,
    /// Complete the player's current stage on application.
    pub auto_complete_stage: bool,
    /// Use the host's generic skip instead of storing a bonus.
    pub default_time_skip: bool,
}

impl Reward {
    /// Does this reward carry a stackable speed bonus?
    #[must_use]
    pub fn has_speed_bonus(&self) -> bool {
        self.speed_bonus_percent != 0.0 || self.speed_bonus_skip_seconds != 0
    }
}

/// How often a special may be granted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub once_per_player: bool,
    pub once_per_server: bool,
}

impl Default for Scope {
    fn default() -> Self {
        Self {
            once_per_player: true,
            once_per_server: false,
        }
    }
}

/// Message templates. `{player}` and `{special}` are substituted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Messages {
    pub player: String,
    pub broadcast: String,
}

impl Messages {
    /// Render a template for a player name and special id.
    #[must_use]
    pub fn render(template: &str, player_name: &str, special_id: &str) -> String {
        template
            .replace("{player}", player_name)
            .replace("{special}", special_id)
    }
}

/// Status effect a player must hold for the reward to be granted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectRequirement {
    pub effect: String,
    pub min_amplifier: i32,
}

/// A validated special.
///
/// ## Example
///
/// ```
/// use progress_specials::specials::{
///     Reward, SpecialDefinition, StageCondition, TriggerKind, TriggerSpec,
/// };
///
/// let def = SpecialDefinition::new(
///     "wood_boost",
///     TriggerSpec::new(TriggerKind::ItemPickup { item_type: Some("oak_log".into()) }),
///     StageCondition::only(["special:wood"]),
/// )
/// .with_reward(Reward { speed_bonus_percent: 50.0, ..Reward::default() });
///
/// assert_eq!(def.id, "wood_boost");
/// assert!(def.reward.has_speed_bonus());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpecialDefinition {
    /// Unique identifier.
    pub id: String,
    pub trigger: TriggerSpec,
    pub stage: StageCondition,
    pub reward: Reward,
    pub scope: Scope,
    pub messages: Messages,
    pub requirement: Option<EffectRequirement>,
}

impl SpecialDefinition {
    /// Create a definition with an empty reward and the default scope.
    pub fn new(id: impl Into<String>, trigger: TriggerSpec, stage: StageCondition) -> Self {
        Self {
            id: id.into(),
            trigger,
            stage,
            reward: Reward::default(),
            scope: Scope::default(),
            messages: Messages::default(),
            requirement: None,
        }
    }

    /// Set the reward (builder pattern).
    #[must_use]
    pub fn with_reward(mut self, reward: Reward) -> Self {
        self.reward = reward;
        self
    }

    /// Set the scope (builder pattern).
    #[must_use]
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Set the message templates (builder pattern).
    #[must_use]
    pub fn with_messages(mut self, player: impl Into<String>, broadcast: impl Into<String>) -> Self {
        self.messages = Messages {
            player: player.into(),
            broadcast: broadcast.into(),
        };
        self
    }

    /// Set the status-effect requirement (builder pattern).
    #[must_use]
    pub fn with_requirement(mut self, effect: impl Into<String>, min_amplifier: i32) -> Self {
        self.requirement = Some(EffectRequirement {
            effect: effect.into(),
            min_amplifier,
        });
        self
    }

    /// Status effect this special is sensitive to, if any.
    ///
    /// Used to pre-filter sweeps on effect-change notifications.
    #[must_use]
    pub fn effect_key(&self) -> Option<&str> {
        if let Some(req) = &self.requirement {
            return Some(&req.effect);
        }
        match &self.trigger.kind {
            TriggerKind::StatusEffect { effect, .. } => Some(effect),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trigger_names() {
        assert_eq!(TriggerKind::parse_name("ENTITY_DEATH"), Some(TriggerName::EntityDeath));
        assert_eq!(TriggerKind::parse_name("item-pickup"), Some(TriggerName::ItemPickup));
        assert_eq!(TriggerKind::parse_name("entity_pickup"), Some(TriggerName::ItemPickup));
        assert_eq!(TriggerKind::parse_name(" Unlock_Entry "), Some(TriggerName::UnlockEntry));
        assert_eq!(TriggerKind::parse_name("status_effect"), Some(TriggerName::StatusEffect));
        assert_eq!(TriggerKind::parse_name("command"), Some(TriggerName::Command));
        assert_eq!(TriggerKind::parse_name("block_break"), None);
    }

    #[test]
    fn test_trigger_name_display() {
        assert_eq!(TriggerName::EntityDeath.to_string(), "entity_death");
        assert_eq!(TriggerKind::Command.name(), TriggerName::Command);
    }

    #[test]
    fn test_command_activatable() {
        let unlock = TriggerSpec::new(TriggerKind::UnlockEntry { entry_id: "a".into() });
        assert!(!unlock.allows_command());
        assert!(unlock.clone().command_activatable().allows_command());
        assert!(TriggerSpec::new(TriggerKind::Command).allows_command());
    }

    #[test]
    fn test_stage_condition_targets() {
        assert!(StageCondition::all_stages().has_target());
        assert!(StageCondition::only(["a"]).has_target());
        assert!(!StageCondition::default().has_target());
    }

    #[test]
    fn test_render_messages() {
        let text = Messages::render("{player} earned {special}!", "Alex", "wood_boost");
        assert_eq!(text, "Alex earned wood_boost!");
    }

    #[test]
    fn test_effect_key() {
        let trigger = TriggerSpec::new(TriggerKind::Command);
        let plain = SpecialDefinition::new("a", trigger.clone(), StageCondition::all_stages());
        assert_eq!(plain.effect_key(), None);

        let required = plain.clone().with_requirement("speed", 1);
        assert_eq!(required.effect_key(), Some("speed"));

        let effect_trigger = SpecialDefinition::new(
            "b",
            TriggerSpec::new(TriggerKind::StatusEffect { effect: "haste".into(), min_amplifier: 0 }),
            StageCondition::all_stages(),
        );
        assert_eq!(effect_trigger.effect_key(), Some("haste"));
    }

    #[test]
    fn test_reward_speed_bonus() {
        assert!(!Reward::default().has_speed_bonus());
        let skip_only = Reward { speed_bonus_skip_seconds: 3, ..Reward::default() };
        assert!(skip_only.has_speed_bonus());
    }
}
