//! Domain events and their dispatch.
//!
//! Every entry point follows the same shape: resolve the player the event
//! credits, look up the specials the event routes to, sweep the player's
//! pending specials, then run the state machine for each routed special.
//! Events that route to no special skip the sweep.

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::activity::{ActivityTick, Location};
use crate::core::{ContextEntity, EntityId, PlayerId};
use crate::specials::TriggerKind;

use super::encounter::EncounterGrant;
use super::host::ProgressionHost;
use super::trigger::{TriggerEngine, TriggerOutcome};

/// An entity died.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathEvent {
    /// The entity that died.
    pub victim: ContextEntity,

    /// Whether the victim is a player.
    pub victim_is_player: bool,

    /// Player credited with the kill, if any.
    pub credited: Option<PlayerId>,

    /// Whether the credited player dealt the killing blow directly.
    pub killer_is_player: bool,
}

impl DeathEvent {
    /// A non-player victim with no credited player.
    pub fn new(victim: ContextEntity) -> Self {
        Self {
            victim,
            victim_is_player: false,
            credited: None,
            killer_is_player: false,
        }
    }

    /// A player victim with no credited player.
    #[must_use]
    pub fn player_victim(player: PlayerId) -> Self {
        Self {
            victim: ContextEntity::new(EntityId::player(player), "player"),
            victim_is_player: true,
            credited: None,
            killer_is_player: false,
        }
    }

    /// Credit a player who killed the victim directly (builder pattern).
    #[must_use]
    pub fn killed_by(mut self, killer: PlayerId) -> Self {
        self.credited = Some(killer);
        self.killer_is_player = true;
        self
    }

    /// Credit a player who did not deal the killing blow (builder pattern).
    #[must_use]
    pub fn credited_to(mut self, player: PlayerId) -> Self {
        self.credited = Some(player);
        self.killer_is_player = false;
        self
    }
}

/// A player picked up an item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupEvent {
    pub player: PlayerId,
    pub item_type: String,
    /// The item entity in the world, if the host tracks one.
    pub entity: Option<EntityId>,
}

impl PickupEvent {
    pub fn new(player: PlayerId, item_type: impl Into<String>) -> Self {
        Self {
            player,
            item_type: item_type.into(),
            entity: None,
        }
    }

    /// Attach the item entity (builder pattern).
    #[must_use]
    pub fn with_entity(mut self, entity: EntityId) -> Self {
        self.entity = Some(entity);
        self
    }

    fn context(&self) -> Option<ContextEntity> {
        self.entity
            .map(|id| ContextEntity::new(id, self.item_type.to_ascii_lowercase()))
    }
}

/// What an event entry point did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Pending specials granted by the sweep.
    pub swept: Vec<String>,
    /// State machine result per routed special.
    pub outcomes: Vec<(String, TriggerOutcome)>,
    /// Distinct-encounter steps granted.
    pub encounters: Vec<EncounterGrant>,
}

impl DispatchReport {
    /// Ids granted by this dispatch, sweep first.
    #[must_use]
    pub fn applied(&self) -> Vec<&str> {
        self.swept
            .iter()
            .map(String::as_str)
            .chain(
                self.outcomes
                    .iter()
                    .filter(|(_, outcome)| outcome.is_applied())
                    .map(|(id, _)| id.as_str()),
            )
            .collect()
    }

    /// The outcome for one routed special.
    #[must_use]
    pub fn outcome(&self, id: &str) -> Option<&TriggerOutcome> {
        self.outcomes
            .iter()
            .find(|(routed, _)| routed == id)
            .map(|(_, outcome)| outcome)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.swept.is_empty() && self.outcomes.is_empty() && self.encounters.is_empty()
    }
}

impl<H: ProgressionHost> TriggerEngine<H> {
    /// An entity died.
    ///
    /// Nothing happens without a credited player. Specials that require a
    /// player killer are skipped when the credited player did not deal the
    /// killing blow.
    pub fn on_entity_death(&mut self, event: &DeathEvent) -> DispatchReport {
        let mut report = DispatchReport::default();
        let Some(player) = event.credited else {
            return report;
        };

        report.encounters = self.record_encounters(player, &event.victim);

        let catalog = Arc::clone(&self.catalog);
        let routed = catalog.deaths_for(&event.victim.entity_type, event.victim_is_player);
        if routed.is_empty() {
            return report;
        }

        report.swept = self.sweep(player, None);
        for def in routed {
            let needs_player_killer = matches!(
                def.trigger.kind,
                TriggerKind::EntityDeath {
                    killer_must_be_player: true,
                    ..
                }
            );
            if needs_player_killer && !event.killer_is_player {
                continue;
            }
            let outcome = self.trigger(def, player, Some(event.victim.clone()));
            report.outcomes.push((def.id.clone(), outcome));
        }
        report
    }

    /// A player picked up an item.
    pub fn on_item_pickup(&mut self, event: &PickupEvent) -> DispatchReport {
        let mut report = DispatchReport::default();
        let catalog = Arc::clone(&self.catalog);
        let routed = catalog.pickups_for(&event.item_type);
        if routed.is_empty() {
            return report;
        }

        report.swept = self.sweep(event.player, None);
        for def in routed {
            let outcome = self.trigger(def, event.player, event.context());
            report.outcomes.push((def.id.clone(), outcome));
        }
        report
    }

    /// The host unlocked a progression entry for a player.
    pub fn on_unlock_entry(&mut self, player: PlayerId, entry_id: &str) -> DispatchReport {
        let mut report = DispatchReport::default();
        let catalog = Arc::clone(&self.catalog);
        let routed = catalog.unlocks_for(entry_id);
        if routed.is_empty() {
            return report;
        }

        report.swept = self.sweep(player, None);
        for def in routed {
            let outcome = self.trigger(def, player, None);
            report.outcomes.push((def.id.clone(), outcome));
        }
        report
    }

    /// A player's status effect was added, changed or removed.
    ///
    /// Sweeps the specials tied to that effect, then fires status-effect
    /// triggers the player now satisfies.
    pub fn on_effect_changed(&mut self, player: PlayerId, effect: &str) -> DispatchReport {
        let mut report = DispatchReport {
            swept: self.sweep(player, Some(effect)),
            ..DispatchReport::default()
        };

        let catalog = Arc::clone(&self.catalog);
        for def in catalog.effect_related(effect) {
            let TriggerKind::StatusEffect {
                effect: trigger_effect,
                min_amplifier,
            } = &def.trigger.kind
            else {
                continue;
            };
            let held = self.host.active_effect(player, trigger_effect);
            if !held.is_some_and(|e| e.amplifier >= *min_amplifier) {
                continue;
            }
            let outcome = self.trigger(def, player, None);
            report.outcomes.push((def.id.clone(), outcome));
        }
        report
    }

    /// A player joined: grant what became eligible while they were away and
    /// push their aggregate speed.
    pub fn on_session_start(&mut self, player: PlayerId) -> DispatchReport {
        let report = DispatchReport {
            swept: self.sweep(player, None),
            ..DispatchReport::default()
        };
        if self.republish(player) {
            debug!("Republished aggregate speed for {player}");
        }
        report
    }

    /// A player left. Their record stays; speed baselines and activity
    /// memory are dropped since the host resets its timer state.
    pub fn on_session_end(&mut self, player: PlayerId) {
        self.speed.forget(player);
        self.activity.forget(player);
    }

    /// A player's stage changed.
    pub fn on_stage_changed(&mut self, player: PlayerId) -> DispatchReport {
        DispatchReport {
            swept: self.sweep(player, None),
            ..DispatchReport::default()
        }
    }

    /// The host reports classified world activity for an activity hook.
    ///
    /// Returns the tick pushed to the timer, if the activity earned one.
    pub fn on_activity(
        &mut self,
        player: PlayerId,
        hook: &str,
        location: Option<&Location>,
        now_millis: u64,
    ) -> Option<ActivityTick> {
        let stage = self.stage_of(player);
        let tick = self
            .activity
            .record(player, hook, location, now_millis, stage.as_ref())?;
        self.speed
            .push_raw(player, tick.skip_seconds, tick.speed_percent, &tick.reason);
        Some(tick)
    }
}
