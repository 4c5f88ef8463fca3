//! Shared test host: records every call the engine makes.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use progress_specials::core::{ActiveEffect, PlayerId, StageSnapshot};
use progress_specials::engine::{ProgressionHost, TriggerEngine};
use progress_specials::specials::{OpenVocabulary, SpecialsConfig};
use progress_specials::speed::TimeModifier;

/// One call to the timer hook.
#[derive(Clone, Debug, PartialEq)]
pub struct Push {
    pub player: PlayerId,
    pub skip_seconds: i32,
    pub percent: f64,
    pub reason: String,
}

/// Host whose state tests set directly.
#[derive(Default)]
pub struct MockHost {
    stages: RefCell<HashMap<PlayerId, StageSnapshot>>,
    indices: RefCell<HashMap<String, i32>>,
    effects: RefCell<HashMap<(PlayerId, String), i32>>,
    permissions: RefCell<HashSet<(PlayerId, String)>>,

    pub pushes: RefCell<Vec<Push>>,
    pub completed_stages: RefCell<Vec<PlayerId>>,
    pub default_skips: RefCell<Vec<(PlayerId, String)>>,
    pub messages: RefCell<Vec<(PlayerId, String)>>,
    pub broadcasts: RefCell<Vec<String>>,
}

impl MockHost {
    /// Put a player in a stage. The index is registered with the host, not
    /// the snapshot, so the engine has to resolve it.
    pub fn set_stage(&self, player: PlayerId, id: &str, stage_type: &str, index: i32) {
        self.indices.borrow_mut().insert(id.to_string(), index);
        self.stages
            .borrow_mut()
            .insert(player, StageSnapshot::new(id).with_type(stage_type));
    }

    pub fn clear_stage(&self, player: PlayerId) {
        self.stages.borrow_mut().remove(&player);
    }

    pub fn set_effect(&self, player: PlayerId, effect: &str, amplifier: i32) {
        self.effects
            .borrow_mut()
            .insert((player, effect.to_string()), amplifier);
    }

    pub fn remove_effect(&self, player: PlayerId, effect: &str) {
        self.effects.borrow_mut().remove(&(player, effect.to_string()));
    }

    pub fn grant(&self, player: PlayerId, permission: &str) {
        self.permissions
            .borrow_mut()
            .insert((player, permission.to_string()));
    }

    pub fn push_count(&self) -> usize {
        self.pushes.borrow().len()
    }

    pub fn last_push(&self) -> Option<Push> {
        self.pushes.borrow().last().cloned()
    }

    /// Sum of pushed skips for a player.
    pub fn total_skip(&self, player: PlayerId) -> i32 {
        self.pushes
            .borrow()
            .iter()
            .filter(|p| p.player == player)
            .map(|p| p.skip_seconds)
            .sum()
    }

    /// Product of pushed speed factors for a player, as the host timer
    /// would accumulate them.
    pub fn total_multiplier(&self, player: PlayerId) -> f64 {
        self.pushes
            .borrow()
            .iter()
            .filter(|p| p.player == player)
            .map(|p| 1.0 + p.percent / 100.0)
            .product()
    }
}

impl TimeModifier for MockHost {
    fn apply_external_time_skip(&self, player: PlayerId, skip_seconds: i32, percent: f64, reason: &str) {
        self.pushes.borrow_mut().push(Push {
            player,
            skip_seconds,
            percent,
            reason: reason.to_string(),
        });
    }
}

impl ProgressionHost for MockHost {
    fn current_stage(&self, player: PlayerId) -> Option<StageSnapshot> {
        self.stages.borrow().get(&player).cloned()
    }

    fn stage_index(&self, stage_id: &str) -> i32 {
        self.indices.borrow().get(stage_id).copied().unwrap_or(-1)
    }

    fn complete_current_stage(&self, player: PlayerId) {
        self.completed_stages.borrow_mut().push(player);
    }

    fn active_effect(&self, player: PlayerId, effect: &str) -> Option<ActiveEffect> {
        self.effects
            .borrow()
            .get(&(player, effect.to_string()))
            .map(|amplifier| ActiveEffect::new(*amplifier))
    }

    fn apply_default_time_skip(&self, player: PlayerId, reason: &str) {
        self.default_skips
            .borrow_mut()
            .push((player, reason.to_string()));
    }

    fn player_name(&self, player: PlayerId) -> String {
        format!("Player{}", player.raw())
    }

    fn send_message(&self, player: PlayerId, message: &str) {
        self.messages
            .borrow_mut()
            .push((player, message.to_string()));
    }

    fn broadcast(&self, message: &str) {
        self.broadcasts.borrow_mut().push(message.to_string());
    }

    fn has_permission(&self, player: PlayerId, permission: &str) -> bool {
        self.permissions
            .borrow()
            .contains(&(player, permission.to_string()))
    }
}

/// Build an engine from a JSON configuration. Panics on invalid entries so
/// typos in test configs surface immediately.
pub fn engine(json: &str) -> (TriggerEngine<MockHost>, Arc<MockHost>) {
    let config = SpecialsConfig::from_json(json).expect("valid config json");
    let host = Arc::new(MockHost::default());
    let (engine, warnings) = TriggerEngine::from_config(Arc::clone(&host), &config, &OpenVocabulary);
    assert!(warnings.is_empty(), "unexpected catalog warnings: {warnings:?}");
    (engine, host)
}

pub fn player(n: u128) -> PlayerId {
    PlayerId::new(n)
}
