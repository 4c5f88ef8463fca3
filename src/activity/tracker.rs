//! Stage activity ticks.
//!
//! Some stages progress through plain world activity (building, farming)
//! rather than through specials. The host classifies the activity and reports
//! it under a hook key; the tracker decides whether the report earns a tick:
//!
//! 1. the player's current stage must be the hook's stage,
//! 2. the last accepted tick for `(player, hook)` must be at least
//!    `cooldown_millis` old,
//! 3. with `distinct_locations`, the location must differ from the last
//!    accepted one.
//!
//! An accepted tick pushes a fixed skip and speed delta to the timer.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{PlayerId, StageSnapshot};
use crate::specials::ActivityEntry;

/// A block position in the host world.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub world: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Location {
    pub fn new(world: impl Into<String>, x: i32, y: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }
}

/// One configured activity hook.
#[derive(Clone, Debug, PartialEq)]
pub struct ActivityHook {
    pub key: String,
    /// Stage id the hook is active in (case-insensitive).
    pub stage: String,
    pub skip_seconds: i32,
    pub speed_percent: f64,
    pub cooldown_millis: u64,
    pub distinct_locations: bool,
}

impl ActivityHook {
    /// Build a hook from its configuration entry.
    pub fn from_entry(key: impl Into<String>, entry: &ActivityEntry) -> Self {
        Self {
            key: key.into(),
            stage: entry.section.clone(),
            skip_seconds: entry.skip_seconds,
            speed_percent: entry.speed_percent,
            cooldown_millis: entry.cooldown_millis,
            distinct_locations: entry.distinct_locations,
        }
    }

    /// Reason string pushed with the tick.
    #[must_use]
    pub fn reason(&self) -> String {
        format!("{} activity", self.key)
    }
}

/// What an accepted tick pushes to the timer.
#[derive(Clone, Debug, PartialEq)]
pub struct ActivityTick {
    pub skip_seconds: i32,
    pub speed_percent: f64,
    pub reason: String,
}

/// Last accepted tick of one player on one hook.
#[derive(Clone, Debug, Default)]
struct LastTick {
    at_millis: Option<u64>,
    location: Option<Location>,
}

/// Per-player cooldown and location memory for activity hooks.
#[derive(Clone, Debug, Default)]
pub struct ActivityTracker {
    hooks: FxHashMap<String, ActivityHook>,
    last: FxHashMap<(PlayerId, String), LastTick>,
}

impl ActivityTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tracker from configured hooks.
    pub fn from_hooks(hooks: impl IntoIterator<Item = ActivityHook>) -> Self {
        Self {
            hooks: hooks.into_iter().map(|h| (h.key.clone(), h)).collect(),
            last: FxHashMap::default(),
        }
    }

    /// Replace the configured hooks. Tick memory of removed hooks is dropped.
    pub fn set_hooks(&mut self, hooks: impl IntoIterator<Item = ActivityHook>) {
        self.hooks = hooks.into_iter().map(|h| (h.key.clone(), h)).collect();
        let hooks = &self.hooks;
        self.last.retain(|(_, key), _| hooks.contains_key(key));
    }

    #[must_use]
    pub fn hook(&self, key: &str) -> Option<&ActivityHook> {
        self.hooks.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Decide whether a reported activity earns a tick, and record it if so.
    pub fn record(
        &mut self,
        player: PlayerId,
        key: &str,
        location: Option<&Location>,
        now_millis: u64,
        stage: Option<&StageSnapshot>,
    ) -> Option<ActivityTick> {
        let hook = self.hooks.get(key)?;
        if !stage.is_some_and(|s| s.id.eq_ignore_ascii_case(&hook.stage)) {
            return None;
        }

        let last = self.last.entry((player, key.to_string())).or_default();
        if let Some(at) = last.at_millis {
            if now_millis.saturating_sub(at) < hook.cooldown_millis {
                return None;
            }
        }
        if hook.distinct_locations && location.is_some() && last.location.as_ref() == location {
            return None;
        }

        last.at_millis = Some(now_millis);
        if location.is_some() {
            last.location = location.cloned();
        }

        Some(ActivityTick {
            skip_seconds: hook.skip_seconds,
            speed_percent: hook.speed_percent,
            reason: hook.reason(),
        })
    }

    /// Forget a player's tick memory.
    pub fn forget(&mut self, player: PlayerId) {
        self.last.retain(|(p, _), _| *p != player);
    }
}
