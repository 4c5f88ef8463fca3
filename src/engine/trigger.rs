//! The per-(player, special) state machine.
//!
//! ## States
//!
//! ```text
//! Unseen ──trigger──▶ Pending ──sweep──▶ Applied
//!    └──────────trigger──────────────────▲
//! ```
//!
//! - **Unseen**: nothing recorded.
//! - **Pending**: completed but not applied. The trigger was satisfied while
//!   the stage or status-effect gate was closed. Re-checked by [`sweep`].
//! - **Applied**: terminal. The reward was granted.
//!
//! Once-per-server specials additionally pass through [`GlobalLocks`]: the
//! first player to complete one takes the lock and every later trigger from
//! anyone is ignored.
//!
//! ## Transition on a trigger
//!
//! 1. once-per-server and locked: nothing
//! 2. already applied: nothing
//! 3. stage not eligible: mark completed, take the lock, stop
//! 4. once-per-player and already completed and applied: nothing
//! 5. status-effect requirement unmet: as 3 (lock per settings)
//! 6. otherwise: take the lock, apply the reward
//!
//! [`sweep`]: TriggerEngine::sweep

use std::sync::Arc;

use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::activity::{ActivityHook, ActivityTracker};
use crate::core::{ContextEntity, EngineSettings, PlayerId, StageSnapshot};
use crate::eligibility::{requirement_met, StageMatcher};
use crate::record::{BonusRecord, GlobalLocks};
use crate::specials::{
    CatalogWarning, Messages, SpecialCatalog, SpecialDefinition, SpecialsConfig, Vocabulary,
};
use crate::speed::SpeedStackingService;

use super::encounter::EncounterRule;
use super::host::{resolved_stage, ProgressionHost};
use super::notify::{HandlerRegistry, SpecialHandler, SpecialTriggered};

/// Result of running the state machine for one special.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Once-per-server special already consumed.
    ServerLocked,
    /// The player already has it.
    AlreadyApplied,
    /// Stage gate closed; recorded as pending.
    Deferred { reason: String },
    /// Completed and applied before, and only grantable once.
    Repeated,
    /// Stage matched but the status-effect requirement did not; pending.
    AwaitingEffect,
    /// Reward granted.
    Applied,
}

impl TriggerOutcome {
    /// Did this outcome grant the reward?
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    /// Did this outcome leave the special pending?
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Deferred { .. } | Self::AwaitingEffect)
    }
}

/// The specials rule engine.
///
/// Owns the catalog, every player's [`BonusRecord`], the server-wide locks
/// and the speed publisher. The host delivers events one at a time; every
/// entry point takes `&mut self`.
///
/// ## Example
///
/// ```
/// use std::sync::Arc;
/// use progress_specials::core::{PlayerId, StageSnapshot};
/// use progress_specials::engine::{ProgressionHost, TriggerEngine};
/// use progress_specials::specials::{OpenVocabulary, SpecialsConfig};
/// use progress_specials::speed::TimeModifier;
///
/// struct Host;
/// impl TimeModifier for Host {
///     fn apply_external_time_skip(&self, _: PlayerId, _: i32, _: f64, _: &str) {}
/// }
/// impl ProgressionHost for Host {
///     fn current_stage(&self, _: PlayerId) -> Option<StageSnapshot> {
///         Some(StageSnapshot::new("special:wood").with_index(3))
///     }
///     fn stage_index(&self, _: &str) -> i32 { 3 }
/// }
///
/// let config = SpecialsConfig::from_json(r#"{
///     "specials": {
///         "first_log": {
///             "trigger": { "type": "item_pickup", "item-type": "oak_log" },
///             "section": { "allowed-sections": ["special:wood"] },
///             "reward": { "speed-bonus-percent": 50 }
///         }
///     }
/// }"#).unwrap();
///
/// let (mut engine, warnings) = TriggerEngine::from_config(Arc::new(Host), &config, &OpenVocabulary);
/// assert!(warnings.is_empty());
///
/// let player = PlayerId::new(7);
/// engine.on_item_pickup(&progress_specials::engine::PickupEvent::new(player, "oak_log"));
/// assert!(engine.record(player).unwrap().is_applied("first_log"));
/// ```
pub struct TriggerEngine<H: ProgressionHost> {
    pub(super) host: Arc<H>,
    pub(super) catalog: Arc<SpecialCatalog>,
    pub(super) settings: EngineSettings,
    pub(super) records: FxHashMap<PlayerId, BonusRecord>,
    pub(super) locks: GlobalLocks,
    pub(super) speed: SpeedStackingService<Arc<H>>,
    pub(super) handlers: HandlerRegistry,
    pub(super) encounters: Vec<EncounterRule>,
    pub(super) activity: ActivityTracker,
}

impl<H: ProgressionHost> TriggerEngine<H> {
    /// Create an engine over a prepared catalog.
    pub fn new(host: Arc<H>, catalog: SpecialCatalog, settings: EngineSettings) -> Self {
        Self {
            speed: SpeedStackingService::new(Arc::clone(&host)),
            host,
            catalog: Arc::new(catalog),
            settings,
            records: FxHashMap::default(),
            locks: GlobalLocks::new(),
            handlers: HandlerRegistry::new(),
            encounters: Vec::new(),
            activity: ActivityTracker::new(),
        }
    }

    /// Create an engine from configuration.
    ///
    /// Returns the warnings of every skipped special.
    pub fn from_config(
        host: Arc<H>,
        config: &SpecialsConfig,
        vocabulary: &dyn Vocabulary,
    ) -> (Self, Vec<CatalogWarning>) {
        let (catalog, warnings) = SpecialCatalog::load(config, vocabulary);
        let mut engine = Self::new(host, catalog, config.settings.clone());
        engine.configure_extras(config);
        (engine, warnings)
    }

    /// Add distinct-encounter rules (builder pattern).
    #[must_use]
    pub fn with_encounters(mut self, rules: impl IntoIterator<Item = EncounterRule>) -> Self {
        self.encounters.extend(rules);
        self
    }

    /// Add activity hooks (builder pattern).
    #[must_use]
    pub fn with_activity_hooks(mut self, hooks: impl IntoIterator<Item = ActivityHook>) -> Self {
        self.activity.set_hooks(hooks);
        self
    }

    fn configure_extras(&mut self, config: &SpecialsConfig) {
        self.encounters = config
            .encounters
            .iter()
            .map(|(key, entry)| EncounterRule::from_entry(key.as_str(), entry))
            .collect();
        self.activity.set_hooks(
            config
                .activity
                .iter()
                .map(|(key, entry)| ActivityHook::from_entry(key.as_str(), entry)),
        );
    }

    /// Rebuild the catalog from configuration and swap it in.
    ///
    /// Player records and locks are kept. Records may reference ids that no
    /// longer exist; those are ignored by the sweep.
    pub fn reload(&mut self, config: &SpecialsConfig, vocabulary: &dyn Vocabulary) -> Vec<CatalogWarning> {
        let (catalog, warnings) = SpecialCatalog::load(config, vocabulary);
        info!("Reloaded specials catalog: {} specials", catalog.len());
        self.catalog = Arc::new(catalog);
        self.settings = config.settings.clone();
        self.configure_extras(config);
        warnings
    }

    /// The current catalog.
    #[must_use]
    pub fn catalog(&self) -> Arc<SpecialCatalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// A player's record, if one exists.
    #[must_use]
    pub fn record(&self, player: PlayerId) -> Option<&BonusRecord> {
        self.records.get(&player)
    }

    /// All player records.
    pub fn records(&self) -> impl Iterator<Item = (PlayerId, &BonusRecord)> {
        self.records.iter().map(|(player, record)| (*player, record))
    }

    #[must_use]
    pub fn locks(&self) -> &GlobalLocks {
        &self.locks
    }

    #[must_use]
    pub fn speed(&self) -> &SpeedStackingService<Arc<H>> {
        &self.speed
    }

    /// Register a handler for every applied special.
    pub fn subscribe(&mut self, handler: impl SpecialHandler + 'static) {
        self.handlers.subscribe(handler);
    }

    /// Register a handler for one special id.
    pub fn subscribe_to(&mut self, special_id: impl Into<String>, handler: impl SpecialHandler + 'static) {
        self.handlers.subscribe_to(special_id, handler);
    }

    /// The player's stage with its index resolved.
    #[must_use]
    pub fn stage_of(&self, player: PlayerId) -> Option<StageSnapshot> {
        resolved_stage(self.host.as_ref(), player)
    }

    /// Run the state machine for one triggered special.
    pub fn trigger(
        &mut self,
        def: &SpecialDefinition,
        player: PlayerId,
        context: Option<ContextEntity>,
    ) -> TriggerOutcome {
        let id = def.id.as_str();

        if def.scope.once_per_server && self.locks.is_locked(id) {
            return TriggerOutcome::ServerLocked;
        }
        if self.records.get(&player).is_some_and(|r| r.is_applied(id)) {
            return TriggerOutcome::AlreadyApplied;
        }

        self.evaluate_and_apply(def, player, context)
    }

    /// Gate checks and grant, shared by triggers, the sweep and commands.
    pub(super) fn evaluate_and_apply(
        &mut self,
        def: &SpecialDefinition,
        player: PlayerId,
        context: Option<ContextEntity>,
    ) -> TriggerOutcome {
        let id = def.id.as_str();

        let snapshot = self.stage_of(player);
        let stage = StageMatcher::evaluate(Some(&def.stage), snapshot.as_ref());
        if !stage.allowed {
            self.defer(def, player, true);
            debug!("Special {id} pending for {player}: {}", stage.reason);
            return TriggerOutcome::Deferred {
                reason: stage.reason,
            };
        }

        let record = self.records.entry(player).or_default();
        if def.scope.once_per_player && record.is_completed(id) && record.is_applied(id) {
            return TriggerOutcome::Repeated;
        }

        if !self.requirement_met(def, player) {
            self.defer(def, player, self.settings.lock_server_on_unmet_requirement);
            debug!("Special {id} pending for {player}: status effect requirement not met");
            return TriggerOutcome::AwaitingEffect;
        }

        if def.scope.once_per_server && self.locks.acquire(id, player) {
            debug!("Special {id} locked server-wide by {player}");
        }
        self.apply_reward(def, player, context);
        TriggerOutcome::Applied
    }

    fn requirement_met(&self, def: &SpecialDefinition, player: PlayerId) -> bool {
        let held = def
            .requirement
            .as_ref()
            .and_then(|req| self.host.active_effect(player, &req.effect));
        requirement_met(def.requirement.as_ref(), held)
    }

    /// Record a special as pending, optionally taking its server lock.
    fn defer(&mut self, def: &SpecialDefinition, player: PlayerId, take_lock: bool) {
        self.records.entry(player).or_default().mark_completed(&def.id);
        if take_lock && def.scope.once_per_server && self.locks.acquire(&def.id, player) {
            debug!("Special {} locked server-wide by {player} (pending)", def.id);
        }
    }

    /// Grant a special's reward.
    ///
    /// Marks it completed and applied, stores the speed bonus (or runs the
    /// host's default skip instead), republishes the player's speed, pushes
    /// the session skip, completes the stage if configured, sends messages
    /// and notifies subscribers.
    pub(super) fn apply_reward(
        &mut self,
        def: &SpecialDefinition,
        player: PlayerId,
        context: Option<ContextEntity>,
    ) {
        let id = def.id.as_str();
        let reward = &def.reward;
        let reason = self.settings.reason_for(id);

        let record = self.records.entry(player).or_default();
        record.mark_completed(id);
        record.mark_applied(id);

        if reward.default_time_skip {
            self.host.apply_default_time_skip(player, &reason);
        } else if reward.has_speed_bonus() {
            record.add_or_update_bonus(id, reward.speed_bonus_percent, reward.speed_bonus_skip_seconds);
        }

        self.speed.publish(player, record, &reason);
        self.speed
            .session_skip(player, reward.session_skip_seconds, &reason);

        if reward.auto_complete_stage {
            self.host.complete_current_stage(player);
        }

        let messages = &def.messages;
        if !messages.player.is_empty() || !messages.broadcast.is_empty() {
            let name = self.host.player_name(player);
            if !messages.player.is_empty() {
                let text = Messages::render(&messages.player, &name, id);
                self.host.send_message(player, &text);
            }
            if !messages.broadcast.is_empty() {
                let text = Messages::render(&messages.broadcast, &name, id);
                self.host.broadcast(&text);
            }
        }

        debug!("Special {id} applied to {player}");
        self.handlers.notify(&SpecialTriggered {
            special_id: id.to_string(),
            player,
            context,
        });
    }

    /// Re-check a player's pending specials and grant those whose gates are
    /// now open.
    ///
    /// With `effect_filter`, specials tied to a different status effect are
    /// skipped; specials tied to no effect are always re-checked. Returns the
    /// ids granted, in id order.
    pub fn sweep(&mut self, player: PlayerId, effect_filter: Option<&str>) -> Vec<String> {
        let catalog = Arc::clone(&self.catalog);
        let Some(pending) = self.records.get(&player).map(BonusRecord::pending) else {
            return Vec::new();
        };

        let mut granted = Vec::new();
        for id in pending {
            let Some(def) = catalog.get(&id) else {
                continue;
            };
            if let (Some(filter), Some(effect)) = (effect_filter, def.effect_key()) {
                if !effect.eq_ignore_ascii_case(filter) {
                    continue;
                }
            }
            if def.scope.once_per_server && !self.locks.admits(&id, player) {
                continue;
            }
            if self.evaluate_and_apply(def, player, None).is_applied() {
                granted.push(id);
            }
        }
        granted
    }

    /// Push the player's full aggregate speed if it differs from what was
    /// last pushed.
    pub fn republish(&mut self, player: PlayerId) -> bool {
        let record = self.records.entry(player).or_default();
        let reason = format!("{}: aggregate", self.settings.reason_prefix);
        self.speed.publish(player, record, &reason).is_some()
    }

    /// Replace the whole persisted state (records and locks).
    ///
    /// Speed baselines are cleared; call [`on_session_start`] for online
    /// players to push their totals again.
    ///
    /// [`on_session_start`]: TriggerEngine::on_session_start
    pub fn restore(&mut self, records: FxHashMap<PlayerId, BonusRecord>, locks: GlobalLocks) {
        for player in self.records.keys().copied().collect::<Vec<_>>() {
            self.speed.forget(player);
        }
        info!(
            "Restored specials state: {} players, {} server locks",
            records.len(),
            locks.len()
        );
        self.records = records;
        self.locks = locks;
    }
}

impl<H: ProgressionHost> std::fmt::Debug for TriggerEngine<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerEngine")
            .field("specials", &self.catalog.len())
            .field("players", &self.records.len())
            .field("locks", &self.locks.len())
            .field("handlers", &self.handlers)
            .finish()
    }
}
