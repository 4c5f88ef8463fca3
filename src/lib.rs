//! # progress-specials
//!
//! A rule engine for progression "specials": configurable rules that grant
//! speed bonuses, time skips and stage completion when a player satisfies a
//! trigger while in an eligible progression stage.
//!
//! ## Design Principles
//!
//! 1. **Host-Agnostic**: Players, stages, status effects and the progression
//!    timer belong to the host, reached through `ProgressionHost`.
//!
//! 2. **Deferred, Never Lost**: A trigger that fires in the wrong stage is
//!    recorded as pending and granted by a later sweep.
//!
//! 3. **Deltas Only**: The host timer is cumulative, so speed changes are
//!    pushed as differences from the last push. Nothing is double-applied.
//!
//! ## Modules
//!
//! - `core`: Player and entity ids, stage snapshots, engine settings
//! - `specials`: Configuration schema, definitions, catalog and indices
//! - `eligibility`: Stage condition and status-effect checks
//! - `record`: Per-player records and server-wide locks
//! - `speed`: Bonus stacking and delta publication
//! - `engine`: Trigger state machine, events, commands, notifications
//! - `activity`: Cooldown-throttled stage activity hooks
//! - `persistence`: JSON files and bincode snapshots

pub mod core;
pub mod specials;
pub mod eligibility;
pub mod record;
pub mod speed;
pub mod engine;
pub mod activity;
pub mod persistence;

// Re-export commonly used types
pub use crate::core::{
    ActiveEffect, ContextEntity, EngineSettings, EntityId, ParseIdError, PlayerId, StageSnapshot,
};

pub use crate::specials::{
    CatalogWarning, OpenVocabulary, SpecialCatalog, SpecialDefinition, SpecialsConfig,
    StageCondition, TriggerKind, TriggerSpec, Vocabulary,
};

pub use crate::eligibility::{requirement_met, StageMatch, StageMatcher};

pub use crate::record::{BonusRecord, GlobalLocks, SpeedBonus};

pub use crate::speed::{SpeedStackingService, TimeModifier};

pub use crate::engine::{
    CommandIssuer, CommandResponse, DeathEvent, DispatchReport, PickupEvent, ProgressionHost,
    SpecialCommand, SpecialHandler, SpecialTriggered, TriggerEngine, TriggerOutcome,
};

pub use crate::activity::{ActivityTracker, Location};

pub use crate::persistence::{EngineSnapshot, JsonStore, StoreError};
