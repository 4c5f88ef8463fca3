//! Special definitions and the catalog that indexes them.
//!
//! ## Key Components
//!
//! - [`SpecialsConfig`]: serde schema of the configuration
//! - [`SpecialDefinition`]: one validated, immutable special
//! - [`TriggerKind`]: tagged trigger descriptor, one variant per event kind
//! - [`SpecialCatalog`]: storage plus per-trigger indices
//! - [`Vocabulary`]: host-side name resolution used while loading
//!
//! ## Design Philosophy
//!
//! Configuration is parsed permissively and validated once, at catalog
//! build time. Past that point nothing in the engine has to handle a
//! half-valid special: every definition has a trigger, a stage target and
//! resolved names.

mod catalog;
mod config;
mod definition;

pub use catalog::{CatalogWarning, OpenVocabulary, SpecialCatalog, Vocabulary};
pub use config::{
    ActivityEntry, EncounterEntry, MessagesEntry, PotionRequirementEntry, RewardEntry, ScopeEntry,
    SectionEntry, SpecialEntry, SpecialsConfig, TriggerEntry,
};
pub use definition::{
    EffectRequirement, Messages, Reward, Scope, SpecialDefinition, StageCondition, TriggerKind,
    TriggerName, TriggerSpec,
};
