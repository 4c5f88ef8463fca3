//! Core engine types: identities, stage snapshots, settings.
//!
//! These are the values exchanged with the host. The host owns players,
//! stages and status effects; the engine only sees snapshots of them.

pub mod id;
pub mod stage;
pub mod config;

pub use id::{ContextEntity, EntityId, ParseIdError, PlayerId};
pub use stage::{ActiveEffect, StageSnapshot};
pub use config::EngineSettings;
