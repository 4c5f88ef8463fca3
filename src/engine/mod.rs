//! The specials rule engine.
//!
//! ## Key Components
//!
//! - [`ProgressionHost`]: the host collaborator (stages, effects, timer)
//! - [`TriggerEngine`]: per-(player, special) state machine, reward
//!   application and the pending sweep
//! - [`DeathEvent`], [`PickupEvent`]: routed domain events
//! - [`EncounterRule`]: distinct-victim rules
//! - [`SpecialCommand`]: `activate` / `remove`
//! - [`SpecialHandler`]: "special triggered" subscribers
//!
//! ## Event Flow
//!
//! 1. The host reports an event to an `on_*` entry point.
//! 2. The catalog routes it to candidate specials.
//! 3. The player's pending specials are swept.
//! 4. Each candidate runs through the state machine.
//! 5. Grants publish speed deltas and notify subscribers.

mod command;
mod encounter;
mod events;
mod host;
mod notify;
mod trigger;

pub use command::{CommandIssuer, CommandResponse, SpecialCommand};
pub use encounter::{EncounterGrant, EncounterRule};
pub use events::{DeathEvent, DispatchReport, PickupEvent};
pub use host::ProgressionHost;
pub use notify::{HandlerRegistry, SpecialHandler, SpecialTriggered};
pub use trigger::{TriggerEngine, TriggerOutcome};
