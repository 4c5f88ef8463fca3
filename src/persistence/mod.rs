//! Durable specials state.
//!
//! - [`PlayerFile`], [`GlobalFile`]: serde forms of records and locks
//! - [`JsonStore`]: one JSON file per player plus a global file
//! - [`EngineSnapshot`]: bincode snapshot of everything
//!
//! Persistence runs only at startup, shutdown and periodic save points,
//! never in the middle of a transition.

mod record_file;
mod snapshot;
mod store;

pub use record_file::{BonusEntry, GlobalFile, PlayerFile};
pub use snapshot::EngineSnapshot;
pub use store::{JsonStore, StoreError};
