//! Durable specials state: per-player records and server-wide locks.

mod bonus;
mod locks;

pub use bonus::{BonusRecord, SpeedBonus};
pub use locks::GlobalLocks;
