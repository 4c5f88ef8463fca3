//! Eligibility checks for specials.
//!
//! A special that has been triggered is only granted when the player's
//! current stage satisfies its [`StageCondition`](crate::specials::StageCondition)
//! and, if configured, the player holds the required status effect.
//! Otherwise the engine records the special as pending and re-checks it
//! later.

mod matcher;

pub use matcher::{requirement_met, StageMatch, StageMatcher};
