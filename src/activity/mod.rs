//! Stage activity hooks.
//!
//! A secondary progression path: stages that speed up through reported
//! world activity, throttled per player by a cooldown and a same-location
//! guard. Classification of the activity itself belongs to the host.

mod tracker;

pub use tracker::{ActivityHook, ActivityTick, ActivityTracker, Location};
