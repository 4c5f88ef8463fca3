//! Progress-speed aggregation.
//!
//! - [`TimeModifier`]: the host's single-method timer hook
//! - [`SpeedStackingService`]: aggregate multiplier/skip and delta pushes

mod stacking;

pub use stacking::{Baseline, SpeedDelta, SpeedStackingService, TimeModifier, MIN_MULTIPLIER};
