//! Host-supplied snapshots of a player's progression context.

use serde::{Deserialize, Serialize};

/// A player's current stage at evaluation time.
///
/// Produced by the host; the engine never owns stage state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSnapshot {
    /// Stage identifier (e.g. `special:wood`).
    pub id: String,

    /// Stage type reported by the host (e.g. `SPECIAL`), if any.
    pub stage_type: Option<String>,

    /// Ordinal index of the stage in the progression sequence.
    /// `None` when the host does not know it.
    pub index: Option<i32>,
}

impl StageSnapshot {
    /// Create a snapshot with an unknown type and index.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            stage_type: None,
            index: None,
        }
    }

    /// Set the stage type (builder pattern).
    #[must_use]
    pub fn with_type(mut self, stage_type: impl Into<String>) -> Self {
        self.stage_type = Some(stage_type.into());
        self
    }

    /// Set the stage index (builder pattern).
    #[must_use]
    pub fn with_index(mut self, index: i32) -> Self {
        self.index = Some(index);
        self
    }
}

/// A status effect currently held by a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEffect {
    /// Effect intensity (0 = level I).
    pub amplifier: i32,
}

impl ActiveEffect {
    /// Create an active effect with the given amplifier.
    #[must_use]
    pub const fn new(amplifier: i32) -> Self {
        Self { amplifier }
    }
}
