//! Stage eligibility and status-effect requirements.
//!
//! Both checks are pure functions over a special's condition and a snapshot
//! the caller took from the host. They never touch player records.

use serde::{Deserialize, Serialize};

use crate::core::{ActiveEffect, StageSnapshot};
use crate::specials::{EffectRequirement, StageCondition};

/// Outcome of a stage check, with a human-readable reason.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageMatch {
    pub allowed: bool,
    pub reason: String,
}

impl StageMatch {
    /// The special may apply in this stage.
    pub fn allowed(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
        }
    }

    /// The special may not apply in this stage.
    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

/// Evaluator for stage conditions.
pub struct StageMatcher;

impl StageMatcher {
    /// Check a stage condition against a player's current stage.
    ///
    /// Checks run in a fixed order and the first failure wins:
    /// absent condition, missing target, global flag, whitelist, stage
    /// type, known index, index bounds.
    pub fn evaluate(
        condition: Option<&StageCondition>,
        snapshot: Option<&StageSnapshot>,
    ) -> StageMatch {
        let Some(condition) = condition else {
            return StageMatch::allowed("No section condition provided");
        };

        if !condition.has_target() {
            return StageMatch::denied("Misconfigured: no allowed sections configured");
        }

        if condition.applies_to_all {
            return StageMatch::allowed("Applies to all sections");
        }

        let Some(snapshot) = snapshot else {
            return StageMatch::denied("No active section available");
        };

        let current = &snapshot.id;
        if !condition
            .allowed_stages
            .iter()
            .any(|s| s.eq_ignore_ascii_case(current))
        {
            return StageMatch::denied(format!(
                "Section '{current}' is not allowed for this special"
            ));
        }

        // Untyped stages skip the type check.
        if let (Some(required), Some(actual)) = (&condition.require_type, &snapshot.stage_type) {
            if !actual.eq_ignore_ascii_case(required) {
                return StageMatch::denied(format!(
                    "Section type '{actual}' does not match required '{required}'"
                ));
            }
        }

        let Some(index) = snapshot.index else {
            return StageMatch::denied(format!(
                "No section index available for section '{current}'"
            ));
        };

        if let Some(min) = condition.min_index {
            if index < min {
                return StageMatch::denied(format!(
                    "Section index {index} is below minimum required {min}"
                ));
            }
        }
        if let Some(max) = condition.max_index {
            if index > max {
                return StageMatch::denied(format!(
                    "Section index {index} is above maximum allowed {max}"
                ));
            }
        }

        StageMatch::allowed("Section matches configured constraints")
    }
}

/// Check a status-effect requirement against the effect the player holds.
///
/// `held` is the player's current instance of the required effect, if any.
/// Specials without a requirement always pass.
#[must_use]
pub fn requirement_met(requirement: Option<&EffectRequirement>, held: Option<ActiveEffect>) -> bool {
    match requirement {
        None => true,
        Some(req) => held.is_some_and(|effect| effect.amplifier >= req.min_amplifier),
    }
}
