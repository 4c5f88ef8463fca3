//! Engine-wide settings.
//!
//! Settings live in the `settings` block of the specials configuration and
//! select between policy variants the rule engine supports. Every field has
//! a serde default, so an absent block yields `EngineSettings::default()`.

use serde::{Deserialize, Serialize};

/// Policy and naming knobs for the trigger engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct EngineSettings {
    /// Consume a once-per-server lock when the stage matched but the
    /// status-effect requirement did not.
    ///
    /// `true` reproduces the long-standing behaviour: the rule is recorded as
    /// completed for the player and the server-wide slot is burned, even
    /// though the reward is withheld. `false` records the completion but
    /// leaves the slot free for other players.
    pub lock_server_on_unmet_requirement: bool,

    /// Release the once-per-server lock when a rule is removed from a player
    /// by command.
    pub release_server_lock_on_remove: bool,

    /// Prefix of the reason string pushed to the timer collaborator.
    pub reason_prefix: String,

    /// Permission node required for the `activate` command.
    pub activate_permission: String,

    /// Permission node required for the `remove` command.
    pub remove_permission: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            lock_server_on_unmet_requirement: true,
            release_server_lock_on_remove: false,
            reason_prefix: "specials".to_string(),
            activate_permission: "specials.activate".to_string(),
            remove_permission: "specials.remove".to_string(),
        }
    }
}

impl EngineSettings {
    /// Reason string for a rule id.
    #[must_use]
    pub fn reason_for(&self, rule_id: &str) -> String {
        format!("{}: {}", self.reason_prefix, rule_id)
    }

    /// Set the unmet-requirement lock policy (builder pattern).
    #[must_use]
    pub fn with_lock_on_unmet_requirement(mut self, lock: bool) -> Self {
        self.lock_server_on_unmet_requirement = lock;
        self
    }

    /// Set the lock release policy for removal (builder pattern).
    #[must_use]
    pub fn with_release_on_remove(mut self, release: bool) -> Self {
        self.release_server_lock_on_remove = release;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert!(settings.lock_server_on_unmet_requirement);
        assert!(!settings.release_server_lock_on_remove);
        assert_eq!(settings.reason_for("wood_boost"), "specials: wood_boost");
    }

    #[test]
    fn test_partial_block_uses_defaults() {
        let json = r#"{ "release-server-lock-on-remove": true }"#;
        let settings: EngineSettings = serde_json::from_str(json).unwrap();

        assert!(settings.release_server_lock_on_remove);
        assert!(settings.lock_server_on_unmet_requirement);
        assert_eq!(settings.activate_permission, "specials.activate");
    }

    #[test]
    fn test_builders() {
        let settings = EngineSettings::default()
            .with_lock_on_unmet_requirement(false)
            .with_release_on_remove(true);

        assert!(!settings.lock_server_on_unmet_requirement);
        assert!(settings.release_server_lock_on_remove);
    }
}
