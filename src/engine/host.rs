//! The host progression system, as seen by the engine.

use crate::core::{ActiveEffect, PlayerId, StageSnapshot};
use crate::speed::TimeModifier;

/// Everything the engine needs from the host.
///
/// The host owns players, stages, status effects and the progression timer.
/// All calls are synchronous and assumed reliable; the engine never retries.
///
/// Only [`current_stage`](Self::current_stage) and
/// [`stage_index`](Self::stage_index) must be implemented for stage-gated
/// rules to work; the remaining methods have no-op defaults so hosts can
/// opt into the features they support.
pub trait ProgressionHost: TimeModifier {
    /// The player's current stage, or `None` if they have none.
    fn current_stage(&self, player: PlayerId) -> Option<StageSnapshot>;

    /// Ordinal index of a stage. Negative when unknown.
    fn stage_index(&self, stage_id: &str) -> i32;

    /// Finish the player's current stage immediately.
    fn complete_current_stage(&self, _player: PlayerId) {}

    /// The player's instance of a status effect, if they hold it.
    fn active_effect(&self, _player: PlayerId, _effect: &str) -> Option<ActiveEffect> {
        None
    }

    /// Apply the host's own default time skip for the current stage.
    fn apply_default_time_skip(&self, _player: PlayerId, _reason: &str) {}

    /// Display name used in message templates.
    fn player_name(&self, player: PlayerId) -> String {
        player.to_string()
    }

    /// Send a message to one player.
    fn send_message(&self, _player: PlayerId, _message: &str) {}

    /// Send a message to everyone.
    fn broadcast(&self, _message: &str) {}

    /// Check a permission node for a command issuer.
    fn has_permission(&self, _player: PlayerId, _permission: &str) -> bool {
        false
    }
}

impl<T: ProgressionHost + ?Sized> ProgressionHost for std::sync::Arc<T> {
    fn current_stage(&self, player: PlayerId) -> Option<StageSnapshot> {
        (**self).current_stage(player)
    }

    fn stage_index(&self, stage_id: &str) -> i32 {
        (**self).stage_index(stage_id)
    }

    fn complete_current_stage(&self, player: PlayerId) {
        (**self).complete_current_stage(player);
    }

    fn active_effect(&self, player: PlayerId, effect: &str) -> Option<ActiveEffect> {
        (**self).active_effect(player, effect)
    }

    fn apply_default_time_skip(&self, player: PlayerId, reason: &str) {
        (**self).apply_default_time_skip(player, reason);
    }

    fn player_name(&self, player: PlayerId) -> String {
        (**self).player_name(player)
    }

    fn send_message(&self, player: PlayerId, message: &str) {
        (**self).send_message(player, message);
    }

    fn broadcast(&self, message: &str) {
        (**self).broadcast(message);
    }

    fn has_permission(&self, player: PlayerId, permission: &str) -> bool {
        (**self).has_permission(player, permission)
    }
}

/// Snapshot of a player's stage with the index resolved.
///
/// Hosts may leave `index` empty in [`ProgressionHost::current_stage`]; it is
/// then looked up through [`ProgressionHost::stage_index`], and negative
/// answers mean unknown.
pub(crate) fn resolved_stage<H: ProgressionHost + ?Sized>(
    host: &H,
    player: PlayerId,
) -> Option<StageSnapshot> {
    let mut snapshot = host.current_stage(player)?;
    if snapshot.index.is_none() {
        let index = host.stage_index(&snapshot.id);
        if index >= 0 {
            snapshot.index = Some(index);
        }
    }
    Some(snapshot)
}
