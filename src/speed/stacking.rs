//! Speed bonus stacking and delta publication.
//!
//! ## Stacking rule
//!
//! Percent bonuses add: the multiplier is `1 + Σpercent / 100`. Skip
//! seconds add too. Only applied specials count (see [`BonusRecord`]).
//!
//! ## Delta publication
//!
//! The host's timer accepts *adjustments*, not absolute values: every push
//! is applied on top of what was pushed before. The service therefore keeps
//! the last multiplier and skip it pushed per player and only sends the
//! difference. Pushing the same totals twice sends nothing the second time.
//!
//! Negative bonuses can push the sum to -100% or below. The multiplier is
//! floored at [`MIN_MULTIPLIER`] so every delta stays finite.

use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::core::PlayerId;
use crate::record::BonusRecord;

/// The host's timer adjustment hook.
///
/// `skip_seconds` and `percent_delta` are relative to everything pushed
/// before for the same player.
pub trait TimeModifier {
    fn apply_external_time_skip(
        &self,
        player: PlayerId,
        skip_seconds: i32,
        percent_delta: f64,
        reason: &str,
    );
}

impl<T: TimeModifier + ?Sized> TimeModifier for std::sync::Arc<T> {
    fn apply_external_time_skip(
        &self,
        player: PlayerId,
        skip_seconds: i32,
        percent_delta: f64,
        reason: &str,
    ) {
        (**self).apply_external_time_skip(player, skip_seconds, percent_delta, reason);
    }
}

/// Lowest multiplier the service computes or publishes.
pub const MIN_MULTIPLIER: f64 = 0.01;

/// What was last pushed for a player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Baseline {
    pub multiplier: f64,
    pub skip_seconds: i32,
}

impl Default for Baseline {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            skip_seconds: 0,
        }
    }
}

/// A delta that was pushed to the timer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedDelta {
    pub skip_seconds: i32,
    pub percent: f64,
}

/// Computes aggregate speed from records and pushes deltas to the host.
///
/// ## Example
///
/// ```
/// use progress_specials::core::PlayerId;
/// use progress_specials::record::BonusRecord;
/// use progress_specials::speed::{SpeedStackingService, TimeModifier};
///
/// struct Ignore;
/// impl TimeModifier for Ignore {
///     fn apply_external_time_skip(&self, _: PlayerId, _: i32, _: f64, _: &str) {}
/// }
///
/// let mut record = BonusRecord::new();
/// record.mark_completed("emerald");
/// record.mark_applied("emerald");
/// record.add_or_update_bonus("emerald", 800.0, 10);
///
/// let service = SpeedStackingService::new(Ignore);
/// assert_eq!(service.adjusted_duration(180, &record), 19);
/// ```
pub struct SpeedStackingService<M: TimeModifier> {
    modifier: M,
    baselines: FxHashMap<PlayerId, Baseline>,
}

impl<M: TimeModifier> SpeedStackingService<M> {
    /// Create a service pushing to `modifier`.
    pub fn new(modifier: M) -> Self {
        Self {
            modifier,
            baselines: FxHashMap::default(),
        }
    }

    /// `1 + total percent / 100`, never below [`MIN_MULTIPLIER`].
    #[must_use]
    pub fn multiplier(&self, record: &BonusRecord) -> f64 {
        (1.0 + record.total_percent() / 100.0).max(MIN_MULTIPLIER)
    }

    /// Total skip seconds.
    #[must_use]
    pub fn aggregate_skip(&self, record: &BonusRecord) -> i32 {
        record.total_skip_seconds()
    }

    /// A stage duration after skips and speed are applied, rounded up.
    #[must_use]
    pub fn adjusted_duration(&self, base_seconds: i64, record: &BonusRecord) -> i64 {
        let reduced = (base_seconds - i64::from(self.aggregate_skip(record))).max(0);
        (reduced as f64 / self.multiplier(record)).ceil() as i64
    }

    /// Recompute a player's totals and push the change since the last push.
    ///
    /// Returns the pushed delta, or `None` when nothing changed.
    #[allow(clippy::float_cmp)]
    pub fn publish(&mut self, player: PlayerId, record: &BonusRecord, reason: &str) -> Option<SpeedDelta> {
        let multiplier = self.multiplier(record);
        let skip = self.aggregate_skip(record);
        let last = self.baseline(player);

        let multiplier_delta = multiplier / last.multiplier;
        let skip_delta = skip - last.skip_seconds;
        if multiplier_delta == 1.0 && skip_delta == 0 {
            return None;
        }

        let percent_delta = (multiplier_delta - 1.0) * 100.0;
        if !percent_delta.is_finite() {
            warn!("Refusing non-finite speed delta for {player} ({reason})");
            return None;
        }
        debug!("Pushing speed delta to {player}: skip {skip_delta}s, {percent_delta:+.2}% ({reason})");
        self.modifier
            .apply_external_time_skip(player, skip_delta, percent_delta, reason);
        self.baselines.insert(
            player,
            Baseline {
                multiplier,
                skip_seconds: skip,
            },
        );

        Some(SpeedDelta {
            skip_seconds: skip_delta,
            percent: percent_delta,
        })
    }

    /// Push a one-off skip, independent of the stacked totals.
    ///
    /// Non-positive skips are ignored. Returns whether a push happened.
    pub fn session_skip(&self, player: PlayerId, skip_seconds: i32, reason: &str) -> bool {
        if skip_seconds <= 0 {
            return false;
        }
        self.modifier
            .apply_external_time_skip(player, skip_seconds, 0.0, reason);
        true
    }

    /// Push a raw adjustment that bypasses the baselines.
    pub fn push_raw(&self, player: PlayerId, skip_seconds: i32, percent: f64, reason: &str) {
        self.modifier
            .apply_external_time_skip(player, skip_seconds, percent, reason);
    }

    /// The last pushed totals for a player.
    #[must_use]
    pub fn baseline(&self, player: PlayerId) -> Baseline {
        self.baselines.get(&player).copied().unwrap_or_default()
    }

    /// Drop a player's baseline, e.g. when their session ends and the host
    /// resets its timer state.
    pub fn forget(&mut self, player: PlayerId) {
        self.baselines.remove(&player);
    }

    /// The underlying modifier.
    pub fn modifier(&self) -> &M {
        &self.modifier
    }
}
