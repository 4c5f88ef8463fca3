//! Server-wide locks for once-per-server specials.

use rustc_hash::FxHashMap;

use crate::core::PlayerId;

/// Ids of once-per-server specials that some player has consumed.
///
/// Each lock remembers the player that took it, when known. Locks restored
/// from storage that predates holder tracking have no holder.
///
/// Grows monotonically in normal operation; `release` exists only for the
/// opt-in removal policy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlobalLocks {
    locked: FxHashMap<String, Option<PlayerId>>,
}

impl GlobalLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_locked(&self, id: &str) -> bool {
        self.locked.contains_key(id)
    }

    /// Lock a special on behalf of `holder`.
    ///
    /// Returns `true` if it was not locked before. An existing lock keeps its
    /// first holder.
    pub fn acquire(&mut self, id: &str, holder: PlayerId) -> bool {
        if self.locked.contains_key(id) {
            return false;
        }
        self.locked.insert(id.to_string(), Some(holder));
        true
    }

    /// Restore a lock, with its holder if known.
    pub fn restore(&mut self, id: impl Into<String>, holder: Option<PlayerId>) {
        self.locked.insert(id.into(), holder);
    }

    /// Unlock a special. Returns `true` if it was locked.
    pub fn release(&mut self, id: &str) -> bool {
        self.locked.remove(id).is_some()
    }

    /// The player holding a lock, if the special is locked and the holder
    /// is known.
    #[must_use]
    pub fn holder(&self, id: &str) -> Option<PlayerId> {
        self.locked.get(id).copied().flatten()
    }

    /// May `player` still be granted this special?
    ///
    /// True when the special is unlocked, locked by `player`, or locked by an
    /// unknown holder.
    #[must_use]
    pub fn admits(&self, id: &str, player: PlayerId) -> bool {
        match self.locked.get(id) {
            None | Some(None) => true,
            Some(Some(holder)) => *holder == player,
        }
    }

    /// Locked ids.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.locked.keys().map(String::as_str)
    }

    /// Locked ids with a known holder.
    pub fn holders(&self) -> impl Iterator<Item = (&str, PlayerId)> {
        self.locked
            .iter()
            .filter_map(|(id, holder)| holder.map(|h| (id.as_str(), h)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locked.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locked.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for GlobalLocks {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            locked: iter.into_iter().map(|id| (id.into(), None)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_once() {
        let mut locks = GlobalLocks::new();
        assert!(locks.acquire("dragon", PlayerId::new(1)));
        assert!(!locks.acquire("dragon", PlayerId::new(2)));
        assert!(locks.is_locked("dragon"));
        assert_eq!(locks.holder("dragon"), Some(PlayerId::new(1)));
        assert_eq!(locks.len(), 1);
    }

    #[test]
    fn test_admits() {
        let mut locks: GlobalLocks = ["legacy"].into_iter().collect();
        locks.acquire("dragon", PlayerId::new(1));

        assert!(locks.admits("free", PlayerId::new(2)));
        assert!(locks.admits("legacy", PlayerId::new(2)));
        assert!(locks.admits("dragon", PlayerId::new(1)));
        assert!(!locks.admits("dragon", PlayerId::new(2)));
    }

    #[test]
    fn test_release() {
        let mut locks: GlobalLocks = ["a", "b"].into_iter().collect();
        assert!(locks.release("a"));
        assert!(!locks.release("a"));
        assert!(!locks.is_locked("a"));
        assert!(locks.is_locked("b"));
    }

    #[test]
    fn test_holders_skips_unknown() {
        let mut locks: GlobalLocks = ["legacy"].into_iter().collect();
        locks.restore("dragon", Some(PlayerId::new(7)));

        let holders: Vec<_> = locks.holders().collect();
        assert_eq!(holders, vec![("dragon", PlayerId::new(7))]);
        assert_eq!(locks.iter().count(), 2);
    }
}
