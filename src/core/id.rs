//! Identity types.
//!
//! Hosts identify players and entities by 128-bit UUIDs. The engine keeps them
//! as plain `u128` newtypes and only cares about the textual form at the
//! persistence boundary, where identity file names and stored victim ids are
//! parsed back.
//!
//! ```
//! use progress_specials::core::PlayerId;
//!
//! let id: PlayerId = "123e4567-e89b-12d3-a456-426614174000".parse().unwrap();
//! assert_eq!(id.to_string(), "123e4567-e89b-12d3-a456-426614174000");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string is not a valid UUID.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid uuid: {0:?}")]
pub struct ParseIdError(pub String);

fn parse_uuid(s: &str) -> Result<u128, ParseIdError> {
    let hex: String = s.chars().filter(|c| *c != '-').collect();
    let groups: Vec<usize> = s.split('-').map(str::len).collect();
    let hyphenated_ok = groups.len() == 1 || groups == [8, 4, 4, 4, 12];
    if hex.len() != 32 || !hyphenated_ok || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ParseIdError(s.to_string()));
    }
    u128::from_str_radix(&hex, 16).map_err(|_| ParseIdError(s.to_string()))
}

fn write_uuid(f: &mut fmt::Formatter<'_>, value: u128) -> fmt::Result {
    let hex = format!("{value:032x}");
    write!(
        f,
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// Player identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u128);

impl PlayerId {
    /// Create a new player ID.
    #[must_use]
    pub const fn new(id: u128) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u128 {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_uuid(f, self.0)
    }
}

impl FromStr for PlayerId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_uuid(s).map(Self)
    }
}

/// Identity of any entity in the host world, players included.
///
/// Victims of distinct-encounter rules are tracked by `EntityId`; a player
/// victim has the same raw value as its `PlayerId`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u128);

impl EntityId {
    /// Create a new entity ID.
    #[must_use]
    pub const fn new(id: u128) -> Self {
        Self(id)
    }

    /// Entity ID of a player.
    #[must_use]
    pub const fn player(id: PlayerId) -> Self {
        Self(id.0)
    }

    /// Check if this entity is the given player.
    #[must_use]
    pub const fn is_player(self, player: PlayerId) -> bool {
        self.0 == player.0
    }
}

impl From<PlayerId> for EntityId {
    fn from(id: PlayerId) -> Self {
        Self::player(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_uuid(f, self.0)
    }
}

impl FromStr for EntityId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_uuid(s).map(Self)
    }
}

/// The entity involved in a trigger (the mob that died, the item picked up).
///
/// Carried through to subscribers of the triggered notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntity {
    /// Entity identity.
    pub id: EntityId,
    /// Normalised entity type name (e.g. `zombie`, `item`).
    pub entity_type: String,
}

impl ContextEntity {
    /// Create a new context entity.
    pub fn new(id: EntityId, entity_type: impl Into<String>) -> Self {
        Self {
            id,
            entity_type: entity_type.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hyphenated() {
        let id: PlayerId = "00000000-0000-0000-0000-00000000002a".parse().unwrap();
        assert_eq!(id.raw(), 42);
    }

    #[test]
    fn test_parse_simple_form() {
        let id: EntityId = "0000000000000000000000000000002A".parse().unwrap();
        assert_eq!(id, EntityId::new(42));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("not-a-uuid".parse::<PlayerId>().is_err());
        assert!("".parse::<PlayerId>().is_err());
        assert!("0000000-00000-0000-0000-00000000002a".parse::<PlayerId>().is_err());
        assert!("zz000000-0000-0000-0000-00000000002a".parse::<PlayerId>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let id = PlayerId::new(0x123e4567_e89b_12d3_a456_426614174000);
        let text = id.to_string();
        assert_eq!(text, "123e4567-e89b-12d3-a456-426614174000");
        assert_eq!(text.parse::<PlayerId>().unwrap(), id);
    }

    #[test]
    fn test_entity_from_player() {
        let player = PlayerId::new(7);
        let entity = EntityId::from(player);
        assert!(entity.is_player(player));
        assert!(!EntityId::new(8).is_player(player));
    }
}
