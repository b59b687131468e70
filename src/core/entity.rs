//! Entity identification for heroes and creatures.
//!
//! Every combatant on the board is a hero (one per occupied position) or a
//! creature owned by a hero.
//!
//! ## Two views of the same entity
//!
//! - `EntityId`: keyed by `AbsoluteSide`. Identical on both peers, so it is
//!   what actions and state sync messages carry.
//! - `LocalSlot`: keyed by `LocalSide`. What a single peer uses to find the
//!   entity in its own state tree and render registry.
//!
//! ```
//! use battle_sync::core::{AbsoluteSide, EntityId, LocalSide, Position};
//!
//! let archer = EntityId::creature(AbsoluteSide::Host, Position::Left, 0);
//!
//! // Host renders its own creatures on the player side...
//! assert_eq!(archer.to_local(true).side, LocalSide::Player);
//! // ...the guest sees the same creature as an opponent.
//! assert_eq!(archer.to_local(false).side, LocalSide::Opponent);
//!
//! // Either view converts back to the same identity.
//! assert_eq!(EntityId::from_local(archer.to_local(false), false), archer);
//! ```

use serde::{Deserialize, Serialize};

use super::side::{to_absolute_side, to_local_side, AbsoluteSide, LocalSide, Position};

/// Whether an entity is a hero or one of a hero's creatures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Hero,
    Creature,
}

/// Peer-independent identity of a combatant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    pub side: AbsoluteSide,
    pub position: Position,
    /// Index into the owning hero's creature list; `None` for the hero.
    pub creature_index: Option<u8>,
}

impl EntityId {
    /// The hero at a position.
    #[must_use]
    pub const fn hero(side: AbsoluteSide, position: Position) -> Self {
        Self {
            side,
            position,
            creature_index: None,
        }
    }

    /// A creature owned by the hero at a position.
    #[must_use]
    pub const fn creature(side: AbsoluteSide, position: Position, index: u8) -> Self {
        Self {
            side,
            position,
            creature_index: Some(index),
        }
    }

    #[must_use]
    pub const fn kind(self) -> EntityKind {
        match self.creature_index {
            Some(_) => EntityKind::Creature,
            None => EntityKind::Hero,
        }
    }

    /// The hero that owns this entity (itself, for heroes).
    #[must_use]
    pub const fn owner(self) -> Self {
        Self::hero(self.side, self.position)
    }

    /// Resolve into the evaluating peer's local view.
    #[must_use]
    pub const fn to_local(self, is_host: bool) -> LocalSlot {
        LocalSlot {
            side: to_local_side(self.side, is_host),
            position: self.position,
            creature_index: self.creature_index,
        }
    }

    /// Build the shared identity from a peer's local view.
    #[must_use]
    pub const fn from_local(slot: LocalSlot, is_host: bool) -> Self {
        Self {
            side: to_absolute_side(slot.side, is_host),
            position: slot.position,
            creature_index: slot.creature_index,
        }
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.creature_index {
            Some(index) => write!(f, "{}/{}#{}", self.side, self.position, index),
            None => write!(f, "{}/{}", self.side, self.position),
        }
    }
}

/// A peer's local address for a combatant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocalSlot {
    pub side: LocalSide,
    pub position: Position,
    pub creature_index: Option<u8>,
}

impl LocalSlot {
    #[must_use]
    pub const fn hero(side: LocalSide, position: Position) -> Self {
        Self {
            side,
            position,
            creature_index: None,
        }
    }

    #[must_use]
    pub const fn creature(side: LocalSide, position: Position, index: u8) -> Self {
        Self {
            side,
            position,
            creature_index: Some(index),
        }
    }

    #[must_use]
    pub const fn kind(self) -> EntityKind {
        match self.creature_index {
            Some(_) => EntityKind::Creature,
            None => EntityKind::Hero,
        }
    }
}

impl std::fmt::Display for LocalSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.creature_index {
            Some(index) => write!(f, "{}/{}#{}", self.side, self.position, index),
            None => write!(f, "{}/{}", self.side, self.position),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind() {
        assert_eq!(EntityId::hero(AbsoluteSide::Host, Position::Left).kind(), EntityKind::Hero);
        assert_eq!(
            EntityId::creature(AbsoluteSide::Host, Position::Left, 2).kind(),
            EntityKind::Creature
        );
    }

    #[test]
    fn test_owner() {
        let creature = EntityId::creature(AbsoluteSide::Guest, Position::Right, 1);
        assert_eq!(creature.owner(), EntityId::hero(AbsoluteSide::Guest, Position::Right));
    }

    #[test]
    fn test_local_round_trip_all_combinations() {
        for is_host in [true, false] {
            for side in [AbsoluteSide::Host, AbsoluteSide::Guest] {
                for position in Position::ALL {
                    for creature_index in [None, Some(0), Some(3)] {
                        let id = EntityId { side, position, creature_index };
                        assert_eq!(EntityId::from_local(id.to_local(is_host), is_host), id);
                    }
                }
            }
        }
    }

    #[test]
    fn test_display() {
        let hero = EntityId::hero(AbsoluteSide::Host, Position::Center);
        assert_eq!(format!("{}", hero), "host/center");
        let slot = LocalSlot::creature(LocalSide::Opponent, Position::Left, 0);
        assert_eq!(format!("{}", slot), "opponent/left#0");
    }

    #[test]
    fn test_serialization() {
        let id = EntityId::creature(AbsoluteSide::Guest, Position::Left, 4);
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
