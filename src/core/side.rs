//! Battle sides: absolute identity and per-peer local view.
//!
//! ## AbsoluteSide
//!
//! `Host` or `Guest`. Identity-stable across both peers, so it is the only
//! side that ever travels on the wire.
//!
//! ## LocalSide
//!
//! `Player` or `Opponent`, relative to whichever peer is evaluating. Every
//! peer renders itself as the player.
//!
//! ## SideMap
//!
//! Two-entry storage indexed by `LocalSide`, the battle analogue of a
//! per-player map.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Side identity shared by both peers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AbsoluteSide {
    Host,
    Guest,
}

impl AbsoluteSide {
    /// The absolute side owned by a peer.
    #[must_use]
    pub const fn of_peer(is_host: bool) -> Self {
        if is_host {
            Self::Host
        } else {
            Self::Guest
        }
    }

    /// The other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Host => Self::Guest,
            Self::Guest => Self::Host,
        }
    }
}

impl std::fmt::Display for AbsoluteSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Guest => write!(f, "guest"),
        }
    }
}

/// Side as seen by the peer doing the evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LocalSide {
    Player,
    Opponent,
}

impl LocalSide {
    /// Both local sides, player first.
    pub const ALL: [LocalSide; 2] = [LocalSide::Player, LocalSide::Opponent];

    /// The other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Player => Self::Opponent,
            Self::Opponent => Self::Player,
        }
    }
}

impl std::fmt::Display for LocalSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Player => write!(f, "player"),
            Self::Opponent => write!(f, "opponent"),
        }
    }
}

/// Map an absolute side onto the evaluating peer's local view.
///
/// Recompute per entity and per message; the answer depends on which peer
/// is asking.
///
/// ```
/// use battle_sync::core::{to_local_side, AbsoluteSide, LocalSide};
///
/// assert_eq!(to_local_side(AbsoluteSide::Host, true), LocalSide::Player);
/// assert_eq!(to_local_side(AbsoluteSide::Host, false), LocalSide::Opponent);
/// ```
#[must_use]
pub const fn to_local_side(absolute: AbsoluteSide, is_host: bool) -> LocalSide {
    let own = AbsoluteSide::of_peer(is_host);
    if absolute as u8 == own as u8 {
        LocalSide::Player
    } else {
        LocalSide::Opponent
    }
}

/// Inverse of [`to_local_side`], used when encoding outbound references.
#[must_use]
pub const fn to_absolute_side(local: LocalSide, is_host: bool) -> AbsoluteSide {
    let own = AbsoluteSide::of_peer(is_host);
    match local {
        LocalSide::Player => own,
        LocalSide::Opponent => own.opposite(),
    }
}

/// Board column occupied by a hero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Left,
    Center,
    Right,
}

impl Position {
    /// All positions in board order.
    pub const ALL: [Position; 3] = [Position::Left, Position::Center, Position::Right];

    /// Column index (0 = left).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Center => 1,
            Self::Right => 2,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Center => write!(f, "center"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Per-side storage with O(1) access by `LocalSide`.
///
/// ## Example
///
/// ```
/// use battle_sync::core::{LocalSide, SideMap};
///
/// let mut souls: SideMap<i64> = SideMap::with_value(0);
/// souls[LocalSide::Opponent] += 2;
/// assert_eq!(souls[LocalSide::Player], 0);
/// assert_eq!(souls[LocalSide::Opponent], 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideMap<T> {
    player: T,
    opponent: T,
}

impl<T> SideMap<T> {
    /// Create from explicit values.
    pub fn new(player: T, opponent: T) -> Self {
        Self { player, opponent }
    }

    /// Create with both entries set to the same value.
    pub fn with_value(value: T) -> Self
    where
        T: Clone,
    {
        Self::new(value.clone(), value)
    }

    /// Get a side's entry.
    #[must_use]
    pub fn get(&self, side: LocalSide) -> &T {
        match side {
            LocalSide::Player => &self.player,
            LocalSide::Opponent => &self.opponent,
        }
    }

    /// Get a side's entry mutably.
    pub fn get_mut(&mut self, side: LocalSide) -> &mut T {
        match side {
            LocalSide::Player => &mut self.player,
            LocalSide::Opponent => &mut self.opponent,
        }
    }

    /// Iterate over `(LocalSide, &T)` pairs, player first.
    pub fn iter(&self) -> impl Iterator<Item = (LocalSide, &T)> {
        [(LocalSide::Player, &self.player), (LocalSide::Opponent, &self.opponent)].into_iter()
    }
}

impl<T> Index<LocalSide> for SideMap<T> {
    type Output = T;

    fn index(&self, side: LocalSide) -> &Self::Output {
        self.get(side)
    }
}

impl<T> IndexMut<LocalSide> for SideMap<T> {
    fn index_mut(&mut self, side: LocalSide) -> &mut Self::Output {
        self.get_mut(side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_side_on_host() {
        assert_eq!(to_local_side(AbsoluteSide::Host, true), LocalSide::Player);
        assert_eq!(to_local_side(AbsoluteSide::Guest, true), LocalSide::Opponent);
    }

    #[test]
    fn test_local_side_on_guest() {
        assert_eq!(to_local_side(AbsoluteSide::Host, false), LocalSide::Opponent);
        assert_eq!(to_local_side(AbsoluteSide::Guest, false), LocalSide::Player);
    }

    #[test]
    fn test_absolute_round_trip() {
        for is_host in [true, false] {
            for side in [AbsoluteSide::Host, AbsoluteSide::Guest] {
                let local = to_local_side(side, is_host);
                assert_eq!(to_absolute_side(local, is_host), side);
            }
            for local in LocalSide::ALL {
                let absolute = to_absolute_side(local, is_host);
                assert_eq!(to_local_side(absolute, is_host), local);
            }
        }
    }

    #[test]
    fn test_same_absolute_side_same_local_side() {
        // Ally-targeting: actor and target share an absolute side.
        for is_host in [true, false] {
            let actor = to_local_side(AbsoluteSide::Guest, is_host);
            let target = to_local_side(AbsoluteSide::Guest, is_host);
            assert_eq!(actor, target);
        }
    }

    #[test]
    fn test_peers_see_mirrored_sides() {
        for side in [AbsoluteSide::Host, AbsoluteSide::Guest] {
            assert_eq!(
                to_local_side(side, true),
                to_local_side(side, false).opposite()
            );
        }
    }

    #[test]
    fn test_position_index() {
        assert_eq!(Position::Left.index(), 0);
        assert_eq!(Position::Center.index(), 1);
        assert_eq!(Position::Right.index(), 2);
        assert_eq!(format!("{}", Position::Center), "center");
    }

    #[test]
    fn test_side_map_iter() {
        let map = SideMap::new(1, 2);
        let pairs: Vec<_> = map.iter().collect();
        assert_eq!(pairs, vec![(LocalSide::Player, &1), (LocalSide::Opponent, &2)]);
    }

    #[test]
    fn test_position_serde() {
        let json = serde_json::to_string(&Position::Right).unwrap();
        assert_eq!(json, "\"right\"");
        let back: Position = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Position::Right);
    }
}
