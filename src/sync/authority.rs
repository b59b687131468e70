//! Authority gate: which peer may compute outcomes.
//!
//! Exactly one peer (the host) rolls random numbers, computes damage and
//! mutates canonical state. The guest only replays. Every host entry point
//! starts with [`AuthorityGate::check`] and returns without side effects
//! when it fails; the guest's replay path is reached only through inbound
//! message dispatch.

use serde::{Deserialize, Serialize};

use crate::core::{AbsoluteSide, SyncError};

/// The role a peer plays for the whole battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeerRole {
    Host,
    Guest,
}

impl PeerRole {
    #[must_use]
    pub const fn is_host(self) -> bool {
        matches!(self, Self::Host)
    }

    /// Whether this peer computes outcomes.
    ///
    /// Identical to `is_host` today; kept separate because callers ask two
    /// different questions.
    #[must_use]
    pub const fn is_authoritative(self) -> bool {
        matches!(self, Self::Host)
    }

    /// The absolute side this peer owns.
    #[must_use]
    pub const fn side(self) -> AbsoluteSide {
        AbsoluteSide::of_peer(self.is_host())
    }
}

impl std::fmt::Display for PeerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Guest => write!(f, "guest"),
        }
    }
}

/// Result of an authority check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthorityGate {
    /// Caller may compute and mutate.
    Open,
    /// Caller must return immediately without side effects.
    Closed,
}

impl AuthorityGate {
    /// Check a peer's role.
    #[must_use]
    pub const fn check(role: PeerRole) -> Self {
        if role.is_authoritative() {
            Self::Open
        } else {
            Self::Closed
        }
    }

    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Convert to a `Result` for `?` in authoritative helpers.
    pub fn require(self) -> Result<(), SyncError> {
        match self {
            Self::Open => Ok(()),
            Self::Closed => Err(SyncError::NotAuthoritative),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_is_authoritative() {
        assert!(PeerRole::Host.is_authoritative());
        assert!(AuthorityGate::check(PeerRole::Host).is_open());
        assert!(AuthorityGate::check(PeerRole::Host).require().is_ok());
    }

    #[test]
    fn test_guest_is_gated() {
        assert!(!PeerRole::Guest.is_authoritative());
        assert_eq!(AuthorityGate::check(PeerRole::Guest), AuthorityGate::Closed);
        assert!(matches!(
            AuthorityGate::check(PeerRole::Guest).require(),
            Err(SyncError::NotAuthoritative)
        ));
    }

    #[test]
    fn test_role_side() {
        assert_eq!(PeerRole::Host.side(), AbsoluteSide::Host);
        assert_eq!(PeerRole::Guest.side(), AbsoluteSide::Guest);
    }
}
