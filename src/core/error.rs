//! Error type shared by the synchronization layer.

use thiserror::Error;

use super::entity::EntityId;

/// Failures surfaced by the battle sync core.
///
/// None of these are shown to the player. Callers log and carry on; the
/// worst outcome of any of them is a missing animation or combat log line.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An authoritative operation was attempted on a non-authoritative peer.
    #[error("operation requires host authority")]
    NotAuthoritative,

    /// A message could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(#[source] bincode::Error),

    /// An inbound frame could not be deserialized.
    #[error("failed to decode message: {0}")]
    Decode(#[source] bincode::Error),

    /// The peer speaks a different protocol version.
    #[error("protocol version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u16, actual: u16 },

    /// The transport refused or dropped a frame.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A referenced entity is not present in local state.
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    /// No handler is registered for an inbound kind.
    #[error("no handler registered for kind `{0}`")]
    UnknownKind(String),

    /// Configuration text could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}
