//! Host-to-guest synchronization: authority, wire format, transport, timing
//! and replay.

pub mod authority;
pub mod codec;
pub mod message;
pub mod replay;
pub mod timing;
pub mod transport;

pub use authority::{AuthorityGate, PeerRole};
pub use codec::{decode_envelope, encode_envelope, SequenceCheck, SequenceTracker};
pub use message::{
    ActionMessage, ActorRef, ComputedValues, Envelope, HealEntry, Payload, StateSync, TargetRef,
    PROTOCOL_VERSION,
};
pub use replay::{Replay, ReplayPhase, ReplayReport, Resolved};
pub use timing::{delay, speed_adjusted_delay, Speed};
pub use transport::{
    ChannelTransport, Inbox, LocalLink, LossyTransport, NullTransport, RecordingTransport,
    Transport,
};
