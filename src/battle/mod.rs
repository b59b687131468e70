//! Battle runtime: the per-peer session, state mutators, inbound routing
//! and the peer wrapper that ties them to abilities.

pub mod combat;
pub mod peer;
pub mod router;
pub mod session;

pub use combat::VitalsChange;
pub use peer::Peer;
pub use router::{Dispatch, MessageRouter};
pub use session::BattleSession;
