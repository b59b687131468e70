//! # battle-sync
//!
//! Host-authoritative action synchronization for a two-peer card battler.
//!
//! ## Design Principles
//!
//! 1. **One Authority**: The host rolls every random number, computes every
//!    damage and heal, and mutates canonical state. The guest replays.
//!
//! 2. **Send Before Animate**: The host hands an action message to the
//!    transport before its own animation starts, so both peers play the
//!    same timeline shifted by network latency plus a short grace period.
//!
//! 3. **Relative Rendering**: Messages address entities by absolute side
//!    (host/guest). Each peer translates to its own player/opponent view.
//!
//! ## Architecture
//!
//! - **Explicit Session**: No globals. A `BattleSession` owns state, RNG,
//!   transport, presenter and combat log and is passed to every ability.
//!
//! - **Single-Threaded Async**: Abilities are `async` and suspend only at
//!   delays; multi-target visuals run as joined futures on one task.
//!
//! - **Dedicated State Sync**: HP, status stacks and side counters reach
//!   the guest only through explicit sync messages.
//!
//! ## Modules
//!
//! - `core`: Sides, entity ids, state tree, RNG, configuration, combat log
//! - `sync`: Authority gate, wire messages, codec, transport, timing, replay
//! - `presentation`: Presenter trait, render registry, visual tracking
//! - `battle`: Session, state mutators, inbound router, peer wrapper
//! - `effects`: Ability trait, targeting and the reference abilities
//! - `telemetry`: Tracing setup

pub mod core;
pub mod sync;
pub mod presentation;
pub mod battle;
pub mod effects;
pub mod telemetry;

// Re-export commonly used types
pub use crate::core::{
    to_absolute_side, to_local_side,
    AbsoluteSide, LocalSide, Position, SideMap,
    EntityId, EntityKind, LocalSlot,
    BattleRng, BattleRngState, CosmeticRng,
    BattleConfig, SyncError,
    CombatLog, LogLine, Severity,
    BattleState, FormationSpec, HeroSpec, CreatureSpec, Vitals,
};

pub use crate::sync::{
    AuthorityGate, PeerRole,
    ActionMessage, ActorRef, TargetRef, ComputedValues, HealEntry,
    Envelope, Payload, StateSync, PROTOCOL_VERSION,
    SequenceCheck, SequenceTracker,
    Replay, ReplayPhase, ReplayReport,
    Speed, speed_adjusted_delay,
    Transport, LocalLink, ChannelTransport, Inbox,
    NullTransport, RecordingTransport, LossyTransport,
};

pub use crate::presentation::{
    Presenter, TracingPresenter, RecordingPresenter, PresentEvent,
    RenderHandle, RenderRegistry, VisualCue, VisualId, VisualTracker,
};

pub use crate::battle::{BattleSession, Dispatch, MessageRouter, Peer, VitalsChange};

pub use crate::effects::{
    Ability, AbilityBook, ActionOutcome,
    TargetSpec, TargetFilter, TargetSelector,
    SkeletonArcher, MendingChorus, Necromancer, PoisonVial,
};
