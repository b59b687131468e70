//! Wire messages exchanged from host to guest.
//!
//! Two payload families travel in the same ordered stream:
//!
//! - `ActionMessage`: what an ability did, with every value the guest needs
//!   to replay it. Never asks the guest to roll or compute.
//! - `StateSync`: one authoritative state change (HP, status stacks, side
//!   counters, battle end). The only way guest state is mutated.
//!
//! Entity references are plain descriptors keyed by absolute side. Each peer
//! re-resolves them against its own state tree; nothing on the wire is a
//! live reference.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{AbsoluteSide, EntityId, EntityKind, LogLine, Position};

/// Version stamped on every envelope.
pub const PROTOCOL_VERSION: u16 = 1;

/// Kind tags for state sync payloads.
pub mod sync_kind {
    pub const HEALTH: &str = "state_health";
    pub const STATUS: &str = "state_status";
    pub const COUNTER: &str = "state_counter";
    pub const BATTLE_END: &str = "battle_end";
}

/// The entity that acted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorRef {
    pub side: AbsoluteSide,
    pub position: Position,
    pub creature_index: Option<u8>,
    pub name: String,
}

impl ActorRef {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            side: id.side,
            position: id.position,
            creature_index: id.creature_index,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn entity_id(&self) -> EntityId {
        EntityId {
            side: self.side,
            position: self.position,
            creature_index: self.creature_index,
        }
    }
}

/// An entity acted upon.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetRef {
    pub target_type: EntityKind,
    pub side: AbsoluteSide,
    pub position: Position,
    pub creature_index: Option<u8>,
    pub name: String,
}

impl TargetRef {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            target_type: id.kind(),
            side: id.side,
            position: id.position,
            creature_index: id.creature_index,
            name: name.into(),
        }
    }

    /// The referenced identity, or `None` if the descriptor is inconsistent
    /// (a creature with no index).
    #[must_use]
    pub fn entity_id(&self) -> Option<EntityId> {
        match (self.target_type, self.creature_index) {
            (EntityKind::Hero, _) => Some(EntityId::hero(self.side, self.position)),
            (EntityKind::Creature, Some(i)) => {
                Some(EntityId::creature(self.side, self.position, i))
            }
            (EntityKind::Creature, None) => None,
        }
    }
}

/// One heal already rolled by the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealEntry {
    pub target: TargetRef,
    pub amount: i64,
}

/// Effect-specific outcome, fully decided by the host.
///
/// Durations are nominal milliseconds; each peer applies its own speed
/// adjustment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComputedValues {
    /// Single projectile from actor to the message target.
    Projectile {
        damage: i64,
        critical: bool,
        travel_ms: u64,
        impact_ms: u64,
    },
    /// Heals landing one after another, `stagger_ms` apart.
    StaggeredHeal {
        heals: SmallVec<[HealEntry; 3]>,
        stagger_ms: u64,
        glow_ms: u64,
    },
    /// A creature raised mid-battle under the actor's hero.
    Summon {
        summoned: TargetRef,
        max_hp: i64,
        rise_ms: u64,
    },
    /// A thrown status effect splashing onto several targets.
    StatusSplash {
        effect: String,
        stacks: u32,
        targets: SmallVec<[TargetRef; 3]>,
        flight_ms: u64,
        splash_ms: u64,
    },
}

/// Host's description of a completed or in-progress ability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMessage {
    /// Ability kind tag, e.g. `"skeleton_archer_projectile_attack"`.
    pub kind: String,
    pub actor: ActorRef,
    /// Primary target, when the ability has exactly one.
    pub target: Option<TargetRef>,
    pub values: ComputedValues,
    /// Combat log lines the host wrote for this action.
    pub log: Vec<LogLine>,
    /// Advisory wall-clock time. Never used for ordering.
    pub timestamp_ms: u64,
}

impl ActionMessage {
    pub fn new(kind: impl Into<String>, actor: ActorRef, values: ComputedValues) -> Self {
        Self {
            kind: kind.into(),
            actor,
            target: None,
            values,
            log: Vec::new(),
            timestamp_ms: now_ms(),
        }
    }

    /// Set the primary target (builder pattern).
    #[must_use]
    pub fn with_target(mut self, target: TargetRef) -> Self {
        self.target = Some(target);
        self
    }

    /// Attach combat log lines (builder pattern).
    #[must_use]
    pub fn with_log(mut self, lines: impl IntoIterator<Item = LogLine>) -> Self {
        self.log.extend(lines);
        self
    }
}

/// One authoritative state change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateSync {
    Health {
        target: EntityId,
        hp: i64,
        max_hp: i64,
        alive: bool,
    },
    Status {
        target: EntityId,
        effect: String,
        /// New total; 0 removes the effect.
        stacks: u32,
    },
    Counter {
        side: AbsoluteSide,
        key: String,
        value: i64,
    },
    BattleEnd {
        winner: Option<AbsoluteSide>,
    },
}

impl StateSync {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Health { .. } => sync_kind::HEALTH,
            Self::Status { .. } => sync_kind::STATUS,
            Self::Counter { .. } => sync_kind::COUNTER,
            Self::BattleEnd { .. } => sync_kind::BATTLE_END,
        }
    }
}

/// What an envelope carries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    Action(ActionMessage),
    Sync(StateSync),
}

impl Payload {
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Action(action) => &action.kind,
            Self::Sync(sync) => sync.kind(),
        }
    }
}

/// Versioned, sequenced wrapper around a payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub version: u16,
    /// Per-sender sequence number starting at 0.
    pub seq: u64,
    pub kind: String,
    /// Advisory wall-clock time.
    pub sent_at_ms: u64,
    pub payload: Payload,
}

impl Envelope {
    pub fn new(version: u16, seq: u64, payload: Payload) -> Self {
        Self {
            version,
            seq,
            kind: payload.kind().to_string(),
            sent_at_ms: now_ms(),
            payload,
        }
    }
}

/// Milliseconds since the Unix epoch, or 0 if the clock is before it.
#[must_use]
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
