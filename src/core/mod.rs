//! Core battle types: sides, entities, state, randomness, configuration.
//!
//! Everything here is peer-agnostic. Which peer may call what is decided by
//! the session (`crate::battle`) and the authority gate (`crate::sync`).

pub mod side;
pub mod entity;
pub mod rng;
pub mod config;
pub mod error;
pub mod log;
pub mod state;

pub use side::{to_absolute_side, to_local_side, AbsoluteSide, LocalSide, Position, SideMap};
pub use entity::{EntityId, EntityKind, LocalSlot};
pub use rng::{BattleRng, BattleRngState, CosmeticRng};
pub use config::BattleConfig;
pub use error::SyncError;
pub use log::{CombatLog, LogLine, Severity};
pub use state::{
    BattleState, CreatureSpec, CreatureState, Formation, FormationSpec, HeroSpec, HeroState,
    StatusStacks, Vitals,
};
