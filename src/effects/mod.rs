//! Abilities: the host and guest halves of every special attack.
//!
//! Each ability implements [`Ability`] with two entry points:
//!
//! - `execute_special_attack`: host only. Checks authority, selects targets
//!   and rolls through the session RNG, mutates state through the session's
//!   authoritative methods, broadcasts one action message, then plays its
//!   own visuals.
//! - `handle_guest`: guest only. Replays the action from the message alone,
//!   using the same nominal durations as the host.
//!
//! ## Reference abilities
//!
//! - `SkeletonArcher`: random single target, crit roll, projectile.
//! - `MendingChorus`: staggered heals on several allies.
//! - `Necromancer`: temporary summon paid for with a side counter.
//! - `PoisonVial`: shuffled enemies receive status stacks.
//!
//! [`AbilityBook`] maps kind tags to abilities for dispatch.

mod targeting;
pub mod skeleton_archer;
pub mod mending_chorus;
pub mod necromancer;
pub mod poison_vial;

pub use targeting::{TargetCount, TargetFilter, TargetSelector, TargetSide, TargetSpec};
pub use skeleton_archer::SkeletonArcher;
pub use mending_chorus::MendingChorus;
pub use necromancer::Necromancer;
pub use poison_vial::PoisonVial;

use async_trait::async_trait;
use rustc_hash::FxHashMap;

use crate::battle::BattleSession;
use crate::core::{EntityId, SyncError};
use crate::presentation::{Presenter, VisualCue, VisualTracker};
use crate::sync::{ActionMessage, ReplayReport};

/// Host-side result of an ability activation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Called on the guest. Nothing happened.
    NotAuthoritative,
    /// No valid targets (or nothing to consume). Nothing was sent.
    NoTargets,
    /// The ability resolved.
    Completed {
        targets: usize,
        /// Whether the action message reached the transport.
        sent: bool,
    },
}

/// One special attack, host and guest halves.
#[async_trait(?Send)]
pub trait Ability {
    /// Kind tag carried by this ability's action messages.
    fn kind(&self) -> &'static str;

    /// Compute and apply the attack. No-op on a non-authoritative peer.
    async fn execute_special_attack(
        &mut self,
        session: &mut BattleSession,
        actor: EntityId,
    ) -> Result<ActionOutcome, SyncError>;

    /// Replay an action received from the host.
    async fn handle_guest(
        &mut self,
        session: &mut BattleSession,
        message: ActionMessage,
    ) -> ReplayReport;

    /// Remove lingering visuals. Returns how many were removed; safe to
    /// call repeatedly.
    fn cleanup(&mut self, presenter: &dyn Presenter) -> usize;
}

/// Show a cue, hold it for a nominal duration at local speed, clear it.
///
/// The visual stays tracked while on screen, so dropping the future midway
/// leaves it for `cleanup`.
pub(crate) async fn play_cue(
    session: &BattleSession,
    tracker: &VisualTracker,
    cue: VisualCue,
    nominal_ms: u64,
) {
    let visual = session.show(&cue);
    tracker.track(visual);
    session.animation_delay(nominal_ms).await;
    session.clear_visual(visual);
    tracker.release(visual);
}

/// Registry of abilities keyed by kind.
#[derive(Default)]
pub struct AbilityBook {
    abilities: FxHashMap<&'static str, Box<dyn Ability>>,
}

impl AbilityBook {
    /// Create a new empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A book holding every reference ability with default tuning.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut book = Self::new();
        book.register(Box::new(SkeletonArcher::default()));
        book.register(Box::new(MendingChorus::default()));
        book.register(Box::new(Necromancer::default()));
        book.register(Box::new(PoisonVial::default()));
        book
    }

    /// Register an ability.
    ///
    /// Panics if an ability with the same kind already exists.
    pub fn register(&mut self, ability: Box<dyn Ability>) {
        let kind = ability.kind();
        if self.abilities.contains_key(kind) {
            panic!("Ability kind `{}` already registered", kind);
        }
        self.abilities.insert(kind, ability);
    }

    pub fn get_mut(&mut self, kind: &str) -> Option<&mut (dyn Ability + 'static)> {
        self.abilities.get_mut(kind).map(|a| a.as_mut())
    }

    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.abilities.contains_key(kind)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }

    /// Registered kinds, sorted.
    #[must_use]
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.abilities.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }

    /// Run every ability's cleanup. Returns the total visuals removed.
    pub fn cleanup_all(&mut self, presenter: &dyn Presenter) -> usize {
        self.abilities.values_mut().map(|a| a.cleanup(presenter)).sum()
    }
}
