//! Ability targeting.
//!
//! Defines how abilities select their targets:
//! - `TargetSpec`: which side, which filters, how many
//! - `TargetFilter`: predicates over an entity's vitals
//! - `TargetSelector`: evaluates a spec against a peer's battle state
//!
//! Selection only lists candidates. Picking among them is a random choice
//! and therefore happens on the host through the session RNG.

use serde::{Deserialize, Serialize};

use crate::core::{BattleState, EntityId, EntityKind, LocalSide, Vitals};

/// Which side a spec targets, relative to the acting entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetSide {
    Enemies,
    Allies,
    Both,
}

/// How many targets an ability affects once candidates are ordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetCount {
    /// At most N targets.
    UpTo(usize),
    /// All valid targets.
    All,
}

/// Filters for valid targets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetFilter {
    /// Target must be alive.
    Alive,
    /// Target must be alive and below max HP.
    Damaged,
    /// Target must be a hero or a creature.
    Kind(EntityKind),
    /// Target must carry at least one stack of an effect.
    HasStatus(String),
    /// Target must carry no stacks of an effect.
    LacksStatus(String),
    /// Target must not be the acting entity.
    NotSource,
}

/// Specification for ability targeting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub side: TargetSide,
    pub filters: Vec<TargetFilter>,
    pub count: TargetCount,
}

impl TargetSpec {
    /// One living enemy, hero or creature.
    pub fn single_enemy() -> Self {
        Self::enemies(1)
    }

    /// Up to `n` living enemies.
    pub fn enemies(n: usize) -> Self {
        Self {
            side: TargetSide::Enemies,
            filters: vec![TargetFilter::Alive],
            count: TargetCount::UpTo(n),
        }
    }

    /// Up to `n` damaged allies.
    pub fn damaged_allies(n: usize) -> Self {
        Self {
            side: TargetSide::Allies,
            filters: vec![TargetFilter::Damaged],
            count: TargetCount::UpTo(n),
        }
    }

    /// Largest number of targets this spec accepts.
    #[must_use]
    pub fn max_targets(&self) -> Option<usize> {
        match self.count {
            TargetCount::UpTo(n) => Some(n),
            TargetCount::All => None,
        }
    }
}

/// Selector for choosing targets based on a spec.
#[derive(Clone, Debug)]
pub struct TargetSelector {
    spec: TargetSpec,
    source: EntityId,
}

impl TargetSelector {
    /// Create a selector for an acting entity.
    pub fn new(spec: TargetSpec, source: EntityId) -> Self {
        Self { spec, source }
    }

    /// All valid targets in board order, as shared identities.
    pub fn valid_targets(&self, state: &BattleState, is_host: bool) -> Vec<EntityId> {
        let own = self.source.to_local(is_host).side;
        let sides = match self.spec.side {
            TargetSide::Allies => vec![own],
            TargetSide::Enemies => vec![own.opposite()],
            TargetSide::Both => LocalSide::ALL.to_vec(),
        };

        let mut targets = Vec::new();
        for side in sides {
            for slot in state.slots(side) {
                let Some(vitals) = state.vitals(slot) else {
                    continue;
                };
                let entity = EntityId::from_local(slot, is_host);
                if self.passes_filters(entity, vitals) {
                    targets.push(entity);
                }
            }
        }
        targets
    }

    /// Keep the first targets of an already ordered candidate list, up to
    /// the spec's count.
    pub fn take_allowed(&self, mut ordered: Vec<EntityId>) -> Vec<EntityId> {
        if let Some(max) = self.spec.max_targets() {
            ordered.truncate(max);
        }
        ordered
    }

    fn passes_filters(&self, entity: EntityId, vitals: &Vitals) -> bool {
        self.spec
            .filters
            .iter()
            .all(|filter| self.passes_filter(entity, vitals, filter))
    }

    fn passes_filter(&self, entity: EntityId, vitals: &Vitals, filter: &TargetFilter) -> bool {
        match filter {
            TargetFilter::Alive => vitals.alive,
            TargetFilter::Damaged => vitals.is_damaged(),
            TargetFilter::Kind(kind) => entity.kind() == *kind,
            TargetFilter::HasStatus(effect) => vitals.stacks(effect) > 0,
            TargetFilter::LacksStatus(effect) => vitals.stacks(effect) == 0,
            TargetFilter::NotSource => entity != self.source,
        }
    }
}
