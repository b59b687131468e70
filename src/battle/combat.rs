//! State mutators for damage, healing and status effects.
//!
//! These operate on a `BattleState` directly and know nothing about peers.
//! The host reaches them through the session's `authoritative_*` methods,
//! which also broadcast the resulting state sync. The guest reaches the
//! `set_*` variants only through inbound state sync.

use crate::core::{BattleState, LocalSlot};

/// HP change applied to one entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VitalsChange {
    pub before: i64,
    pub hp: i64,
    pub max_hp: i64,
    pub alive: bool,
    /// Alive before, dead after.
    pub killed: bool,
}

impl VitalsChange {
    /// Absolute amount of HP that changed.
    #[must_use]
    pub fn delta(&self) -> i64 {
        (self.hp - self.before).abs()
    }
}

/// Subtract HP. Negative amounts count as zero; dead entities take none.
///
/// Returns `None` if the slot is empty.
pub fn apply_damage(state: &mut BattleState, slot: LocalSlot, amount: i64) -> Option<VitalsChange> {
    let vitals = state.vitals_mut(slot)?;
    let before = vitals.hp;
    let was_alive = vitals.alive;
    if was_alive {
        vitals.hp = (vitals.hp - amount.max(0)).max(0);
        if vitals.hp == 0 {
            vitals.alive = false;
        }
    }
    Some(VitalsChange {
        before,
        hp: vitals.hp,
        max_hp: vitals.max_hp,
        alive: vitals.alive,
        killed: was_alive && !vitals.alive,
    })
}

/// Add HP up to max. Dead entities are not healed.
pub fn apply_heal(state: &mut BattleState, slot: LocalSlot, amount: i64) -> Option<VitalsChange> {
    let vitals = state.vitals_mut(slot)?;
    let before = vitals.hp;
    if vitals.alive {
        vitals.hp = (vitals.hp + amount.max(0)).min(vitals.max_hp);
    }
    Some(VitalsChange {
        before,
        hp: vitals.hp,
        max_hp: vitals.max_hp,
        alive: vitals.alive,
        killed: false,
    })
}

/// Add stacks of a status effect, returning the new total.
pub fn apply_status(
    state: &mut BattleState,
    slot: LocalSlot,
    effect: &str,
    stacks: u32,
) -> Option<u32> {
    let vitals = state.vitals_mut(slot)?;
    let total = vitals.stacks(effect).saturating_add(stacks);
    vitals.statuses.insert(effect.to_string(), total);
    Some(total)
}

/// Remove a status effect entirely, returning the stacks it had.
pub fn remove_status(state: &mut BattleState, slot: LocalSlot, effect: &str) -> Option<u32> {
    let vitals = state.vitals_mut(slot)?;
    Some(vitals.statuses.remove(effect).unwrap_or(0))
}

/// Overwrite HP values from an authoritative source.
pub fn set_vitals(
    state: &mut BattleState,
    slot: LocalSlot,
    hp: i64,
    max_hp: i64,
    alive: bool,
) -> bool {
    match state.vitals_mut(slot) {
        Some(vitals) => {
            vitals.hp = hp;
            vitals.max_hp = max_hp;
            vitals.alive = alive;
            true
        }
        None => false,
    }
}

/// Overwrite a status stack count; 0 removes the effect.
pub fn set_status(state: &mut BattleState, slot: LocalSlot, effect: &str, stacks: u32) -> bool {
    match state.vitals_mut(slot) {
        Some(vitals) => {
            if stacks == 0 {
                vitals.statuses.remove(effect);
            } else {
                vitals.statuses.insert(effect.to_string(), stacks);
            }
            true
        }
        None => false,
    }
}
