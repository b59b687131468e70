//! Battle state tree: heroes, creatures, status stacks and side counters.
//!
//! ## Layout
//!
//! Each local side owns a `Formation` of up to three heroes (left, center,
//! right). Each hero owns an ordered list of creatures. Side counters hold
//! per-side integers such as graveyard size.
//!
//! ## Who mutates what
//!
//! The host mutates this tree from effect code. The guest mutates it only
//! from state sync handlers, plus the creation of temporary summons
//! described by an action message. Nothing here checks that rule; the
//! session methods that wrap these calls do.
//!
//! ## State values
//!
//! HP and counters are `i64`; status stacks are `u32` keyed by effect name.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::entity::{EntityId, LocalSlot};
use super::side::{to_local_side, AbsoluteSide, LocalSide, Position, SideMap};

/// Status effect stacks keyed by effect name.
pub type StatusStacks = FxHashMap<String, u32>;

/// Health, alive flag and status stacks shared by heroes and creatures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vitals {
    pub hp: i64,
    pub max_hp: i64,
    pub alive: bool,
    pub statuses: StatusStacks,
}

impl Vitals {
    /// Full health, no statuses.
    #[must_use]
    pub fn new(max_hp: i64) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            alive: max_hp > 0,
            statuses: StatusStacks::default(),
        }
    }

    #[must_use]
    pub fn is_damaged(&self) -> bool {
        self.alive && self.hp < self.max_hp
    }

    /// Current stacks of a status effect (0 if absent).
    #[must_use]
    pub fn stacks(&self, effect: &str) -> u32 {
        self.statuses.get(effect).copied().unwrap_or(0)
    }
}

/// A creature owned by a hero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureState {
    pub name: String,
    pub vitals: Vitals,
    /// Summoned mid-battle; not part of the starting formation.
    pub temporary: bool,
}

impl CreatureState {
    pub fn new(name: impl Into<String>, max_hp: i64) -> Self {
        Self {
            name: name.into(),
            vitals: Vitals::new(max_hp),
            temporary: false,
        }
    }

    pub fn summoned(name: impl Into<String>, max_hp: i64) -> Self {
        Self {
            temporary: true,
            ..Self::new(name, max_hp)
        }
    }
}

/// A hero and its creatures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroState {
    pub name: String,
    pub vitals: Vitals,
    pub creatures: Vec<CreatureState>,
}

impl HeroState {
    pub fn new(name: impl Into<String>, max_hp: i64) -> Self {
        Self {
            name: name.into(),
            vitals: Vitals::new(max_hp),
            creatures: Vec::new(),
        }
    }
}

/// Up to three heroes keyed by position.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formation {
    slots: [Option<HeroState>; 3],
}

impl Formation {
    #[must_use]
    pub fn get(&self, position: Position) -> Option<&HeroState> {
        self.slots[position.index()].as_ref()
    }

    pub fn get_mut(&mut self, position: Position) -> Option<&mut HeroState> {
        self.slots[position.index()].as_mut()
    }

    /// Place a hero, replacing any existing one.
    pub fn place(&mut self, position: Position, hero: HeroState) {
        self.slots[position.index()] = Some(hero);
    }

    /// Iterate over occupied positions in board order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &HeroState)> {
        Position::ALL
            .into_iter()
            .filter_map(move |p| self.get(p).map(|h| (p, h)))
    }

    pub fn clear(&mut self) {
        self.slots = Default::default();
    }
}

/// Starting creature description.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureSpec {
    pub name: String,
    pub hp: i64,
}

/// Starting hero description.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroSpec {
    pub position: Position,
    pub name: String,
    pub hp: i64,
    #[serde(default)]
    pub creatures: Vec<CreatureSpec>,
}

/// Starting formation for one side, as chosen before the battle.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormationSpec {
    #[serde(default)]
    pub heroes: Vec<HeroSpec>,
}

impl FormationSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hero (builder pattern).
    pub fn hero(mut self, position: Position, name: impl Into<String>, hp: i64) -> Self {
        self.heroes.push(HeroSpec {
            position,
            name: name.into(),
            hp,
            creatures: Vec::new(),
        });
        self
    }

    /// Give the most recently added hero a creature (builder pattern).
    ///
    /// Ignored if no hero has been added yet.
    pub fn creature(mut self, name: impl Into<String>, hp: i64) -> Self {
        if let Some(hero) = self.heroes.last_mut() {
            hero.creatures.push(CreatureSpec {
                name: name.into(),
                hp,
            });
        }
        self
    }

    /// Build the live formation.
    #[must_use]
    pub fn build(&self) -> Formation {
        let mut formation = Formation::default();
        for spec in &self.heroes {
            let mut hero = HeroState::new(spec.name.clone(), spec.hp);
            hero.creatures = spec
                .creatures
                .iter()
                .map(|c| CreatureState::new(c.name.clone(), c.hp))
                .collect();
            formation.place(spec.position, hero);
        }
        formation
    }
}

/// One peer's copy of the battle.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleState {
    heroes: SideMap<Formation>,
    counters: SideMap<FxHashMap<String, i64>>,
}

impl BattleState {
    /// Build the starting state from both sides' formations.
    ///
    /// `is_host` decides which formation this peer renders as its own.
    #[must_use]
    pub fn new(host: &FormationSpec, guest: &FormationSpec, is_host: bool) -> Self {
        let mut state = Self::default();
        *state.formation_mut(to_local_side(AbsoluteSide::Host, is_host)) = host.build();
        *state.formation_mut(to_local_side(AbsoluteSide::Guest, is_host)) = guest.build();
        state
    }

    // === Heroes ===

    #[must_use]
    pub fn player_heroes(&self) -> &Formation {
        &self.heroes[LocalSide::Player]
    }

    #[must_use]
    pub fn opponent_heroes(&self) -> &Formation {
        &self.heroes[LocalSide::Opponent]
    }

    #[must_use]
    pub fn formation(&self, side: LocalSide) -> &Formation {
        &self.heroes[side]
    }

    pub fn formation_mut(&mut self, side: LocalSide) -> &mut Formation {
        &mut self.heroes[side]
    }

    #[must_use]
    pub fn hero(&self, side: LocalSide, position: Position) -> Option<&HeroState> {
        self.heroes[side].get(position)
    }

    pub fn hero_mut(&mut self, side: LocalSide, position: Position) -> Option<&mut HeroState> {
        self.heroes[side].get_mut(position)
    }

    // === Entity lookup ===

    /// Vitals of the entity at a slot.
    #[must_use]
    pub fn vitals(&self, slot: LocalSlot) -> Option<&Vitals> {
        let hero = self.hero(slot.side, slot.position)?;
        match slot.creature_index {
            None => Some(&hero.vitals),
            Some(i) => hero.creatures.get(i as usize).map(|c| &c.vitals),
        }
    }

    pub fn vitals_mut(&mut self, slot: LocalSlot) -> Option<&mut Vitals> {
        let hero = self.hero_mut(slot.side, slot.position)?;
        match slot.creature_index {
            None => Some(&mut hero.vitals),
            Some(i) => hero.creatures.get_mut(i as usize).map(|c| &mut c.vitals),
        }
    }

    /// Display name of the entity at a slot.
    #[must_use]
    pub fn name(&self, slot: LocalSlot) -> Option<&str> {
        let hero = self.hero(slot.side, slot.position)?;
        match slot.creature_index {
            None => Some(hero.name.as_str()),
            Some(i) => hero.creatures.get(i as usize).map(|c| c.name.as_str()),
        }
    }

    #[must_use]
    pub fn contains(&self, slot: LocalSlot) -> bool {
        self.vitals(slot).is_some()
    }

    /// Every entity on a side: each hero followed by its creatures, in
    /// board order.
    #[must_use]
    pub fn slots(&self, side: LocalSide) -> Vec<LocalSlot> {
        let mut slots = Vec::new();
        for (position, hero) in self.heroes[side].iter() {
            slots.push(LocalSlot::hero(side, position));
            for index in 0..hero.creatures.len() {
                slots.push(LocalSlot::creature(side, position, index as u8));
            }
        }
        slots
    }

    /// Entities on a side that are still alive.
    #[must_use]
    pub fn living_slots(&self, side: LocalSide) -> Vec<LocalSlot> {
        self.slots(side)
            .into_iter()
            .filter(|s| self.vitals(*s).is_some_and(|v| v.alive))
            .collect()
    }

    /// Whether every hero on a side is dead (or the side is empty).
    #[must_use]
    pub fn side_defeated(&self, side: LocalSide) -> bool {
        self.heroes[side].iter().all(|(_, h)| !h.vitals.alive)
    }

    /// Append a creature to a hero's list.
    ///
    /// Returns the new creature's slot, or `None` if the owner is missing.
    pub fn add_creature(
        &mut self,
        side: LocalSide,
        position: Position,
        creature: CreatureState,
    ) -> Option<LocalSlot> {
        let hero = self.hero_mut(side, position)?;
        hero.creatures.push(creature);
        let index = u8::try_from(hero.creatures.len() - 1).ok()?;
        Some(LocalSlot::creature(side, position, index))
    }

    // === Side counters ===

    /// Get a counter with default.
    #[must_use]
    pub fn counter(&self, side: LocalSide, key: &str, default: i64) -> i64 {
        self.counters[side].get(key).copied().unwrap_or(default)
    }

    pub fn set_counter(&mut self, side: LocalSide, key: impl Into<String>, value: i64) {
        self.counters[side].insert(key.into(), value);
    }

    /// Modify a counter by delta, returning the new value.
    pub fn modify_counter(&mut self, side: LocalSide, key: &str, delta: i64) -> i64 {
        let value = self.counter(side, key, 0) + delta;
        self.counters[side].insert(key.to_string(), value);
        value
    }

    // === Comparison ===

    /// HP and alive flag of every entity, keyed by shared identity.
    ///
    /// Two peers in sync produce equal snapshots.
    #[must_use]
    pub fn vitals_snapshot(&self, is_host: bool) -> Vec<(EntityId, i64, bool)> {
        let mut snapshot: Vec<_> = LocalSide::ALL
            .into_iter()
            .flat_map(|side| self.slots(side))
            .filter_map(|slot| {
                let v = self.vitals(slot)?;
                Some((EntityId::from_local(slot, is_host), v.hp, v.alive))
            })
            .collect();
        snapshot.sort_by_key(|(id, _, _)| *id);
        snapshot
    }

    /// Tear down everything at battle end.
    pub fn clear(&mut self) {
        for side in LocalSide::ALL {
            self.heroes[side].clear();
            self.counters[side].clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_spec() -> FormationSpec {
        FormationSpec::new()
            .hero(Position::Left, "Alice", 30)
            .creature("Skeleton Archer", 8)
            .creature("Imp", 4)
            .hero(Position::Right, "Bob", 25)
    }

    fn guest_spec() -> FormationSpec {
        FormationSpec::new().hero(Position::Center, "Cara", 40)
    }

    #[test]
    fn test_formation_placement_host() {
        let state = BattleState::new(&host_spec(), &guest_spec(), true);
        assert_eq!(state.player_heroes().get(Position::Left).unwrap().name, "Alice");
        assert_eq!(state.opponent_heroes().get(Position::Center).unwrap().name, "Cara");
    }

    #[test]
    fn test_formation_placement_guest() {
        let state = BattleState::new(&host_spec(), &guest_spec(), false);
        assert_eq!(state.player_heroes().get(Position::Center).unwrap().name, "Cara");
        assert_eq!(state.opponent_heroes().get(Position::Left).unwrap().name, "Alice");
    }

    #[test]
    fn test_slots_order() {
        let state = BattleState::new(&host_spec(), &guest_spec(), true);
        let slots = state.slots(LocalSide::Player);
        assert_eq!(
            slots,
            vec![
                LocalSlot::hero(LocalSide::Player, Position::Left),
                LocalSlot::creature(LocalSide::Player, Position::Left, 0),
                LocalSlot::creature(LocalSide::Player, Position::Left, 1),
                LocalSlot::hero(LocalSide::Player, Position::Right),
            ]
        );
    }

    #[test]
    fn test_vitals_and_name_lookup() {
        let state = BattleState::new(&host_spec(), &guest_spec(), true);
        let imp = LocalSlot::creature(LocalSide::Player, Position::Left, 1);
        assert_eq!(state.name(imp), Some("Imp"));
        assert_eq!(state.vitals(imp).unwrap().hp, 4);
        assert!(state.vitals(LocalSlot::creature(LocalSide::Player, Position::Left, 9)).is_none());
        assert!(state.vitals(LocalSlot::hero(LocalSide::Opponent, Position::Left)).is_none());
    }

    #[test]
    fn test_living_slots_excludes_dead() {
        let mut state = BattleState::new(&host_spec(), &guest_spec(), true);
        let imp = LocalSlot::creature(LocalSide::Player, Position::Left, 1);
        state.vitals_mut(imp).unwrap().alive = false;
        assert!(!state.living_slots(LocalSide::Player).contains(&imp));
        assert_eq!(state.living_slots(LocalSide::Player).len(), 3);
    }

    #[test]
    fn test_add_creature() {
        let mut state = BattleState::new(&host_spec(), &guest_spec(), true);
        let slot = state
            .add_creature(LocalSide::Player, Position::Left, CreatureState::summoned("Bones", 5))
            .unwrap();
        assert_eq!(slot.creature_index, Some(2));
        assert!(state.hero(LocalSide::Player, Position::Left).unwrap().creatures[2].temporary);

        assert!(state
            .add_creature(LocalSide::Player, Position::Center, CreatureState::new("x", 1))
            .is_none());
    }

    #[test]
    fn test_counters() {
        let mut state = BattleState::default();
        assert_eq!(state.counter(LocalSide::Player, "graveyard", 0), 0);
        state.set_counter(LocalSide::Player, "graveyard", 3);
        assert_eq!(state.modify_counter(LocalSide::Player, "graveyard", -1), 2);
        assert_eq!(state.counter(LocalSide::Opponent, "graveyard", 7), 7);
    }

    #[test]
    fn test_snapshot_matches_across_peers() {
        let host = BattleState::new(&host_spec(), &guest_spec(), true);
        let guest = BattleState::new(&host_spec(), &guest_spec(), false);
        assert_eq!(host.vitals_snapshot(true), guest.vitals_snapshot(false));
    }

    #[test]
    fn test_side_defeated() {
        let mut state = BattleState::new(&host_spec(), &guest_spec(), true);
        assert!(!state.side_defeated(LocalSide::Opponent));
        state
            .hero_mut(LocalSide::Opponent, Position::Center)
            .unwrap()
            .vitals
            .alive = false;
        assert!(state.side_defeated(LocalSide::Opponent));
    }

    #[test]
    fn test_clear() {
        let mut state = BattleState::new(&host_spec(), &guest_spec(), true);
        state.set_counter(LocalSide::Player, "graveyard", 1);
        state.clear();
        assert!(state.slots(LocalSide::Player).is_empty());
        assert_eq!(state.counter(LocalSide::Player, "graveyard", 0), 0);
    }

    #[test]
    fn test_formation_spec_from_toml() {
        let text = r#"
            [[heroes]]
            position = "left"
            name = "Alice"
            hp = 30
            creatures = [{ name = "Imp", hp = 4 }]
        "#;
        let spec: FormationSpec = toml::from_str(text).unwrap();
        let formation = spec.build();
        assert_eq!(formation.get(Position::Left).unwrap().creatures[0].name, "Imp");
    }
}
