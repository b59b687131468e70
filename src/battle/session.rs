//! Battle session: one peer's view of one battle.
//!
//! The session is the dependency container every ability receives. It owns
//! the state tree, the RNG (host only), the outbound transport, the
//! presenter and render registry, the combat log and the local animation
//! speed. Nothing is global; build one per peer and tear it down with
//! [`BattleSession::end_battle`].
//!
//! ## Host vs guest
//!
//! Both peers construct the same type. The guest's session has no RNG, and
//! every `authoritative_*` method returns [`SyncError::NotAuthoritative`]
//! on it, so replay code cannot compute outcomes even by mistake. Guest
//! state changes arrive through [`BattleSession::apply_state_sync`].

use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, info, warn};

use super::combat::{self, VitalsChange};
use crate::core::{
    to_absolute_side, to_local_side, AbsoluteSide, BattleConfig, BattleRng, BattleRngState,
    BattleState, CombatLog, CosmeticRng, CreatureState, EntityId, Formation, FormationSpec,
    LocalSide, LocalSlot, LogLine, Severity, SyncError,
};
use crate::presentation::{Presenter, RenderRegistry, VisualCue, VisualId};
use crate::sync::codec::encode_envelope;
use crate::sync::message::{ActionMessage, ActorRef, Envelope, Payload, StateSync, TargetRef};
use crate::sync::replay::{Replay, Resolved};
use crate::sync::timing::{self, Speed};
use crate::sync::{AuthorityGate, PeerRole, Transport};

/// One peer's battle.
pub struct BattleSession {
    role: PeerRole,
    config: BattleConfig,
    state: BattleState,
    rng: Option<BattleRng>,
    cosmetic: CosmeticRng,
    transport: Box<dyn Transport>,
    presenter: Rc<dyn Presenter>,
    registry: RenderRegistry,
    log: CombatLog,
    speed: Speed,
    next_seq: u64,
    next_visual: Cell<u64>,
    outcome: Option<Option<AbsoluteSide>>,
    final_vitals: Vec<(EntityId, i64, bool)>,
}

impl BattleSession {
    /// Build the starting state from both formations and mount every
    /// entity.
    pub fn new(
        role: PeerRole,
        config: BattleConfig,
        host: &FormationSpec,
        guest: &FormationSpec,
        transport: impl Transport + 'static,
        presenter: Rc<dyn Presenter>,
    ) -> Self {
        let config = config.validated();
        let state = BattleState::new(host, guest, role.is_host());
        let rng = role.is_authoritative().then(|| BattleRng::new(config.seed));

        let mut registry = RenderRegistry::new();
        for side in LocalSide::ALL {
            for slot in state.slots(side) {
                let name = state.name(slot).unwrap_or_default();
                registry.insert(slot, presenter.mount(slot, name));
            }
        }
        debug!(%role, mounted = registry.len(), "battle session created");

        Self {
            role,
            speed: Speed::new(config.speed),
            log: CombatLog::with_capacity(config.combat_log_capacity),
            config,
            state,
            rng,
            cosmetic: CosmeticRng::default(),
            transport: Box::new(transport),
            presenter,
            registry,
            next_seq: 0,
            next_visual: Cell::new(0),
            outcome: None,
            final_vitals: Vec::new(),
        }
    }

    // === Role ===

    #[must_use]
    pub fn role(&self) -> PeerRole {
        self.role
    }

    #[must_use]
    pub fn is_host(&self) -> bool {
        self.role.is_host()
    }

    #[must_use]
    pub fn is_authoritative(&self) -> bool {
        self.role.is_authoritative()
    }

    #[must_use]
    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    // === State access ===

    #[must_use]
    pub fn state(&self) -> &BattleState {
        &self.state
    }

    #[must_use]
    pub fn player_heroes(&self) -> &Formation {
        self.state.player_heroes()
    }

    #[must_use]
    pub fn opponent_heroes(&self) -> &Formation {
        self.state.opponent_heroes()
    }

    #[must_use]
    pub fn registry(&self) -> &RenderRegistry {
        &self.registry
    }

    #[must_use]
    pub fn to_local_side(&self, side: AbsoluteSide) -> LocalSide {
        to_local_side(side, self.is_host())
    }

    #[must_use]
    pub fn to_absolute_side(&self, side: LocalSide) -> AbsoluteSide {
        to_absolute_side(side, self.is_host())
    }

    #[must_use]
    pub fn local_slot(&self, id: EntityId) -> LocalSlot {
        id.to_local(self.is_host())
    }

    #[must_use]
    pub fn entity_id(&self, slot: LocalSlot) -> EntityId {
        EntityId::from_local(slot, self.is_host())
    }

    #[must_use]
    pub fn name_of(&self, id: EntityId) -> Option<&str> {
        self.state.name(self.local_slot(id))
    }

    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.state
            .vitals(self.local_slot(id))
            .is_some_and(|v| v.alive)
    }

    /// Current stacks of a status effect on an entity.
    #[must_use]
    pub fn status_stacks(&self, id: EntityId, effect: &str) -> u32 {
        self.state
            .vitals(self.local_slot(id))
            .map_or(0, |v| v.stacks(effect))
    }

    #[must_use]
    pub fn counter(&self, side: AbsoluteSide, key: &str, default: i64) -> i64 {
        self.state.counter(self.to_local_side(side), key, default)
    }

    /// Wire descriptor for an acting entity.
    pub fn actor_ref(&self, id: EntityId) -> Option<ActorRef> {
        self.name_of(id).map(|name| ActorRef::new(id, name))
    }

    /// Wire descriptor for a targeted entity.
    pub fn target_ref(&self, id: EntityId) -> Option<TargetRef> {
        self.name_of(id).map(|name| TargetRef::new(id, name))
    }

    // === Randomness (host only) ===

    fn rng(&mut self) -> Result<&mut BattleRng, SyncError> {
        AuthorityGate::check(self.role).require()?;
        self.rng.as_mut().ok_or(SyncError::NotAuthoritative)
    }

    pub fn get_random_int(&mut self, min: i64, max: i64) -> Result<i64, SyncError> {
        Ok(self.rng()?.get_random_int(min, max))
    }

    pub fn get_random_percent(&mut self) -> Result<u32, SyncError> {
        Ok(self.rng()?.get_random_percent())
    }

    pub fn roll_percent(&mut self, chance: u32) -> Result<bool, SyncError> {
        Ok(self.rng()?.roll_percent(chance))
    }

    pub fn shuffle_array<T: Clone>(&mut self, items: &[T]) -> Result<Vec<T>, SyncError> {
        Ok(self.rng()?.shuffle_array(items))
    }

    /// Captured RNG position, for save/restore on the host.
    #[must_use]
    pub fn rng_state(&self) -> Option<BattleRngState> {
        self.rng.as_ref().map(BattleRng::state)
    }

    /// Unsynchronized random offset for purely cosmetic variation.
    pub fn cosmetic_jitter(&mut self, spread: f32) -> f32 {
        self.cosmetic.jitter(spread)
    }

    // === Timing ===

    #[must_use]
    pub fn speed(&self) -> Speed {
        self.speed
    }

    pub fn set_speed(&mut self, multiplier: f64) {
        self.speed = Speed::new(multiplier);
    }

    #[must_use]
    pub fn speed_adjusted_delay(&self, nominal_ms: u64) -> u64 {
        self.speed.adjust(nominal_ms)
    }

    /// Wait exactly `ms`, ignoring speed.
    pub async fn delay(&self, ms: u64) {
        timing::delay(ms).await;
    }

    /// Wait a nominal animation duration at the local speed.
    pub async fn animation_delay(&self, nominal_ms: u64) {
        timing::delay(self.speed_adjusted_delay(nominal_ms)).await;
    }

    // === Combat log ===

    /// Append a line and return it, so the host can piggyback it on the
    /// action message.
    pub fn add_combat_log(&mut self, message: impl Into<String>, severity: Severity) -> LogLine {
        let line = LogLine::new(message, severity);
        self.log.push(line.clone());
        line
    }

    #[must_use]
    pub fn combat_log(&self) -> &CombatLog {
        &self.log
    }

    pub fn combat_log_mut(&mut self) -> &mut CombatLog {
        &mut self.log
    }

    // === Outbound ===

    /// Wrap a payload in an envelope and send it.
    ///
    /// Returns the sequence number used. The number is consumed even if the
    /// transport fails, so the receiver sees the loss as a gap.
    pub fn send_battle_update(&mut self, payload: Payload) -> Result<u64, SyncError> {
        AuthorityGate::check(self.role).require()?;
        let seq = self.next_seq;
        let envelope = Envelope::new(self.config.protocol_version, seq, payload);
        let frame = encode_envelope(&envelope)?;
        self.next_seq += 1;
        self.transport.send(frame)?;
        debug!(seq, kind = %envelope.kind, "sent battle update");
        Ok(seq)
    }

    /// Send an action message, then wait the fixed grace period.
    ///
    /// Failures are logged and the caller carries on animating locally.
    /// Returns whether the frame was handed to the transport.
    pub async fn broadcast_action(&mut self, message: ActionMessage) -> bool {
        let kind = message.kind.clone();
        let sent = match self.send_battle_update(Payload::Action(message)) {
            Ok(_) => true,
            Err(err) => {
                warn!(%kind, error = %err, "failed to send action; continuing locally");
                false
            }
        };
        self.delay(self.config.send_grace_ms).await;
        sent
    }

    fn send_sync(&mut self, sync: StateSync) {
        let kind = sync.kind();
        if let Err(err) = self.send_battle_update(Payload::Sync(sync)) {
            warn!(kind, error = %err, "failed to send state sync; peers may diverge");
        }
    }

    fn sync_health(&mut self, id: EntityId, change: &VitalsChange) {
        self.send_sync(StateSync::Health {
            target: id,
            hp: change.hp,
            max_hp: change.max_hp,
            alive: change.alive,
        });
    }

    // === Authoritative mutation (host only) ===

    /// Damage a hero or creature and broadcast its new health.
    pub fn authoritative_apply_damage(
        &mut self,
        id: EntityId,
        amount: i64,
    ) -> Result<VitalsChange, SyncError> {
        AuthorityGate::check(self.role).require()?;
        let slot = self.local_slot(id);
        let change = combat::apply_damage(&mut self.state, slot, amount)
            .ok_or(SyncError::UnknownEntity(id))?;
        self.sync_health(id, &change);
        if change.killed {
            info!(entity = %id, "entity defeated");
        }
        Ok(change)
    }

    /// Heal a hero or creature and broadcast its new health.
    pub fn authoritative_apply_heal(
        &mut self,
        id: EntityId,
        amount: i64,
    ) -> Result<VitalsChange, SyncError> {
        AuthorityGate::check(self.role).require()?;
        let slot = self.local_slot(id);
        let change = combat::apply_heal(&mut self.state, slot, amount)
            .ok_or(SyncError::UnknownEntity(id))?;
        self.sync_health(id, &change);
        Ok(change)
    }

    /// Add status stacks and broadcast the new total.
    pub fn authoritative_apply_status(
        &mut self,
        id: EntityId,
        effect: &str,
        stacks: u32,
    ) -> Result<u32, SyncError> {
        AuthorityGate::check(self.role).require()?;
        let slot = self.local_slot(id);
        let total = combat::apply_status(&mut self.state, slot, effect, stacks)
            .ok_or(SyncError::UnknownEntity(id))?;
        self.send_sync(StateSync::Status {
            target: id,
            effect: effect.to_string(),
            stacks: total,
        });
        Ok(total)
    }

    /// Remove a status effect and broadcast its removal.
    pub fn authoritative_remove_status(
        &mut self,
        id: EntityId,
        effect: &str,
    ) -> Result<u32, SyncError> {
        AuthorityGate::check(self.role).require()?;
        let slot = self.local_slot(id);
        let removed = combat::remove_status(&mut self.state, slot, effect)
            .ok_or(SyncError::UnknownEntity(id))?;
        self.send_sync(StateSync::Status {
            target: id,
            effect: effect.to_string(),
            stacks: 0,
        });
        Ok(removed)
    }

    /// Modify a side counter and broadcast the new value.
    pub fn authoritative_modify_counter(
        &mut self,
        side: AbsoluteSide,
        key: &str,
        delta: i64,
    ) -> Result<i64, SyncError> {
        AuthorityGate::check(self.role).require()?;
        let value = self.state.modify_counter(self.to_local_side(side), key, delta);
        self.send_sync(StateSync::Counter {
            side,
            key: key.to_string(),
            value,
        });
        Ok(value)
    }

    /// Set a side counter and broadcast it.
    pub fn authoritative_set_counter(
        &mut self,
        side: AbsoluteSide,
        key: &str,
        value: i64,
    ) -> Result<(), SyncError> {
        AuthorityGate::check(self.role).require()?;
        self.state.set_counter(self.to_local_side(side), key, value);
        self.send_sync(StateSync::Counter {
            side,
            key: key.to_string(),
            value,
        });
        Ok(())
    }

    /// Identity the next creature added under `owner` will get.
    pub fn next_creature_id(&self, owner: EntityId) -> Option<EntityId> {
        let hero = self.state.hero(self.to_local_side(owner.side), owner.position)?;
        let index = u8::try_from(hero.creatures.len()).ok()?;
        Some(EntityId::creature(owner.side, owner.position, index))
    }

    /// Create and mount a temporary creature at `id`.
    ///
    /// Both peers call this for the same summon: the host from effect code,
    /// the guest from the action message before any visual refers to it.
    /// Returns `false` if the owner is missing or the index does not line
    /// up with the local creature list. Existing creatures are left alone.
    pub fn materialize_summon(&mut self, id: EntityId, name: &str, max_hp: i64) -> bool {
        let slot = self.local_slot(id);
        if self.state.contains(slot) {
            debug!(entity = %id, "summon already present");
            return true;
        }
        if self.next_creature_id(id.owner()) != Some(id) {
            warn!(entity = %id, "summon index does not match local creature list");
            return false;
        }
        let creature = CreatureState::summoned(name, max_hp);
        let Some(created) = self.state.add_creature(slot.side, slot.position, creature) else {
            warn!(entity = %id, "summon owner missing");
            return false;
        };
        let handle = self.presenter.mount(created, name);
        self.registry.insert(created, handle);
        debug!(entity = %id, name, "summon materialized");
        true
    }

    // === Inbound (guest) ===

    /// Apply an authoritative change from the host.
    ///
    /// Returns whether local state changed. `BattleEnd` is handled by the
    /// caller, which also has to clean up abilities.
    pub fn apply_state_sync(&mut self, sync: &StateSync) -> bool {
        if self.is_authoritative() {
            warn!(kind = sync.kind(), "host ignoring inbound state sync");
            return false;
        }
        let applied = match sync {
            StateSync::Health { target, hp, max_hp, alive } => {
                let slot = self.local_slot(*target);
                combat::set_vitals(&mut self.state, slot, *hp, *max_hp, *alive)
            }
            StateSync::Status { target, effect, stacks } => {
                let slot = self.local_slot(*target);
                combat::set_status(&mut self.state, slot, effect, *stacks)
            }
            StateSync::Counter { side, key, value } => {
                let local = self.to_local_side(*side);
                self.state.set_counter(local, key.clone(), *value);
                true
            }
            StateSync::BattleEnd { .. } => false,
        };
        if !applied && !matches!(sync, StateSync::BattleEnd { .. }) {
            warn!(kind = sync.kind(), "state sync target missing locally");
        }
        applied
    }

    // === Replay helpers ===

    /// Resolve an entity for replay against local state and registry.
    pub fn resolve(&self, replay: &mut Replay, id: EntityId) -> Option<Resolved> {
        replay.resolve(&self.state, &self.registry, self.is_host(), id)
    }

    pub fn resolve_target(&self, replay: &mut Replay, target: &TargetRef) -> Option<Resolved> {
        replay.resolve_target(&self.state, &self.registry, self.is_host(), target)
    }

    // === Presentation ===

    #[must_use]
    pub fn presenter(&self) -> &dyn Presenter {
        self.presenter.as_ref()
    }

    /// Start a transient visual and return its id.
    pub fn show(&self, cue: &VisualCue) -> VisualId {
        let visual = VisualId(self.next_visual.get());
        self.next_visual.set(visual.0 + 1);
        self.presenter.show(visual, cue);
        visual
    }

    pub fn clear_visual(&self, visual: VisualId) {
        self.presenter.clear(visual);
    }

    // === Battle end ===

    /// The winner if a side has no living heroes.
    ///
    /// `Some(None)` means both sides fell.
    #[must_use]
    pub fn check_battle_end(&self) -> Option<Option<AbsoluteSide>> {
        let player_out = self.state.side_defeated(LocalSide::Player);
        let opponent_out = self.state.side_defeated(LocalSide::Opponent);
        match (player_out, opponent_out) {
            (false, false) => None,
            (true, true) => Some(None),
            (false, true) => Some(Some(self.to_absolute_side(LocalSide::Player))),
            (true, false) => Some(Some(self.to_absolute_side(LocalSide::Opponent))),
        }
    }

    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.outcome.is_some()
    }

    /// Final result, once ended.
    #[must_use]
    pub fn outcome(&self) -> Option<Option<AbsoluteSide>> {
        self.outcome
    }

    /// Vitals snapshot taken just before teardown.
    #[must_use]
    pub fn final_vitals(&self) -> &[(EntityId, i64, bool)] {
        &self.final_vitals
    }

    /// Tear down the battle.
    ///
    /// The host announces the result first. Every mounted entity is
    /// unmounted and the state tree cleared; the combat log is kept.
    /// Calling this twice is harmless.
    pub fn end_battle(&mut self, winner: Option<AbsoluteSide>) {
        if self.is_ended() {
            return;
        }
        if self.is_authoritative() {
            self.send_sync(StateSync::BattleEnd { winner });
        }
        let message = match winner {
            Some(side) => format!("The {} side wins", side),
            None => "The battle ends in a draw".to_string(),
        };
        self.add_combat_log(message, Severity::Info);
        for handle in self.registry.drain() {
            self.presenter.unmount(handle);
        }
        self.final_vitals = self.state.vitals_snapshot(self.is_host());
        self.state.clear();
        self.outcome = Some(winner);
        info!(role = %self.role, ?winner, "battle ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Position;
    use crate::presentation::RecordingPresenter;
    use crate::sync::{decode_envelope, RecordingTransport, PROTOCOL_VERSION};

    fn specs() -> (FormationSpec, FormationSpec) {
        (
            FormationSpec::new().hero(Position::Left, "Alice", 20).creature("Archer", 5),
            FormationSpec::new().hero(Position::Center, "Cara", 20),
        )
    }

    fn session(role: PeerRole) -> (BattleSession, RecordingTransport, Rc<RecordingPresenter>) {
        let (host, guest) = specs();
        let transport = RecordingTransport::new();
        let presenter = Rc::new(RecordingPresenter::new());
        let session = BattleSession::new(
            role,
            BattleConfig::default(),
            &host,
            &guest,
            transport.clone(),
            presenter.clone(),
        );
        (session, transport, presenter)
    }

    const CARA: EntityId = EntityId::hero(AbsoluteSide::Guest, Position::Center);

    #[test]
    fn test_mounts_every_entity() {
        let (session, _, presenter) = session(PeerRole::Host);
        assert_eq!(session.registry().len(), 3);
        assert_eq!(presenter.mounted().len(), 3);
    }

    #[test]
    fn test_guest_has_no_rng() {
        let (mut session, transport, _) = session(PeerRole::Guest);
        assert!(session.rng_state().is_none());
        let jitter = session.cosmetic_jitter(2.0);
        assert!((-2.0..=2.0).contains(&jitter));
        assert!(matches!(session.get_random_int(1, 6), Err(SyncError::NotAuthoritative)));
        assert!(matches!(
            session.authoritative_apply_damage(CARA, 3),
            Err(SyncError::NotAuthoritative)
        ));
        assert!(transport.is_empty());
        assert_eq!(session.state().vitals(session.local_slot(CARA)).unwrap().hp, 20);
    }

    #[test]
    fn test_damage_sends_health_sync() {
        let (mut session, transport, _) = session(PeerRole::Host);
        let change = session.authoritative_apply_damage(CARA, 7).unwrap();
        assert_eq!(change.hp, 13);

        let frames = transport.frames();
        assert_eq!(frames.len(), 1);
        let envelope = decode_envelope(&frames[0], PROTOCOL_VERSION).unwrap();
        assert_eq!(envelope.seq, 0);
        assert_eq!(
            envelope.payload,
            Payload::Sync(StateSync::Health { target: CARA, hp: 13, max_hp: 20, alive: true })
        );
    }

    #[test]
    fn test_unknown_entity() {
        let (mut session, transport, _) = session(PeerRole::Host);
        let nobody = EntityId::hero(AbsoluteSide::Guest, Position::Left);
        assert!(matches!(
            session.authoritative_apply_heal(nobody, 1),
            Err(SyncError::UnknownEntity(id)) if id == nobody
        ));
        assert!(transport.is_empty());
    }

    #[test]
    fn test_guest_applies_sync() {
        let (mut session, _, _) = session(PeerRole::Guest);
        assert!(session.apply_state_sync(&StateSync::Health {
            target: CARA,
            hp: 4,
            max_hp: 20,
            alive: true,
        }));
        assert!(session.apply_state_sync(&StateSync::Status {
            target: CARA,
            effect: "poisoned".into(),
            stacks: 2,
        }));
        assert!(session.apply_state_sync(&StateSync::Counter {
            side: AbsoluteSide::Host,
            key: "graveyard".into(),
            value: 3,
        }));
        let cara = LocalSlot::hero(LocalSide::Player, Position::Center);
        assert_eq!(session.state().vitals(cara).unwrap().hp, 4);
        assert_eq!(session.status_stacks(CARA, "poisoned"), 2);
        assert_eq!(session.state().counter(LocalSide::Opponent, "graveyard", 0), 3);
    }

    #[test]
    fn test_host_ignores_inbound_sync() {
        let (mut session, _, _) = session(PeerRole::Host);
        assert!(!session.apply_state_sync(&StateSync::Health {
            target: CARA,
            hp: 1,
            max_hp: 20,
            alive: true,
        }));
        assert_eq!(session.state().vitals(session.local_slot(CARA)).unwrap().hp, 20);
    }

    #[test]
    fn test_materialize_summon_on_both_peers() {
        let owner = EntityId::hero(AbsoluteSide::Host, Position::Left);
        for role in [PeerRole::Host, PeerRole::Guest] {
            let (mut session, _, presenter) = session(role);
            let id = session.next_creature_id(owner).unwrap();
            assert_eq!(id.creature_index, Some(1));
            assert!(session.materialize_summon(id, "Bones", 3));
            assert!(session.registry().contains(session.local_slot(id)));
            assert_eq!(presenter.mounted().len(), 4);
            // Re-applying is a no-op.
            assert!(session.materialize_summon(id, "Bones", 3));
            assert_eq!(session.registry().len(), 4);
        }
    }

    #[test]
    fn test_summon_index_mismatch() {
        let (mut session, _, _) = session(PeerRole::Guest);
        let skipped = EntityId::creature(AbsoluteSide::Host, Position::Left, 3);
        assert!(!session.materialize_summon(skipped, "Bones", 3));
    }

    #[test]
    fn test_end_battle_tears_down() {
        let (mut session, transport, presenter) = session(PeerRole::Host);
        session.end_battle(Some(AbsoluteSide::Host));
        session.end_battle(Some(AbsoluteSide::Host));
        assert!(session.registry().is_empty());
        assert!(presenter.mounted().is_empty());
        assert_eq!(session.final_vitals().len(), 3);
        assert_eq!(session.outcome(), Some(Some(AbsoluteSide::Host)));
        assert_eq!(transport.len(), 1);
        assert_eq!(session.combat_log().iter().last().unwrap().message, "The host side wins");
    }

    #[test]
    fn test_check_battle_end() {
        let (mut session, _, _) = session(PeerRole::Host);
        assert_eq!(session.check_battle_end(), None);
        session.authoritative_apply_damage(CARA, 100).unwrap();
        assert_eq!(session.check_battle_end(), Some(Some(AbsoluteSide::Host)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_broadcast_waits_grace() {
        let (mut session, transport, _) = session(PeerRole::Host);
        let actor = session.actor_ref(EntityId::hero(AbsoluteSide::Host, Position::Left)).unwrap();
        let message = ActionMessage::new(
            "test",
            actor,
            crate::sync::ComputedValues::Projectile {
                damage: 1,
                critical: false,
                travel_ms: 0,
                impact_ms: 0,
            },
        );
        let start = tokio::time::Instant::now();
        assert!(session.broadcast_action(message).await);
        assert_eq!(transport.len(), 1);
        assert!(start.elapsed() >= std::time::Duration::from_millis(40));
    }
}
