//! Necromancer: raises a temporary skeleton under its hero by spending one
//! corpse from the side's graveyard counter.
//!
//! The summoned creature is created on the guest from the action message
//! before any visual refers to it. Its HP is rolled on the host and carried
//! in the message.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{play_cue, Ability, ActionOutcome};
use crate::battle::BattleSession;
use crate::core::{EntityId, Severity, SyncError};
use crate::presentation::{Presenter, VisualCue, VisualTracker};
use crate::sync::{ActionMessage, ComputedValues, Replay, ReplayReport};

pub const KIND: &str = "necromancer_raise_skeleton";

/// Side counter consumed per summon.
pub const GRAVEYARD: &str = "graveyard";

pub const RISE_MS: u64 = 400;

#[derive(Debug)]
pub struct Necromancer {
    pub summon_name: String,
    pub min_hp: i64,
    pub max_hp: i64,
    tracker: VisualTracker,
}

impl Necromancer {
    pub fn new(summon_name: impl Into<String>, min_hp: i64, max_hp: i64) -> Self {
        Self {
            summon_name: summon_name.into(),
            min_hp,
            max_hp,
            tracker: VisualTracker::new(),
        }
    }
}

impl Default for Necromancer {
    fn default() -> Self {
        Self::new("Risen Skeleton", 3, 6)
    }
}

#[async_trait(?Send)]
impl Ability for Necromancer {
    fn kind(&self) -> &'static str {
        KIND
    }

    async fn execute_special_attack(
        &mut self,
        session: &mut BattleSession,
        actor: EntityId,
    ) -> Result<ActionOutcome, SyncError> {
        if !session.is_authoritative() {
            return Ok(ActionOutcome::NotAuthoritative);
        }
        let actor_ref = session.actor_ref(actor).ok_or(SyncError::UnknownEntity(actor))?;

        let owner = actor.owner();
        if session.counter(actor.side, GRAVEYARD, 0) <= 0 || !session.is_alive(owner) {
            info!(kind = KIND, %actor, "no targets");
            return Ok(ActionOutcome::NoTargets);
        }
        let Some(summoned) = session.next_creature_id(owner) else {
            info!(kind = KIND, %actor, "no room for summon");
            return Ok(ActionOutcome::NoTargets);
        };

        let hp = session.get_random_int(self.min_hp, self.max_hp)?;
        session.authoritative_modify_counter(actor.side, GRAVEYARD, -1)?;
        if !session.materialize_summon(summoned, &self.summon_name, hp) {
            return Err(SyncError::UnknownEntity(summoned));
        }
        let summoned_ref = session.target_ref(summoned).ok_or(SyncError::UnknownEntity(summoned))?;

        let line = session.add_combat_log(
            format!("{} raises a {} ({} HP)", actor_ref.name, summoned_ref.name, hp),
            Severity::Info,
        );
        let message = ActionMessage::new(
            KIND,
            actor_ref,
            ComputedValues::Summon {
                summoned: summoned_ref,
                max_hp: hp,
                rise_ms: RISE_MS,
            },
        )
        .with_log([line]);
        let sent = session.broadcast_action(message).await;

        let at = session.local_slot(summoned);
        play_cue(session, &self.tracker, VisualCue::Summon { at }, RISE_MS).await;
        Ok(ActionOutcome::Completed { targets: 1, sent })
    }

    async fn handle_guest(
        &mut self,
        session: &mut BattleSession,
        message: ActionMessage,
    ) -> ReplayReport {
        let mut replay = Replay::begin(&message.kind);
        let ComputedValues::Summon { summoned, max_hp, rise_ms } = &message.values else {
            warn!(kind = %message.kind, "unexpected values for summon");
            return replay.abort(session.combat_log_mut(), &message.log);
        };

        // State first: the creature must exist before anything resolves it.
        if let Some(id) = summoned.entity_id() {
            session.materialize_summon(id, &summoned.name, *max_hp);
        }

        // The rise plays at the summon's slot; a missing caster is only
        // recorded as a miss.
        if session.resolve(&mut replay, message.actor.entity_id()).is_none() {
            debug!(kind = %message.kind, caster = %message.actor.name, "summon without a caster");
        }
        let Some(raised) = session.resolve_target(&mut replay, summoned) else {
            return replay.abort(session.combat_log_mut(), &message.log);
        };

        replay.animate();
        play_cue(session, &self.tracker, VisualCue::Summon { at: raised.slot }, *rise_ms).await;

        replay.emit_log(session.combat_log_mut(), &message.log);
        replay.finish()
    }

    fn cleanup(&mut self, presenter: &dyn Presenter) -> usize {
        self.tracker.cleanup(presenter)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::core::{AbsoluteSide, BattleConfig, FormationSpec, LocalSide, Position};
    use crate::presentation::RecordingPresenter;
    use crate::sync::{PeerRole, RecordingTransport};

    const NECRO: EntityId = EntityId::hero(AbsoluteSide::Host, Position::Left);

    fn host() -> (BattleSession, RecordingTransport) {
        let host = FormationSpec::new().hero(Position::Left, "Mort", 20);
        let guest = FormationSpec::new().hero(Position::Center, "Cara", 20);
        let transport = RecordingTransport::new();
        let session = BattleSession::new(
            PeerRole::Host,
            BattleConfig::default(),
            &host,
            &guest,
            transport.clone(),
            Rc::new(RecordingPresenter::new()),
        );
        (session, transport)
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_graveyard() {
        let (mut session, transport) = host();
        let outcome = Necromancer::default()
            .execute_special_attack(&mut session, NECRO)
            .await
            .unwrap();
        assert_eq!(outcome, ActionOutcome::NoTargets);
        assert!(transport.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_raises_and_consumes_corpse() {
        let (mut session, transport) = host();
        session.authoritative_set_counter(AbsoluteSide::Host, GRAVEYARD, 2).unwrap();

        let mut necro = Necromancer::new("Bones", 4, 4);
        let outcome = necro.execute_special_attack(&mut session, NECRO).await.unwrap();
        assert_eq!(outcome, ActionOutcome::Completed { targets: 1, sent: true });

        let hero = session.state().hero(LocalSide::Player, Position::Left).unwrap();
        assert_eq!(hero.creatures.len(), 1);
        assert!(hero.creatures[0].temporary);
        assert_eq!(hero.creatures[0].vitals.max_hp, 4);
        assert_eq!(session.counter(AbsoluteSide::Host, GRAVEYARD, 0), 1);
        // Set counter, modify counter, action.
        assert_eq!(transport.len(), 3);
    }
}
