//! Skeleton archer: one arrow at a random living enemy.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{play_cue, Ability, ActionOutcome, TargetSelector, TargetSpec};
use crate::battle::BattleSession;
use crate::core::{EntityId, Severity, SyncError};
use crate::presentation::{Presenter, VisualCue, VisualTracker};
use crate::sync::{ActionMessage, ComputedValues, Replay, ReplayReport};

pub const KIND: &str = "skeleton_archer_projectile_attack";

/// Nominal arrow flight time.
pub const TRAVEL_MS: u64 = 300;
/// Nominal impact flash time.
pub const IMPACT_MS: u64 = 150;

#[derive(Debug)]
pub struct SkeletonArcher {
    pub damage: i64,
    /// Percent chance to deal double damage.
    pub crit_chance: u32,
    tracker: VisualTracker,
}

impl SkeletonArcher {
    pub fn new(damage: i64, crit_chance: u32) -> Self {
        Self {
            damage,
            crit_chance,
            tracker: VisualTracker::new(),
        }
    }
}

impl Default for SkeletonArcher {
    fn default() -> Self {
        Self::new(4, 20)
    }
}

#[async_trait(?Send)]
impl Ability for SkeletonArcher {
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

        let candidates = TargetSelector::new(TargetSpec::single_enemy(), actor)
            .valid_targets(session.state(), session.is_host());
        if candidates.is_empty() {
            info!(kind = KIND, %actor, "no targets");
            return Ok(ActionOutcome::NoTargets);
        }

        let pick = session.get_random_int(0, candidates.len() as i64 - 1)?;
        let target = candidates[pick as usize];
        let critical = session.roll_percent(self.crit_chance)?;
        let damage = if critical { self.damage * 2 } else { self.damage };
        let target_ref = session.target_ref(target).ok_or(SyncError::UnknownEntity(target))?;

        let (shooter, victim) = (&actor_ref.name, &target_ref.name);
        let line = if critical {
            session.add_combat_log(
                format!("{} lands a critical shot on {} for {} damage!", shooter, victim, damage),
                Severity::Success,
            )
        } else {
            session.add_combat_log(
                format!("{} shoots {} for {} damage", shooter, victim, damage),
                Severity::Info,
            )
        };

        let message = ActionMessage::new(
            KIND,
            actor_ref,
            ComputedValues::Projectile {
                damage,
                critical,
                travel_ms: TRAVEL_MS,
                impact_ms: IMPACT_MS,
            },
        )
        .with_target(target_ref)
        .with_log([line]);
        let sent = session.broadcast_action(message).await;

        // Committed before any visual so an interrupted shot still lands.
        let change = session.authoritative_apply_damage(target, damage)?;
        debug!(kind = KIND, %target, hp = change.hp, killed = change.killed, "arrow damage");

        let from = session.local_slot(actor);
        let to = session.local_slot(target);
        let travel_ms = session.speed_adjusted_delay(TRAVEL_MS);
        let arrow = VisualCue::Projectile { from, to, travel_ms };
        play_cue(session, &self.tracker, arrow, TRAVEL_MS).await;
        let impact = VisualCue::Impact { at: to, amount: damage, critical };
        play_cue(session, &self.tracker, impact, IMPACT_MS).await;

        Ok(ActionOutcome::Completed { targets: 1, sent })
    }

    async fn handle_guest(
        &mut self,
        session: &mut BattleSession,
        message: ActionMessage,
    ) -> ReplayReport {
        let mut replay = Replay::begin(&message.kind);
        let ComputedValues::Projectile { damage, critical, travel_ms, impact_ms } = message.values
        else {
            warn!(kind = %message.kind, "unexpected values for projectile attack");
            return replay.abort(session.combat_log_mut(), &message.log);
        };

        let actor = session.resolve(&mut replay, message.actor.entity_id());
        let target = match &message.target {
            Some(target) => session.resolve_target(&mut replay, target),
            None => None,
        };
        let (Some(actor), Some(target)) = (actor, target) else {
            return replay.abort(session.combat_log_mut(), &message.log);
        };

        replay.animate();
        let travel = session.speed_adjusted_delay(travel_ms);
        play_cue(
            session,
            &self.tracker,
            VisualCue::Projectile { from: actor.slot, to: target.slot, travel_ms: travel },
            travel_ms,
        )
        .await;
        play_cue(
            session,
            &self.tracker,
            VisualCue::Impact { at: target.slot, amount: damage, critical },
            impact_ms,
        )
        .await;

        replay.emit_log(session.combat_log_mut(), &message.log);
        replay.finish()
    }

    fn cleanup(&mut self, presenter: &dyn Presenter) -> usize {
        self.tracker.cleanup(presenter)
    }
}
