//! Mending chorus: staggered heals on several damaged allies.
//!
//! Amounts are rolled per target on the host. Heals are applied before the
//! action is broadcast, so the guest's health syncs arrive ahead of the
//! replay. Glows play concurrently, each delayed by its stagger offset, and
//! the ability finishes when the last one clears.

use async_trait::async_trait;
use futures::future::join_all;
use smallvec::SmallVec;
use tracing::{debug, info, warn};

use super::{play_cue, Ability, ActionOutcome, TargetSelector, TargetSpec};
use crate::battle::BattleSession;
use crate::core::{EntityId, LocalSlot, Severity, SyncError};
use crate::presentation::{Presenter, VisualCue, VisualTracker};
use crate::sync::{ActionMessage, ComputedValues, HealEntry, Replay, ReplayReport};

pub const KIND: &str = "mending_chorus_heal";

pub const STAGGER_MS: u64 = 120;
pub const GLOW_MS: u64 = 250;

#[derive(Debug)]
pub struct MendingChorus {
    pub min_heal: i64,
    pub max_heal: i64,
    pub targeting: TargetSpec,
    tracker: VisualTracker,
}

impl MendingChorus {
    pub fn new(min_heal: i64, max_heal: i64, max_targets: usize) -> Self {
        Self {
            min_heal,
            max_heal,
            targeting: TargetSpec::damaged_allies(max_targets),
            tracker: VisualTracker::new(),
        }
    }

    /// Play one glow per slot, `stagger_ms` apart, and wait for all.
    async fn play_glows(
        session: &BattleSession,
        tracker: &VisualTracker,
        glows: &[(LocalSlot, i64)],
        stagger_ms: u64,
        glow_ms: u64,
    ) {
        let futures = glows.iter().enumerate().map(|(i, &(at, amount))| async move {
            session.animation_delay(stagger_ms * i as u64).await;
            play_cue(session, tracker, VisualCue::HealGlow { at, amount }, glow_ms).await;
        });
        join_all(futures).await;
    }
}

impl Default for MendingChorus {
    fn default() -> Self {
        Self::new(2, 5, 3)
    }
}

#[async_trait(?Send)]
impl Ability for MendingChorus {
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

        let selector = TargetSelector::new(self.targeting.clone(), actor);
        let candidates = selector.valid_targets(session.state(), session.is_host());
        let targets = selector.take_allowed(candidates);
        if targets.is_empty() {
            info!(kind = KIND, %actor, "no targets");
            return Ok(ActionOutcome::NoTargets);
        }

        let mut heals: SmallVec<[HealEntry; 3]> = SmallVec::new();
        let mut log = Vec::with_capacity(targets.len());
        for &target in &targets {
            let rolled = session.get_random_int(self.min_heal, self.max_heal)?;
            let change = session.authoritative_apply_heal(target, rolled)?;
            let target_ref = session.target_ref(target).ok_or(SyncError::UnknownEntity(target))?;
            log.push(session.add_combat_log(
                format!("{} mends {} for {} HP", actor_ref.name, target_ref.name, change.delta()),
                Severity::Success,
            ));
            heals.push(HealEntry {
                target: target_ref,
                amount: change.delta(),
            });
        }

        let glows: Vec<(LocalSlot, i64)> = targets
            .iter()
            .zip(&heals)
            .map(|(id, heal)| (session.local_slot(*id), heal.amount))
            .collect();

        let message = ActionMessage::new(
            KIND,
            actor_ref,
            ComputedValues::StaggeredHeal {
                heals,
                stagger_ms: STAGGER_MS,
                glow_ms: GLOW_MS,
            },
        )
        .with_log(log);
        let sent = session.broadcast_action(message).await;

        Self::play_glows(session, &self.tracker, &glows, STAGGER_MS, GLOW_MS).await;
        Ok(ActionOutcome::Completed { targets: glows.len(), sent })
    }

    async fn handle_guest(
        &mut self,
        session: &mut BattleSession,
        message: ActionMessage,
    ) -> ReplayReport {
        let mut replay = Replay::begin(&message.kind);
        let ComputedValues::StaggeredHeal { heals, stagger_ms, glow_ms } = &message.values else {
            warn!(kind = %message.kind, "unexpected values for staggered heal");
            return replay.abort(session.combat_log_mut(), &message.log);
        };

        // Glows anchor on the targets. A missing caster still counts as a
        // miss in the report.
        if session.resolve(&mut replay, message.actor.entity_id()).is_none() {
            debug!(kind = %message.kind, caster = %message.actor.name, "glows without a caster");
        }
        let glows: Vec<(LocalSlot, i64)> = heals
            .iter()
            .filter_map(|heal| {
                session
                    .resolve_target(&mut replay, &heal.target)
                    .map(|r| (r.slot, heal.amount))
            })
            .collect();
        if glows.is_empty() {
            return replay.abort(session.combat_log_mut(), &message.log);
        }

        replay.animate();
        Self::play_glows(session, &self.tracker, &glows, *stagger_ms, *glow_ms).await;

        replay.emit_log(session.combat_log_mut(), &message.log);
        replay.finish()
    }

    fn cleanup(&mut self, presenter: &dyn Presenter) -> usize {
        self.tracker.cleanup(presenter)
    }
}
