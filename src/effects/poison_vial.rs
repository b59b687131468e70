//! Poison vial: thrown at the enemy line, splashing a random subset.
//!
//! The host shuffles the living enemies and poisons the first few. The
//! shuffle result travels in the message as the target list; the guest
//! never reshuffles.

use async_trait::async_trait;
use futures::future::join_all;
use smallvec::SmallVec;
use tracing::{info, warn};

use super::{play_cue, Ability, ActionOutcome, TargetSelector, TargetSpec};
use crate::battle::BattleSession;
use crate::core::{EntityId, LocalSlot, Severity, SyncError};
use crate::presentation::{Presenter, VisualCue, VisualTracker};
use crate::sync::{ActionMessage, ComputedValues, Replay, ReplayReport, TargetRef};

pub const KIND: &str = "poison_vial_splash";

pub const POISON: &str = "poisoned";

pub const FLIGHT_MS: u64 = 350;
pub const SPLASH_MS: u64 = 200;

#[derive(Debug)]
pub struct PoisonVial {
    pub stacks: u32,
    pub targeting: TargetSpec,
    tracker: VisualTracker,
}

impl PoisonVial {
    pub fn new(stacks: u32, max_targets: usize) -> Self {
        Self {
            stacks,
            targeting: TargetSpec::enemies(max_targets),
            tracker: VisualTracker::new(),
        }
    }

    /// Vial flight to the first target, then a splash and aura on each.
    #[allow(clippy::too_many_arguments)]
    async fn play(
        session: &BattleSession,
        tracker: &VisualTracker,
        from: Option<LocalSlot>,
        targets: &[LocalSlot],
        effect: &str,
        stacks: u32,
        flight_ms: u64,
        splash_ms: u64,
    ) {
        if let (Some(from), Some(&to)) = (from, targets.first()) {
            let travel_ms = session.speed_adjusted_delay(flight_ms);
            let cue = VisualCue::Projectile { from, to, travel_ms };
            play_cue(session, tracker, cue, flight_ms).await;
        }
        let splashes = targets.iter().map(|&at| async move {
            join_all([
                play_cue(session, tracker, VisualCue::Splash { at }, splash_ms),
                play_cue(
                    session,
                    tracker,
                    VisualCue::StatusAura { at, effect: effect.to_string(), stacks },
                    splash_ms,
                ),
            ])
            .await;
        });
        join_all(splashes).await;
    }
}

impl Default for PoisonVial {
    fn default() -> Self {
        Self::new(2, 2)
    }
}

#[async_trait(?Send)]
impl Ability for PoisonVial {
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
        if candidates.is_empty() {
            info!(kind = KIND, %actor, "no targets");
            return Ok(ActionOutcome::NoTargets);
        }

        let chosen = selector.take_allowed(session.shuffle_array(&candidates)?);

        let mut targets: SmallVec<[TargetRef; 3]> = SmallVec::new();
        let mut log = Vec::with_capacity(chosen.len());
        for &target in &chosen {
            let total = session.authoritative_apply_status(target, POISON, self.stacks)?;
            let target_ref = session.target_ref(target).ok_or(SyncError::UnknownEntity(target))?;
            log.push(session.add_combat_log(
                format!("{} is poisoned ({} stacks)", target_ref.name, total),
                Severity::Warning,
            ));
            targets.push(target_ref);
        }

        let message = ActionMessage::new(
            KIND,
            actor_ref,
            ComputedValues::StatusSplash {
                effect: POISON.to_string(),
                stacks: self.stacks,
                targets,
                flight_ms: FLIGHT_MS,
                splash_ms: SPLASH_MS,
            },
        )
        .with_log(log);
        let sent = session.broadcast_action(message).await;

        let from = Some(session.local_slot(actor));
        let slots: Vec<LocalSlot> = chosen.iter().map(|id| session.local_slot(*id)).collect();
        Self::play(
            session,
            &self.tracker,
            from,
            &slots,
            POISON,
            self.stacks,
            FLIGHT_MS,
            SPLASH_MS,
        )
        .await;
        Ok(ActionOutcome::Completed { targets: slots.len(), sent })
    }

    async fn handle_guest(
        &mut self,
        session: &mut BattleSession,
        message: ActionMessage,
    ) -> ReplayReport {
        let mut replay = Replay::begin(&message.kind);
        let ComputedValues::StatusSplash { effect, stacks, targets, flight_ms, splash_ms } =
            &message.values
        else {
            warn!(kind = %message.kind, "unexpected values for status splash");
            return replay.abort(session.combat_log_mut(), &message.log);
        };

        let from = session
            .resolve(&mut replay, message.actor.entity_id())
            .map(|r| r.slot);
        let slots: Vec<LocalSlot> = targets
            .iter()
            .filter_map(|t| session.resolve_target(&mut replay, t).map(|r| r.slot))
            .collect();
        if slots.is_empty() {
            return replay.abort(session.combat_log_mut(), &message.log);
        }

        replay.animate();
        Self::play(
            session,
            &self.tracker,
            from,
            &slots,
            effect,
            *stacks,
            *flight_ms,
            *splash_ms,
        )
        .await;

        replay.emit_log(session.combat_log_mut(), &message.log);
        replay.finish()
    }

    fn cleanup(&mut self, presenter: &dyn Presenter) -> usize {
        self.tracker.cleanup(presenter)
    }
}
