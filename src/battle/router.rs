//! Inbound frame dispatch.
//!
//! Every frame the guest receives goes through [`MessageRouter::dispatch`]:
//! decode and version check, sequence check (duplicates are dropped), then
//! either replay through the matching ability or apply as a state sync. Failures are logged and
//! reported in the returned [`Dispatch`]; nothing here aborts the loop that
//! feeds it.

use tracing::{debug, trace, warn};

use super::session::BattleSession;
use crate::effects::AbilityBook;
use crate::sync::{
    decode_envelope, Payload, ReplayReport, SequenceCheck, SequenceTracker, StateSync,
};

/// What happened to one inbound frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// An action was replayed.
    Replayed(ReplayReport),
    /// A state sync was applied (or found nothing to apply to).
    Synced { kind: &'static str, applied: bool },
    /// The host ended the battle.
    Ended,
    /// The frame was dropped.
    Rejected(String),
}

/// Decodes and routes inbound frames for one peer.
#[derive(Clone, Debug, Default)]
pub struct MessageRouter {
    sequence: SequenceTracker,
    dispatched: u64,
    rejected: u64,
}

impl MessageRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames successfully dispatched.
    #[must_use]
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Frames dropped as undecodable, stale, wrong version or unknown kind.
    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    #[must_use]
    pub fn sequence(&self) -> &SequenceTracker {
        &self.sequence
    }

    fn reject(&mut self, reason: String) -> Dispatch {
        warn!(%reason, "dropping inbound frame");
        self.rejected += 1;
        Dispatch::Rejected(reason)
    }

    /// Handle one frame.
    pub async fn dispatch(
        &mut self,
        session: &mut BattleSession,
        book: &mut AbilityBook,
        frame: &[u8],
    ) -> Dispatch {
        if session.is_ended() {
            return self.reject("battle already ended".into());
        }
        let envelope = match decode_envelope(frame, session.config().protocol_version) {
            Ok(envelope) => envelope,
            Err(err) => return self.reject(err.to_string()),
        };

        match self.sequence.observe(envelope.seq) {
            SequenceCheck::InOrder => {}
            SequenceCheck::Gap { missing } => {
                warn!(seq = envelope.seq, missing, "sequence gap; missed updates are lost");
            }
            SequenceCheck::Stale => {
                let reason = format!(
                    "stale or duplicate frame {} (expected {})",
                    envelope.seq,
                    self.sequence.next_expected()
                );
                return self.reject(reason);
            }
        }
        debug!(seq = envelope.seq, kind = %envelope.kind, "dispatching");
        trace!(envelope = %envelope.to_debug_json(), "inbound envelope");

        let outcome = match envelope.payload {
            Payload::Action(message) => {
                let Some(ability) = book.get_mut(&message.kind) else {
                    let reason = format!("no handler registered for kind `{}`", message.kind);
                    return self.reject(reason);
                };
                Dispatch::Replayed(ability.handle_guest(session, message).await)
            }
            Payload::Sync(StateSync::BattleEnd { winner }) => {
                let removed = book.cleanup_all(session.presenter());
                debug!(removed, "cleaned up abilities at battle end");
                session.end_battle(winner);
                Dispatch::Ended
            }
            Payload::Sync(sync) => {
                let applied = session.apply_state_sync(&sync);
                Dispatch::Synced { kind: sync.kind(), applied }
            }
        };
        self.dispatched += 1;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::core::{AbsoluteSide, BattleConfig, EntityId, FormationSpec, Position};
    use crate::presentation::RecordingPresenter;
    use crate::sync::{encode_envelope, Envelope, NullTransport, PeerRole, PROTOCOL_VERSION};

    fn guest() -> BattleSession {
        let host = FormationSpec::new().hero(Position::Left, "Alice", 20);
        let guest = FormationSpec::new().hero(Position::Center, "Cara", 20);
        BattleSession::new(
            PeerRole::Guest,
            BattleConfig::default(),
            &host,
            &guest,
            NullTransport,
            Rc::new(RecordingPresenter::new()),
        )
    }

    fn frame(seq: u64, sync: StateSync) -> Vec<u8> {
        encode_envelope(&Envelope::new(PROTOCOL_VERSION, seq, Payload::Sync(sync))).unwrap()
    }

    #[tokio::test]
    async fn test_routes_sync() {
        let mut session = guest();
        let mut book = AbilityBook::with_defaults();
        let mut router = MessageRouter::new();
        let alice = EntityId::hero(AbsoluteSide::Host, Position::Left);

        let out = router
            .dispatch(
                &mut session,
                &mut book,
                &frame(0, StateSync::Health { target: alice, hp: 5, max_hp: 20, alive: true }),
            )
            .await;
        assert_eq!(out, Dispatch::Synced { kind: "state_health", applied: true });
        assert_eq!(router.dispatched(), 1);
    }

    #[tokio::test]
    async fn test_garbage_is_rejected_not_fatal() {
        let mut session = guest();
        let mut book = AbilityBook::with_defaults();
        let mut router = MessageRouter::new();
        assert!(matches!(
            router.dispatch(&mut session, &mut book, &[1, 2, 3]).await,
            Dispatch::Rejected(_)
        ));
        assert_eq!(router.rejected(), 1);
    }

    #[tokio::test]
    async fn test_battle_end() {
        let mut session = guest();
        let mut book = AbilityBook::with_defaults();
        let mut router = MessageRouter::new();
        let out = router
            .dispatch(&mut session, &mut book, &frame(0, StateSync::BattleEnd { winner: None }))
            .await;
        assert_eq!(out, Dispatch::Ended);
        assert!(session.is_ended());
        assert!(session.registry().is_empty());

        // Nothing is dispatched after the end.
        assert!(matches!(
            router
                .dispatch(&mut session, &mut book, &frame(1, StateSync::BattleEnd { winner: None }))
                .await,
            Dispatch::Rejected(_)
        ));
    }

    #[tokio::test]
    async fn test_gap_is_tolerated() {
        let mut session = guest();
        let mut book = AbilityBook::with_defaults();
        let mut router = MessageRouter::new();
        let sync = StateSync::Counter {
            side: AbsoluteSide::Host,
            key: "graveyard".into(),
            value: 1,
        };
        router.dispatch(&mut session, &mut book, &frame(0, sync.clone())).await;
        let out = router.dispatch(&mut session, &mut book, &frame(4, sync)).await;
        assert!(matches!(out, Dispatch::Synced { applied: true, .. }));
        assert_eq!(router.sequence().missing_total(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_frame_is_dropped() {
        let mut session = guest();
        let mut book = AbilityBook::with_defaults();
        let mut router = MessageRouter::new();
        let alice = EntityId::hero(AbsoluteSide::Host, Position::Left);

        let first = frame(0, StateSync::Health { target: alice, hp: 12, max_hp: 20, alive: true });
        router.dispatch(&mut session, &mut book, &first).await;
        // A late frame carrying an older value must not roll state back.
        let late = frame(0, StateSync::Health { target: alice, hp: 20, max_hp: 20, alive: true });
        let out = router.dispatch(&mut session, &mut book, &late).await;

        assert!(matches!(out, Dispatch::Rejected(_)));
        assert_eq!(router.dispatched(), 1);
        assert_eq!(router.rejected(), 1);
        assert_eq!(router.sequence().stale_total(), 1);
        assert_eq!(session.state().vitals(session.local_slot(alice)).unwrap().hp, 12);
    }
}
