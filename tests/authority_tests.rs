//! Authority, send ordering and cleanup tests.
//!
//! These drive a single session directly: the guest must never compute or
//! send, the host must send before it animates, and an interrupted ability
//! must leave nothing on screen once cleaned up.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tokio::time::Instant;

use battle_sync::effects::skeleton_archer;
use battle_sync::{
    Ability, AbilityBook, AbsoluteSide, ActionOutcome, BattleConfig, BattleSession, Dispatch,
    EntityId, FormationSpec, LocalLink, Peer, PeerRole, Position, RecordingPresenter,
    RecordingTransport, SkeletonArcher, SyncError, Transport, PROTOCOL_VERSION,
};

fn host_formation() -> FormationSpec {
    FormationSpec::new()
        .hero(Position::Left, "Alice", 20)
        .creature("Skeleton Archer", 5)
        .hero(Position::Center, "Bea", 18)
}

fn guest_formation() -> FormationSpec {
    FormationSpec::new().hero(Position::Right, "Dan", 30)
}

const ARCHER: EntityId = EntityId::creature(AbsoluteSide::Host, Position::Left, 0);
const ALICE: EntityId = EntityId::hero(AbsoluteSide::Host, Position::Left);
const DAN: EntityId = EntityId::hero(AbsoluteSide::Guest, Position::Right);

fn session(
    role: PeerRole,
    config: BattleConfig,
    transport: impl Transport + 'static,
) -> (BattleSession, Rc<RecordingPresenter>) {
    let view = Rc::new(RecordingPresenter::new());
    let session = BattleSession::new(
        role,
        config,
        &host_formation(),
        &guest_formation(),
        transport,
        view.clone(),
    );
    (session, view)
}

/// Transport that records when each frame was handed over.
#[derive(Clone, Default)]
struct TimedTransport {
    sent: Rc<RefCell<Vec<Instant>>>,
}

impl Transport for TimedTransport {
    fn send(&self, _frame: Vec<u8>) -> Result<(), SyncError> {
        self.sent.borrow_mut().push(Instant::now());
        Ok(())
    }
}

// =============================================================================
// Guest Is Not Authoritative
// =============================================================================

/// Test that no ability does anything when invoked on the guest.
#[tokio::test(start_paused = true)]
async fn test_guest_abilities_are_no_ops() {
    let transport = RecordingTransport::new();
    let (mut guest, view) = session(PeerRole::Guest, BattleConfig::default(), transport.clone());
    let before = guest.state().vitals_snapshot(false);

    let mut book = AbilityBook::with_defaults();
    for kind in book.kinds() {
        let ability = book.get_mut(kind).unwrap();
        let outcome = ability.execute_special_attack(&mut guest, ALICE).await.unwrap();
        assert_eq!(outcome, ActionOutcome::NotAuthoritative, "{}", kind);
    }

    assert!(transport.is_empty());
    assert!(view.shown().is_empty());
    assert!(guest.combat_log().is_empty());
    assert_eq!(guest.state().vitals_snapshot(false), before);
}

/// Test that every authoritative entry point refuses on the guest.
#[test]
fn test_guest_mutators_refuse() {
    let transport = RecordingTransport::new();
    let (mut guest, _) = session(PeerRole::Guest, BattleConfig::default(), transport.clone());

    assert!(matches!(guest.get_random_int(1, 6), Err(SyncError::NotAuthoritative)));
    assert!(matches!(guest.get_random_percent(), Err(SyncError::NotAuthoritative)));
    assert!(matches!(guest.roll_percent(50), Err(SyncError::NotAuthoritative)));
    assert!(matches!(guest.shuffle_array(&[1, 2, 3]), Err(SyncError::NotAuthoritative)));
    assert!(matches!(guest.authoritative_apply_damage(DAN, 5), Err(SyncError::NotAuthoritative)));
    assert!(matches!(guest.authoritative_apply_heal(ALICE, 5), Err(SyncError::NotAuthoritative)));
    assert!(matches!(
        guest.authoritative_apply_status(DAN, "poisoned", 2),
        Err(SyncError::NotAuthoritative)
    ));
    assert!(matches!(
        guest.authoritative_set_counter(AbsoluteSide::Guest, "graveyard", 3),
        Err(SyncError::NotAuthoritative)
    ));

    assert!(transport.is_empty());
    assert_eq!(guest.state().vitals(guest.local_slot(DAN)).unwrap().hp, 30);
    assert_eq!(guest.counter(AbsoluteSide::Guest, "graveyard", 0), 0);
}

// =============================================================================
// Send Before Animate
// =============================================================================

/// Test that the action frame leaves before the first host visual, and the
/// visual waits at least the grace period.
#[tokio::test(start_paused = true)]
async fn test_send_precedes_first_visual() {
    let transport = TimedTransport::default();
    let (mut host, view) = session(PeerRole::Host, BattleConfig::default(), transport.clone());

    SkeletonArcher::new(4, 0)
        .execute_special_attack(&mut host, ARCHER)
        .await
        .unwrap();

    let sent = transport.sent.borrow();
    let first_show = view.first_show_at().unwrap();
    let gap = first_show - sent[0];
    assert!(gap >= Duration::from_millis(40), "gap was {:?}", gap);
    assert!(gap < Duration::from_millis(45), "gap was {:?}", gap);
    // The damage sync is out before the arrow is drawn.
    assert_eq!(sent.len(), 2);
    assert!(sent[1] <= first_show);
}

/// Test that the grace period is not scaled by animation speed.
#[tokio::test(start_paused = true)]
async fn test_grace_ignores_speed() {
    let transport = TimedTransport::default();
    let config = BattleConfig::default().with_speed(10.0);
    let (mut host, view) = session(PeerRole::Host, config, transport.clone());

    SkeletonArcher::new(4, 0)
        .execute_special_attack(&mut host, ARCHER)
        .await
        .unwrap();

    let gap = view.first_show_at().unwrap() - transport.sent.borrow()[0];
    assert!(gap >= Duration::from_millis(40), "gap was {:?}", gap);
}

/// Test that the action frame precedes the health sync it causes, and that
/// both leave before any visual plays.
#[tokio::test(start_paused = true)]
async fn test_action_frame_precedes_its_sync() {
    let transport = RecordingTransport::new();
    let (mut host, _) = session(PeerRole::Host, BattleConfig::default(), transport.clone());

    SkeletonArcher::new(4, 0)
        .execute_special_attack(&mut host, ARCHER)
        .await
        .unwrap();

    let kinds: Vec<String> = transport
        .envelopes(PROTOCOL_VERSION)
        .into_iter()
        .map(|e| e.kind)
        .collect();
    assert_eq!(kinds, vec![skeleton_archer::KIND.to_string(), "state_health".to_string()]);
    let seqs: Vec<u64> = transport
        .envelopes(PROTOCOL_VERSION)
        .into_iter()
        .map(|e| e.seq)
        .collect();
    assert_eq!(seqs, vec![0, 1]);
    assert_eq!(host.state().vitals(host.local_slot(DAN)).unwrap().hp, 26);
}

/// Test that a failed send is logged and the host still animates locally.
#[tokio::test(start_paused = true)]
async fn test_send_failure_keeps_local_animation() {
    let (transport, mut inbox) = LocalLink::pair();
    inbox.close();
    let (mut host, view) = session(PeerRole::Host, BattleConfig::default(), transport);

    let outcome = SkeletonArcher::new(4, 0)
        .execute_special_attack(&mut host, ARCHER)
        .await
        .unwrap();

    assert_eq!(outcome, ActionOutcome::Completed { targets: 1, sent: false });
    assert_eq!(view.shown().len(), 2);
    assert_eq!(host.state().vitals(host.local_slot(DAN)).unwrap().hp, 26);
}

// =============================================================================
// Cleanup
// =============================================================================

/// Test that an ability interrupted mid-flight keeps its state change and
/// sync, leaves its visual tracked, and that cleanup removes it exactly once.
#[tokio::test(start_paused = true)]
async fn test_cleanup_after_interrupted_host_ability() {
    let transport = RecordingTransport::new();
    let (mut host, view) = session(PeerRole::Host, BattleConfig::default(), transport.clone());
    let mut archer = SkeletonArcher::new(4, 0);

    // Grace (40) has passed, the arrow (300) has not landed.
    let interrupted = tokio::time::timeout(
        Duration::from_millis(100),
        archer.execute_special_attack(&mut host, ARCHER),
    )
    .await;
    assert!(interrupted.is_err());
    assert_eq!(view.live_visuals().len(), 1);

    // Log, HP and sync agree even though the arrow never landed.
    assert_eq!(host.combat_log().len(), 1);
    assert_eq!(host.state().vitals(host.local_slot(DAN)).unwrap().hp, 26);
    let kinds: Vec<String> = transport
        .envelopes(PROTOCOL_VERSION)
        .into_iter()
        .map(|e| e.kind)
        .collect();
    assert_eq!(kinds, vec![skeleton_archer::KIND.to_string(), "state_health".to_string()]);

    assert_eq!(archer.cleanup(host.presenter()), 1);
    assert_eq!(archer.cleanup(host.presenter()), 0);
    assert!(view.live_visuals().is_empty());
}

/// Test the same on the guest side, through a peer's cleanup.
#[tokio::test(start_paused = true)]
async fn test_cleanup_after_interrupted_replay() {
    // Record a real shot on a host first.
    let transport = RecordingTransport::new();
    let (mut host, _) = session(PeerRole::Host, BattleConfig::default(), transport.clone());
    SkeletonArcher::new(4, 0)
        .execute_special_attack(&mut host, ARCHER)
        .await
        .unwrap();
    let action = transport.frames()[0].clone();

    let (_tx, inbox) = LocalLink::pair();
    let view = Rc::new(RecordingPresenter::new());
    let mut guest = Peer::guest(
        BattleConfig::default(),
        &host_formation(),
        &guest_formation(),
        inbox,
        view.clone(),
    );

    let interrupted =
        tokio::time::timeout(Duration::from_millis(100), guest.receive(&action)).await;
    assert!(interrupted.is_err());
    assert_eq!(view.live_visuals().len(), 1);

    assert_eq!(guest.cleanup(), 1);
    assert_eq!(guest.cleanup(), 0);
    assert!(view.live_visuals().is_empty());
}

/// Test that ending twice is harmless and frames after the end are dropped.
#[tokio::test(start_paused = true)]
async fn test_end_is_idempotent() {
    let transport = RecordingTransport::new();
    let (mut host, view) = session(PeerRole::Host, BattleConfig::default(), transport.clone());

    host.end_battle(Some(AbsoluteSide::Host));
    host.end_battle(None);

    assert_eq!(transport.len(), 1);
    assert_eq!(host.outcome(), Some(Some(AbsoluteSide::Host)));
    assert_eq!(host.combat_log().len(), 1);
    assert!(view.mounted().is_empty());

    let (_tx, inbox) = LocalLink::pair();
    let mut guest = Peer::guest(
        BattleConfig::default(),
        &host_formation(),
        &guest_formation(),
        inbox,
        Rc::new(RecordingPresenter::new()),
    );
    let end = transport.frames()[0].clone();
    assert_eq!(guest.receive(&end).await, Dispatch::Ended);
    assert!(matches!(guest.receive(&end).await, Dispatch::Rejected(_)));
    assert_eq!(guest.session().outcome(), Some(Some(AbsoluteSide::Host)));
}
