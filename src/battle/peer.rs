//! A peer: session, abilities and inbound router bundled together.

use std::rc::Rc;

use tracing::{debug, warn};

use super::router::{Dispatch, MessageRouter};
use super::session::BattleSession;
use crate::core::{AbsoluteSide, BattleConfig, EntityId, FormationSpec, SyncError};
use crate::effects::{AbilityBook, ActionOutcome};
use crate::presentation::Presenter;
use crate::sync::{Inbox, NullTransport, PeerRole, Transport};

/// One side of a two-peer battle.
pub struct Peer {
    session: BattleSession,
    book: AbilityBook,
    router: MessageRouter,
    inbox: Option<Inbox>,
}

impl Peer {
    /// The authoritative peer. Sends through `transport`.
    pub fn host(
        config: BattleConfig,
        host: &FormationSpec,
        guest: &FormationSpec,
        transport: impl Transport + 'static,
        presenter: Rc<dyn Presenter>,
    ) -> Self {
        Self {
            session: BattleSession::new(PeerRole::Host, config, host, guest, transport, presenter),
            book: AbilityBook::with_defaults(),
            router: MessageRouter::new(),
            inbox: None,
        }
    }

    /// The replaying peer. Receives from `inbox`.
    pub fn guest(
        config: BattleConfig,
        host: &FormationSpec,
        guest: &FormationSpec,
        inbox: Inbox,
        presenter: Rc<dyn Presenter>,
    ) -> Self {
        Self {
            session: BattleSession::new(
                PeerRole::Guest,
                config,
                host,
                guest,
                NullTransport,
                presenter,
            ),
            book: AbilityBook::with_defaults(),
            router: MessageRouter::new(),
            inbox: Some(inbox),
        }
    }

    /// Replace the ability book (builder pattern).
    #[must_use]
    pub fn with_book(mut self, book: AbilityBook) -> Self {
        self.book = book;
        self
    }

    #[must_use]
    pub fn session(&self) -> &BattleSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut BattleSession {
        &mut self.session
    }

    #[must_use]
    pub fn router(&self) -> &MessageRouter {
        &self.router
    }

    pub fn book_mut(&mut self) -> &mut AbilityBook {
        &mut self.book
    }

    /// Activate an ability by kind for `actor`.
    pub async fn act(&mut self, kind: &str, actor: EntityId) -> Result<ActionOutcome, SyncError> {
        let ability = self
            .book
            .get_mut(kind)
            .ok_or_else(|| SyncError::UnknownKind(kind.to_string()))?;
        ability.execute_special_attack(&mut self.session, actor).await
    }

    /// Handle one frame directly, bypassing the inbox.
    pub async fn receive(&mut self, frame: &[u8]) -> Dispatch {
        self.router.dispatch(&mut self.session, &mut self.book, frame).await
    }

    /// Dispatch every frame already queued. Returns how many were handled.
    pub async fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Some(frame) = self.inbox.as_mut().and_then(Inbox::try_recv) {
            self.router.dispatch(&mut self.session, &mut self.book, &frame).await;
            handled += 1;
        }
        handled
    }

    /// Dispatch frames until the battle ends or every sender is gone.
    pub async fn run(&mut self) -> usize {
        let Some(mut inbox) = self.inbox.take() else {
            warn!("run called on a peer without an inbox");
            return 0;
        };
        let mut handled = 0;
        while let Some(frame) = inbox.recv().await {
            let dispatch = self.router.dispatch(&mut self.session, &mut self.book, &frame).await;
            handled += 1;
            if dispatch == Dispatch::Ended {
                break;
            }
        }
        debug!(handled, "inbox loop finished");
        self.inbox = Some(inbox);
        handled
    }

    /// Remove lingering visuals from every ability.
    pub fn cleanup(&mut self) -> usize {
        self.book.cleanup_all(self.session.presenter())
    }

    /// Clean up abilities and end the battle.
    pub fn end_battle(&mut self, winner: Option<AbsoluteSide>) {
        self.cleanup();
        self.session.end_battle(winner);
    }
}
