//! Frame transports between peers.
//!
//! The core only needs "deliver this frame to the other peer, in order".
//! Real networking lives outside the crate; the implementations here cover
//! in-process play, the guest's send side, tests and fault injection.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace};

use super::codec::decode_envelope;
use super::message::Envelope;
use crate::core::SyncError;

/// Outbound half of a peer connection.
///
/// `send` must not block and must preserve order between calls.
pub trait Transport {
    fn send(&self, frame: Vec<u8>) -> Result<(), SyncError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, frame: Vec<u8>) -> Result<(), SyncError> {
        (**self).send(frame)
    }
}

impl<T: Transport + ?Sized> Transport for Rc<T> {
    fn send(&self, frame: Vec<u8>) -> Result<(), SyncError> {
        (**self).send(frame)
    }
}

/// Sending half of an in-process link.
#[derive(Clone, Debug)]
pub struct ChannelTransport {
    tx: UnboundedSender<Vec<u8>>,
}

impl Transport for ChannelTransport {
    fn send(&self, frame: Vec<u8>) -> Result<(), SyncError> {
        trace!(bytes = frame.len(), "channel send");
        self.tx
            .send(frame)
            .map_err(|_| SyncError::Transport("peer inbox closed".into()))
    }
}

/// Receiving half of an in-process link.
#[derive(Debug)]
pub struct Inbox {
    rx: UnboundedReceiver<Vec<u8>>,
}

impl Inbox {
    /// Wait for the next frame. `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }

    /// Take a frame if one is already queued.
    pub fn try_recv(&mut self) -> Option<Vec<u8>> {
        self.rx.try_recv().ok()
    }

    /// Stop accepting frames. Later sends fail.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

/// In-process, ordered, reliable link.
pub struct LocalLink;

impl LocalLink {
    /// Create a connected sender/inbox pair.
    #[must_use]
    pub fn pair() -> (ChannelTransport, Inbox) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelTransport { tx }, Inbox { rx })
    }
}

/// Accepts and discards every frame.
///
/// The guest never sends, but its session still needs a transport.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn send(&self, frame: Vec<u8>) -> Result<(), SyncError> {
        trace!(bytes = frame.len(), "null transport discarded frame");
        Ok(())
    }
}

/// Keeps every frame in memory.
///
/// Clones share the same buffer, so a test can hand one clone to a session
/// and inspect the other.
#[derive(Clone, Debug, Default)]
pub struct RecordingTransport {
    frames: Rc<RefCell<Vec<Vec<u8>>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.borrow().is_empty()
    }

    /// Copy of every frame sent so far.
    #[must_use]
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.borrow().clone()
    }

    /// Decode every recorded frame, skipping any that fail.
    #[must_use]
    pub fn envelopes(&self, version: u16) -> Vec<Envelope> {
        self.frames
            .borrow()
            .iter()
            .filter_map(|f| decode_envelope(f, version).ok())
            .collect()
    }
}

impl Transport for RecordingTransport {
    fn send(&self, frame: Vec<u8>) -> Result<(), SyncError> {
        self.frames.borrow_mut().push(frame);
        Ok(())
    }
}

/// Wraps another transport and silently drops selected frames.
///
/// Dropped frames report success, like a packet lost on the wire. Used to
/// demonstrate that a lost message is never resynchronized.
pub struct LossyTransport<T> {
    inner: T,
    should_drop: Box<dyn Fn(u64) -> bool>,
    sent: Cell<u64>,
    dropped: Cell<u64>,
}

impl<T: Transport> LossyTransport<T> {
    /// Drop every frame whose zero-based index satisfies `should_drop`.
    pub fn new(inner: T, should_drop: impl Fn(u64) -> bool + 'static) -> Self {
        Self {
            inner,
            should_drop: Box::new(should_drop),
            sent: Cell::new(0),
            dropped: Cell::new(0),
        }
    }

    /// Drop exactly the frames at the given indices.
    pub fn dropping(inner: T, indices: impl IntoIterator<Item = u64>) -> Self {
        let indices: Vec<u64> = indices.into_iter().collect();
        Self::new(inner, move |i| indices.contains(&i))
    }

    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.get()
    }
}

impl<T: Transport> Transport for LossyTransport<T> {
    fn send(&self, frame: Vec<u8>) -> Result<(), SyncError> {
        let index = self.sent.get();
        self.sent.set(index + 1);
        if (self.should_drop)(index) {
            self.dropped.set(self.dropped.get() + 1);
            debug!(index, "lossy transport dropped frame");
            return Ok(());
        }
        self.inner.send(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_link_preserves_order() {
        let (tx, mut inbox) = LocalLink::pair();
        for i in 0..4u8 {
            tx.send(vec![i]).unwrap();
        }
        let received: Vec<_> = std::iter::from_fn(|| inbox.try_recv()).collect();
        assert_eq!(received, vec![vec![0], vec![1], vec![2], vec![3]]);
    }

    #[test]
    fn test_closed_inbox_fails_send() {
        let (tx, mut inbox) = LocalLink::pair();
        inbox.close();
        assert!(matches!(tx.send(vec![1]), Err(SyncError::Transport(_))));
    }

    #[test]
    fn test_recording_shares_buffer() {
        let recorder = RecordingTransport::new();
        let boxed: Box<dyn Transport> = Box::new(recorder.clone());
        boxed.send(vec![7]).unwrap();
        assert_eq!(recorder.frames(), vec![vec![7]]);
    }

    #[test]
    fn test_lossy_drops_selected() {
        let recorder = RecordingTransport::new();
        let lossy = LossyTransport::dropping(recorder.clone(), [1]);
        for i in 0..3u8 {
            assert!(lossy.send(vec![i]).is_ok());
        }
        assert_eq!(recorder.frames(), vec![vec![0], vec![2]]);
        assert_eq!(lossy.dropped(), 1);
    }
}
