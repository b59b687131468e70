//! Envelope encoding and decoding.
//!
//! Frames are bincode-serialized `Envelope`s. The transport preserves
//! message boundaries, so there is no length prefix. Decoding rejects
//! envelopes from a different protocol version.

use tracing::trace;

use super::message::Envelope;
use crate::core::SyncError;

/// Encode an envelope into a frame.
pub fn encode_envelope(envelope: &Envelope) -> Result<Vec<u8>, SyncError> {
    let frame = bincode::serialize(envelope).map_err(SyncError::Encode)?;
    trace!(seq = envelope.seq, kind = %envelope.kind, bytes = frame.len(), "encoded envelope");
    Ok(frame)
}

/// Decode a frame, requiring `expected_version`.
pub fn decode_envelope(frame: &[u8], expected_version: u16) -> Result<Envelope, SyncError> {
    let envelope: Envelope = bincode::deserialize(frame).map_err(SyncError::Decode)?;
    if envelope.version != expected_version {
        return Err(SyncError::VersionMismatch {
            expected: expected_version,
            actual: envelope.version,
        });
    }
    trace!(seq = envelope.seq, kind = %envelope.kind, "decoded envelope");
    Ok(envelope)
}

impl Envelope {
    /// Pretty JSON for debug dumps.
    pub fn to_debug_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("<unprintable: {}>", e))
    }
}

/// Outcome of checking an inbound sequence number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceCheck {
    /// Exactly the next expected number.
    InOrder,
    /// Later than expected; `missing` frames never arrived.
    Gap { missing: u64 },
    /// Already seen or older than expected.
    Stale,
}

/// Tracks inbound sequence numbers.
///
/// Detection only. Frames are never buffered or reordered; the protocol
/// assumes an ordered transport and this exists to make violations visible.
#[derive(Clone, Debug, Default)]
pub struct SequenceTracker {
    expected: u64,
    gaps: u64,
    stale: u64,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an inbound sequence number.
    pub fn observe(&mut self, seq: u64) -> SequenceCheck {
        if seq == self.expected {
            self.expected += 1;
            SequenceCheck::InOrder
        } else if seq > self.expected {
            let missing = seq - self.expected;
            self.gaps += missing;
            self.expected = seq + 1;
            SequenceCheck::Gap { missing }
        } else {
            self.stale += 1;
            SequenceCheck::Stale
        }
    }

    /// Total frames skipped so far.
    #[must_use]
    pub fn missing_total(&self) -> u64 {
        self.gaps
    }

    /// Total duplicate or out-of-order frames seen.
    #[must_use]
    pub fn stale_total(&self) -> u64 {
        self.stale
    }

    #[must_use]
    pub fn next_expected(&self) -> u64 {
        self.expected
    }
}
