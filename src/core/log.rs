//! Player-visible combat log.
//!
//! Distinct from `tracing` diagnostics: these lines are gameplay output, and
//! both peers must end a battle with the same sequence. The host piggybacks
//! every line it writes for an action onto that action's message so the
//! guest can emit identical lines.

use im::Vector;
use serde::{Deserialize, Serialize};

/// Severity of a combat log line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
    Warning,
}

/// One combat log line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub message: String,
    pub severity: Severity,
}

impl LogLine {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }
}

/// Append-only combat log with optional capacity.
///
/// Backed by `im::Vector` so snapshots for comparison are O(1).
#[derive(Clone, Debug, Default)]
pub struct CombatLog {
    lines: Vector<LogLine>,
    capacity: usize,
    total: u64,
}

impl CombatLog {
    /// Create a log keeping at most `capacity` lines (0 = unlimited).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: Vector::new(),
            capacity,
            total: 0,
        }
    }

    /// Append a line, evicting the oldest when over capacity.
    pub fn push(&mut self, line: LogLine) {
        self.lines.push_back(line);
        self.total += 1;
        if self.capacity > 0 && self.lines.len() > self.capacity {
            self.lines.pop_front();
        }
    }

    /// Lines currently retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines ever written, including evicted ones.
    #[must_use]
    pub fn total_written(&self) -> u64 {
        self.total
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogLine> {
        self.lines.iter()
    }

    /// Cheap snapshot of the retained lines.
    #[must_use]
    pub fn snapshot(&self) -> Vector<LogLine> {
        self.lines.clone()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
