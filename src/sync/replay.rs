//! Guest-side replay of host actions.
//!
//! Each inbound action walks a fixed sequence of phases:
//!
//! ```text
//! Received -> EntityResolution -> AnimationPlayback -> LocalLogEmit -> Done
//! ```
//!
//! A resolution miss (entity absent from local state or not mounted) is
//! logged, visuals are skipped, and the piggybacked log lines are still
//! emitted so both peers end with the same combat log. Replay never fails.

use smallvec::SmallVec;
use tracing::{debug, warn};

use super::message::TargetRef;
use crate::core::{BattleState, CombatLog, EntityId, LocalSlot, LogLine};
use crate::presentation::{RenderHandle, RenderRegistry};

/// Replay state machine phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReplayPhase {
    Received,
    EntityResolution,
    AnimationPlayback,
    LocalLogEmit,
    Done,
}

/// An entity descriptor resolved against local state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolved {
    pub id: EntityId,
    pub slot: LocalSlot,
    pub handle: RenderHandle,
}

/// What happened while replaying one action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayReport {
    pub kind: String,
    /// Phases entered, in order.
    pub phases: SmallVec<[ReplayPhase; 5]>,
    /// Descriptors that failed to resolve.
    pub misses: usize,
    pub resolved: usize,
    pub log_lines: usize,
}

impl ReplayReport {
    #[must_use]
    pub fn completed(&self) -> bool {
        self.phases.last() == Some(&ReplayPhase::Done)
    }

    /// Whether any visuals played.
    #[must_use]
    pub fn animated(&self) -> bool {
        self.phases.contains(&ReplayPhase::AnimationPlayback)
    }
}

/// One in-progress replay.
#[derive(Debug)]
pub struct Replay {
    report: ReplayReport,
}

impl Replay {
    /// Start replaying an action of `kind`.
    pub fn begin(kind: &str) -> Self {
        debug!(kind, "replay received");
        let mut phases = SmallVec::new();
        phases.push(ReplayPhase::Received);
        Self {
            report: ReplayReport {
                kind: kind.to_string(),
                phases,
                misses: 0,
                resolved: 0,
                log_lines: 0,
            },
        }
    }

    #[must_use]
    pub fn phase(&self) -> ReplayPhase {
        self.report
            .phases
            .last()
            .copied()
            .unwrap_or(ReplayPhase::Received)
    }

    fn enter(&mut self, phase: ReplayPhase) {
        if self.phase() != phase {
            self.report.phases.push(phase);
        }
    }

    /// Resolve a shared identity against local state and the render
    /// registry.
    pub fn resolve(
        &mut self,
        state: &BattleState,
        registry: &RenderRegistry,
        is_host: bool,
        id: EntityId,
    ) -> Option<Resolved> {
        self.enter(ReplayPhase::EntityResolution);
        let slot = id.to_local(is_host);
        if !state.contains(slot) {
            warn!(kind = %self.report.kind, entity = %id, %slot, "replay target not in state");
            self.report.misses += 1;
            return None;
        }
        let Some(handle) = registry.get(slot) else {
            warn!(kind = %self.report.kind, entity = %id, %slot, "replay target not mounted");
            self.report.misses += 1;
            return None;
        };
        self.report.resolved += 1;
        Some(Resolved { id, slot, handle })
    }

    /// Resolve a target descriptor.
    pub fn resolve_target(
        &mut self,
        state: &BattleState,
        registry: &RenderRegistry,
        is_host: bool,
        target: &TargetRef,
    ) -> Option<Resolved> {
        match target.entity_id() {
            Some(id) => self.resolve(state, registry, is_host, id),
            None => {
                self.enter(ReplayPhase::EntityResolution);
                warn!(kind = %self.report.kind, name = %target.name, "malformed target descriptor");
                self.report.misses += 1;
                None
            }
        }
    }

    #[must_use]
    pub fn has_misses(&self) -> bool {
        self.report.misses > 0
    }

    /// Mark the start of visual playback.
    pub fn animate(&mut self) {
        self.enter(ReplayPhase::AnimationPlayback);
    }

    /// Append the host's log lines to the local combat log.
    pub fn emit_log(&mut self, log: &mut CombatLog, lines: &[LogLine]) {
        self.enter(ReplayPhase::LocalLogEmit);
        for line in lines {
            log.push(line.clone());
        }
        self.report.log_lines += lines.len();
    }

    /// Skip visuals after a miss: emit the log and finish.
    pub fn abort(mut self, log: &mut CombatLog, lines: &[LogLine]) -> ReplayReport {
        warn!(kind = %self.report.kind, misses = self.report.misses, "skipping replay visuals");
        self.emit_log(log, lines);
        self.finish()
    }

    pub fn finish(mut self) -> ReplayReport {
        self.enter(ReplayPhase::Done);
        debug!(kind = %self.report.kind, resolved = self.report.resolved, "replay done");
        self.report
    }
}
