//! Presentation boundary.
//!
//! The sync core never draws anything. It hands abstract [`VisualCue`]s to a
//! [`Presenter`] and keeps two pieces of bookkeeping:
//!
//! - [`RenderRegistry`]: which render handle belongs to which local slot,
//!   so replay can resolve an entity descriptor to something drawable.
//! - [`VisualTracker`]: which transient visuals an ability still has on
//!   screen, so `cleanup` can remove them after an abort or at battle end.
//!
//! All presenter methods take `&self`. Concurrent visual futures within one
//! ability share the presenter, so implementations use interior mutability.

pub mod registry;
pub mod tracker;

pub use registry::RenderRegistry;
pub use tracker::VisualTracker;

use std::cell::{Cell, RefCell};

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;

use crate::core::LocalSlot;

/// Handle for a mounted entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RenderHandle(pub u64);

/// Handle for a transient visual (projectile, glow, aura).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VisualId(pub u64);

/// One abstract presentation step, addressed in local slots.
///
/// Durations are already speed adjusted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualCue {
    Projectile {
        from: LocalSlot,
        to: LocalSlot,
        travel_ms: u64,
    },
    Impact {
        at: LocalSlot,
        amount: i64,
        critical: bool,
    },
    HealGlow {
        at: LocalSlot,
        amount: i64,
    },
    Summon {
        at: LocalSlot,
    },
    StatusAura {
        at: LocalSlot,
        effect: String,
        stacks: u32,
    },
    Splash {
        at: LocalSlot,
    },
}

impl VisualCue {
    /// Slot the cue is anchored to (the destination, for projectiles).
    #[must_use]
    pub fn anchor(&self) -> LocalSlot {
        match self {
            Self::Projectile { to, .. } => *to,
            Self::Impact { at, .. }
            | Self::HealGlow { at, .. }
            | Self::Summon { at }
            | Self::StatusAura { at, .. }
            | Self::Splash { at } => *at,
        }
    }
}

/// Sink for presentation steps.
pub trait Presenter {
    /// Create the on-screen representation of an entity.
    fn mount(&self, slot: LocalSlot, name: &str) -> RenderHandle;

    /// Remove an entity's representation.
    fn unmount(&self, handle: RenderHandle);

    /// Start a transient visual.
    fn show(&self, visual: VisualId, cue: &VisualCue);

    /// Remove a transient visual. Unknown ids are ignored.
    fn clear(&self, visual: VisualId);
}

/// Presenter that only logs. Used by the demo binary.
#[derive(Debug, Default)]
pub struct TracingPresenter {
    label: &'static str,
    next_handle: Cell<u64>,
}

impl TracingPresenter {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            next_handle: Cell::new(0),
        }
    }
}

impl Presenter for TracingPresenter {
    fn mount(&self, slot: LocalSlot, name: &str) -> RenderHandle {
        let handle = RenderHandle(self.next_handle.get());
        self.next_handle.set(handle.0 + 1);
        debug!(peer = self.label, %slot, name, handle = handle.0, "mount");
        handle
    }

    fn unmount(&self, handle: RenderHandle) {
        debug!(peer = self.label, handle = handle.0, "unmount");
    }

    fn show(&self, visual: VisualId, cue: &VisualCue) {
        debug!(peer = self.label, visual = visual.0, ?cue, "show");
    }

    fn clear(&self, visual: VisualId) {
        debug!(peer = self.label, visual = visual.0, "clear");
    }
}

/// Something a [`RecordingPresenter`] saw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PresentEvent {
    Mount(LocalSlot, RenderHandle),
    Unmount(RenderHandle),
    Show(VisualId, VisualCue),
    Clear(VisualId),
}

/// Presenter that records every call with its (tokio) timestamp.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    events: RefCell<Vec<(Instant, PresentEvent)>>,
    next_handle: Cell<u64>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<(Instant, PresentEvent)> {
        self.events.borrow().clone()
    }

    /// Every cue shown, in order.
    #[must_use]
    pub fn shown(&self) -> Vec<(Instant, VisualCue)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|(at, e)| match e {
                PresentEvent::Show(_, cue) => Some((*at, cue.clone())),
                _ => None,
            })
            .collect()
    }

    /// Time of the first `show` call.
    #[must_use]
    pub fn first_show_at(&self) -> Option<Instant> {
        self.shown().first().map(|(at, _)| *at)
    }

    /// Visuals shown but not yet cleared.
    #[must_use]
    pub fn live_visuals(&self) -> Vec<VisualId> {
        let mut live = Vec::new();
        for (_, event) in self.events.borrow().iter() {
            match event {
                PresentEvent::Show(id, _) => live.push(*id),
                PresentEvent::Clear(id) => live.retain(|v| v != id),
                _ => {}
            }
        }
        live
    }

    /// Slots mounted and not unmounted.
    #[must_use]
    pub fn mounted(&self) -> Vec<LocalSlot> {
        let mut mounted: Vec<(LocalSlot, RenderHandle)> = Vec::new();
        for (_, event) in self.events.borrow().iter() {
            match event {
                PresentEvent::Mount(slot, handle) => mounted.push((*slot, *handle)),
                PresentEvent::Unmount(handle) => mounted.retain(|(_, h)| h != handle),
                _ => {}
            }
        }
        mounted.into_iter().map(|(s, _)| s).collect()
    }

    fn record(&self, event: PresentEvent) {
        self.events.borrow_mut().push((Instant::now(), event));
    }
}

impl Presenter for RecordingPresenter {
    fn mount(&self, slot: LocalSlot, _name: &str) -> RenderHandle {
        let handle = RenderHandle(self.next_handle.get());
        self.next_handle.set(handle.0 + 1);
        self.record(PresentEvent::Mount(slot, handle));
        handle
    }

    fn unmount(&self, handle: RenderHandle) {
        self.record(PresentEvent::Unmount(handle));
    }

    fn show(&self, visual: VisualId, cue: &VisualCue) {
        self.record(PresentEvent::Show(visual, cue.clone()));
    }

    fn clear(&self, visual: VisualId) {
        self.record(PresentEvent::Clear(visual));
    }
}
