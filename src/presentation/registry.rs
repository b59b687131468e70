//! Slot-indexed render handles.

use rustc_hash::FxHashMap;

use super::RenderHandle;
use crate::core::LocalSlot;

/// Render handle for every mounted entity, keyed by local slot.
///
/// Replay resolves entity descriptors here; a slot with state but no handle
/// counts as a miss.
#[derive(Clone, Debug, Default)]
pub struct RenderRegistry {
    handles: FxHashMap<LocalSlot, RenderHandle>,
}

impl RenderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle, returning any handle it replaced.
    pub fn insert(&mut self, slot: LocalSlot, handle: RenderHandle) -> Option<RenderHandle> {
        self.handles.insert(slot, handle)
    }

    #[must_use]
    pub fn get(&self, slot: LocalSlot) -> Option<RenderHandle> {
        self.handles.get(&slot).copied()
    }

    pub fn remove(&mut self, slot: LocalSlot) -> Option<RenderHandle> {
        self.handles.remove(&slot)
    }

    #[must_use]
    pub fn contains(&self, slot: LocalSlot) -> bool {
        self.handles.contains_key(&slot)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Remove and return every handle.
    pub fn drain(&mut self) -> Vec<RenderHandle> {
        let mut handles: Vec<_> = self.handles.drain().map(|(_, h)| h).collect();
        handles.sort();
        handles
    }
}
