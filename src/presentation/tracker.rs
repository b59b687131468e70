//! Per-ability set of transient visuals still on screen.

use std::cell::RefCell;

use rustc_hash::FxHashSet;

use super::{Presenter, VisualId};

/// Visuals an ability has shown and not yet cleared.
///
/// Interior mutability lets the concurrent futures of one multi-target
/// animation track and release through a shared reference.
#[derive(Debug, Default)]
pub struct VisualTracker {
    active: RefCell<FxHashSet<VisualId>>,
}

impl VisualTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self, visual: VisualId) {
        self.active.borrow_mut().insert(visual);
    }

    /// Stop tracking a visual the caller already cleared.
    pub fn release(&self, visual: VisualId) -> bool {
        self.active.borrow_mut().remove(&visual)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.active.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.borrow().is_empty()
    }

    /// Clear every tracked visual through `presenter`.
    ///
    /// Returns how many were removed; a second call returns 0.
    pub fn cleanup(&self, presenter: &dyn Presenter) -> usize {
        let drained: Vec<VisualId> = self.active.borrow_mut().drain().collect();
        for visual in &drained {
            presenter.clear(*visual);
        }
        drained.len()
    }
}
