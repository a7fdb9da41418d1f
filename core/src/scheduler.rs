//! The render queue.
//!
//! Requests arriving before the next flush are coalesced per component. A flush drains the
//! queue ancestors first, so a parent that re-renders (and thereby renders its children with
//! fresh properties) runs before its children's own requests are looked at.

use indexmap::IndexSet;

use crate::component::ComponentId;

/// Pending re-render requests, in arrival order, without duplicates.
#[derive(Debug, Default)]
pub struct RenderQueue {
    pending: IndexSet<ComponentId>,
}

impl RenderQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a render of `id`. Returns `false` if one was already pending.
    pub fn request(&mut self, id: ComponentId) -> bool {
        self.pending.insert(id)
    }

    /// Number of distinct components waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Returns `true` if a render of `id` is waiting.
    #[must_use]
    pub fn contains(&self, id: ComponentId) -> bool {
        self.pending.contains(&id)
    }

    /// Takes every pending request, shallowest component first.
    ///
    /// `depth` returns `None` for components that are no longer mounted; their requests are
    /// dropped. Components at the same depth keep arrival order.
    pub fn drain_ordered(&mut self, mut depth: impl FnMut(ComponentId) -> Option<usize>) -> Vec<ComponentId> {
        let mut ordered: Vec<(usize, ComponentId)> = self
            .pending
            .drain(..)
            .filter_map(|id| depth(id).map(|depth| (depth, id)))
            .collect();
        ordered.sort_by_key(|&(depth, _)| depth);
        ordered.into_iter().map(|(_, id)| id).collect()
    }
}
