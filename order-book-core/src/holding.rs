use crate::types::{BookEntry, EntryId, Side};
use std::collections::VecDeque;

/// Per-side queue of market orders that could not be fully filled on arrival.
///
/// A pure time-ordered FIFO; it never matches on its own — the engine's flush
/// loop re-examines it against the opposite ladder after every book
/// mutation. Invariant: every entry here has `remaining > 0` and `price ==
/// None`.
pub(crate) struct HoldingQueue {
    side: Side,
    orders: VecDeque<BookEntry>,
}

impl HoldingQueue {
    pub(crate) fn new(side: Side) -> Self {
        HoldingQueue {
            side,
            orders: VecDeque::new(),
        }
    }

    pub(crate) fn append(&mut self, entry: BookEntry) {
        debug_assert!(entry.remaining > 0, "holding queue entry must have remaining > 0");
        debug_assert!(entry.price.is_none(), "holding queue entry must be priceless");
        tracing::debug!(side = %self.side, entry_id = entry.entry_id, "market order queued");
        self.orders.push_back(entry);
    }

    /// Removes an entry by id, wherever it sits. Returns `None` if unknown.
    pub(crate) fn cancel(&mut self, entry_id: EntryId) -> Option<BookEntry> {
        let pos = self.orders.iter().position(|o| o.entry_id == entry_id)?;
        let removed = self.orders.remove(pos);
        if removed.is_some() {
            tracing::debug!(side = %self.side, entry_id, "held market order cancelled");
        }
        removed
    }

    pub(crate) fn head_entry(&self) -> Option<&BookEntry> {
        self.orders.front()
    }

    pub(crate) fn head_entry_mut(&mut self) -> Option<&mut BookEntry> {
        self.orders.front_mut()
    }

    pub(crate) fn length(&self) -> usize {
        self.orders.len()
    }
}
