use crate::types::{BookEntry, EntryId, PriceLevel, Quantity, Side, Trade};
use std::collections::{BTreeMap, HashMap};

type Price = crate::types::Price;

/// One side of the book: a price-to-level map plus an id index for O(1) cancel.
///
/// "Best" is the highest key for a bid ladder and the lowest key for an ask
/// ladder; `BTreeMap` gives that for free by iterating from either end, so
/// there is no separately maintained sorted-price vector (see the design
/// notes on representation freedom: any structure that gets `best_price`
/// right is a valid ladder).
pub(crate) struct Ladder {
    side: Side,
    levels: BTreeMap<Price, PriceLevel>,
    index: HashMap<EntryId, Price>,
}

impl Ladder {
    pub(crate) fn new(side: Side) -> Self {
        Ladder {
            side,
            levels: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub(crate) fn best_price(&self) -> Option<Price> {
        match self.side {
            Side::Buy => self.levels.keys().next_back().copied(),
            Side::Sell => self.levels.keys().next().copied(),
        }
    }

    pub(crate) fn depth_at(&self, price: Price) -> Quantity {
        self.levels.get(&price).map_or(0, |l| l.total_quantity)
    }

    /// Inserts a priced entry with time priority strictly after anything
    /// already resting at that price.
    pub(crate) fn insert(&mut self, entry: BookEntry) {
        let price = entry
            .price
            .expect("ladder insert requires a priced entry");
        let entry_id = entry.entry_id;
        self.levels
            .entry(price)
            .or_insert_with(|| PriceLevel::new(price))
            .add_order(entry);
        self.index.insert(entry_id, price);
        tracing::debug!(side = %self.side, entry_id, price, "resting order inserted");
        self.debug_assert_consistent();
    }

    /// Removes a resting entry by id. Fails with `UnknownEntry`-shaped `None`
    /// if the id isn't indexed here; the caller (the engine) is expected to
    /// try the other structures before concluding the id doesn't exist.
    pub(crate) fn cancel(&mut self, entry_id: EntryId) -> Option<BookEntry> {
        let price = self.index.remove(&entry_id)?;
        let level = self
            .levels
            .get_mut(&price)
            .unwrap_or_else(|| panic!("invariant: indexed price {price} has no level"));
        let removed = level.remove_by_id(entry_id).unwrap_or_else(|| {
            panic!("invariant: entry {entry_id} indexed but absent from its level")
        });
        if level.is_empty() {
            self.levels.remove(&price);
        }
        tracing::debug!(side = %self.side, entry_id, "resting order cancelled");
        self.debug_assert_consistent();
        Some(removed)
    }

    /// True if `limit_price` is aggressive enough to take liquidity from this
    /// ladder's best level (this ladder must be the *opposite* side of the
    /// taker's own side for this check to mean "the incoming limit crosses").
    fn crosses(&self, limit_price: Price) -> bool {
        match self.best_price() {
            None => false,
            Some(best) => match self.side {
                Side::Buy => best >= limit_price,
                Side::Sell => best <= limit_price,
            },
        }
    }

    /// One head-of-book consumption step. Precondition: the ladder is
    /// non-empty and `incoming.remaining > 0`. Returns the executed price and
    /// this ladder's best price after the mutation.
    fn match_single(&mut self, incoming: &mut BookEntry) -> (Price, Option<Price>) {
        let best_price = self
            .best_price()
            .expect("match_single precondition: ladder must be non-empty");
        let level = self
            .levels
            .get_mut(&best_price)
            .expect("invariant: best price indexed but has no level");
        let head = *level
            .orders
            .front()
            .expect("invariant: indexed price has an empty level");
        let trade_qty = incoming.remaining.min(head.remaining);

        if head.remaining <= incoming.remaining {
            incoming.remaining -= head.remaining;
            level.remove_front();
            self.index.remove(&head.entry_id);
            if level.is_empty() {
                self.levels.remove(&best_price);
            }
        } else {
            level.shrink_front(head.remaining - trade_qty);
            incoming.remaining = 0;
        }

        let trade = Trade::new(best_price, trade_qty, head.entry_id, incoming.entry_id);
        tracing::info!(side = %self.side, %trade, "match");
        self.debug_assert_consistent();
        (best_price, self.best_price())
    }

    /// Drains this ladder against an incoming market order until either the
    /// order is filled or the ladder empties.
    pub(crate) fn execute_market(&mut self, entry: &mut BookEntry) -> Vec<(Price, Option<Price>)> {
        let mut pairs = Vec::new();
        while entry.remaining > 0 && !self.is_empty() {
            pairs.push(self.match_single(entry));
        }
        pairs
    }

    /// Drains this ladder against an incoming crossing limit order until
    /// either the order is filled or the ladder stops crossing the limit
    /// price (including emptying out entirely).
    pub(crate) fn execute_crossed_limit(
        &mut self,
        entry: &mut BookEntry,
    ) -> Vec<(Price, Option<Price>)> {
        let limit_price = entry
            .price
            .expect("execute_crossed_limit precondition: entry must carry a price");
        let mut pairs = Vec::new();
        while entry.remaining > 0 && self.crosses(limit_price) {
            pairs.push(self.match_single(entry));
        }
        pairs
    }

    fn debug_assert_consistent(&self) {
        debug_assert_eq!(
            self.index.len(),
            self.levels.values().map(|l| l.orders.len()).sum::<usize>(),
            "ladder index/level entry count mismatch"
        );
        debug_assert!(
            self.levels.values().all(|l| !l.is_empty()),
            "empty level left resting in ladder"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: EntryId, price: Price, qty: Quantity) -> BookEntry {
        BookEntry {
            entry_id: id,
            remaining: qty,
            price: Some(price),
        }
    }

    #[test]
    fn best_price_picks_most_aggressive() {
        let mut bids = Ladder::new(Side::Buy);
        bids.insert(entry(1, 99, 10));
        bids.insert(entry(2, 100, 5));
        assert_eq!(bids.best_price(), Some(100));

        let mut asks = Ladder::new(Side::Sell);
        asks.insert(entry(1, 101, 10));
        asks.insert(entry(2, 100, 5));
        assert_eq!(asks.best_price(), Some(100));
    }

    #[test]
    fn cancel_removes_level_when_empty() {
        let mut bids = Ladder::new(Side::Buy);
        bids.insert(entry(1, 100, 10));
        assert_eq!(bids.best_price(), Some(100));
        let removed = bids.cancel(1).expect("present");
        assert_eq!(removed.remaining, 10);
        assert!(bids.is_empty());
        assert_eq!(bids.cancel(1), None);
    }

    #[test]
    fn cancel_unknown_id_returns_none() {
        let mut bids = Ladder::new(Side::Buy);
        bids.insert(entry(1, 100, 10));
        assert_eq!(bids.cancel(999), None);
    }

    #[test]
    fn execute_market_sweeps_multiple_levels_in_price_time_order() {
        let mut asks = Ladder::new(Side::Sell);
        asks.insert(entry(1, 100, 10));
        asks.insert(entry(2, 101, 20));
        asks.insert(entry(3, 101, 5));

        let mut incoming = BookEntry {
            entry_id: 99,
            remaining: 35,
            price: None,
        };
        let pairs = asks.execute_market(&mut incoming);

        assert_eq!(pairs, vec![(100, Some(101)), (101, Some(101)), (101, None)]);
        assert_eq!(incoming.remaining, 0);
        assert!(asks.is_empty());
    }

    #[test]
    fn execute_crossed_limit_stops_when_no_longer_crossing() {
        let mut asks = Ladder::new(Side::Sell);
        asks.insert(entry(1, 100, 10));
        asks.insert(entry(2, 105, 10));

        let mut incoming = entry(99, 102, 15);
        let pairs = asks.execute_crossed_limit(&mut incoming);

        assert_eq!(pairs, vec![(100, Some(105))]);
        assert_eq!(incoming.remaining, 5);
        assert_eq!(asks.best_price(), Some(105));
    }

    #[test]
    fn depth_at_reports_level_total() {
        let mut bids = Ladder::new(Side::Buy);
        bids.insert(entry(1, 100, 10));
        bids.insert(entry(2, 100, 5));
        assert_eq!(bids.depth_at(100), 15);
        assert_eq!(bids.depth_at(50), 0);
    }
}
