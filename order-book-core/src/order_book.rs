use crate::holding::HoldingQueue;
use crate::ladder::Ladder;
use crate::types::{
    BookEntry, EntryId, Instrument, Message, NewOrder, OrderBookError, OrderKind, Price, Quantity,
    Side,
};

/// The matching engine: two price ladders plus two dormant market-order
/// holding queues, orchestrating intake, the self-crossing rule, and the
/// flush procedure that re-examines held market orders after every mutation.
///
/// `submit` and `cancel` are atomic from the caller's point of view; nothing
/// here suspends, blocks, or may be called reentrantly from within message
/// emission. Callers are responsible for serializing concurrent calls.
pub struct OrderBook {
    /// Instrument being traded
    pub instrument: Instrument,
    sequence: EntryId,
    bids: Ladder,
    asks: Ladder,
    bid_holding: HoldingQueue,
    ask_holding: HoldingQueue,
}

impl OrderBook {
    /// Creates a new empty order book for the specified instrument.
    pub fn new(instrument: Instrument) -> Self {
        OrderBook {
            instrument,
            sequence: 0,
            bids: Ladder::new(Side::Buy),
            asks: Ladder::new(Side::Sell),
            bid_holding: HoldingQueue::new(Side::Buy),
            ask_holding: HoldingQueue::new(Side::Sell),
        }
    }

    /// Submits a new order for matching.
    ///
    /// Validates the order first; an invalid order is rejected without any
    /// mutation. A valid order is routed to the limit or market path, then
    /// every holding queue is re-examined via the flush procedure before the
    /// combined message list is returned.
    pub fn submit(&mut self, order: NewOrder) -> Result<Vec<Message>, OrderBookError> {
        Self::validate(&order)?;

        let mut messages = match order.kind {
            OrderKind::Limit => {
                let price = order.price.expect("validated: limit order carries a price");
                self.process_limit(order.side, order.quantity, price)
            }
            OrderKind::Market => self.process_market(order.side, order.quantity),
        };
        messages.extend(self.flush_market_queues());
        Ok(messages)
    }

    /// Cancels a resting or held entry. Silent if the id is unknown anywhere,
    /// per the informational (non-fatal) `UnknownEntry` case.
    pub fn cancel(&mut self, entry_id: EntryId) {
        if self.try_cancel(entry_id).is_err() {
            tracing::info!(entry_id, "cancel requested for unrecognized entry id");
        }
    }

    /// Same as `cancel`, but reports an unknown id instead of swallowing it.
    pub fn try_cancel(&mut self, entry_id: EntryId) -> Result<(), OrderBookError> {
        if self.bids.cancel(entry_id).is_some() {
            return Ok(());
        }
        if self.asks.cancel(entry_id).is_some() {
            return Ok(());
        }
        if self.bid_holding.cancel(entry_id).is_some() {
            return Ok(());
        }
        if self.ask_holding.cancel(entry_id).is_some() {
            return Ok(());
        }
        Err(OrderBookError::UnknownEntry(entry_id))
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.best_price()
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.best_price()
    }

    pub fn bid_depth_at(&self, price: Price) -> Quantity {
        self.bids.depth_at(price)
    }

    pub fn ask_depth_at(&self, price: Price) -> Quantity {
        self.asks.depth_at(price)
    }

    pub fn holding_length(&self, side: Side) -> usize {
        match side {
            Side::Buy => self.bid_holding.length(),
            Side::Sell => self.ask_holding.length(),
        }
    }

    pub fn sequence_number(&self) -> EntryId {
        self.sequence
    }

    fn validate(order: &NewOrder) -> Result<(), OrderBookError> {
        if order.quantity == 0 {
            return Err(OrderBookError::InvalidOrder {
                reason: "quantity must be greater than zero".into(),
            });
        }
        match (order.kind, order.price) {
            (OrderKind::Limit, None) => Err(OrderBookError::InvalidOrder {
                reason: "limit order requires a price".into(),
            }),
            (OrderKind::Limit, Some(0)) => Err(OrderBookError::InvalidOrder {
                reason: "limit price must be greater than zero".into(),
            }),
            (OrderKind::Market, Some(_)) => Err(OrderBookError::InvalidOrder {
                reason: "market order must not specify a price".into(),
            }),
            _ => Ok(()),
        }
    }

    fn next_entry_id(&mut self) -> EntryId {
        self.sequence += 1;
        self.sequence
    }

    /// Handles a limit order: passive rest, or a crossing limit that drains
    /// the opposite ladder and, if anything remains, resubmits the remainder
    /// as a fresh order (a new `entry_id`, the source's own behavior — see
    /// `OrderBook` crate docs for why the sequence counter advances twice for
    /// a single caller submission in that case).
    fn process_limit(&mut self, side: Side, quantity: Quantity, price: Price) -> Vec<Message> {
        let entry_id = self.next_entry_id();
        let mut entry = BookEntry {
            entry_id,
            remaining: quantity,
            price: Some(price),
        };

        let crosses = match side {
            Side::Buy => self.asks.best_price().is_some_and(|best| price >= best),
            Side::Sell => self.bids.best_price().is_some_and(|best| price <= best),
        };

        if !crosses {
            match side {
                Side::Buy => self.bids.insert(entry),
                Side::Sell => self.asks.insert(entry),
            }
            return Vec::new();
        }

        let pairs = match side {
            Side::Buy => self.asks.execute_crossed_limit(&mut entry),
            Side::Sell => self.bids.execute_crossed_limit(&mut entry),
        };

        if entry.remaining > 0 {
            // The opposite side cannot have refilled mid-submission, so this
            // resubmit either rests passively or, in principle, crosses
            // further against an untouched remainder — it never produces
            // messages of its own; the source discards them, and we mirror
            // that rather than propagate an always-empty list. Crucially,
            // this mutates the *own* side's ladder (rests the remainder)
            // *before* the messages below are synthesized, so `bid`/`ask`
            // read the post-resubmit best, matching the source's behavior.
            self.process_limit(side, entry.remaining, price);
        }

        self.synthesize_messages(side, &pairs)
    }

    /// Handles a market order: takes against the opposite ladder, and queues
    /// whatever remains (if anything) in this side's holding queue.
    fn process_market(&mut self, side: Side, quantity: Quantity) -> Vec<Message> {
        let entry_id = self.next_entry_id();
        let mut entry = BookEntry {
            entry_id,
            remaining: quantity,
            price: None,
        };

        let pairs = match side {
            Side::Buy => self.asks.execute_market(&mut entry),
            Side::Sell => self.bids.execute_market(&mut entry),
        };

        if entry.remaining > 0 {
            match side {
                Side::Buy => self.bid_holding.append(entry),
                Side::Sell => self.ask_holding.append(entry),
            }
        }

        self.synthesize_messages(side, &pairs)
    }

    /// Repeatedly re-examines the holding queues for now-executable market
    /// orders. Picks the older head (lowest `entry_id`) when both queues are
    /// viable, falling back to whichever side can actually match; stops when
    /// neither can. Terminates because each iteration either drains a held
    /// order or empties an opposite ladder.
    fn flush_market_queues(&mut self) -> Vec<Message> {
        let mut messages = Vec::new();
        while let Some(side) = self.pick_flush_candidate() {
            let pairs = match side {
                Side::Buy => {
                    let mut entry = *self
                        .bid_holding
                        .head_entry()
                        .expect("flush candidate guarantees a head entry");
                    let pairs = self.asks.execute_market(&mut entry);
                    if entry.remaining == 0 {
                        self.bid_holding
                            .cancel(entry.entry_id)
                            .expect("head entry must still be queued");
                    } else {
                        *self
                            .bid_holding
                            .head_entry_mut()
                            .expect("head entry must still be queued") = entry;
                    }
                    pairs
                }
                Side::Sell => {
                    let mut entry = *self
                        .ask_holding
                        .head_entry()
                        .expect("flush candidate guarantees a head entry");
                    let pairs = self.bids.execute_market(&mut entry);
                    if entry.remaining == 0 {
                        self.ask_holding
                            .cancel(entry.entry_id)
                            .expect("head entry must still be queued");
                    } else {
                        *self
                            .ask_holding
                            .head_entry_mut()
                            .expect("head entry must still be queued") = entry;
                    }
                    pairs
                }
            };
            messages.extend(self.synthesize_messages(side, &pairs));
        }
        messages
    }

    /// `side` tags which holding queue (and opposite ladder) to drive next,
    /// `None` means no further progress is possible right now.
    fn pick_flush_candidate(&self) -> Option<Side> {
        let bid_head = self.bid_holding.head_entry();
        let ask_head = self.ask_holding.head_entry();

        match (bid_head, ask_head) {
            (Some(b), Some(a)) => {
                if b.entry_id < a.entry_id {
                    self.pick_buy_then_sell()
                } else {
                    self.pick_sell_then_buy()
                }
            }
            (Some(_), None) => (!self.asks.is_empty()).then_some(Side::Buy),
            (None, Some(_)) => (!self.bids.is_empty()).then_some(Side::Sell),
            (None, None) => None,
        }
    }

    fn pick_buy_then_sell(&self) -> Option<Side> {
        if !self.asks.is_empty() {
            Some(Side::Buy)
        } else if !self.bids.is_empty() {
            Some(Side::Sell)
        } else {
            None
        }
    }

    fn pick_sell_then_buy(&self) -> Option<Side> {
        if !self.bids.is_empty() {
            Some(Side::Sell)
        } else if !self.asks.is_empty() {
            Some(Side::Buy)
        } else {
            None
        }
    }

    /// Converts matched (trade_price, post_best) pairs into external
    /// messages. The taker's own side only ever rests or queues after these
    /// pairs were computed, never mutates mid-match, so its best price is a
    /// constant repeated across the whole batch; the opposite side's best
    /// moves fill by fill and is read straight from each pair.
    fn synthesize_messages(&self, taker_side: Side, pairs: &[(Price, Option<Price>)]) -> Vec<Message> {
        match taker_side {
            Side::Buy => {
                let bid = self.bids.best_price();
                pairs
                    .iter()
                    .map(|&(trade_price, post_ask)| Message {
                        bid,
                        ask: post_ask,
                        trade_price,
                    })
                    .collect()
            }
            Side::Sell => {
                let ask = self.asks.best_price();
                pairs
                    .iter()
                    .map(|&(trade_price, post_bid)| Message {
                        bid: post_bid,
                        ask,
                        trade_price,
                    })
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod order_book_tests {
    use super::*;
    use crate::test_support::*;
    use crate::types::Side::{Buy, Sell};

    #[test]
    fn zero_quantity_is_rejected_without_mutation() {
        let mut book = new_book();
        let err = book.submit(limit(Buy, 100, 0)).unwrap_err();
        assert!(matches!(err, OrderBookError::InvalidOrder { .. }));
        assert_eq!(book.sequence_number(), 0);
        assert!(book.best_bid().is_none());
    }

    #[test]
    fn market_order_without_price_is_valid_limit_requires_price() {
        let mut book = new_book();
        let err = book
            .submit(crate::types::NewOrder {
                side: Buy,
                kind: crate::types::OrderKind::Limit,
                quantity: 10,
                price: None,
            })
            .unwrap_err();
        assert!(matches!(err, OrderBookError::InvalidOrder { .. }));
    }

    // --- literal end-to-end scenarios from the specification ---

    #[test]
    fn scenario_1_passive_bid_alone() {
        let mut book = new_book();
        let msgs = book.submit(limit(Buy, 100, 10)).unwrap();
        assert!(msgs.is_empty());
        assert_eq!(book.sequence_number(), 1);
        assert_eq!(book.best_bid(), Some(100));
        assert_eq!(book.best_ask(), None);
    }

    #[test]
    fn scenario_2_market_on_empty_book() {
        let mut book = new_book();
        let msgs = book.submit(market(Buy, 10)).unwrap();
        assert!(msgs.is_empty());
        assert_eq!(book.sequence_number(), 1);
        assert_eq!(book.holding_length(Buy), 1);
        assert_eq!(book.holding_length(Sell), 0);
    }

    #[test]
    fn scenario_3_shallow_match() {
        let mut book = new_book();
        book.submit(limit(Sell, 100, 10)).unwrap();
        let msgs = book.submit(market(Buy, 10)).unwrap();
        assert_eq!(
            msgs,
            vec![msg(None, None, 100)]
        );
        assert_eq!(book.sequence_number(), 2);
        assert_eq!(book.best_bid(), None);
        assert_eq!(book.best_ask(), None);
        assert_eq!(book.holding_length(Buy), 0);
        assert_eq!(book.holding_length(Sell), 0);
    }

    fn prime_scenario_4_5(book: &mut OrderBook) {
        book.submit(limit(Buy, 99, 10)).unwrap(); // id 1
        book.submit(limit(Buy, 98, 4)).unwrap(); // id 2
        book.submit(limit(Buy, 99, 2)).unwrap(); // id 3
        book.submit(limit(Buy, 97, 20)).unwrap(); // id 4
        book.submit(limit(Buy, 98, 15)).unwrap(); // id 5
        book.submit(limit(Buy, 97, 10)).unwrap(); // id 6
        book.submit(limit(Sell, 101, 10)).unwrap(); // id 7
        book.submit(limit(Sell, 102, 4)).unwrap(); // id 8
        book.submit(limit(Sell, 101, 2)).unwrap(); // id 9
        book.submit(limit(Sell, 103, 20)).unwrap(); // id 10
        book.submit(limit(Sell, 102, 15)).unwrap(); // id 11
        book.submit(limit(Sell, 103, 10)).unwrap(); // id 12
    }

    #[test]
    fn scenario_4_small_cross() {
        let mut book = new_book();
        prime_scenario_4_5(&mut book);

        let msgs = book.submit(limit(Buy, 101, 11)).unwrap();
        assert_eq!(
            msgs,
            vec![msg(Some(99), Some(101), 101), msg(Some(99), Some(101), 101)]
        );
        assert_eq!(book.best_ask(), Some(101));
        assert_eq!(book.ask_depth_at(101), 1);
        assert_eq!(book.sequence_number(), 13);
    }

    #[test]
    fn scenario_5_large_cross_drains_bid_side() {
        let mut book = new_book();
        prime_scenario_4_5(&mut book);

        let msgs = book.submit(limit(Sell, 90, 1000)).unwrap();
        assert_eq!(
            msgs,
            vec![
                msg(Some(99), Some(90), 99),
                msg(Some(98), Some(90), 99),
                msg(Some(98), Some(90), 98),
                msg(Some(97), Some(90), 98),
                msg(Some(97), Some(90), 97),
                msg(None, Some(90), 97),
            ]
        );
        assert_eq!(book.best_bid(), None);
        assert_eq!(book.best_ask(), Some(90));
        assert_eq!(book.ask_depth_at(90), 939);
        assert_eq!(book.sequence_number(), 14);
    }

    #[test]
    fn scenario_6_market_flush_reengages() {
        let mut book = new_book();
        book.submit(limit(Buy, 99, 10)).unwrap(); // id 1
        book.submit(limit(Buy, 98, 4)).unwrap(); // id 2
        book.submit(limit(Buy, 99, 2)).unwrap(); // id 3
        book.submit(limit(Buy, 97, 20)).unwrap(); // id 4
        book.submit(limit(Buy, 98, 15)).unwrap(); // id 5
        book.submit(limit(Buy, 97, 10)).unwrap(); // id 6

        // five market buys with nothing to match against; all five queue up.
        book.submit(market(Buy, 15)).unwrap(); // id 7
        book.submit(market(Buy, 10)).unwrap(); // id 8
        book.submit(market(Buy, 8)).unwrap(); // id 9
        book.submit(market(Buy, 12)).unwrap(); // id 10
        book.submit(market(Buy, 6)).unwrap(); // id 11
        assert_eq!(book.holding_length(Buy), 5);

        // passive sell rests at 100 (doesn't cross 99 best bid), then the
        // flush loop immediately matches it against the oldest holding buy.
        let msgs = book.submit(limit(Sell, 100, 10)).unwrap(); // id 12
        assert_eq!(msgs, vec![msg(Some(99), None, 100)]);

        assert_eq!(book.sequence_number(), 12);
        assert_eq!(book.best_ask(), None);
        assert_eq!(book.holding_length(Buy), 5);
        // the oldest held buy (id 7, 15 units) partially filled by the 10-unit sell.
    }

    #[test]
    fn round_trip_passive_insert_then_cancel() {
        let mut book = new_book();
        let msgs = book.submit(limit(Buy, 100, 10)).unwrap();
        assert!(msgs.is_empty());
        assert_eq!(book.best_bid(), Some(100));

        book.cancel(1);
        assert_eq!(book.best_bid(), None);
        assert_eq!(book.sequence_number(), 1);
    }

    #[test]
    fn cancel_unknown_id_is_silent() {
        let mut book = new_book();
        book.cancel(12345); // must not panic
        assert_eq!(book.try_cancel(12345), Err(OrderBookError::UnknownEntry(12345)));
    }

    #[test]
    fn price_time_priority_within_level_and_across_levels() {
        let mut book = new_book();
        book.submit(limit(Sell, 99, 2)).unwrap(); // id1, better price
        book.submit(limit(Sell, 100, 3)).unwrap(); // id2
        book.submit(limit(Sell, 100, 4)).unwrap(); // id3

        let msgs = book.submit(limit(Buy, 150, 7)).unwrap();
        assert_eq!(
            msgs,
            vec![
                msg(None, Some(100), 99),
                msg(None, Some(100), 100),
                msg(None, Some(100), 100),
            ]
        );
        assert_eq!(book.best_ask(), Some(100));
        assert_eq!(book.ask_depth_at(100), 2);
        assert_eq!(book.best_bid(), None);
    }

    #[test]
    fn conservation_of_quantity_across_partial_fills() {
        let mut book = new_book();
        book.submit(limit(Sell, 100, 5)).unwrap();
        let msgs = book.submit(limit(Buy, 100, 8)).unwrap();
        assert_eq!(msgs.len(), 1); // one fragment, 5 traded
        assert_eq!(book.best_bid(), Some(100));
        assert_eq!(book.bid_depth_at(100), 3); // 8 - 5 resting
        assert_eq!(book.best_ask(), None);
    }

    #[test]
    fn idempotent_no_op_flush_produces_no_messages() {
        let mut book = new_book();
        book.submit(market(Buy, 10)).unwrap(); // queues, no opposite liquidity
        let msgs = book.submit(limit(Buy, 50, 5)).unwrap(); // passive, doesn't touch asks
        assert!(msgs.is_empty());
        assert_eq!(book.holding_length(Buy), 1);
    }
}
