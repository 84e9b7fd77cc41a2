use derive_more::Display;
use std::borrow::Cow;
use std::collections::VecDeque;
use validator::Validate;

pub type Price = u128;
pub type Quantity = u128;

pub type PriceAndQuantity = (Price, Quantity);
pub type EntryId = u64;
pub type Timestamp = u64;

/// Represents the side of an order in the book.
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[cfg_attr(feature = "cli", value(rename_all = "lower"))]
pub enum Side {
    /// Buy order (bid) - willing to buy at specified price or lower
    Buy,
    /// Sell order (ask) - willing to sell at specified price or higher
    Sell,
}

/// Whether an order rests at a specific price or takes whatever liquidity is available.
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[cfg_attr(feature = "cli", value(rename_all = "lower"))]
pub enum OrderKind {
    /// Limit order - rests at `price` if it doesn't fully cross
    Limit,
    /// Market order - takes whatever liquidity exists, queues the remainder
    Market,
}

#[derive(Display, Debug, Clone, PartialEq, Eq, Hash)]
#[display("{}", symbol)]
pub struct Asset {
    /// Symbol string
    pub symbol: Cow<'static, str>,
    /// Minor units for display/serde (e.g., USD=2, BTC=8)
    pub decimals: u8,
}

impl Asset {
    pub const fn new(symbol: &'static str, decimals: u8) -> Self {
        Self {
            symbol: Cow::Borrowed(symbol),
            decimals,
        }
    }
}

#[derive(Display, Validate, Debug, Clone, PartialEq, Eq, Hash)]
#[display("{}/{}", base, quote)]
pub struct Instrument {
    /// Base asset (e.g., BTC)
    pub base: Asset,
    /// Quote asset (e.g., USDT)
    pub quote: Asset,
}

impl Instrument {
    pub fn new(base: Asset, quote: Asset) -> Self {
        Self { base, quote }
    }
}

/// A caller-submitted order, not yet assigned an entry id.
///
/// Immutable once constructed. `price` must be `Some` for `Limit` orders and
/// `None` for `Market` orders; `OrderBook::submit` rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrder {
    pub side: Side,
    pub kind: OrderKind,
    pub quantity: Quantity,
    pub price: Option<Price>,
}

impl NewOrder {
    pub fn limit(side: Side, price: Price, quantity: Quantity) -> Self {
        Self {
            side,
            kind: OrderKind::Limit,
            quantity,
            price: Some(price),
        }
    }

    pub fn market(side: Side, quantity: Quantity) -> Self {
        Self {
            side,
            kind: OrderKind::Market,
            quantity,
            price: None,
        }
    }
}

/// A resting (or dormant-market) entry tracked by a ladder or holding queue.
///
/// `price` is `Some` for entries resting in a ladder and `None` for market
/// entries parked in a holding queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookEntry {
    pub entry_id: EntryId,
    pub remaining: Quantity,
    pub price: Option<Price>,
}

/// A single price level's time-ordered FIFO of resting entries.
///
/// Invariant: every entry in `orders` shares `price`; empty levels never
/// persist inside a `Ladder` (they are removed as soon as their last order
/// is gone).
#[derive(Debug)]
pub(crate) struct PriceLevel {
    pub(crate) price: Price,
    pub(crate) orders: VecDeque<BookEntry>,
    pub(crate) total_quantity: Quantity,
}

impl PriceLevel {
    pub(crate) fn new(price: Price) -> Self {
        PriceLevel {
            price,
            orders: VecDeque::new(),
            total_quantity: 0,
        }
    }

    pub(crate) fn add_order(&mut self, order: BookEntry) {
        self.total_quantity += order.remaining;
        self.orders.push_back(order);
    }

    /// Removes and returns the order at the front of the queue (oldest at this price).
    pub(crate) fn remove_front(&mut self) -> Option<BookEntry> {
        let order = self.orders.pop_front()?;
        self.total_quantity -= order.remaining;
        Some(order)
    }

    /// Removes a specific order wherever it sits in the queue.
    ///
    /// Used by ladder cancellation, which may target an order that is not
    /// at the head; head-of-book matching only ever calls `remove_front`.
    pub(crate) fn remove_by_id(&mut self, entry_id: EntryId) -> Option<BookEntry> {
        let pos = self.orders.iter().position(|o| o.entry_id == entry_id)?;
        let order = self.orders.remove(pos)?;
        self.total_quantity -= order.remaining;
        Some(order)
    }

    /// Shrinks the front order's remaining quantity after a partial fill.
    pub(crate) fn shrink_front(&mut self, new_remaining: Quantity) {
        if let Some(order) = self.orders.front_mut() {
            let old = order.remaining;
            order.remaining = new_remaining;
            self.total_quantity = self.total_quantity - old + new_remaining;
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// A completed match between a resting maker and an incoming taker.
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
#[display(
    "Trade: {} @ {} (maker: {}, taker: {})",
    quantity,
    price,
    maker_id,
    taker_id
)]
pub struct Trade {
    pub price: Price,
    pub quantity: Quantity,
    pub maker_id: EntryId,
    pub taker_id: EntryId,
}

impl Trade {
    pub fn new(price: Price, quantity: Quantity, maker_id: EntryId, taker_id: EntryId) -> Self {
        Trade {
            price,
            quantity,
            maker_id,
            taker_id,
        }
    }
}

pub type Trades = Vec<Trade>;

/// One fragment of the external market-data message stream.
///
/// Emitted once per matched fragment by `OrderBook::submit`. `bid`/`ask`
/// report the engine's best prices at the moment the fragment was produced;
/// see `OrderBook` for the exact rule governing which side is a constant
/// across a batch and which moves fill by fill.
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
#[display("trade_price={} bid={:?} ask={:?}", trade_price, bid, ask)]
pub struct Message {
    pub bid: Option<Price>,
    pub ask: Option<Price>,
    pub trade_price: Price,
}

/// Error type for order book operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderBookError {
    /// The caller's order failed validation; no state was mutated.
    #[error("invalid order: {reason}")]
    InvalidOrder { reason: String },
    /// `cancel` (or a ladder/holding lookup) referenced an id that isn't resting anywhere.
    #[error("unknown entry id {0}")]
    UnknownEntry(EntryId),
    /// Internal bookkeeping mismatch; indicates a bug, never expected in correct code.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_display_and_new() {
        let btc = Asset::new("BTC", 8);
        assert_eq!(format!("{}", btc), "BTC");
        assert_eq!(btc.symbol, "BTC");
        assert_eq!(btc.decimals, 8);
    }

    fn mk_entry(entry_id: EntryId, remaining: Quantity) -> BookEntry {
        BookEntry {
            entry_id,
            remaining,
            price: Some(0),
        }
    }

    #[test]
    fn price_level_new_and_is_empty() {
        let mut lvl = PriceLevel::new(10);
        assert_eq!(lvl.price, 10);
        assert!(lvl.is_empty());
        assert_eq!(lvl.total_quantity, 0);

        lvl.add_order(mk_entry(1, 5));
        assert!(!lvl.is_empty());
        assert_eq!(lvl.total_quantity, 5);
    }

    #[test]
    fn price_level_add_fifo_and_totals() {
        let mut lvl = PriceLevel::new(42);

        lvl.add_order(mk_entry(1, 30));
        lvl.add_order(mk_entry(2, 20));

        assert_eq!(lvl.orders.len(), 2);
        assert_eq!(lvl.orders.front().unwrap().entry_id, 1);
        assert_eq!(lvl.orders.back().unwrap().entry_id, 2);
        assert_eq!(lvl.total_quantity, 50);
    }

    #[test]
    fn price_level_remove_front_and_shrink() {
        let mut lvl = PriceLevel::new(99);

        lvl.add_order(mk_entry(1, 10));
        lvl.add_order(mk_entry(2, 25));

        lvl.shrink_front(4);
        assert_eq!(lvl.orders.front().unwrap().remaining, 4);
        assert_eq!(lvl.total_quantity, 4 + 25);

        let removed = lvl.remove_front().expect("has front");
        assert_eq!(removed.entry_id, 1);
        assert_eq!(lvl.total_quantity, 25);
        assert_eq!(lvl.orders.front().unwrap().entry_id, 2);

        let removed2 = lvl.remove_front().expect("has second");
        assert_eq!(removed2.entry_id, 2);
        assert_eq!(lvl.total_quantity, 0);
        assert!(lvl.is_empty());
        assert!(lvl.remove_front().is_none());
    }

    #[test]
    fn price_level_remove_by_id_from_middle() {
        let mut lvl = PriceLevel::new(5);
        lvl.add_order(mk_entry(1, 10));
        lvl.add_order(mk_entry(2, 20));
        lvl.add_order(mk_entry(3, 30));

        let removed = lvl.remove_by_id(2).expect("present");
        assert_eq!(removed.remaining, 20);
        assert_eq!(lvl.total_quantity, 40);
        assert_eq!(lvl.orders.iter().map(|o| o.entry_id).collect::<Vec<_>>(), vec![1, 3]);
        assert!(lvl.remove_by_id(2).is_none());
    }
}
