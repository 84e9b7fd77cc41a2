//! # Order Book Core
//!
//! A single-symbol, single-threaded continuous limit order book.
//!
//! This crate provides the core data structures and algorithms for matching
//! limit and market orders under price-time priority, including the
//! self-crossing limit rule and the market-order holding/flush procedure. It
//! emits a deterministic stream of `Message`s describing the book's best
//! prices around every trade.
//!
//! ## Example
//!
//! ```rust
//! use order_book_core::{NewOrder, OrderBook, Side};
//! use order_book_core::types::{Asset, Instrument};
//!
//! // Create a BTC/USDT instrument
//! let usdt = Asset::new("USDT", 2);
//! let btc = Asset::new("BTC", 6);
//! let instrument = Instrument::new(btc, usdt);
//! let mut book = OrderBook::new(instrument);
//!
//! // Place a resting buy order (prices and quantities in minor units)
//! let messages = book.submit(NewOrder::limit(Side::Buy, 10000, 10000)).unwrap();
//! assert!(messages.is_empty()); // nothing to match yet
//!
//! // A crossing sell order matches against it
//! let messages = book.submit(NewOrder::limit(Side::Sell, 10000, 5000)).unwrap();
//! assert_eq!(messages.len(), 1);
//! ```

mod holding;
mod ladder;
pub mod order_book;
#[cfg(test)]
pub(crate) mod test_support;
pub mod types;
mod units;

pub use order_book::OrderBook;
pub use types::{
    BookEntry, EntryId, Message, NewOrder, OrderBookError, OrderKind, Side, Trade, Trades,
};
pub use units::{
    format_price, format_quantity, price_from_minor_units, price_to_minor_units,
    quantity_from_minor_units, quantity_to_minor_units,
};
