#![cfg(test)]

use crate::types::{Asset, Instrument, Message, Price, Quantity};
use crate::{NewOrder, OrderBook, Side};

pub(crate) fn std_instrument() -> Instrument {
    // Quote: USDT (2 dp) -> tick step 1 minor unit = 0.01
    let usdt = Asset::new("USDT", 2);
    // Base: BTC (6 dp) -> lot step 1_000 minor units = 0.001
    let btc = Asset::new("BTC", 6);
    Instrument::new(btc, usdt)
}

pub(crate) fn new_book() -> OrderBook {
    OrderBook::new(std_instrument())
}

/// Shorthand for a limit `NewOrder` in raw integer minor units.
pub(crate) fn limit(side: Side, price: Price, quantity: Quantity) -> NewOrder {
    NewOrder::limit(side, price, quantity)
}

/// Shorthand for a market `NewOrder` in raw integer minor units.
pub(crate) fn market(side: Side, quantity: Quantity) -> NewOrder {
    NewOrder::market(side, quantity)
}

/// Shorthand for constructing an expected `Message`.
pub(crate) fn msg(bid: Option<Price>, ask: Option<Price>, trade_price: Price) -> Message {
    Message { bid, ask, trade_price }
}
