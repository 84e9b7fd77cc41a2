//! # Order Book Demo
//!
//! Demonstrates various features and behaviors of the order book implementation.
//!
//! This demo shows:
//! - Basic order matching
//! - Partial fills
//! - Price-time priority
//! - Complex market scenarios crossing multiple levels
//! - Market orders on an empty book (holding queue)
//! - The flush procedure re-engaging a held market order

use order_book_core::types::{Asset, Instrument};
use order_book_core::{
    format_price, format_quantity, price_to_minor_units, quantity_to_minor_units, Message,
    NewOrder, OrderBook, OrderBookError, Side,
};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Main entry point that runs all demo scenarios.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Limit Order Book Demo ===\n");

    let btc = Asset::new("BTC", 6); // Base: BTC (6 decimals)
    let usdt = Asset::new("USDT", 2); // Quote: USDT (2 decimals)
    let instrument = Instrument::new(btc, usdt);

    println!("Instrument details: {}", instrument);
    let mut book1 = OrderBook::new(instrument.clone());
    demo_basic_matching(&mut book1);

    let mut book2 = OrderBook::new(instrument.clone());
    demo_partial_fills(&mut book2);

    let mut book3 = OrderBook::new(instrument.clone());
    demo_price_time_priority(&mut book3);

    let mut book4 = OrderBook::new(instrument.clone());
    demo_complex_scenario(&mut book4);

    let mut book5 = OrderBook::new(instrument.clone());
    demo_market_order_on_empty_book(&mut book5);

    let mut book6 = OrderBook::new(instrument);
    demo_market_flush_reengage(&mut book6);
}

/// Demonstrates basic order matching between buy and sell orders.
///
/// Shows how a buy order at a specific price matches exactly with
/// a sell order at the same price.
fn demo_basic_matching(book: &mut OrderBook) {
    println!("-----------------------");
    println!("1. Basic Matching Demo:");
    println!("-----------------------");

    let messages =
        place_limit_decimal(book, Side::Buy, "100.00", "0.010").expect("failed to place buy order");
    print_messages(&messages, book);
    print_book_state(book);

    let messages =
        place_limit_decimal(book, Side::Sell, "100.00", "0.010").expect("failed to place sell order");
    print_messages(&messages, book);
    print_book_state(book);
}

/// Demonstrates partial order fills.
///
/// Shows what happens when orders are only partially matched,
/// leaving remaining quantity in the book.
fn demo_partial_fills(book: &mut OrderBook) {
    println!("---------------------");
    println!("2. Partial Fill Demo:");
    println!("---------------------");

    place_limit_decimal(book, Side::Buy, "100.00", "0.015").expect("failed to place buy order");

    let messages =
        place_limit_decimal(book, Side::Sell, "100.00", "0.010").expect("failed to place sell order");
    print_messages(&messages, book);
    print_book_state(book);

    let messages =
        place_limit_decimal(book, Side::Sell, "100.00", "0.010").expect("failed to place sell order");
    print_messages(&messages, book);
    print_book_state(book);
}

/// Demonstrates price-time priority matching rules.
///
/// Shows how orders are matched first by best price, then by
/// arrival time (FIFO) for orders at the same price level.
fn demo_price_time_priority(book: &mut OrderBook) {
    println!("----------------------------");
    println!("3. Price-Time Priority Demo:");
    println!("----------------------------");

    place_limit_decimal(book, Side::Buy, "99.00", "0.010").unwrap();
    place_limit_decimal(book, Side::Buy, "100.00", "0.010").unwrap();
    place_limit_decimal(book, Side::Buy, "100.00", "0.010").unwrap();

    print_book_state(book);

    let messages = place_limit_decimal(book, Side::Sell, "99.00", "0.025").unwrap();

    print_messages(&messages, book);

    print_book_state(book);
}

/// Demonstrates a complex market scenario with multiple price levels.
///
/// Shows aggressive orders that cross the spread and match against
/// multiple price levels, illustrating realistic market behavior.
fn demo_complex_scenario(book: &mut OrderBook) {
    println!("---------------------------");
    println!("4. Complex Market Scenario:");
    println!("---------------------------");

    println!("Building initial order book:");
    place_limit_decimal(book, Side::Buy, "98.00", "0.020").unwrap();
    place_limit_decimal(book, Side::Buy, "99.00", "0.015").unwrap();
    place_limit_decimal(book, Side::Buy, "100.00", "0.010").unwrap();
    place_limit_decimal(book, Side::Sell, "101.00", "0.010").unwrap();
    place_limit_decimal(book, Side::Sell, "102.00", "0.015").unwrap();
    place_limit_decimal(book, Side::Sell, "103.00", "0.020").unwrap();

    print_book_state(book);

    println!("\nLarge aggressive BUY order crosses spread:");
    let messages = place_limit_decimal(book, Side::Buy, "102.00", "0.030").unwrap();
    print_messages(&messages, book);
    print_book_state(book);

    println!("\nLarge aggressive SELL order:");
    let messages = place_limit_decimal(book, Side::Sell, "98.00", "0.040").unwrap();
    print_messages(&messages, book);
    print_book_state(book);
}

/// Demonstrates a market order arriving with nothing to match against.
///
/// The order has no price to rest at, so instead of resting it is parked in
/// the side's holding queue until a future opposite-side order gives the
/// flush procedure something to match it against.
fn demo_market_order_on_empty_book(book: &mut OrderBook) {
    println!("-------------------------------------");
    println!("5. Market Order On Empty Book Demo:");
    println!("-------------------------------------");

    let messages = place_market_decimal(book, Side::Buy, "0.010").expect("failed to place market order");
    print_messages(&messages, book);
    println!("--Holding queue (buy side) length: {}", book.holding_length(Side::Buy));
    print_book_state(book);
}

/// Demonstrates the flush procedure.
///
/// A held market buy sits dormant until a resting sell order arrives that
/// doesn't cross the (empty) bid side directly, but does give the flush loop
/// liquidity to match the held order against immediately after the sell
/// rests.
fn demo_market_flush_reengage(book: &mut OrderBook) {
    println!("---------------------------------");
    println!("6. Market Flush Re-Engage Demo:");
    println!("---------------------------------");

    println!("Queuing a market buy with nothing to match against:");
    let messages = place_market_decimal(book, Side::Buy, "0.015").expect("failed to place market order");
    print_messages(&messages, book);
    println!("--Holding queue (buy side) length: {}", book.holding_length(Side::Buy));

    println!("\nResting sell order arrives; the flush loop matches it against the held buy:");
    let messages = place_limit_decimal(book, Side::Sell, "100.00", "0.015").unwrap();
    print_messages(&messages, book);
    println!("--Holding queue (buy side) length: {}", book.holding_length(Side::Buy));
    print_book_state(book);
}

/// Prints a list of emitted messages in a formatted way.
fn print_messages(messages: &[Message], book: &OrderBook) {
    if messages.is_empty() {
        println!("--No trades executed");
    } else {
        println!("--Trades executed:");
        for m in messages {
            let trade_str = format_price(m.trade_price, &book.instrument.quote);
            let bid_str = m
                .bid
                .map(|p| format_price(p, &book.instrument.quote))
                .unwrap_or_else(|| "none".to_string());
            let ask_str = m
                .ask
                .map(|p| format_price(p, &book.instrument.quote))
                .unwrap_or_else(|| "none".to_string());
            println!("----Trade @ {} (bid: {}, ask: {})", trade_str, bid_str, ask_str);
        }
    }
}

/// Prints the current state of the order book showing best bid and ask.
fn print_book_state(book: &OrderBook) {
    println!("--Book state:");
    match book.best_bid() {
        Some(price) => {
            let qty_str = format_quantity(book.bid_depth_at(price), &book.instrument.base);
            println!("----Best BID: {} @ {}", qty_str, format_price(price, &book.instrument.quote));
        }
        None => println!("----Best BID: None"),
    }
    match book.best_ask() {
        Some(price) => {
            let qty_str = format_quantity(book.ask_depth_at(price), &book.instrument.base);
            println!("----Best ASK: {} @ {}", qty_str, format_price(price, &book.instrument.quote));
        }
        None => println!("----Best ASK: None"),
    }
    println!();
}

/// Helper to convert decimal values to minor units for a limit order.
fn place_limit_decimal(
    book: &mut OrderBook,
    side: Side,
    price_decimal: &str,
    quantity_decimal: &str,
) -> Result<Vec<Message>, OrderBookError> {
    println!("--Placing {} limit order: Price={}, Qty={}", side, price_decimal, quantity_decimal);
    let price = Decimal::from_str(price_decimal).unwrap();
    let quantity = Decimal::from_str(quantity_decimal).unwrap();

    let price_minor = price_to_minor_units(price, &book.instrument.quote).unwrap();
    let quantity_minor = quantity_to_minor_units(quantity, &book.instrument.base).unwrap();

    book.submit(NewOrder::limit(side, price_minor, quantity_minor))
}

/// Helper to convert a decimal quantity to minor units for a market order.
fn place_market_decimal(
    book: &mut OrderBook,
    side: Side,
    quantity_decimal: &str,
) -> Result<Vec<Message>, OrderBookError> {
    println!("--Placing {} market order: Qty={}", side, quantity_decimal);
    let quantity = Decimal::from_str(quantity_decimal).unwrap();
    let quantity_minor = quantity_to_minor_units(quantity, &book.instrument.base).unwrap();

    book.submit(NewOrder::market(side, quantity_minor))
}
