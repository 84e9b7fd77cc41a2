//! # Order Book CLI
//!
//! A command-line interface for interacting with the order book.
//!
//! This CLI provides commands to place limit and market orders, cancel
//! resting entries, query book state, and run an interactive mode.

use clap::{Parser, Subcommand};
use order_book_core::{
    format_price, format_quantity, price_to_minor_units, quantity_to_minor_units, Message,
    NewOrder, OrderBook, OrderKind, Side,
};
use order_book_core::types::{Asset, Instrument};
use rust_decimal::Decimal;
use std::io::{self, Write};
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "order-book-cli")]
#[command(about = "A limit order book CLI", long_about = None)]
struct Cli {
    /// Base asset symbol (e.g., BTC)
    #[arg(long, default_value = "BTC")]
    base_asset: String,

    /// Base asset decimals (e.g., 6 for BTC satoshis)
    #[arg(long, default_value = "6")]
    base_decimals: u8,

    /// Quote asset symbol (e.g., USDT)
    #[arg(long, default_value = "USDT")]
    quote_asset: String,

    /// Quote asset decimals (e.g., 2 for USDT cents)
    #[arg(long, default_value = "2")]
    quote_decimals: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Place an order in the book
    #[command(name = "place-order")]
    PlaceOrder {
        /// Order side (buy/sell)
        side: Side,
        /// Order kind (limit/market)
        kind: OrderKind,
        /// Quantity in decimal format (e.g., 0.001)
        quantity: String,
        /// Price in decimal format (e.g., 100.50). Required for limit, omitted for market.
        price: Option<String>,
    },
    /// Place a buy order (interactive mode). Omit price for a market order.
    #[command(name = "buy")]
    Buy {
        /// Quantity in decimal format (e.g., 0.001)
        quantity: String,
        /// Price in decimal format; a market order if omitted
        price: Option<String>,
    },
    /// Place a sell order (interactive mode). Omit price for a market order.
    #[command(name = "sell")]
    Sell {
        /// Quantity in decimal format (e.g., 0.001)
        quantity: String,
        /// Price in decimal format; a market order if omitted
        price: Option<String>,
    },
    /// Cancel a resting or held entry by id
    #[command(name = "cancel")]
    Cancel {
        /// Entry id, as returned when the order was placed
        entry_id: u64,
    },
    /// Show current order book state
    #[command(name = "book", aliases = ["state", "b"])]
    Book,
    /// Show best bid and ask prices
    #[command(name = "best")]
    Best,
    /// Show market depth
    #[command(name = "depth")]
    Depth {
        /// Number of levels to show (default: 5)
        #[arg(default_value = "5")]
        levels: usize,
    },
    /// Clear the order book (interactive mode)
    #[command(name = "clear")]
    Clear,
    /// Exit interactive mode
    #[command(name = "quit", aliases = ["exit", "q"])]
    Quit,
    /// Start interactive mode
    #[command(name = "interactive")]
    Interactive,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let base_asset = Asset {
        symbol: cli.base_asset.into(),
        decimals: cli.base_decimals,
    };
    let quote_asset = Asset {
        symbol: cli.quote_asset.into(),
        decimals: cli.quote_decimals,
    };
    let instrument = Instrument::new(base_asset, quote_asset);

    match cli.command {
        None => {
            run_interactive_mode(instrument);
        }
        Some(Commands::PlaceOrder {
            side,
            kind,
            quantity,
            price,
        }) => {
            let mut book = OrderBook::new(instrument);
            match place_order(&mut book, side, kind, price.as_deref(), &quantity) {
                Ok(messages) => print_order_result(&book, None, &messages),
                Err(e) => {
                    eprintln!("Error placing order: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Cancel { entry_id }) => {
            let mut book = OrderBook::new(instrument);
            book.cancel(entry_id);
            println!("Cancel requested for entry {}.", entry_id);
        }
        Some(Commands::Interactive) => {
            run_interactive_mode(instrument);
        }
        Some(Commands::Buy { .. })
        | Some(Commands::Sell { .. })
        | Some(Commands::Book)
        | Some(Commands::Best)
        | Some(Commands::Depth { .. })
        | Some(Commands::Clear)
        | Some(Commands::Quit) => {
            eprintln!("This command is only available in interactive mode.");
            eprintln!("Use: cargo run --bin order-book-cli -- interactive");
            std::process::exit(1);
        }
    }
}

/// Parse interactive command using clap
fn parse_interactive_command(input: &str) -> Result<Commands, String> {
    let args = shlex::split(input).ok_or("Invalid command syntax")?;
    if args.is_empty() {
        return Err("Empty command".to_string());
    }

    let mut full_args = vec!["order-book-cli".to_string()];
    full_args.extend(args);

    match Cli::try_parse_from(full_args) {
        Ok(cli) => match cli.command {
            Some(command) => Ok(command),
            None => Err("Interactive mode not available within interactive mode".to_string()),
        },
        Err(e) => Err(e.to_string()),
    }
}

/// Runs the interactive REPL mode
fn run_interactive_mode(instrument: Instrument) {
    println!("=== Order Book Interactive CLI ===");
    println!("Type 'help' for available commands, 'quit' to exit\n");

    let mut book = OrderBook::new(instrument);

    println!("Instrument: {}\n", book.instrument);

    loop {
        print!("> ");
        io::stdout().flush().unwrap();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(_) => {
                let trimmed = input.trim();
                if trimmed.is_empty() {
                    continue;
                }

                match parse_interactive_command(trimmed) {
                    Ok(command) => match command {
                        Commands::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        Commands::Buy { quantity, price } => {
                            let kind = if price.is_some() {
                                OrderKind::Limit
                            } else {
                                OrderKind::Market
                            };
                            match place_order(&mut book, Side::Buy, kind, price.as_deref(), &quantity) {
                                Ok(messages) => {
                                    print_order_result(&book, None, &messages);
                                    print_book_summary(&book);
                                }
                                Err(e) => println!("\u{274c} Error: {}", e),
                            }
                        }
                        Commands::Sell { quantity, price } => {
                            let kind = if price.is_some() {
                                OrderKind::Limit
                            } else {
                                OrderKind::Market
                            };
                            match place_order(&mut book, Side::Sell, kind, price.as_deref(), &quantity) {
                                Ok(messages) => {
                                    print_order_result(&book, None, &messages);
                                    print_book_summary(&book);
                                }
                                Err(e) => println!("\u{274c} Error: {}", e),
                            }
                        }
                        Commands::Cancel { entry_id } => {
                            book.cancel(entry_id);
                            println!("\u{1f5d1}\u{fe0f}  Cancel requested for entry {}.", entry_id);
                            print_book_summary(&book);
                        }
                        Commands::Book => print_book_state(&book),
                        Commands::Best => print_best_prices(&book),
                        Commands::Clear => {
                            let instrument = book.instrument.clone();
                            book = OrderBook::new(instrument);
                            println!("\u{1f4dd} Order book cleared.");
                        }
                        Commands::Depth { levels } => {
                            print_market_depth(&book, levels);
                        }
                        Commands::PlaceOrder { .. } | Commands::Interactive => {
                            println!("\u{274c} Command not available in interactive mode.");
                        }
                    },
                    Err(e) => {
                        if trimmed.trim() == "help" || trimmed.trim() == "h" {
                            show_help();
                        } else if e.contains("unexpected argument") || e.contains("invalid value") {
                            println!("\u{274c} Invalid command. Type 'help' for available commands.");
                        } else if e.contains("required arguments")
                            || e.contains("The following required arguments")
                        {
                            println!("\u{274c} Missing required arguments. Type 'help' for usage.");
                        } else {
                            println!("\u{274c} Error: {}", e.lines().next().unwrap_or("Invalid command"));
                        }
                    }
                }
            }
            Err(error) => {
                println!("Error reading input: {}", error);
                break;
            }
        }
    }
}

fn show_help() {
    println!("\u{1f4da} Available Commands:");
    println!("  buy <quantity> [price]         - Place a buy order; a market order if price is omitted");
    println!("  sell <quantity> [price]        - Place a sell order; a market order if price is omitted");
    println!("  cancel <entry_id>              - Cancel a resting or held entry");
    println!("  book | state | b               - Show current order book state");
    println!("  best                           - Show best bid and ask prices");
    println!("  depth [levels]                 - Show market depth (default: 5 levels)");
    println!("  clear                          - Clear the order book");
    println!("  help | h                       - Show this help message");
    println!("  quit | exit | q                - Exit the CLI");
    println!();
    println!("\u{1f4a1} Tips:");
    println!("  - Prices and quantities use decimal format (e.g., 100.50, 0.001)");
    println!("  - Entry ids are assigned by the book when an order is accepted");
    println!("  - Orders are matched using price-time priority");
    println!();
}

fn place_order(
    book: &mut OrderBook,
    side: Side,
    kind: OrderKind,
    price_str: Option<&str>,
    quantity_str: &str,
) -> Result<Vec<Message>, String> {
    let quantity_decimal =
        Decimal::from_str(quantity_str).map_err(|_| format!("Invalid quantity format: {}", quantity_str))?;
    let quantity_minor = quantity_to_minor_units(quantity_decimal, &book.instrument.base)
        .ok_or("Quantity too large to convert to minor units")?;

    let order = match kind {
        OrderKind::Limit => {
            let price_str = price_str.ok_or("Limit order requires a price")?;
            let price_decimal = Decimal::from_str(price_str)
                .map_err(|_| format!("Invalid price format: {}", price_str))?;
            let price_minor = price_to_minor_units(price_decimal, &book.instrument.quote)
                .ok_or("Price too large to convert to minor units")?;
            NewOrder::limit(side, price_minor, quantity_minor)
        }
        OrderKind::Market => {
            if price_str.is_some() {
                return Err("Market order must not specify a price".to_string());
            }
            NewOrder::market(side, quantity_minor)
        }
    };

    book.submit(order).map_err(|e| e.to_string())
}

fn print_order_result(book: &OrderBook, order_label: Option<&str>, messages: &[Message]) {
    if let Some(label) = order_label {
        println!("{}", label);
    }
    if messages.is_empty() {
        println!("Order placed. No trades executed.");
    } else {
        println!("Order executed! Messages:");
        for m in messages {
            let bid_str = m
                .bid
                .map(|p| format_price(p, &book.instrument.quote))
                .unwrap_or_else(|| "none".to_string());
            let ask_str = m
                .ask
                .map(|p| format_price(p, &book.instrument.quote))
                .unwrap_or_else(|| "none".to_string());
            let trade_str = format_price(m.trade_price, &book.instrument.quote);
            println!("  trade @ {} (bid: {}, ask: {})", trade_str, bid_str, ask_str);
        }
    }
}

fn print_book_state(book: &OrderBook) {
    println!("\n\u{1f4ca} Order Book State:");
    print_best_prices(book);
    print_market_depth(book, 3);
    println!();
}

fn print_best_prices(book: &OrderBook) {
    match (book.best_bid(), book.best_ask()) {
        (Some(bid), Some(ask)) => {
            let bid_str = format_price(bid, &book.instrument.quote);
            let ask_str = format_price(ask, &book.instrument.quote);
            let spread_str = format_price(ask - bid, &book.instrument.quote);
            println!("  \u{1f49a} Best BID: {}", bid_str);
            println!("  \u{2764}\u{fe0f}  Best ASK: {}", ask_str);
            println!("  \u{1f4cf} Spread:   {}", spread_str);
        }
        (Some(bid), None) => {
            println!("  \u{1f49a} Best BID: {}", format_price(bid, &book.instrument.quote));
            println!("  \u{2764}\u{fe0f}  Best ASK: None");
        }
        (None, Some(ask)) => {
            println!("  \u{1f49a} Best BID: None");
            println!("  \u{2764}\u{fe0f}  Best ASK: {}", format_price(ask, &book.instrument.quote));
        }
        (None, None) => {
            println!("  \u{1f4ed} Order book is empty");
        }
    }
}

fn print_market_depth(book: &OrderBook, levels: usize) {
    let mut sell_depth = Vec::new();
    let mut buy_depth = Vec::new();
    // Depth is reported only at the best price per side; deeper levels are an
    // internal ladder detail the book doesn't expose beyond best/level query.
    if let Some(ask) = book.best_ask() {
        sell_depth.push((ask, book.ask_depth_at(ask)));
    }
    if let Some(bid) = book.best_bid() {
        buy_depth.push((bid, book.bid_depth_at(bid)));
    }
    let _ = levels;

    if !sell_depth.is_empty() || !buy_depth.is_empty() {
        println!("  \u{1f4c8} Market Depth:");
        for (price, qty) in sell_depth.iter().rev() {
            let price_str = format_price(*price, &book.instrument.quote);
            let qty_str = format_quantity(*qty, &book.instrument.base);
            println!("    \u{1f534} {} @ {}", qty_str, price_str);
        }
        if !sell_depth.is_empty() && !buy_depth.is_empty() {
            println!("    \u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}");
        }
        for (price, qty) in &buy_depth {
            let price_str = format_price(*price, &book.instrument.quote);
            let qty_str = format_quantity(*qty, &book.instrument.base);
            println!("    \u{1f7e2} {} @ {}", qty_str, price_str);
        }
    }
}

fn print_book_summary(book: &OrderBook) {
    match (book.best_bid(), book.best_ask()) {
        (Some(bid), Some(ask)) => {
            println!(
                "\u{1f4ca} Best: {} | {}",
                format_price(bid, &book.instrument.quote),
                format_price(ask, &book.instrument.quote)
            );
        }
        (Some(bid), None) => {
            println!("\u{1f4ca} Best: {} | No asks", format_price(bid, &book.instrument.quote));
        }
        (None, Some(ask)) => {
            println!("\u{1f4ca} Best: No bids | {}", format_price(ask, &book.instrument.quote));
        }
        (None, None) => {
            println!("\u{1f4ca} Order book is empty");
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_cmd::Command;
    use predicates::prelude::*;

    fn get_cli_command() -> Command {
        Command::cargo_bin("order-book-cli").unwrap_or_else(|e| {
            panic!(
                "CLI binary not found. Please run 'cargo build --bin order-book-cli' first.\nOriginal error: {}",
                e
            );
        })
    }

    #[test]
    fn test_place_limit_buy_order_no_match() {
        let mut cmd = get_cli_command();
        cmd.args(&["place-order", "buy", "limit", "10", "100"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Order placed. No trades executed."));
    }

    #[test]
    fn test_place_market_order_on_empty_book() {
        let mut cmd = get_cli_command();
        cmd.args(&["place-order", "buy", "market", "10"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Order placed. No trades executed."));
    }

    #[test]
    fn test_market_order_with_price_is_rejected() {
        let mut cmd = get_cli_command();
        cmd.args(&["place-order", "buy", "market", "100", "10"])
            .assert()
            .failure();
    }

    #[test]
    fn test_best_empty_book() {
        let mut cmd = get_cli_command();
        cmd.arg("best").assert().failure();
    }

    #[test]
    fn test_case_sensitive_side() {
        let mut cmd = get_cli_command();
        cmd.args(&["place-order", "BUY", "limit", "10", "100"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid value"));
    }

    #[test]
    fn test_invalid_price() {
        let mut cmd = get_cli_command();
        cmd.args(&["place-order", "buy", "limit", "10", "not_a_number"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error placing order"));
    }

    #[test]
    fn test_invalid_quantity() {
        let mut cmd = get_cli_command();
        cmd.args(&["place-order", "buy", "limit", "not_a_number", "100"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error placing order"));
    }

    #[test]
    fn test_missing_arguments() {
        let mut cmd = get_cli_command();
        cmd.args(&["place-order", "buy"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn test_help_command() {
        let mut cmd = get_cli_command();
        cmd.arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("A limit order book CLI"))
            .stdout(predicate::str::contains("Commands:"))
            .stdout(predicate::str::contains("place-order"))
            .stdout(predicate::str::contains("cancel"));
    }

    #[test]
    fn test_no_subcommand_starts_interactive() {
        let mut cmd = get_cli_command();
        cmd.write_stdin("quit\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("=== Order Book Interactive CLI ==="));
    }

    #[test]
    fn test_zero_quantity() {
        let mut cmd = get_cli_command();
        cmd.args(&["place-order", "buy", "limit", "0", "100"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error placing order"));
    }
}
