//! Live depth test - streams a real market's order book
//!
//! Usage:
//!   cargo run --example live_depth
//!
//! Optional:
//!   PERPBOOK_EXCHANGE=lighter   # Stream from Lighter (default: hyperliquid)
//!   PERPBOOK_MARKET=ETH         # Base asset (default: BTC on Hyperliquid, WETH on Lighter)

use perpbook::types::{Exchange, Symbol};
use perpbook::{Config, FeedEngine};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("perpbook=info".parse().unwrap()),
        )
        .init();

    let exchange = match std::env::var("PERPBOOK_EXCHANGE")
        .unwrap_or_default()
        .to_lowercase()
        .as_str()
    {
        "lighter" => Exchange::Lighter,
        _ => Exchange::Hyperliquid,
    };
    let symbol = match exchange {
        Exchange::Hyperliquid => Symbol::new(
            exchange,
            std::env::var("PERPBOOK_MARKET").unwrap_or_else(|_| "BTC".to_string()),
            "USD",
        ),
        Exchange::Lighter => Symbol::new(
            exchange,
            std::env::var("PERPBOOK_MARKET").unwrap_or_else(|_| "WETH".to_string()),
            "USDC",
        ),
    };

    println!("=== perpbook live depth ===\n");

    // Fetch the catalog once so there is something to show before the
    // stream synchronizes
    let config = Config::new();
    match perpbook::rest::fetch_markets(&config).await {
        Ok(markets) => println!("catalog: {} markets listed", markets.len()),
        Err(e) => println!("catalog fetch failed (continuing): {e}"),
    }

    let engine = FeedEngine::start(config);
    engine.select(symbol.clone())?;
    println!("streaming {symbol}\n");

    let mut depth = engine.depth();
    let mut printed = 0u32;
    while depth.changed().await.is_ok() {
        let view = depth.borrow().clone();
        match view {
            Some(view) => {
                let bid = view.best_bid().map(|l| l.price);
                let ask = view.best_ask().map(|l| l.price);
                println!(
                    "bid {:?}  ask {:?}  mid {:?}  spread {:?} ({:?}%)  [{} bid / {} ask levels]",
                    bid,
                    ask,
                    view.mid(),
                    view.spread(),
                    view.spread_pct(),
                    view.bids.len(),
                    view.asks.len(),
                );
            }
            None => println!("(no synchronized book)"),
        }

        printed += 1;
        if printed >= 50 {
            break;
        }
    }

    println!("\nlast known prices on {}:", symbol.exchange);
    let mut prices = engine.tickers().all(symbol.exchange);
    prices.sort();
    for (base, price) in prices.into_iter().take(10) {
        println!("  {base}: {price}");
    }

    engine.shutdown().await;
    Ok(())
}
