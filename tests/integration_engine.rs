//! Integration tests for the engine facade.
//!
//! These point the feeds at unreachable local endpoints so nothing touches
//! the real exchanges; they exercise selection bookkeeping, validation and
//! shutdown, which do not require a live connection.

use std::time::Duration;

use perpbook::config::ReconnectConfig;
use perpbook::types::{Exchange, Symbol};
use perpbook::{Config, Error, FeedEngine};

fn offline_config() -> Config {
    Config::new()
        .with_hyperliquid_ws_url("ws://127.0.0.1:1")
        .with_lighter_ws_url("ws://127.0.0.1:1")
        .with_reconnect(ReconnectConfig::new().initial_delay_ms(10_000))
}

#[tokio::test]
async fn select_validates_markets_synchronously() {
    let engine = FeedEngine::start(offline_config());

    let unknown = Symbol::new(Exchange::Lighter, "DOGE", "USDC");
    match engine.select(unknown.clone()) {
        Err(Error::UnknownMarket(symbol)) => assert_eq!(symbol, unknown),
        other => panic!("expected UnknownMarket, got {other:?}"),
    }
    assert_eq!(engine.selection(), None);

    let weth = Symbol::new(Exchange::Lighter, "WETH", "USDC");
    engine.select(weth.clone()).unwrap();
    assert_eq!(engine.selection(), Some(weth.clone()));

    // reselecting the same market is a no-op
    engine.select(weth.clone()).unwrap();
    assert_eq!(engine.selection(), Some(weth));

    engine.shutdown().await;
}

#[tokio::test]
async fn selection_moves_across_exchanges() {
    let engine = FeedEngine::start(offline_config());

    engine
        .select(Symbol::new(Exchange::Hyperliquid, "BTC", "USD"))
        .unwrap();
    let wbtc = Symbol::new(Exchange::Lighter, "WBTC", "USDC");
    engine.select(wbtc.clone()).unwrap();
    assert_eq!(engine.selection(), Some(wbtc));

    engine.clear_selection().unwrap();
    assert_eq!(engine.selection(), None);

    engine.shutdown().await;
}

#[tokio::test]
async fn depth_is_none_until_a_book_synchronizes() {
    let engine = FeedEngine::start(offline_config());
    engine
        .select(Symbol::new(Exchange::Hyperliquid, "BTC", "USD"))
        .unwrap();

    // unreachable endpoint: the channel must keep reporting no book
    let depth = engine.depth();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(depth.borrow().is_none());

    engine.shutdown().await;
}

#[tokio::test]
async fn status_is_observable_per_exchange() {
    let engine = FeedEngine::start(offline_config());

    assert!(engine.status(Exchange::Hyperliquid).is_some());
    assert!(engine.status(Exchange::Lighter).is_some());

    engine.shutdown().await;
}
