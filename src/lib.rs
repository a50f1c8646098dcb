//! # perpbook
//!
//! Real-time order book synchronization for perpetual futures across
//! multiple exchanges (currently [Hyperliquid](https://hyperliquid.xyz)
//! and [Lighter](https://lighter.xyz)).
//!
//! ## Features
//!
//! - **Exchange Adapters** - One wire dialect per exchange, normalized into
//!   common snapshot/delta events
//! - **Book Reconciliation** - Per-market state machine that never serves an
//!   unsynchronized or crossed book
//! - **Supervised Feeds** - Per-exchange WebSocket tasks with automatic
//!   reconnect and resubscribe
//! - **Unified Depth Channel** - One `watch` channel carrying the selected
//!   market's depth, whichever exchange it lives on
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use perpbook::{Config, FeedEngine};
//! use perpbook::types::{Exchange, Symbol};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), perpbook::Error> {
//!     let engine = FeedEngine::start(Config::new());
//!     engine.select(Symbol::new(Exchange::Hyperliquid, "BTC", "USD"))?;
//!
//!     let mut depth = engine.depth();
//!     while depth.changed().await.is_ok() {
//!         if let Some(view) = depth.borrow().as_ref() {
//!             println!("bid {:?} / ask {:?}", view.best_bid(), view.best_ask());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Price Representation
//!
//! Exchanges send prices and sizes as decimal strings. The crate parses them
//! into [`rust_decimal::Decimal`] at the adapter boundary: exact decimal
//! arithmetic, a total order for sorted book sides, and no float drift in
//! cumulative totals. Frames with unparseable numbers are dropped whole.
//!
//! ## Architecture
//!
//! - [`exchange`] - Protocol adapters translating each exchange's dialect
//! - [`orderbook`] - Sorted book sides, the reconciler state machine, and
//!   depth views
//! - [`feed`] - Per-exchange connection supervision
//! - [`router`] - The [`FeedEngine`] facade and unified depth routing
//! - [`ticker`] - Last-known prices across all markets
//! - [`rest`] - One-shot market catalog discovery
//! - [`types`] - Markets, symbols, and normalized feed events
//!
//! ## Performance
//!
//! The hot path is frame decode plus one book mutation:
//!
//! - `BTreeMap` price levels, O(log n) per delta
//! - `FxHashMap` for small-key lookups
//! - `parking_lot` locks on the ticker table
//! - Depth views truncate to the configured depth before leaving the feed
//!   task, so consumers never clone full books

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod exchange;
pub mod feed;
pub mod orderbook;
pub mod rest;
pub mod router;
pub mod ticker;
pub mod types;

// Re-export main types at crate root for convenience
pub use config::Config;
pub use error::Error;
pub use router::FeedEngine;

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;
