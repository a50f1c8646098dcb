//! Order book storage, reconciliation and read-only depth views.
//!
//! `BTreeMap`-backed price levels give O(log k) updates and O(1) best
//! bid/ask; every mutation recomputes an immutable [`DepthView`] with
//! cumulative totals, which is the only shape readers ever see.
//!
//! # Example
//!
//! ```rust
//! use perpbook::orderbook::OrderBook;
//! use perpbook::types::{BookEvent, Exchange, PriceLevel, Symbol};
//!
//! let mut book = OrderBook::new(Symbol::new(Exchange::Hyperliquid, "BTC", "USD"));
//! book.apply(&BookEvent::Snapshot {
//!     bids: vec![PriceLevel::new("100".parse().unwrap(), "5".parse().unwrap())],
//!     asks: vec![PriceLevel::new("101".parse().unwrap(), "4".parse().unwrap())],
//! });
//!
//! let view = book.depth_view(15);
//! assert_eq!(view.spread(), Some("1".parse().unwrap()));
//! ```

pub mod book;
pub mod manager;

pub use book::{BookSide, DepthLevel, DepthView, OrderBook, Side};
pub use manager::{ApplyOutcome, BookManager, BookState};
