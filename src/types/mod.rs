//! Core types shared across the engine.
//!
//! - [`market`] - Exchange, symbol and market-catalog types
//! - [`messages`] - Wire frames for both exchanges and the normalized events
//!   they decode into
//!
//! Prices and sizes are [`rust_decimal::Decimal`]. Both exchanges quote them
//! as decimal strings on the wire; `Decimal` keeps the arithmetic exact and
//! provides the total order the book's `BTreeMap` keys require.

pub mod market;
pub mod messages;

pub use market::{Exchange, Market, Symbol};
pub use messages::{BookEvent, FeedEvent, TickerEvent};

/// Price of one level, in the market's quote currency
pub type Price = rust_decimal::Decimal;

/// Size resting at one level, in the market's base currency
pub type Size = rust_decimal::Decimal;

/// A single `(price, size)` level as listed in a snapshot or delta frame.
///
/// Invariant for *stored* levels: `size > 0`. A level listed with
/// `size == 0` in a delta frame is an instruction to remove the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceLevel {
    /// Level price
    pub price: Price,
    /// Aggregate size at this price
    pub size: Size,
}

impl PriceLevel {
    /// Create a new price level
    #[must_use]
    pub const fn new(price: Price, size: Size) -> Self {
        Self { price, size }
    }
}
