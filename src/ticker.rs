//! Last-known price table for all listed markets.
//!
//! [`TickerState`] is the low-frequency companion to the depth engine: it
//! holds one price per `(exchange, base)` pair, fed by the all-symbols
//! mid-price broadcast, by trade prints for the subscribed coin, and by
//! book-derived mids for exchanges without a ticker channel. It powers
//! list/overview displays for *all* markets, not just the selected one.
//!
//! Shared as `Arc<TickerState>` between the feed supervisors (writers) and
//! consumers (readers); a `parking_lot::RwLock` keeps reads cheap.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::types::{Exchange, Price, TickerEvent};

/// Thread-safe symbol -> last-known-price table
#[derive(Debug, Default)]
pub struct TickerState {
    prices: RwLock<FxHashMap<(Exchange, String), Price>>,
}

impl TickerState {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a normalized ticker event from one exchange's feed
    pub fn apply(&self, exchange: Exchange, event: &TickerEvent) {
        match event {
            TickerEvent::MidPrices(mids) => {
                let mut prices = self.prices.write();
                for (base, price) in mids {
                    prices.insert((exchange, base.clone()), *price);
                }
            }
            TickerEvent::LastTrade { base, price } => {
                self.set(exchange, base, *price);
            }
        }
    }

    /// Record a single price (used for book-derived mids)
    pub fn set(&self, exchange: Exchange, base: &str, price: Price) {
        self.prices
            .write()
            .insert((exchange, base.to_string()), price);
    }

    /// Last-known price for one market
    #[must_use]
    pub fn price(&self, exchange: Exchange, base: &str) -> Option<Price> {
        self.prices
            .read()
            .get(&(exchange, base.to_string()))
            .copied()
    }

    /// All known prices for one exchange, unsorted
    #[must_use]
    pub fn all(&self, exchange: Exchange) -> Vec<(String, Price)> {
        self.prices
            .read()
            .iter()
            .filter(|((ex, _), _)| *ex == exchange)
            .map(|((_, base), price)| (base.clone(), *price))
            .collect()
    }

    /// Number of tracked prices across all exchanges
    #[must_use]
    pub fn len(&self) -> usize {
        self.prices.read().len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prices.read().is_empty()
    }
}
