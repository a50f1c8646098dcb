//! Core order book data structures.
//!
//! One [`BookSide`] holds the resident price levels for one direction of one
//! market in a `BTreeMap`, giving:
//!
//! - O(log k) insertion, overwrite and removal
//! - O(1) access to the best level
//! - Price-sorted, best-first iteration (bids descending, asks ascending)
//!
//! [`OrderBook`] pairs two sides and applies normalized [`BookEvent`]s;
//! [`DepthView`] is the immutable, depth-limited snapshot handed to readers.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{BookEvent, Price, PriceLevel, Size, Symbol};

/// Direction of one side of the book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Buy side; iterates highest price first
    Bid,
    /// Sell side; iterates lowest price first
    Ask,
}

/// Sorted store of price levels for one side of one market.
///
/// Invariants: stored sizes are strictly positive (an upsert with size zero
/// removes the level), and prices are unique within the side.
#[derive(Debug, Clone)]
pub struct BookSide {
    side: Side,
    levels: BTreeMap<Price, Size>,
}

impl BookSide {
    /// Create an empty side
    #[must_use]
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    /// Which direction this side holds
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Insert or overwrite a level; a zero size removes the level instead
    /// (no-op if absent). Negative sizes are rejected upstream and never
    /// reach the store.
    pub fn upsert(&mut self, price: Price, size: Size) {
        if size.is_zero() {
            self.levels.remove(&price);
        } else {
            self.levels.insert(price, size);
        }
    }

    /// Best level: highest bid or lowest ask
    #[must_use]
    pub fn best(&self) -> Option<PriceLevel> {
        let entry = match self.side {
            Side::Bid => self.levels.last_key_value(),
            Side::Ask => self.levels.first_key_value(),
        };
        entry.map(|(&price, &size)| PriceLevel::new(price, size))
    }

    /// Iterate levels best-first
    pub fn iter(&self) -> impl Iterator<Item = PriceLevel> + '_ {
        let inner: Box<dyn Iterator<Item = (&Price, &Size)>> = match self.side {
            Side::Bid => Box::new(self.levels.iter().rev()),
            Side::Ask => Box::new(self.levels.iter()),
        };
        inner.map(|(&price, &size)| PriceLevel::new(price, size))
    }

    /// Best `n` levels in side order
    #[must_use]
    pub fn top(&self, n: usize) -> Vec<PriceLevel> {
        self.iter().take(n).collect()
    }

    /// Drop every level
    pub fn clear(&mut self) {
        self.levels.clear();
    }

    /// Replace the whole side with the listed levels
    pub fn replace(&mut self, levels: &[PriceLevel]) {
        self.levels.clear();
        for level in levels {
            self.upsert(level.price, level.size);
        }
    }

    /// Number of resident levels
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether the side holds no levels
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Order book for a single market.
///
/// Not internally synchronized; each book is owned by exactly one feed
/// supervisor task, which applies events in arrival order. Readers only ever
/// see [`DepthView`] snapshots.
#[derive(Debug, Clone)]
pub struct OrderBook {
    symbol: Symbol,
    bids: BookSide,
    asks: BookSide,
    /// Count of events applied since the last snapshot reset
    updates: u64,
}

impl OrderBook {
    /// Create a new empty book for the given market
    #[must_use]
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            bids: BookSide::new(Side::Bid),
            asks: BookSide::new(Side::Ask),
            updates: 0,
        }
    }

    /// Market this book belongs to
    #[must_use]
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Bid side
    #[must_use]
    pub fn bids(&self) -> &BookSide {
        &self.bids
    }

    /// Ask side
    #[must_use]
    pub fn asks(&self) -> &BookSide {
        &self.asks
    }

    /// Apply a normalized depth event.
    ///
    /// Snapshots replace both sides wholesale and are always safe to apply;
    /// deltas upsert/remove exactly the listed levels. Levels listed with a
    /// negative price or size are skipped.
    pub fn apply(&mut self, event: &BookEvent) {
        match event {
            BookEvent::Snapshot { bids, asks } => {
                self.bids.replace(&sanitize(bids));
                self.asks.replace(&sanitize(asks));
            }
            BookEvent::Delta { bids, asks } => {
                for level in sanitize(bids) {
                    self.bids.upsert(level.price, level.size);
                }
                for level in sanitize(asks) {
                    self.asks.upsert(level.price, level.size);
                }
            }
        }
        self.updates += 1;
    }

    /// Best bid level
    #[must_use]
    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.bids.best()
    }

    /// Best ask level
    #[must_use]
    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.asks.best()
    }

    /// Mid price: average of best bid and best ask
    #[must_use]
    pub fn mid(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid.price + ask.price) / Decimal::from(2)),
            _ => None,
        }
    }

    /// Best-ask minus best-bid
    #[must_use]
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.price - bid.price),
            _ => None,
        }
    }

    /// Whether best bid >= best ask. A crossed book means the feed handed
    /// us inconsistent state and a fresh snapshot is required.
    #[must_use]
    pub fn is_crossed(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => bid.price >= ask.price,
            _ => false,
        }
    }

    /// Whether both sides are empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Drop all levels and reset the update counter
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.updates = 0;
    }

    /// Build the depth-limited, read-only view with cumulative totals.
    ///
    /// Totals are prefix sums from the best price outward, so they are
    /// monotonically non-decreasing within each side.
    #[must_use]
    pub fn depth_view(&self, depth: usize) -> DepthView {
        DepthView {
            symbol: self.symbol.clone(),
            bids: accumulate(self.bids.top(depth)),
            asks: accumulate(self.asks.top(depth)),
            updates: self.updates,
        }
    }
}

fn sanitize(levels: &[PriceLevel]) -> Vec<PriceLevel> {
    levels
        .iter()
        .filter(|l| l.price.is_sign_positive() && !l.size.is_sign_negative())
        .copied()
        .collect()
}

fn accumulate(levels: Vec<PriceLevel>) -> Vec<DepthLevel> {
    let mut total = Decimal::ZERO;
    levels
        .into_iter()
        .map(|level| {
            total += level.size;
            DepthLevel {
                price: level.price,
                size: level.size,
                total,
            }
        })
        .collect()
}

/// One row of a [`DepthView`]: a level plus the running total from the best
/// price down to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DepthLevel {
    /// Level price
    pub price: Price,
    /// Size at this level
    pub size: Size,
    /// Cumulative size from the best level through this one
    pub total: Size,
}

/// Immutable, depth-limited snapshot of one market's book.
///
/// A new view is produced per reconciliation; views are never mutated in
/// place, so readers can hold them without any torn-read hazard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepthView {
    /// Market the view describes
    pub symbol: Symbol,
    /// Top bid levels, best (highest) first
    pub bids: Vec<DepthLevel>,
    /// Top ask levels, best (lowest) first
    pub asks: Vec<DepthLevel>,
    /// Events applied to the book since its last snapshot reset
    pub updates: u64,
}

impl DepthView {
    /// Best bid row, if any
    #[must_use]
    pub fn best_bid(&self) -> Option<&DepthLevel> {
        self.bids.first()
    }

    /// Best ask row, if any
    #[must_use]
    pub fn best_ask(&self) -> Option<&DepthLevel> {
        self.asks.first()
    }

    /// Mid price, when both sides are non-empty
    #[must_use]
    pub fn mid(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid.price + ask.price) / Decimal::from(2)),
            _ => None,
        }
    }

    /// Absolute spread, when both sides are non-empty
    #[must_use]
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.price - bid.price),
            _ => None,
        }
    }

    /// Spread as a percentage of the mid price
    #[must_use]
    pub fn spread_pct(&self) -> Option<Price> {
        let spread = self.spread()?;
        let mid = self.mid()?;
        if mid.is_zero() {
            return None;
        }
        Some(spread / mid * Decimal::from(100))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Exchange;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn lvl(price: &str, size: &str) -> PriceLevel {
        PriceLevel::new(d(price), d(size))
    }

    fn sym() -> Symbol {
        Symbol::new(Exchange::Hyperliquid, "BTC", "USD")
    }

    #[test]
    fn test_upsert_zero_removes() {
        let mut side = BookSide::new(Side::Bid);
        side.upsert(d("100"), d("5"));
        side.upsert(d("100"), d("0"));
        assert!(side.is_empty());

        // removing an absent level is a no-op
        side.upsert(d("99"), d("0"));
        assert!(side.is_empty());
    }

    #[test]
    fn test_zero_size_never_stored() {
        let mut side = BookSide::new(Side::Ask);
        side.upsert(d("101"), d("4"));
        side.upsert(d("102"), d("2"));
        side.upsert(d("101"), d("0"));
        assert!(side.iter().all(|l| l.size > Decimal::ZERO));
        assert_eq!(side.len(), 1);
    }

    #[test]
    fn test_bid_iteration_descending() {
        let mut side = BookSide::new(Side::Bid);
        side.upsert(d("99"), d("3"));
        side.upsert(d("100"), d("5"));
        side.upsert(d("98.5"), d("1"));

        let prices: Vec<Price> = side.iter().map(|l| l.price).collect();
        assert_eq!(prices, vec![d("100"), d("99"), d("98.5")]);
        assert_eq!(side.best(), Some(lvl("100", "5")));
    }

    #[test]
    fn test_ask_iteration_ascending() {
        let mut side = BookSide::new(Side::Ask);
        side.upsert(d("102"), d("2"));
        side.upsert(d("101"), d("4"));

        let prices: Vec<Price> = side.iter().map(|l| l.price).collect();
        assert_eq!(prices, vec![d("101"), d("102")]);
        assert_eq!(side.best(), Some(lvl("101", "4")));
    }

    #[test]
    fn test_snapshot_replaces_prior_state() {
        let mut book = OrderBook::new(sym());
        book.apply(&BookEvent::Delta {
            bids: vec![lvl("95", "1"), lvl("96", "2")],
            asks: vec![lvl("110", "7")],
        });

        book.apply(&BookEvent::Snapshot {
            bids: vec![lvl("100", "5"), lvl("99", "3")],
            asks: vec![lvl("101", "4"), lvl("102", "2")],
        });

        let bid_prices: Vec<Price> = book.bids().iter().map(|l| l.price).collect();
        assert_eq!(bid_prices, vec![d("100"), d("99")]);
        let ask_prices: Vec<Price> = book.asks().iter().map(|l| l.price).collect();
        assert_eq!(ask_prices, vec![d("101"), d("102")]);
    }

    #[test]
    fn test_depth_view_scenario() {
        // bids=[(100,5),(99,3)] asks=[(101,4),(102,2)]
        let mut book = OrderBook::new(sym());
        book.apply(&BookEvent::Snapshot {
            bids: vec![lvl("100", "5"), lvl("99", "3")],
            asks: vec![lvl("101", "4"), lvl("102", "2")],
        });

        let view = book.depth_view(15);
        assert_eq!(view.best_bid().unwrap().price, d("100"));
        assert_eq!(view.best_bid().unwrap().size, d("5"));
        assert_eq!(view.best_ask().unwrap().price, d("101"));
        assert_eq!(view.best_ask().unwrap().size, d("4"));
        assert_eq!(view.spread(), Some(d("1")));

        let bid_totals: Vec<Decimal> = view.bids.iter().map(|l| l.total).collect();
        assert_eq!(bid_totals, vec![d("5"), d("8")]);
        let ask_totals: Vec<Decimal> = view.asks.iter().map(|l| l.total).collect();
        assert_eq!(ask_totals, vec![d("4"), d("6")]);
    }

    #[test]
    fn test_delta_removal_promotes_next_level() {
        let mut book = OrderBook::new(sym());
        book.apply(&BookEvent::Snapshot {
            bids: vec![lvl("100", "5"), lvl("99", "3")],
            asks: vec![lvl("101", "4"), lvl("102", "2")],
        });
        book.apply(&BookEvent::Delta {
            bids: vec![lvl("100", "0")],
            asks: vec![],
        });
        assert_eq!(book.best_bid(), Some(lvl("99", "3")));
    }

    #[test]
    fn test_totals_monotonic() {
        let mut book = OrderBook::new(sym());
        book.apply(&BookEvent::Snapshot {
            bids: vec![lvl("100", "5"), lvl("99", "0.5"), lvl("98", "10")],
            asks: vec![lvl("101", "2"), lvl("103", "0.1")],
        });

        let view = book.depth_view(15);
        for side in [&view.bids, &view.asks] {
            for pair in side.windows(2) {
                assert!(pair[1].total >= pair[0].total);
            }
        }
    }

    #[test]
    fn test_crossed_detection() {
        let mut book = OrderBook::new(sym());
        book.apply(&BookEvent::Snapshot {
            bids: vec![lvl("101", "1")],
            asks: vec![lvl("100", "1")],
        });
        assert!(book.is_crossed());

        book.apply(&BookEvent::Snapshot {
            bids: vec![lvl("99", "1")],
            asks: vec![lvl("100", "1")],
        });
        assert!(!book.is_crossed());

        // one-sided books are never crossed
        book.apply(&BookEvent::Snapshot {
            bids: vec![],
            asks: vec![lvl("100", "1")],
        });
        assert!(!book.is_crossed());
    }

    #[test]
    fn test_mid_and_spread_pct() {
        let mut book = OrderBook::new(sym());
        book.apply(&BookEvent::Snapshot {
            bids: vec![lvl("99", "1")],
            asks: vec![lvl("101", "1")],
        });
        assert_eq!(book.mid(), Some(d("100")));
        let view = book.depth_view(15);
        assert_eq!(view.spread_pct(), Some(d("2")));
    }

    #[test]
    fn test_depth_truncation() {
        let mut book = OrderBook::new(sym());
        let bids: Vec<PriceLevel> = (1..=20)
            .map(|i| PriceLevel::new(Decimal::from(i), Decimal::ONE))
            .collect();
        book.apply(&BookEvent::Snapshot { bids, asks: vec![] });

        let view = book.depth_view(15);
        assert_eq!(view.bids.len(), 15);
        assert_eq!(view.best_bid().unwrap().price, d("20"));
    }

    #[test]
    fn test_malformed_levels_skipped() {
        let mut book = OrderBook::new(sym());
        book.apply(&BookEvent::Snapshot {
            bids: vec![lvl("100", "5"), PriceLevel::new(d("-1"), d("2"))],
            asks: vec![PriceLevel::new(d("101"), d("-3"))],
        });
        assert_eq!(book.bids().len(), 1);
        assert!(book.asks().is_empty());
    }
}
