//! Book reconciliation and lifecycle for the markets a feed tracks.
//!
//! [`BookManager`] owns one [`OrderBook`] per tracked symbol, applies
//! normalized [`BookEvent`]s in arrival order and reports the outcome:
//! either a fresh [`DepthView`] or a signal that the book went inconsistent
//! and the supervisor must resubscribe for an authoritative snapshot.
//!
//! # Synchronization states
//!
//! A tracked book starts in `WaitingForSnapshot`; for snapshot-then-delta
//! feeds deltas that arrive before the baseline are dropped. A crossed book
//! (best bid >= best ask) moves the book to `Stale`: the transition is
//! reported exactly once so the supervisor resubscribes exactly once, and
//! subsequent deltas are dropped until a snapshot restores consistency.
//! Snapshots are authoritative and accepted in every state.
//!
//! The manager is owned by a single supervisor task and needs no internal
//! locking; readers only ever see the immutable views it emits.

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::types::{BookEvent, Symbol};

use super::book::{DepthView, OrderBook};

/// Synchronization state of one tracked book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookState {
    /// Subscribed but no baseline received yet
    WaitingForSnapshot,
    /// Baseline received; deltas are being applied
    Synchronized,
    /// Book went inconsistent; awaiting a fresh snapshot
    Stale,
}

/// Result of applying one event
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// Event applied; here is the recomputed view
    Updated(DepthView),
    /// Event crossed the book. The book is now stale and the caller must
    /// trigger a resubscription; reported once per inconsistency.
    ResyncNeeded,
    /// Event dropped: delta before a baseline, or while the book is stale
    AwaitingSnapshot,
    /// Event dropped: the market is not (or no longer) tracked
    NotTracked,
}

#[derive(Debug)]
struct BookEntry {
    book: OrderBook,
    state: BookState,
}

/// Owner of the order books for one feed connection.
#[derive(Debug)]
pub struct BookManager {
    books: FxHashMap<Symbol, BookEntry>,
    /// Display depth used when producing views
    depth: usize,
}

impl BookManager {
    /// Create a manager producing views truncated to `depth` levels per side
    #[must_use]
    pub fn new(depth: usize) -> Self {
        Self {
            books: FxHashMap::default(),
            depth,
        }
    }

    /// Start tracking a market with an empty book in `WaitingForSnapshot`
    pub fn track(&mut self, symbol: Symbol) {
        self.books.entry(symbol.clone()).or_insert_with(|| BookEntry {
            book: OrderBook::new(symbol),
            state: BookState::WaitingForSnapshot,
        });
    }

    /// Stop tracking a market and discard its book.
    ///
    /// Any event for this market still in flight will come back as
    /// [`ApplyOutcome::NotTracked`] and be dropped.
    pub fn untrack(&mut self, symbol: &Symbol) {
        self.books.remove(symbol);
    }

    /// Whether the market is currently tracked
    #[must_use]
    pub fn is_tracked(&self, symbol: &Symbol) -> bool {
        self.books.contains_key(symbol)
    }

    /// Synchronization state of a tracked market
    #[must_use]
    pub fn state(&self, symbol: &Symbol) -> Option<BookState> {
        self.books.get(symbol).map(|e| e.state)
    }

    /// Current view of a tracked, synchronized market
    #[must_use]
    pub fn view(&self, symbol: &Symbol) -> Option<DepthView> {
        self.books
            .get(symbol)
            .filter(|e| e.state == BookState::Synchronized)
            .map(|e| e.book.depth_view(self.depth))
    }

    /// Apply one event in arrival order and report the outcome.
    pub fn apply(&mut self, symbol: &Symbol, event: &BookEvent) -> ApplyOutcome {
        let Some(entry) = self.books.get_mut(symbol) else {
            debug!(%symbol, "dropping event for untracked market");
            return ApplyOutcome::NotTracked;
        };

        match event {
            BookEvent::Snapshot { .. } => {
                // A snapshot asserts complete state; it supersedes whatever
                // came before it, including a stale book.
                entry.book.apply(event);
                entry.state = BookState::Synchronized;
            }
            BookEvent::Delta { .. } => {
                if entry.state != BookState::Synchronized {
                    debug!(%symbol, state = ?entry.state, "dropping delta without baseline");
                    return ApplyOutcome::AwaitingSnapshot;
                }
                entry.book.apply(event);
            }
        }

        if entry.book.is_crossed() {
            warn!(%symbol, "crossed book detected, forcing resync");
            entry.state = BookState::Stale;
            return ApplyOutcome::ResyncNeeded;
        }

        ApplyOutcome::Updated(entry.book.depth_view(self.depth))
    }

    /// Number of tracked markets
    #[must_use]
    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// Whether no markets are tracked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Discard every book
    pub fn clear(&mut self) {
        self.books.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Exchange, PriceLevel};
    use rust_decimal::Decimal;

    fn lvl(price: &str, size: &str) -> PriceLevel {
        PriceLevel::new(price.parse().unwrap(), size.parse().unwrap())
    }

    fn sym() -> Symbol {
        Symbol::new(Exchange::Lighter, "WETH", "USDC")
    }

    fn snapshot() -> BookEvent {
        BookEvent::Snapshot {
            bids: vec![lvl("100", "5"), lvl("99", "3")],
            asks: vec![lvl("101", "4"), lvl("102", "2")],
        }
    }

    #[test]
    fn test_untracked_market_dropped() {
        let mut mgr = BookManager::new(15);
        assert_eq!(mgr.apply(&sym(), &snapshot()), ApplyOutcome::NotTracked);
    }

    #[test]
    fn test_delta_before_snapshot_dropped() {
        let mut mgr = BookManager::new(15);
        mgr.track(sym());

        let delta = BookEvent::Delta {
            bids: vec![lvl("100", "5")],
            asks: vec![],
        };
        assert_eq!(mgr.apply(&sym(), &delta), ApplyOutcome::AwaitingSnapshot);
        assert_eq!(mgr.state(&sym()), Some(BookState::WaitingForSnapshot));
        assert_eq!(mgr.view(&sym()), None);
    }

    #[test]
    fn test_snapshot_synchronizes() {
        let mut mgr = BookManager::new(15);
        mgr.track(sym());

        match mgr.apply(&sym(), &snapshot()) {
            ApplyOutcome::Updated(view) => {
                assert_eq!(view.best_bid().unwrap().price, Decimal::from(100));
            }
            other => panic!("expected Updated, got {other:?}"),
        }
        assert_eq!(mgr.state(&sym()), Some(BookState::Synchronized));
        assert!(mgr.view(&sym()).is_some());
    }

    #[test]
    fn test_crossed_book_resync_exactly_once() {
        let mut mgr = BookManager::new(15);
        mgr.track(sym());
        mgr.apply(&sym(), &snapshot());

        // bid through the best ask crosses the book
        let crossing = BookEvent::Delta {
            bids: vec![lvl("101.5", "1")],
            asks: vec![],
        };
        assert_eq!(mgr.apply(&sym(), &crossing), ApplyOutcome::ResyncNeeded);
        assert_eq!(mgr.state(&sym()), Some(BookState::Stale));
        assert_eq!(mgr.view(&sym()), None);

        // further deltas are dropped, not re-reported as resyncs
        let follow_up = BookEvent::Delta {
            bids: vec![lvl("99", "9")],
            asks: vec![],
        };
        assert_eq!(mgr.apply(&sym(), &follow_up), ApplyOutcome::AwaitingSnapshot);

        // the fresh snapshot restores consistency
        match mgr.apply(&sym(), &snapshot()) {
            ApplyOutcome::Updated(_) => {}
            other => panic!("expected Updated, got {other:?}"),
        }
        assert_eq!(mgr.state(&sym()), Some(BookState::Synchronized));
    }

    #[test]
    fn test_untrack_drops_in_flight_events() {
        let mut mgr = BookManager::new(15);
        mgr.track(sym());
        mgr.apply(&sym(), &snapshot());

        // the unsubscribe for this market has been issued
        mgr.untrack(&sym());

        // a late delta must not be applied
        let late = BookEvent::Delta {
            bids: vec![lvl("100", "9")],
            asks: vec![],
        };
        assert_eq!(mgr.apply(&sym(), &late), ApplyOutcome::NotTracked);
        assert!(!mgr.is_tracked(&sym()));
    }

    #[test]
    fn test_delta_convergence_matches_net_effect() {
        // applying D1..Dn equals applying their net-effect merge
        let mut incremental = BookManager::new(15);
        incremental.track(sym());
        incremental.apply(&sym(), &snapshot());
        incremental.apply(
            &sym(),
            &BookEvent::Delta {
                bids: vec![lvl("100", "7")],
                asks: vec![],
            },
        );
        incremental.apply(
            &sym(),
            &BookEvent::Delta {
                bids: vec![lvl("99", "0")],
                asks: vec![lvl("101", "1")],
            },
        );
        incremental.apply(
            &sym(),
            &BookEvent::Delta {
                bids: vec![lvl("100", "2")],
                asks: vec![],
            },
        );

        let mut merged = BookManager::new(15);
        merged.track(sym());
        merged.apply(&sym(), &snapshot());
        merged.apply(
            &sym(),
            &BookEvent::Delta {
                bids: vec![lvl("100", "2"), lvl("99", "0")],
                asks: vec![lvl("101", "1")],
            },
        );

        let a = incremental.view(&sym()).unwrap();
        let b = merged.view(&sym()).unwrap();
        assert_eq!(a.bids, b.bids);
        assert_eq!(a.asks, b.asks);
    }
}
