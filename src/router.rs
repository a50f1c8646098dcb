//! Aggregation across exchange feeds.
//!
//! [`FeedEngine`] owns one [`FeedHandle`] per exchange and a single
//! selection: the `(exchange, symbol)` pair the consumer currently wants
//! depth for. Exactly one exchange carries a live depth subscription at a
//! time; the others stay connected for their ticker channels only. A small
//! router task republishes the selected feed's views onto one unified
//! `watch` channel so consumers never have to know which feed is hot.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::Config;
use crate::exchange::{Hyperliquid, Lighter, ProtocolAdapter};
use crate::feed::{FeedHandle, FeedStatus, FeedSupervisor};
use crate::orderbook::DepthView;
use crate::ticker::TickerState;
use crate::types::{Exchange, Symbol};
use crate::{Error, Result};

/// The engine facade: feeds for every supported exchange plus the routing
/// of the selected market's depth to a single consumer-facing channel.
///
/// # Example
///
/// ```rust,no_run
/// use perpbook::{Config, FeedEngine};
/// use perpbook::types::{Exchange, Symbol};
///
/// # async fn example() -> perpbook::Result<()> {
/// let engine = FeedEngine::start(Config::new());
/// engine.select(Symbol::new(Exchange::Hyperliquid, "BTC", "USD"))?;
///
/// let mut depth = engine.depth();
/// while depth.changed().await.is_ok() {
///     if let Some(view) = depth.borrow().as_ref() {
///         println!("spread: {:?}", view.spread());
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FeedEngine {
    feeds: FxHashMap<Exchange, FeedHandle>,
    tickers: Arc<TickerState>,
    selection: Mutex<Option<Symbol>>,
    selection_tx: watch::Sender<Option<Symbol>>,
    depth_rx: watch::Receiver<Option<DepthView>>,
    router: JoinHandle<()>,
}

impl FeedEngine {
    /// Spawn the per-exchange supervisors and the router task.
    ///
    /// All feeds connect immediately (the ticker channels are
    /// connection-wide); no depth is subscribed until [`FeedEngine::select`]
    /// is called.
    #[must_use]
    pub fn start(config: Config) -> Self {
        let tickers = Arc::new(TickerState::new());

        let mut feeds = FxHashMap::default();
        let adapters: [Arc<dyn ProtocolAdapter>; 2] = [
            Arc::new(Hyperliquid::new(&config)),
            Arc::new(Lighter::new(&config)),
        ];
        for adapter in adapters {
            let exchange = adapter.exchange();
            let handle = FeedSupervisor::spawn(adapter, &config, Arc::clone(&tickers));
            feeds.insert(exchange, handle);
        }

        let (selection_tx, selection_rx) = watch::channel(None);
        let (depth_tx, depth_rx) = watch::channel(None);
        let sources: FxHashMap<Exchange, watch::Receiver<Option<DepthView>>> =
            feeds.iter().map(|(ex, h)| (*ex, h.depth())).collect();
        let router = tokio::spawn(route(selection_rx, sources, depth_tx));

        Self {
            feeds,
            tickers,
            selection: Mutex::new(None),
            selection_tx,
            depth_rx,
            router,
        }
    }

    /// Select the market to stream depth for.
    ///
    /// Subscribes the symbol's exchange and, if the exchange changed,
    /// releases the previous exchange's depth subscription (its connection
    /// stays up for tickers). Unknown markets are rejected synchronously.
    pub fn select(&self, symbol: Symbol) -> Result<()> {
        let feed = self
            .feeds
            .get(&symbol.exchange)
            .ok_or_else(|| Error::UnknownMarket(symbol.clone()))?;
        if !feed.supports(&symbol) {
            return Err(Error::UnknownMarket(symbol));
        }

        let mut selection = self.selection.lock();
        if selection.as_ref() == Some(&symbol) {
            return Ok(());
        }
        info!(%symbol, "selecting market");

        if let Some(previous) = selection.take() {
            if previous.exchange != symbol.exchange {
                if let Some(old_feed) = self.feeds.get(&previous.exchange) {
                    old_feed.unsubscribe()?;
                }
            }
        }
        feed.subscribe(symbol.clone())?;
        *selection = Some(symbol.clone());
        let _ = self.selection_tx.send_replace(Some(symbol));
        Ok(())
    }

    /// Drop the current selection; all depth subscriptions are released
    pub fn clear_selection(&self) -> Result<()> {
        let mut selection = self.selection.lock();
        if let Some(previous) = selection.take() {
            if let Some(feed) = self.feeds.get(&previous.exchange) {
                feed.unsubscribe()?;
            }
        }
        let _ = self.selection_tx.send_replace(None);
        Ok(())
    }

    /// Currently selected market, if any
    #[must_use]
    pub fn selection(&self) -> Option<Symbol> {
        self.selection.lock().clone()
    }

    /// Watch the unified depth view for the selected market.
    ///
    /// `None` means no synchronized book right now (nothing selected, feed
    /// reconnecting, or resyncing after an inconsistency); a `Some` view with
    /// empty sides is a valid, synchronized, empty book.
    #[must_use]
    pub fn depth(&self) -> watch::Receiver<Option<DepthView>> {
        self.depth_rx.clone()
    }

    /// Last-known prices for all markets across all exchanges
    #[must_use]
    pub fn tickers(&self) -> Arc<TickerState> {
        Arc::clone(&self.tickers)
    }

    /// Watch one exchange feed's connection status
    #[must_use]
    pub fn status(&self, exchange: Exchange) -> Option<watch::Receiver<FeedStatus>> {
        self.feeds.get(&exchange).map(FeedHandle::status)
    }

    /// Stop every feed and the router, releasing all per-symbol state
    pub async fn shutdown(self) {
        for (_, feed) in self.feeds {
            feed.shutdown().await;
        }
        self.router.abort();
        let _ = self.router.await;
    }
}

/// Forward the selected feed's views onto the unified channel.
///
/// Views carry their symbol, so anything published by the hot feed for a
/// previously selected market is filtered out here as a second line of
/// defense behind the supervisor's own frame filtering.
async fn route(
    mut selection_rx: watch::Receiver<Option<Symbol>>,
    sources: FxHashMap<Exchange, watch::Receiver<Option<DepthView>>>,
    depth_tx: watch::Sender<Option<DepthView>>,
) {
    loop {
        let selected = selection_rx.borrow_and_update().clone();
        let Some(symbol) = selected else {
            let _ = depth_tx.send_replace(None);
            if selection_rx.changed().await.is_err() {
                return;
            }
            continue;
        };

        let Some(source) = sources.get(&symbol.exchange) else {
            let _ = depth_tx.send_replace(None);
            if selection_rx.changed().await.is_err() {
                return;
            }
            continue;
        };
        let mut source = source.clone();
        publish(&depth_tx, source.borrow_and_update().clone(), &symbol);

        loop {
            tokio::select! {
                changed = selection_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    break;
                }
                changed = source.changed() => {
                    if changed.is_err() {
                        // feed task gone; wait for a new selection
                        let _ = depth_tx.send_replace(None);
                        if selection_rx.changed().await.is_err() {
                            return;
                        }
                        break;
                    }
                    publish(&depth_tx, source.borrow_and_update().clone(), &symbol);
                }
            }
        }
    }
}

fn publish(
    depth_tx: &watch::Sender<Option<DepthView>>,
    view: Option<DepthView>,
    selected: &Symbol,
) {
    match view {
        Some(view) if &view.symbol == selected => {
            let _ = depth_tx.send_replace(Some(view));
        }
        // a view for some other market never reaches consumers
        Some(_) => {}
        None => {
            let _ = depth_tx.send_replace(None);
        }
    }
}
