//! Connection state machine for one exchange feed.
//!
//! # State machine
//!
//! `Disconnected -> Connecting -> Subscribed -> (Resubscribing | Reconnecting) -> ...`
//!
//! - On transport open the supervisor sends the session frames (e.g. the
//!   all-mids broadcast subscription) and, if a market is desired, the depth
//!   subscription for it.
//! - A symbol change while connected unsubscribes the old market before
//!   subscribing the new one; the old book is discarded first, so frames
//!   still in flight for it are dropped rather than applied.
//! - Any transport error or close moves to `Reconnecting`: an infinite,
//!   capped-exponential backoff loop that re-issues the subscription for
//!   whatever symbol is desired *at reconnect time*, not the one active at
//!   disconnect.
//! - Both the blocking read and the backoff sleep sit inside `tokio::select!`
//!   with the command channel, so shutdown and symbol changes interrupt them
//!   immediately.
//!
//! Inbound frames for a single connection are handled sequentially by this
//! one task, which is what guarantees per-symbol, arrival-order application
//! of snapshots and deltas.

use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::config::{Config, ReconnectConfig};
use crate::exchange::ProtocolAdapter;
use crate::orderbook::{ApplyOutcome, BookManager, DepthView};
use crate::ticker::TickerState;
use crate::types::{FeedEvent, Symbol, TickerEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// Connection status surfaced to consumers.
///
/// Transport failures are never errors at this boundary; this status is the
/// only way they are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// Not connected and not trying to be (initial and terminal state)
    Disconnected,
    /// Transport handshake in progress
    Connecting,
    /// Transport open, no depth subscription active
    Connected,
    /// Depth subscription active for the desired market
    Subscribed,
    /// Switching the depth subscription to a different market
    Resubscribing,
    /// Transport lost; waiting out the backoff before the next attempt
    Reconnecting {
        /// Consecutive failed attempts so far
        attempt: u32,
    },
}

/// Commands a [`FeedHandle`] can send to its supervisor task
#[derive(Debug)]
enum FeedCommand {
    Subscribe(Symbol),
    Unsubscribe,
    Shutdown,
}

/// Handle to a running feed supervisor task.
///
/// Dropping the handle without calling [`FeedHandle::shutdown`] closes the
/// command channel, which the task treats as a shutdown request.
#[derive(Debug)]
pub struct FeedHandle {
    adapter: Arc<dyn ProtocolAdapter>,
    cmd_tx: mpsc::UnboundedSender<FeedCommand>,
    depth_rx: watch::Receiver<Option<DepthView>>,
    status_rx: watch::Receiver<FeedStatus>,
    task: JoinHandle<()>,
}

impl FeedHandle {
    /// Whether the exchange lists this market
    #[must_use]
    pub fn supports(&self, symbol: &Symbol) -> bool {
        self.adapter.supports(symbol)
    }

    /// Request a depth subscription for the given market.
    ///
    /// Replaces any previous subscription; the latest requested symbol wins,
    /// including across reconnects.
    pub fn subscribe(&self, symbol: Symbol) -> Result<(), crate::Error> {
        self.cmd_tx
            .send(FeedCommand::Subscribe(symbol))
            .map_err(|_| crate::Error::EngineShutdown)
    }

    /// Release the current depth subscription, keeping the connection (and
    /// its ticker channel) alive
    pub fn unsubscribe(&self) -> Result<(), crate::Error> {
        self.cmd_tx
            .send(FeedCommand::Unsubscribe)
            .map_err(|_| crate::Error::EngineShutdown)
    }

    /// Watch the feed's depth view. `None` means "no synchronized book".
    #[must_use]
    pub fn depth(&self) -> watch::Receiver<Option<DepthView>> {
        self.depth_rx.clone()
    }

    /// Watch the feed's connection status
    #[must_use]
    pub fn status(&self) -> watch::Receiver<FeedStatus> {
        self.status_rx.clone()
    }

    /// Stop the supervisor task and wait for it to exit
    pub async fn shutdown(self) {
        let _ = self.cmd_tx.send(FeedCommand::Shutdown);
        let _ = self.task.await;
    }
}

enum Exit {
    Reconnect,
    Shutdown,
}

/// Supervisor task state for one exchange connection.
///
/// Owned exclusively by its tokio task; the only shared pieces are the
/// `watch` senders and the ticker table.
pub struct FeedSupervisor {
    adapter: Arc<dyn ProtocolAdapter>,
    reconnect: ReconnectConfig,
    books: BookManager,
    tickers: Arc<TickerState>,
    /// Market the consumer currently wants depth for
    desired: Option<Symbol>,
    cmd_rx: mpsc::UnboundedReceiver<FeedCommand>,
    depth_tx: watch::Sender<Option<DepthView>>,
    status_tx: watch::Sender<FeedStatus>,
    /// Frames that failed to decode (dropped, non-fatal)
    malformed_frames: u64,
    /// Well-formed frames dropped as no longer relevant
    dropped_frames: u64,
}

impl FeedSupervisor {
    /// Spawn a supervisor task for the given exchange adapter
    #[must_use]
    pub fn spawn(
        adapter: Arc<dyn ProtocolAdapter>,
        config: &Config,
        tickers: Arc<TickerState>,
    ) -> FeedHandle {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (depth_tx, depth_rx) = watch::channel(None);
        let (status_tx, status_rx) = watch::channel(FeedStatus::Disconnected);

        let supervisor = FeedSupervisor {
            adapter: Arc::clone(&adapter),
            reconnect: config.reconnect().clone(),
            books: BookManager::new(config.depth()),
            tickers,
            desired: None,
            cmd_rx,
            depth_tx,
            status_tx,
            malformed_frames: 0,
            dropped_frames: 0,
        };
        let task = tokio::spawn(supervisor.run());

        FeedHandle {
            adapter,
            cmd_tx,
            depth_rx,
            status_rx,
            task,
        }
    }

    async fn run(mut self) {
        let exchange = self.adapter.exchange();
        let mut attempt: u32 = 0;

        loop {
            self.set_status(FeedStatus::Connecting);
            match connect_async(self.adapter.ws_url()).await {
                Ok((ws, _response)) => {
                    info!(%exchange, "feed connected");
                    attempt = 0;
                    if let Exit::Shutdown = self.drive(ws).await {
                        self.set_status(FeedStatus::Disconnected);
                        return;
                    }
                }
                Err(e) => {
                    warn!(%exchange, error = %e, "feed connect failed");
                }
            }

            // the old connection's state is gone; readers see that
            self.books.clear();
            let _ = self.depth_tx.send_replace(None);

            self.set_status(FeedStatus::Reconnecting { attempt });
            let delay = self.reconnect.delay_for_attempt(attempt);
            attempt = attempt.saturating_add(1);

            // backoff is cancellable: commands land immediately, and the
            // latest requested symbol is what gets subscribed on reconnect
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                cmd = self.cmd_rx.recv() => match cmd {
                    None | Some(FeedCommand::Shutdown) => {
                        self.set_status(FeedStatus::Disconnected);
                        return;
                    }
                    Some(FeedCommand::Subscribe(symbol)) => self.desired = Some(symbol),
                    Some(FeedCommand::Unsubscribe) => self.desired = None,
                }
            }
        }
    }

    /// Service one live connection until it drops or a shutdown arrives
    async fn drive(&mut self, ws: WsStream) -> Exit {
        let (mut sink, mut stream) = ws.split();

        if send_frames(&mut sink, self.adapter.session_frames())
            .await
            .is_err()
        {
            return Exit::Reconnect;
        }
        if let Some(symbol) = self.desired.clone() {
            self.books.track(symbol.clone());
            if send_frames(&mut sink, self.adapter.subscribe_frames(&symbol))
                .await
                .is_err()
            {
                return Exit::Reconnect;
            }
            self.set_status(FeedStatus::Subscribed);
        } else {
            self.set_status(FeedStatus::Connected);
        }

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    None | Some(FeedCommand::Shutdown) => {
                        let _ = sink.close().await;
                        return Exit::Shutdown;
                    }
                    Some(FeedCommand::Subscribe(symbol)) => {
                        if self.switch(&mut sink, Some(symbol)).await.is_err() {
                            return Exit::Reconnect;
                        }
                    }
                    Some(FeedCommand::Unsubscribe) => {
                        if self.switch(&mut sink, None).await.is_err() {
                            return Exit::Reconnect;
                        }
                    }
                },
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if self.handle_frame(&text, &mut sink).await.is_err() {
                            return Exit::Reconnect;
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        if sink.send(Message::Pong(payload)).await.is_err() {
                            return Exit::Reconnect;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        self.log_disconnect("stream closed");
                        return Exit::Reconnect;
                    }
                    Some(Ok(_)) => {} // binary/pong frames are not part of either dialect
                    Some(Err(e)) => {
                        self.log_disconnect(&e.to_string());
                        return Exit::Reconnect;
                    }
                }
            }
        }
    }

    /// Move the depth subscription to `next` (or to nothing).
    ///
    /// The old market's book is discarded *before* the unsubscribe frame is
    /// sent, so a late frame for it can no longer be applied.
    async fn switch(
        &mut self,
        sink: &mut WsSink,
        next: Option<Symbol>,
    ) -> Result<(), tokio_tungstenite::tungstenite::Error> {
        if self.desired == next {
            return Ok(());
        }
        self.set_status(FeedStatus::Resubscribing);

        // record the new target before touching the sink: if a send fails
        // here the connection is torn down, and the reconnect must come
        // back subscribed to the symbol requested last
        let old = std::mem::replace(&mut self.desired, next.clone());
        if let Some(old) = old {
            self.books.untrack(&old);
            send_frames(sink, self.adapter.unsubscribe_frames(&old)).await?;
        }
        let _ = self.depth_tx.send_replace(None);

        if let Some(symbol) = next {
            self.books.track(symbol.clone());
            send_frames(sink, self.adapter.subscribe_frames(&symbol)).await?;
            self.set_status(FeedStatus::Subscribed);
        } else {
            self.set_status(FeedStatus::Connected);
        }
        Ok(())
    }

    async fn handle_frame(
        &mut self,
        raw: &str,
        sink: &mut WsSink,
    ) -> Result<(), tokio_tungstenite::tungstenite::Error> {
        match self.adapter.parse(raw) {
            FeedEvent::Book { market, event } => {
                let Some(active) = self.desired.clone() else {
                    self.dropped_frames += 1;
                    return Ok(());
                };
                // a frame for a market we no longer display is dropped, even
                // if it was in flight when the switch happened
                if self.adapter.market_key(&active).as_deref() != Some(market.as_str()) {
                    self.dropped_frames += 1;
                    return Ok(());
                }

                match self.books.apply(&active, &event) {
                    ApplyOutcome::Updated(view) => {
                        if !self.adapter.has_ticker_channel() {
                            if let Some(mid) = view.mid() {
                                self.tickers.set(self.adapter.exchange(), &active.base, mid);
                            }
                        }
                        let _ = self.depth_tx.send_replace(Some(view));
                    }
                    ApplyOutcome::ResyncNeeded => {
                        // self-heal: drop the published view and ask the
                        // exchange for a fresh authoritative snapshot
                        let _ = self.depth_tx.send_replace(None);
                        send_frames(sink, self.adapter.unsubscribe_frames(&active)).await?;
                        send_frames(sink, self.adapter.subscribe_frames(&active)).await?;
                    }
                    ApplyOutcome::AwaitingSnapshot | ApplyOutcome::NotTracked => {
                        self.dropped_frames += 1;
                    }
                }
            }
            FeedEvent::Ticker(TickerEvent::MidPrices(mut mids)) => {
                // the trades channel supplies the subscribed coin's price;
                // the broadcast mid must not overwrite it
                if self.adapter.has_ticker_channel() {
                    if let Some(active) = &self.desired {
                        mids.retain(|(base, _)| base != &active.base);
                    }
                }
                self.tickers
                    .apply(self.adapter.exchange(), &TickerEvent::MidPrices(mids));
            }
            FeedEvent::Ticker(event) => {
                self.tickers.apply(self.adapter.exchange(), &event);
            }
            FeedEvent::Ignored => {}
            FeedEvent::Malformed => {
                self.malformed_frames += 1;
                debug!(exchange = %self.adapter.exchange(), "dropping malformed frame");
            }
        }
        Ok(())
    }

    fn set_status(&self, status: FeedStatus) {
        debug!(exchange = %self.adapter.exchange(), ?status, "feed status");
        let _ = self.status_tx.send_replace(status);
    }

    fn log_disconnect(&self, reason: &str) {
        warn!(
            exchange = %self.adapter.exchange(),
            reason,
            malformed = self.malformed_frames,
            dropped = self.dropped_frames,
            "feed disconnected"
        );
    }
}

async fn send_frames(
    sink: &mut WsSink,
    frames: Vec<String>,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    for frame in frames {
        sink.send(Message::Text(frame)).await?;
    }
    Ok(())
}
