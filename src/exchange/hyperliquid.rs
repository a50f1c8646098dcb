//! Hyperliquid protocol adapter.
//!
//! Hyperliquid's `l2Book` channel has full-replacement semantics: every
//! frame asserts the complete current state of both sides for one coin
//! (bounded depth, best-first), so each frame becomes a
//! [`BookEvent::Snapshot`] and supersedes prior state unconditionally.
//!
//! Two ticker channels exist alongside depth: `allMids` broadcasts mid
//! prices for every listed coin once per connection, and `trades` carries
//! real prints for the subscribed coin so its last price does not lag the
//! mid.

use rust_decimal::Decimal;

use crate::config::Config;
use crate::types::messages::{HlBook, HlCommand, HlEnvelope, HlMids, HlSubscription, HlTrade};
use crate::types::{BookEvent, Exchange, FeedEvent, PriceLevel, Symbol, TickerEvent};

use super::ProtocolAdapter;

/// Adapter for the Hyperliquid WebSocket dialect
#[derive(Debug, Clone)]
pub struct Hyperliquid {
    ws_url: String,
}

impl Hyperliquid {
    /// Create an adapter pointed at the configured endpoint
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            ws_url: config.hyperliquid_ws_url().to_string(),
        }
    }

    fn command(method: &'static str, subscription: HlSubscription) -> String {
        // serializing a struct of strings cannot fail
        serde_json::to_string(&HlCommand {
            method,
            subscription,
        })
        .unwrap_or_default()
    }

    fn parse_book(data: serde_json::Value) -> FeedEvent {
        let Ok(book) = serde_json::from_value::<HlBook>(data) else {
            return FeedEvent::Malformed;
        };
        // levels[0] is bids, levels[1] is asks
        let (Some(raw_bids), Some(raw_asks)) = (book.levels.first(), book.levels.get(1)) else {
            return FeedEvent::Malformed;
        };
        let (Some(bids), Some(asks)) = (parse_levels(raw_bids), parse_levels(raw_asks)) else {
            return FeedEvent::Malformed;
        };
        FeedEvent::Book {
            market: book.coin,
            event: BookEvent::Snapshot { bids, asks },
        }
    }

    fn parse_mids(data: serde_json::Value) -> FeedEvent {
        let Ok(payload) = serde_json::from_value::<HlMids>(data) else {
            return FeedEvent::Malformed;
        };
        // entries that fail to parse are skipped rather than poisoning the
        // whole broadcast
        let mids: Vec<(String, Decimal)> = payload
            .mids
            .into_iter()
            .filter_map(|(coin, px)| px.parse().ok().map(|px| (coin, px)))
            .collect();
        FeedEvent::Ticker(TickerEvent::MidPrices(mids))
    }

    fn parse_trades(data: serde_json::Value) -> FeedEvent {
        let Ok(trades) = serde_json::from_value::<Vec<HlTrade>>(data) else {
            return FeedEvent::Malformed;
        };
        // only the most recent print matters for the ticker
        let Some(last) = trades.last() else {
            return FeedEvent::Ignored;
        };
        match last.px.parse() {
            Ok(price) => FeedEvent::Ticker(TickerEvent::LastTrade {
                base: last.coin.clone(),
                price,
            }),
            Err(_) => FeedEvent::Malformed,
        }
    }
}

fn parse_levels(raw: &[crate::types::messages::HlLevel]) -> Option<Vec<PriceLevel>> {
    raw.iter()
        .map(|l| {
            let price = l.px.parse().ok()?;
            let size = l.sz.parse().ok()?;
            Some(PriceLevel::new(price, size))
        })
        .collect()
}

impl ProtocolAdapter for Hyperliquid {
    fn exchange(&self) -> Exchange {
        Exchange::Hyperliquid
    }

    fn ws_url(&self) -> &str {
        &self.ws_url
    }

    fn has_ticker_channel(&self) -> bool {
        true
    }

    fn supports(&self, symbol: &Symbol) -> bool {
        symbol.exchange == Exchange::Hyperliquid && symbol.quote == "USD"
    }

    fn market_key(&self, symbol: &Symbol) -> Option<String> {
        self.supports(symbol).then(|| symbol.base.clone())
    }

    fn session_frames(&self) -> Vec<String> {
        vec![Self::command("subscribe", HlSubscription::AllMids)]
    }

    fn subscribe_frames(&self, symbol: &Symbol) -> Vec<String> {
        vec![
            Self::command(
                "subscribe",
                HlSubscription::L2Book {
                    coin: symbol.base.clone(),
                },
            ),
            Self::command(
                "subscribe",
                HlSubscription::Trades {
                    coin: symbol.base.clone(),
                },
            ),
        ]
    }

    fn unsubscribe_frames(&self, symbol: &Symbol) -> Vec<String> {
        vec![
            Self::command(
                "unsubscribe",
                HlSubscription::L2Book {
                    coin: symbol.base.clone(),
                },
            ),
            Self::command(
                "unsubscribe",
                HlSubscription::Trades {
                    coin: symbol.base.clone(),
                },
            ),
        ]
    }

    fn parse(&self, raw: &str) -> FeedEvent {
        let Ok(envelope) = serde_json::from_str::<HlEnvelope>(raw) else {
            return FeedEvent::Malformed;
        };
        match envelope.channel.as_str() {
            "l2Book" => Self::parse_book(envelope.data),
            "allMids" => Self::parse_mids(envelope.data),
            "trades" => Self::parse_trades(envelope.data),
            // acks, pongs and channels the engine has no use for
            _ => FeedEvent::Ignored,
        }
    }
}
