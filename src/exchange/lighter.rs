//! Lighter protocol adapter.
//!
//! Lighter streams snapshot-then-delta: subscribing to `order_book/{id}`
//! yields one `subscribed/order_book` frame with the full baseline, then
//! `update/order_book` frames listing only changed levels, where a level
//! with size `"0"` means remove. Frames are keyed by the numeric market id
//! carried in the `channel` field.
//!
//! Lighter has no separate ticker channel; the feed supervisor derives the
//! mid price from the synchronized book instead.

use crate::config::Config;
use crate::types::messages::{LighterBook, LighterCommand, LighterEnvelope, LighterLevel};
use crate::types::{BookEvent, Exchange, FeedEvent, PriceLevel, Symbol};

use super::ProtocolAdapter;

/// Markets Lighter exposes over the public stream, as (base, quote, id).
/// The id namespace comes from the exchange and is append-only.
const MARKETS: [(&str, &str, u32); 2] = [("WETH", "USDC", 1), ("WBTC", "USDC", 2)];

/// Adapter for the Lighter WebSocket dialect
#[derive(Debug, Clone)]
pub struct Lighter {
    ws_url: String,
}

impl Lighter {
    /// Create an adapter pointed at the configured endpoint
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            ws_url: config.lighter_ws_url().to_string(),
        }
    }

    fn market_id(symbol: &Symbol) -> Option<u32> {
        MARKETS
            .iter()
            .find(|(base, quote, _)| symbol.base == *base && symbol.quote == *quote)
            .map(|&(_, _, id)| id)
    }

    fn command(kind: &'static str, market_id: u32) -> String {
        serde_json::to_string(&LighterCommand {
            kind,
            channel: format!("order_book/{market_id}"),
        })
        .unwrap_or_default()
    }

    /// Market id from a channel path like `order_book/2` or `order_book:2`
    fn channel_market(channel: &str) -> Option<&str> {
        channel
            .strip_prefix("order_book/")
            .or_else(|| channel.strip_prefix("order_book:"))
    }

    fn convert(book: LighterBook) -> Option<(Vec<PriceLevel>, Vec<PriceLevel>)> {
        Some((parse_levels(&book.bids)?, parse_levels(&book.asks)?))
    }
}

fn parse_levels(raw: &[LighterLevel]) -> Option<Vec<PriceLevel>> {
    raw.iter()
        .map(|l| {
            let price = l.price.parse().ok()?;
            let size = l.size.parse().ok()?;
            Some(PriceLevel::new(price, size))
        })
        .collect()
}

impl ProtocolAdapter for Lighter {
    fn exchange(&self) -> Exchange {
        Exchange::Lighter
    }

    fn ws_url(&self) -> &str {
        &self.ws_url
    }

    fn has_ticker_channel(&self) -> bool {
        false
    }

    fn supports(&self, symbol: &Symbol) -> bool {
        symbol.exchange == Exchange::Lighter && Self::market_id(symbol).is_some()
    }

    fn market_key(&self, symbol: &Symbol) -> Option<String> {
        Self::market_id(symbol).map(|id| id.to_string())
    }

    fn session_frames(&self) -> Vec<String> {
        Vec::new()
    }

    fn subscribe_frames(&self, symbol: &Symbol) -> Vec<String> {
        Self::market_id(symbol)
            .map(|id| vec![Self::command("subscribe", id)])
            .unwrap_or_default()
    }

    fn unsubscribe_frames(&self, symbol: &Symbol) -> Vec<String> {
        Self::market_id(symbol)
            .map(|id| vec![Self::command("unsubscribe", id)])
            .unwrap_or_default()
    }

    fn parse(&self, raw: &str) -> FeedEvent {
        let Ok(envelope) = serde_json::from_str::<LighterEnvelope>(raw) else {
            return FeedEvent::Malformed;
        };

        let is_snapshot = match envelope.kind.as_str() {
            "subscribed/order_book" => true,
            "update/order_book" => false,
            _ => return FeedEvent::Ignored,
        };

        // a book frame we cannot attribute to a market is dropped
        let Some(market) = envelope
            .channel
            .as_deref()
            .and_then(Self::channel_market)
            .map(str::to_string)
        else {
            return FeedEvent::Ignored;
        };

        let Some((bids, asks)) = envelope.order_book.and_then(Self::convert) else {
            return FeedEvent::Malformed;
        };

        let event = if is_snapshot {
            BookEvent::Snapshot { bids, asks }
        } else {
            BookEvent::Delta { bids, asks }
        };
        FeedEvent::Book { market, event }
    }
}
