//! Wire frame types and the normalized events adapters decode them into.
//!
//! Each exchange speaks its own JSON dialect; the types here mirror those
//! dialects exactly. Protocol adapters translate them into [`BookEvent`] and
//! [`TickerEvent`], which is all the reconciler ever sees.
//!
//! Prices and sizes arrive as decimal strings on both exchanges and are kept
//! as `String` in the wire types; adapters parse them and drop frames that
//! fail to parse rather than letting a decode error cross the read loop.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Price, PriceLevel};

// ---------------------------------------------------------------------------
// Normalized events
// ---------------------------------------------------------------------------

/// Normalized depth update produced by a protocol adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookEvent {
    /// Complete replacement of both sides (bounded to the exchange's depth)
    Snapshot {
        /// All bid levels, any order
        bids: Vec<PriceLevel>,
        /// All ask levels, any order
        asks: Vec<PriceLevel>,
    },
    /// Incremental update listing only changed levels; `size == 0` removes
    Delta {
        /// Changed bid levels
        bids: Vec<PriceLevel>,
        /// Changed ask levels
        asks: Vec<PriceLevel>,
    },
}

/// Normalized price-ticker update produced by a protocol adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickerEvent {
    /// Mid prices for many coins at once (Hyperliquid `allMids` broadcast)
    MidPrices(Vec<(String, Price)>),
    /// Last trade price for a single coin (Hyperliquid `trades` channel)
    LastTrade {
        /// Base asset the trade printed on
        base: String,
        /// Trade price
        price: Price,
    },
}

/// Everything a raw frame can decode into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// Depth update for one market, keyed by the exchange-native market id
    /// (Hyperliquid coin name, Lighter numeric market id as a string)
    Book {
        /// Exchange-native market key
        market: String,
        /// Normalized depth update
        event: BookEvent,
    },
    /// Price-ticker update
    Ticker(TickerEvent),
    /// Valid frame the engine has no use for (acks, pongs, unknown channels)
    Ignored,
    /// Frame that failed to decode; dropped and counted, never fatal
    Malformed,
}

// ---------------------------------------------------------------------------
// Hyperliquid wire types
// ---------------------------------------------------------------------------

/// Outbound Hyperliquid control frame
#[derive(Debug, Clone, Serialize)]
pub struct HlCommand {
    /// `subscribe` or `unsubscribe`
    pub method: &'static str,
    /// Channel being (un)subscribed
    pub subscription: HlSubscription,
}

/// Hyperliquid subscription descriptor
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HlSubscription {
    /// Full-replacement depth snapshots for one coin
    L2Book {
        /// Coin name, e.g. `BTC`
        coin: String,
    },
    /// Mid prices for all listed coins
    AllMids,
    /// Trade prints for one coin
    Trades {
        /// Coin name
        coin: String,
    },
}

/// Inbound Hyperliquid envelope: `{"channel": "...", "data": ...}`
#[derive(Debug, Clone, Deserialize)]
pub struct HlEnvelope {
    /// Channel the payload belongs to
    pub channel: String,
    /// Channel-specific payload, decoded in a second step
    #[serde(default)]
    pub data: serde_json::Value,
}

/// `l2Book` payload: complete current state of one coin's book
#[derive(Debug, Clone, Deserialize)]
pub struct HlBook {
    /// Coin this book belongs to
    pub coin: String,
    /// `levels[0]` is bids, `levels[1]` is asks, both best-first
    pub levels: Vec<Vec<HlLevel>>,
}

/// One Hyperliquid price level
#[derive(Debug, Clone, Deserialize)]
pub struct HlLevel {
    /// Price as decimal string
    pub px: String,
    /// Size as decimal string
    pub sz: String,
    /// Number of orders at this level (unused)
    #[serde(default)]
    pub n: u32,
}

/// `allMids` payload
#[derive(Debug, Clone, Deserialize)]
pub struct HlMids {
    /// Coin name -> mid price as decimal string
    pub mids: HashMap<String, String>,
}

/// One entry of a `trades` payload
#[derive(Debug, Clone, Deserialize)]
pub struct HlTrade {
    /// Coin the trade printed on
    pub coin: String,
    /// Trade price as decimal string
    pub px: String,
    /// Trade size as decimal string
    #[serde(default)]
    pub sz: String,
}

// ---------------------------------------------------------------------------
// Lighter wire types
// ---------------------------------------------------------------------------

/// Outbound Lighter control frame
#[derive(Debug, Clone, Serialize)]
pub struct LighterCommand {
    /// `subscribe` or `unsubscribe`
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Channel path, e.g. `order_book/2`
    pub channel: String,
}

/// Inbound Lighter envelope.
///
/// `subscribed/order_book` carries the full baseline; `update/order_book`
/// lists only changed levels, where `size == "0"` removes a level.
#[derive(Debug, Clone, Deserialize)]
pub struct LighterEnvelope {
    /// Frame type, e.g. `subscribed/order_book`
    #[serde(rename = "type")]
    pub kind: String,
    /// Channel the frame belongs to, e.g. `order_book/2` or `order_book:2`
    #[serde(default)]
    pub channel: Option<String>,
    /// Depth payload, present on book frames
    #[serde(default)]
    pub order_book: Option<LighterBook>,
}

/// Lighter depth payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LighterBook {
    /// Bid levels (full set in snapshots, changed set in updates)
    #[serde(default)]
    pub bids: Vec<LighterLevel>,
    /// Ask levels (full set in snapshots, changed set in updates)
    #[serde(default)]
    pub asks: Vec<LighterLevel>,
}

/// One Lighter price level
#[derive(Debug, Clone, Deserialize)]
pub struct LighterLevel {
    /// Price as decimal string
    pub price: String,
    /// Size as decimal string; `"0"` means remove the level
    pub size: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hl_subscribe_serialization() {
        let cmd = HlCommand {
            method: "subscribe",
            subscription: HlSubscription::L2Book {
                coin: "BTC".to_string(),
            },
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains(r#""method":"subscribe""#));
        assert!(json.contains(r#""type":"l2Book""#));
        assert!(json.contains(r#""coin":"BTC""#));

        let mids = HlCommand {
            method: "subscribe",
            subscription: HlSubscription::AllMids,
        };
        let json = serde_json::to_string(&mids).unwrap();
        assert!(json.contains(r#""type":"allMids""#));
    }

    #[test]
    fn test_hl_l2book_deserialization() {
        let json = r#"{
            "channel": "l2Book",
            "data": {
                "coin": "ETH",
                "time": 1700000000000,
                "levels": [
                    [{"px": "2500.5", "sz": "10.2", "n": 3}],
                    [{"px": "2501.0", "sz": "4.0", "n": 1}]
                ]
            }
        }"#;
        let env: HlEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(env.channel, "l2Book");
        let book: HlBook = serde_json::from_value(env.data).unwrap();
        assert_eq!(book.coin, "ETH");
        assert_eq!(book.levels[0][0].px, "2500.5");
        assert_eq!(book.levels[1][0].sz, "4.0");
    }

    #[test]
    fn test_hl_allmids_deserialization() {
        let json = r#"{"channel":"allMids","data":{"mids":{"BTC":"97000.5","ETH":"2500"}}}"#;
        let env: HlEnvelope = serde_json::from_str(json).unwrap();
        let mids: HlMids = serde_json::from_value(env.data).unwrap();
        assert_eq!(mids.mids["BTC"], "97000.5");
    }

    #[test]
    fn test_lighter_command_serialization() {
        let cmd = LighterCommand {
            kind: "subscribe",
            channel: "order_book/2".to_string(),
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert_eq!(json, r#"{"type":"subscribe","channel":"order_book/2"}"#);
    }

    #[test]
    fn test_lighter_snapshot_deserialization() {
        let json = r#"{
            "type": "subscribed/order_book",
            "channel": "order_book/1",
            "order_book": {
                "bids": [{"price": "2500.0", "size": "3.5"}],
                "asks": [{"price": "2501.0", "size": "1.25"}]
            }
        }"#;
        let env: LighterEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(env.kind, "subscribed/order_book");
        assert_eq!(env.channel.as_deref(), Some("order_book/1"));
        let book = env.order_book.unwrap();
        assert_eq!(book.bids[0].price, "2500.0");
        assert_eq!(book.asks[0].size, "1.25");
    }
}
