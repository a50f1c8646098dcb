//! Protocol adapters, one per exchange.
//!
//! An adapter translates between the engine and one exchange's wire dialect:
//! subscription control frames out, normalized [`FeedEvent`]s in. Adapters
//! are stateless with respect to book content; all book state lives in the
//! reconciler. A decode failure is reported as [`FeedEvent::Malformed`] and
//! never as a panic or error across the read-loop boundary.

pub mod hyperliquid;
pub mod lighter;

pub use hyperliquid::Hyperliquid;
pub use lighter::Lighter;

use crate::types::{Exchange, FeedEvent, Symbol};

/// One exchange's wire dialect.
///
/// `market_key` is the exchange-native identifier inbound frames carry
/// (Hyperliquid: the coin name; Lighter: the numeric market id). The
/// supervisor compares it against the key of the currently subscribed symbol
/// to drop late frames for markets that are no longer of interest.
pub trait ProtocolAdapter: Send + Sync + std::fmt::Debug + 'static {
    /// Exchange this adapter speaks for
    fn exchange(&self) -> Exchange;

    /// WebSocket endpoint to connect to
    fn ws_url(&self) -> &str;

    /// Whether the exchange broadcasts ticker prices on a dedicated channel.
    /// When `false`, the feed supervisor derives the subscribed market's mid
    /// price from its synchronized book instead.
    fn has_ticker_channel(&self) -> bool;

    /// Whether the exchange lists this market
    fn supports(&self, symbol: &Symbol) -> bool;

    /// Exchange-native market key for a supported symbol
    fn market_key(&self, symbol: &Symbol) -> Option<String>;

    /// Control frames sent once per connection, independent of the depth
    /// subscription (e.g. the all-symbols mid-price broadcast)
    fn session_frames(&self) -> Vec<String>;

    /// Control frames subscribing the given market's depth channels
    fn subscribe_frames(&self, symbol: &Symbol) -> Vec<String>;

    /// Control frames releasing the given market's depth channels
    fn unsubscribe_frames(&self, symbol: &Symbol) -> Vec<String>;

    /// Decode one raw text frame into a normalized event
    fn parse(&self, raw: &str) -> FeedEvent;
}
