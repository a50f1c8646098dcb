//! Exchange identifiers, symbols and market-catalog metadata.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Price;

/// Supported perpetuals exchanges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exchange {
    /// Hyperliquid L1 perps (full-replacement `l2Book` snapshots)
    Hyperliquid,
    /// Lighter on Arbitrum (snapshot + incremental order book updates)
    Lighter,
}

impl Exchange {
    /// Display name as used in the market catalog
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Exchange::Hyperliquid => "Hyperliquid",
            Exchange::Lighter => "Lighter",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Exchange-qualified market identifier.
///
/// Immutable once created. Two symbols are the same market only if the
/// exchange, base and quote all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    /// Exchange this market trades on
    pub exchange: Exchange,
    /// Base asset (e.g. `BTC`, `WETH`)
    pub base: String,
    /// Quote asset (e.g. `USD`, `USDC`)
    pub quote: String,
}

impl Symbol {
    /// Create a new exchange-qualified symbol
    pub fn new(exchange: Exchange, base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            exchange,
            base: base.into(),
            quote: quote.into(),
        }
    }

    /// `BASE-QUOTE` pair string, e.g. `BTC-USD`
    #[must_use]
    pub fn pair(&self) -> String {
        format!("{}-{}", self.base, self.quote)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.exchange, self.base, self.quote)
    }
}

/// Catalog entry describing one listed market.
///
/// Produced by [`crate::rest::fetch_markets`]; powers list/overview views
/// outside the depth engine itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    /// Exchange-qualified symbol
    pub symbol: Symbol,
    /// Mark (or last known) price
    pub price: Price,
    /// 24h price change, percent
    pub change_24h: Option<Price>,
    /// 24h notional volume in quote currency
    pub volume_24h: Option<Price>,
    /// Open interest in quote currency
    pub open_interest: Option<Price>,
    /// Daily funding rate, percent
    pub funding_rate: Option<Price>,
}
