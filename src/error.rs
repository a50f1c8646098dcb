//! Error types for the perpbook crate.
//!
//! Transient transport failures and malformed frames never surface through
//! this type; they are handled inside the feed supervisors (reconnect,
//! drop-and-count). `Error` covers the synchronous API boundary and the
//! catalog fetches.

use crate::types::Symbol;

/// The main error type for this crate
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Subscription requested for a market the exchange does not list
    #[error("unknown market: {0}")]
    UnknownMarket(Symbol),

    /// The engine has been shut down; no further selections are accepted
    #[error("feed engine is shut down")]
    EngineShutdown,

    /// Catalog response did not have the expected shape
    #[error("unexpected catalog response: {0}")]
    Catalog(String),
}
