//! Per-exchange feed supervision.
//!
//! One [`FeedSupervisor`] task owns one logical connection per exchange:
//! it connects, issues subscriptions, routes inbound frames through the
//! exchange's protocol adapter into the book reconciler, and reconnects
//! with backoff when the transport drops. Consumers interact through a
//! [`FeedHandle`], which carries the command channel and the `watch`
//! receivers for depth and connection status.

pub mod supervisor;

pub use supervisor::{FeedHandle, FeedStatus, FeedSupervisor};
