//! Client-side rate acquisition: an ordered strategy chain with a
//! five-minute cache, BOB to USDT conversion and the demo history series.

pub mod client;
pub mod history;
pub mod strategy;

pub use client::{resolve_proxy_urls, RateClient};
pub use history::{generate_history, HistoryPoint, HistorySeries, Timeframe};
pub use strategy::{DirectStrategy, ProxyStrategy, RateStrategy, SyntheticStrategy};
