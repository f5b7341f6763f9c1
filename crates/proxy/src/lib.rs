//! Proxy service exposing aggregated Binance P2P rates with permissive
//! CORS, mirroring the hosted serverless functions it replaces.

pub mod app;
pub mod feed;

pub use app::{router, AppState};
pub use feed::{BinanceRateFeed, RateFeed};
