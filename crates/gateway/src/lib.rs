//! Exchange gateway: fetches USDT/BOB listings from Binance P2P and
//! reduces them to the min/avg rates the rest of the system works with.

pub mod aggregator;
pub mod binance;

pub use aggregator::{aggregate, AggregatedRates};
pub use binance::{BinanceP2pClient, PriceQuote};
