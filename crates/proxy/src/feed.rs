use anyhow::Result;
use async_trait::async_trait;
use rate_gateway::{aggregate, AggregatedRates, BinanceP2pClient};
use usdt_bob_common::SearchCriteria;

/// Upstream rate source a proxy route delegates to.
#[async_trait]
pub trait RateFeed: Send + Sync {
    /// Fetch listings matching `criteria` and reduce them to min/avg.
    async fn fetch_rates(&self, criteria: &SearchCriteria) -> Result<AggregatedRates>;
}

/// Live feed: Binance P2P listings reduced by the aggregator.
pub struct BinanceRateFeed {
    gateway: BinanceP2pClient,
}

impl BinanceRateFeed {
    pub fn new() -> Self {
        Self {
            gateway: BinanceP2pClient::new(),
        }
    }

    /// Run against a preconfigured gateway (alternate upstream URL).
    pub fn with_gateway(gateway: BinanceP2pClient) -> Self {
        Self { gateway }
    }
}

impl Default for BinanceRateFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateFeed for BinanceRateFeed {
    async fn fetch_rates(&self, criteria: &SearchCriteria) -> Result<AggregatedRates> {
        let quotes = self.gateway.fetch_quotes(criteria).await?;
        aggregate(&quotes)
    }
}
