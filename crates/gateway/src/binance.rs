use std::str::FromStr;

use anyhow::{Context, Result};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};
use usdt_bob_common::{RateError, SearchCriteria};

/// Binance P2P listing search URL
const BINANCE_P2P_URL: &str =
    "https://p2p.binance.com/bapi/c2c/v2/friendly/c2c/adv/search";

/// Desktop browser identity; the endpoint rejects default library agents.
const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// One advertised offer, reduced to the only field aggregation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuote {
    pub price: Decimal,
}

/// Listing search response. `data` stays a raw value so that a missing or
/// non-array field is handled, not a decode failure.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct Listing {
    adv: Advertisement,
}

#[derive(Debug, Deserialize)]
struct Advertisement {
    price: String,
}

/// Client for the Binance P2P listing search.
pub struct BinanceP2pClient {
    client: Client,
    base_url: String,
}

impl BinanceP2pClient {
    pub fn new() -> Self {
        Self::with_base_url(BINANCE_P2P_URL)
    }

    /// Point the gateway at a different endpoint (stubs in tests,
    /// self-hosted mirrors).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        // No request timeout: the hosting platform bounds the call and the
        // caller's fallback chain owns failure handling.
        let client = Client::builder()
            .user_agent(DESKTOP_USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetch the current listings matching `criteria`.
    ///
    /// One POST, no retries; callers decide what a failure means.
    pub async fn fetch_quotes(&self, criteria: &SearchCriteria) -> Result<Vec<PriceQuote>> {
        info!("🌐 Calling Binance P2P search: {}", self.base_url);

        let response = self
            .client
            .post(&self.base_url)
            .header("Accept", "application/json")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .json(criteria)
            .send()
            .await
            .context("Failed to send request to Binance P2P")?;

        let status = response.status();
        if !status.is_success() {
            warn!("❌ Binance P2P returned error status: {}", status);
            return Err(RateError::Upstream {
                status: status.as_u16(),
            }
            .into());
        }

        let body: SearchResponse = response
            .json()
            .await
            .context("Failed to parse Binance P2P response")?;

        let quotes = extract_quotes(body)?;
        info!("📊 {} listings received from Binance P2P", quotes.len());

        Ok(quotes)
    }
}

impl Default for BinanceP2pClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Pull the price list out of a decoded search response.
///
/// The whole batch fails on the first unparseable price; dropping bad
/// listings silently would hide exchange-side corruption.
fn extract_quotes(response: SearchResponse) -> Result<Vec<PriceQuote>> {
    let listings = match response.data {
        serde_json::Value::Array(listings) if !listings.is_empty() => listings,
        _ => return Err(RateError::EmptyResult.into()),
    };

    let mut quotes = Vec::with_capacity(listings.len());
    for entry in listings {
        let listing: Listing =
            serde_json::from_value(entry).context("Malformed listing in Binance P2P response")?;

        let price = Decimal::from_str(&listing.adv.price).map_err(|_| RateError::InvalidPrice {
            raw: listing.adv.price.clone(),
        })?;

        quotes.push(PriceQuote { price });
    }

    Ok(quotes)
}
