use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use rate_gateway::{aggregate, BinanceP2pClient};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::warn;
use usdt_bob_common::config::{FALLBACK_AVG_BOB, FALLBACK_MIN_BOB};
use usdt_bob_common::{ProxyRatesPayload, RateError, RateSnapshot, RateSource, SearchCriteria};

/// One way of acquiring a rate snapshot.
///
/// Strategies are tried in order by the client; an error means "try the
/// next one".
#[async_trait]
pub trait RateStrategy: Send + Sync {
    async fn acquire(&self) -> Result<RateSnapshot>;

    /// Label used in attempt logs.
    fn name(&self) -> &str;
}

/// Acquire through one proxy endpoint URL.
pub struct ProxyStrategy {
    url: String,
    label: String,
    http: reqwest::Client,
    criteria: SearchCriteria,
}

impl ProxyStrategy {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            label: format!("proxy {}", url),
            url,
            http: reqwest::Client::new(),
            criteria: SearchCriteria::default(),
        }
    }
}

#[async_trait]
impl RateStrategy for ProxyStrategy {
    async fn acquire(&self) -> Result<RateSnapshot> {
        let response = self
            .http
            .post(&self.url)
            .json(&self.criteria)
            .send()
            .await
            .with_context(|| format!("Failed to reach proxy {}", self.url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RateError::Upstream {
                status: status.as_u16(),
            }
            .into());
        }

        let payload: ProxyRatesPayload = response
            .json()
            .await
            .context("Failed to parse proxy payload")?;

        snapshot_from_payload(payload)
    }

    fn name(&self) -> &str {
        &self.label
    }
}

/// Call the exchange gateway in-process, no proxy in between.
///
/// Kept after the proxies: browser deployments rarely get past CORS here,
/// but the path works fine from native hosts.
pub struct DirectStrategy {
    gateway: BinanceP2pClient,
    criteria: SearchCriteria,
}

impl DirectStrategy {
    pub fn new() -> Self {
        Self::with_gateway(BinanceP2pClient::new())
    }

    pub fn with_gateway(gateway: BinanceP2pClient) -> Self {
        Self {
            gateway,
            criteria: SearchCriteria::default(),
        }
    }
}

impl Default for DirectStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateStrategy for DirectStrategy {
    async fn acquire(&self) -> Result<RateSnapshot> {
        let quotes = self.gateway.fetch_quotes(&self.criteria).await?;
        let rates = aggregate(&quotes)?;
        Ok(RateSnapshot::new(rates.min, rates.avg, RateSource::Direct))
    }

    fn name(&self) -> &str {
        "direct exchange fetch"
    }
}

/// Plausible values around the fixed constants, perturbed a little so a
/// demo does not show the same numbers forever. Never fails.
pub struct SyntheticStrategy;

#[async_trait]
impl RateStrategy for SyntheticStrategy {
    async fn acquire(&self) -> Result<RateSnapshot> {
        let variation: f64 = rand::thread_rng().gen_range(-0.05..0.05);
        let min = round2(FALLBACK_MIN_BOB + variation);
        let avg = round2(FALLBACK_AVG_BOB + variation + 0.02);

        Ok(RateSnapshot::new(min, avg, RateSource::Synthetic))
    }

    fn name(&self) -> &str {
        "synthetic fallback"
    }
}

/// Turn a proxy payload into a snapshot, classifying its provenance.
///
/// Older deployments marked their fallback payload `success: false`; those
/// are still accepted as long as they carry usable numbers.
fn snapshot_from_payload(payload: ProxyRatesPayload) -> Result<RateSnapshot> {
    let usable = payload.usdt_min_bob > 0.0 && payload.usdt_avg_bob > 0.0;

    if !payload.success && !usable {
        let reason = payload
            .error
            .unwrap_or_else(|| "proxy reported failure".to_string());
        anyhow::bail!("proxy returned no usable rates: {}", reason);
    }

    if let Some(error) = &payload.error {
        warn!("⚠️ proxy degraded to fallback data: {}", error);
    }

    let source = if !payload.success || payload.source.ends_with("_fallback") {
        RateSource::ProxyFallback
    } else {
        RateSource::Realtime
    };

    Ok(RateSnapshot {
        min_price: payload.usdt_min_bob,
        avg_price: payload.usdt_avg_bob,
        timestamp: parse_timestamp(&payload.timestamp),
        source,
        success: true,
    })
}

/// Payload timestamps come from several deployments; anything unparseable
/// is replaced with "now" rather than rejected.
fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Round to the 2 decimal places rates are displayed with.
///
/// Goes through `Decimal` so 13.105 rounds up to 13.11 instead of
/// whatever the nearest binary float would do.
pub(crate) fn round2(value: f64) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(success: bool, min: f64, avg: f64, source: &str) -> ProxyRatesPayload {
        ProxyRatesPayload {
            success,
            usdt_min_bob: min,
            usdt_avg_bob: avg,
            timestamp: "2025-07-01T12:00:00+00:00".to_string(),
            source: source.to_string(),
            count: None,
            platform: None,
            error: None,
            note: None,
        }
    }

    #[test]
    fn test_realtime_payload_classified_as_realtime() {
        let snapshot = snapshot_from_payload(payload(true, 13.10, 13.20, "binance_realtime")).unwrap();

        assert_eq!(snapshot.source, RateSource::Realtime);
        assert_eq!(snapshot.min_price, 13.10);
        assert!(snapshot.success);
        assert_eq!(snapshot.timestamp.to_rfc3339(), "2025-07-01T12:00:00+00:00");
    }

    #[test]
    fn test_fallback_source_classified_as_proxy_fallback() {
        let snapshot = snapshot_from_payload(payload(true, 13.15, 13.17, "vercel_fallback")).unwrap();
        assert_eq!(snapshot.source, RateSource::ProxyFallback);
    }

    #[test]
    fn test_legacy_unsuccessful_payload_with_numbers_is_accepted() {
        // older deployments answered success:false but still sent rates
        let snapshot = snapshot_from_payload(payload(false, 13.15, 13.17, "fallback")).unwrap();

        assert_eq!(snapshot.source, RateSource::ProxyFallback);
        assert!(snapshot.success);
    }

    #[test]
    fn test_unsuccessful_payload_without_numbers_is_rejected() {
        let mut bad = payload(false, 0.0, 0.0, "fallback");
        bad.error = Some("upstream exploded".to_string());

        let err = snapshot_from_payload(bad).unwrap_err();
        assert!(err.to_string().contains("upstream exploded"));
    }

    #[test]
    fn test_unparseable_timestamp_falls_back_to_now() {
        let mut odd = payload(true, 13.10, 13.20, "binance_realtime");
        odd.timestamp = "five minutes ago".to_string();

        let snapshot = snapshot_from_payload(odd).unwrap();
        let age = Utc::now() - snapshot.timestamp;
        assert!(age.num_seconds() < 5);
    }

    #[tokio::test]
    async fn test_synthetic_rates_stay_near_the_constants() {
        for _ in 0..100 {
            let snapshot = SyntheticStrategy.acquire().await.unwrap();

            assert!(snapshot.min_price >= 13.09 && snapshot.min_price <= 13.21);
            assert!(snapshot.avg_price >= snapshot.min_price);
            assert_eq!(snapshot.source, RateSource::Synthetic);
        }
    }

    #[test]
    fn test_round2_is_midpoint_away_from_zero() {
        assert_eq!(round2(13.105), 13.11);
        assert_eq!(round2(13.104), 13.10);
    }
}
