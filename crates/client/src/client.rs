use std::collections::HashMap;
use std::time::Duration;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{error, info, warn};
use usdt_bob_common::config::{self, Platform};
use usdt_bob_common::{ConversionResult, RateError, RateSnapshot, RateType};

use crate::strategy::{DirectStrategy, ProxyStrategy, RateStrategy, SyntheticStrategy};

/// Key the current snapshot is cached under.
const CACHE_KEY: &str = "binance_rates";

struct CachedSnapshot {
    snapshot: RateSnapshot,
    fetched_at: Instant,
}

/// Runs the acquisition strategies in order, with a five-minute cache in
/// front of them.
///
/// Constructed explicitly and handed to whoever needs it; there is no
/// process-wide instance.
pub struct RateClient {
    strategies: Vec<Box<dyn RateStrategy>>,
    cache: RwLock<HashMap<String, CachedSnapshot>>,
    cache_ttl: Duration,
}

impl RateClient {
    /// Standard chain for a host name: its proxy endpoints, then the
    /// direct exchange call, then the synthetic fallback.
    pub fn for_host(host: &str) -> Self {
        let mut strategies: Vec<Box<dyn RateStrategy>> = Vec::new();
        for url in resolve_proxy_urls(host) {
            strategies.push(Box::new(ProxyStrategy::new(url)));
        }
        strategies.push(Box::new(DirectStrategy::new()));
        strategies.push(Box::new(SyntheticStrategy));

        info!(
            "🔧 rate client for host {:?} with {} strategies",
            host,
            strategies.len()
        );
        Self::with_strategies(strategies)
    }

    /// Explicit strategy chain (embedders, tests).
    pub fn with_strategies(strategies: Vec<Box<dyn RateStrategy>>) -> Self {
        Self {
            strategies,
            cache: RwLock::new(HashMap::new()),
            cache_ttl: Duration::from_millis(config::CACHE_TTL_MS),
        }
    }

    /// Current USDT/BOB rates.
    ///
    /// Never fails: once every strategy is exhausted the fixed emergency
    /// constants are returned (and deliberately not cached, so the next
    /// call gets a fresh chance at live data).
    pub async fn get_rates(&self) -> RateSnapshot {
        if let Some(snapshot) = self.cached().await {
            info!("📊 serving cached rates ({})", snapshot.source);
            return snapshot;
        }

        for (attempt, strategy) in self.strategies.iter().enumerate() {
            info!("📡 attempt {}: {}", attempt + 1, strategy.name());

            match strategy.acquire().await {
                Ok(snapshot) if snapshot.success => {
                    info!(
                        "✅ rates via {} - min: Bs.{:.2}, avg: Bs.{:.2} ({})",
                        strategy.name(),
                        snapshot.min_price,
                        snapshot.avg_price,
                        snapshot.source
                    );
                    self.store(snapshot.clone()).await;
                    return snapshot;
                }
                Ok(_) => {
                    warn!("⚠️ attempt {} answered without usable rates", attempt + 1);
                }
                Err(e) => {
                    warn!("⚠️ attempt {} failed: {:#}", attempt + 1, e);
                }
            }
        }

        error!("❌ every acquisition strategy failed, serving emergency constants");
        RateSnapshot::emergency()
    }

    /// Convert a BOB amount using the current min or avg rate.
    ///
    /// Always returns a result; failures are reported through the
    /// `success` and `error` fields, matching the rates themselves.
    pub async fn convert_bob_to_usdt(&self, amount: f64, rate_type: RateType) -> ConversionResult {
        let rates = self.get_rates().await;
        let rate = rates.rate(rate_type);

        match divide_to_8dp(amount, rate) {
            Ok(usdt_amount) => ConversionResult {
                bob_amount: amount,
                usdt_amount,
                rate_used: rate,
                rate_type,
                source: rates.source.as_str().to_string(),
                timestamp: rates.timestamp.to_rfc3339(),
                success: true,
                error: None,
            },
            Err(e) => {
                error!("❌ conversion failed: {}", e);
                ConversionResult {
                    bob_amount: amount,
                    usdt_amount: 0.0,
                    rate_used: rate,
                    rate_type,
                    source: rates.source.as_str().to_string(),
                    timestamp: rates.timestamp.to_rfc3339(),
                    success: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn cached(&self) -> Option<RateSnapshot> {
        let cache = self.cache.read().await;
        let entry = cache.get(CACHE_KEY)?;

        if entry.fetched_at.elapsed() < self.cache_ttl {
            Some(entry.snapshot.clone())
        } else {
            None
        }
    }

    async fn store(&self, snapshot: RateSnapshot) {
        let mut cache = self.cache.write().await;
        cache.insert(
            CACHE_KEY.to_string(),
            CachedSnapshot {
                snapshot,
                fetched_at: Instant::now(),
            },
        );
    }
}

/// Proxy endpoint URLs to try for a page host, in order.
///
/// Mirrors the deployed selection: local development probes both dev
/// servers on their fixed ports, a recognized hosting domain uses its own
/// path, anything else tries every known path.
pub fn resolve_proxy_urls(host: &str) -> Vec<String> {
    let vercel_route = Platform::Vercel.route();
    let netlify_route = Platform::Netlify.route();

    if host == "localhost" || host == "127.0.0.1" {
        vec![
            format!("http://localhost:{}{}", config::VERCEL_DEV_PORT, vercel_route),
            format!("http://localhost:{}{}", config::NETLIFY_DEV_PORT, netlify_route),
        ]
    } else if host.contains("vercel.app") {
        vec![format!("https://{}{}", host, vercel_route)]
    } else if host.contains("netlify.app") {
        vec![format!("https://{}{}", host, netlify_route)]
    } else {
        vec![
            format!("https://{}{}", host, vercel_route),
            format!("https://{}{}", host, netlify_route),
        ]
    }
}

/// `amount / rate` at 8 decimal places, midpoints away from zero.
fn divide_to_8dp(amount: f64, rate: f64) -> Result<f64, RateError> {
    let amount_dec = Decimal::from_f64(amount).ok_or(RateError::InvalidAmount { amount, rate })?;
    let rate_dec = Decimal::from_f64(rate).ok_or(RateError::InvalidAmount { amount, rate })?;

    let quotient = amount_dec
        .checked_div(rate_dec)
        .ok_or(RateError::InvalidAmount { amount, rate })?
        .round_dp_with_strategy(8, RoundingStrategy::MidpointAwayFromZero);

    quotient
        .to_f64()
        .ok_or(RateError::InvalidAmount { amount, rate })
}
