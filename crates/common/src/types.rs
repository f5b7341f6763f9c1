use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{self, Platform};

/// Search criteria for the exchange's P2P listing endpoint.
///
/// Field names follow the exchange wire format, so the struct serializes
/// directly into a request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub asset: String,
    pub fiat: String,
    #[serde(rename = "tradeType")]
    pub trade_type: String,
    pub page: u32,
    pub rows: u32,
    #[serde(rename = "payTypes")]
    pub pay_types: Vec<String>,
    #[serde(rename = "publisherType")]
    pub publisher_type: Option<String>,
}

impl Default for SearchCriteria {
    /// First page of USDT/BOB buy offers from merchant publishers.
    fn default() -> Self {
        Self {
            asset: "USDT".to_string(),
            fiat: "BOB".to_string(),
            trade_type: "BUY".to_string(),
            page: 1,
            rows: 10,
            pay_types: Vec::new(),
            publisher_type: Some("merchant".to_string()),
        }
    }
}

impl SearchCriteria {
    /// Apply caller-supplied overrides field by field; unset fields keep
    /// their current value.
    pub fn merged(mut self, overrides: CriteriaOverrides) -> Self {
        if let Some(asset) = overrides.asset {
            self.asset = asset;
        }
        if let Some(fiat) = overrides.fiat {
            self.fiat = fiat;
        }
        if let Some(trade_type) = overrides.trade_type {
            self.trade_type = trade_type;
        }
        if let Some(page) = overrides.page {
            self.page = page;
        }
        if let Some(rows) = overrides.rows {
            self.rows = rows;
        }
        if let Some(pay_types) = overrides.pay_types {
            self.pay_types = pay_types;
        }
        if let Some(publisher_type) = overrides.publisher_type {
            // Some(None) carries an explicit null: drop the merchant filter
            self.publisher_type = publisher_type;
        }
        self
    }
}

/// Partial criteria a proxy caller may send in its request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CriteriaOverrides {
    pub asset: Option<String>,
    pub fiat: Option<String>,
    #[serde(rename = "tradeType")]
    pub trade_type: Option<String>,
    pub page: Option<u32>,
    pub rows: Option<u32>,
    #[serde(rename = "payTypes")]
    pub pay_types: Option<Vec<String>>,
    /// An absent field keeps the default, an explicit `null` clears the
    /// merchant filter, so the two must stay distinguishable after parsing.
    #[serde(
        rename = "publisherType",
        default,
        deserialize_with = "double_option"
    )]
    pub publisher_type: Option<Option<String>>,
}

/// Wraps the parsed value in a second `Option`: a field set to JSON `null`
/// becomes `Some(None)` instead of collapsing into the absent case.
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Where a rate snapshot ultimately came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    /// Live aggregation served by a proxy endpoint.
    Realtime,
    /// A proxy answered, but with its fixed fallback numbers.
    ProxyFallback,
    /// The exchange was reached directly, no proxy in between.
    Direct,
    /// Locally generated plausible values.
    Synthetic,
    /// Hardcoded constants, returned when everything else failed.
    Emergency,
}

impl RateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateSource::Realtime => "realtime",
            RateSource::ProxyFallback => "proxy_fallback",
            RateSource::Direct => "direct",
            RateSource::Synthetic => "synthetic",
            RateSource::Emergency => "emergency",
        }
    }
}

impl fmt::Display for RateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the two aggregated prices a conversion uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateType {
    Min,
    Avg,
}

impl fmt::Display for RateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateType::Min => f.write_str("min"),
            RateType::Avg => f.write_str("avg"),
        }
    }
}

/// Aggregated USDT/BOB rates plus their provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub min_price: f64,
    pub avg_price: f64,
    pub timestamp: DateTime<Utc>,
    pub source: RateSource,
    pub success: bool,
}

impl RateSnapshot {
    pub fn new(min_price: f64, avg_price: f64, source: RateSource) -> Self {
        Self {
            min_price,
            avg_price,
            timestamp: Utc::now(),
            source,
            success: true,
        }
    }

    /// Fixed constants handed out when every acquisition path failed.
    pub fn emergency() -> Self {
        Self::new(
            config::FALLBACK_MIN_BOB,
            config::FALLBACK_AVG_BOB,
            RateSource::Emergency,
        )
    }

    /// Price selected by `rate_type`.
    pub fn rate(&self, rate_type: RateType) -> f64 {
        match rate_type {
            RateType::Min => self.min_price,
            RateType::Avg => self.avg_price,
        }
    }
}

/// Wire body served by every proxy route, success and fallback alike.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyRatesPayload {
    pub success: bool,
    pub usdt_min_bob: f64,
    pub usdt_avg_bob: f64,
    pub timestamp: String,
    pub source: String,
    #[serde(alias = "raw_data_count", skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ProxyRatesPayload {
    /// Successful live aggregation as served by a proxy route.
    pub fn realtime(min: f64, avg: f64, count: usize, platform: Platform) -> Self {
        Self {
            success: true,
            usdt_min_bob: min,
            usdt_avg_bob: avg,
            timestamp: Utc::now().to_rfc3339(),
            source: "binance_realtime".to_string(),
            count: Some(count),
            platform: Some(platform.label().to_string()),
            error: None,
            note: None,
        }
    }

    /// Fixed-value payload substituted when the live fetch fails.
    ///
    /// Stays `success: true`: callers branch on the payload fields, not on
    /// transport-level status.
    pub fn platform_fallback(platform: Platform, error: String) -> Self {
        Self {
            success: true,
            usdt_min_bob: config::FALLBACK_MIN_BOB,
            usdt_avg_bob: config::FALLBACK_AVG_BOB,
            timestamp: Utc::now().to_rfc3339(),
            source: platform.fallback_source(),
            count: None,
            platform: Some(platform.label().to_string()),
            error: Some(error),
            note: Some("Using fallback data due to API error".to_string()),
        }
    }
}

/// Outcome of a BOB to USDT conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    pub bob_amount: f64,
    pub usdt_amount: f64,
    pub rate_used: f64,
    pub rate_type: RateType,
    pub source: String,
    pub timestamp: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
