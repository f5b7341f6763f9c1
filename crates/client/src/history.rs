//! Synthesized price history for the demo chart.
//!
//! Nothing here touches live data. The series is generated from sine
//! waves, a linear trend and uniform noise around the fallback constants;
//! real historical aggregation was never part of the system.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use usdt_bob_common::config::{FALLBACK_AVG_BOB, FALLBACK_MIN_BOB};

use crate::strategy::round2;

/// Span covered by a generated series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
}

impl Timeframe {
    /// (number of points, hours between points)
    fn shape(&self) -> (usize, i64) {
        match self {
            Timeframe::Day => (24, 1),
            Timeframe::Week => (42, 4),
            Timeframe::Month => (30, 24),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Day => "24h",
            Timeframe::Week => "7d",
            Timeframe::Month => "30d",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "24h" => Ok(Timeframe::Day),
            "7d" => Ok(Timeframe::Week),
            "30d" => Ok(Timeframe::Month),
            other => anyhow::bail!("unknown timeframe: {} (expected 24h, 7d or 30d)", other),
        }
    }
}

/// One synthetic observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub timestamp: String,
    pub usdt_min_bob: f64,
    pub usdt_avg_bob: f64,
}

/// Generated series plus its labeling, shaped like the chart expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySeries {
    pub success: bool,
    pub history: Vec<HistoryPoint>,
    pub timeframe: String,
    pub count: usize,
    #[serde(rename = "data_source")]
    pub source: String,
}

/// Generate a plausible-looking series ending one interval before now.
///
/// Two sine components, a linear trend and uniform noise around the
/// fallback constants. The min price is floored at 12.50 and the average
/// stays at least 0.02 above the min.
pub fn generate_history(timeframe: Timeframe) -> HistorySeries {
    let (points, interval_hours) = timeframe.shape();
    let now = Utc::now();
    let mut rng = rand::thread_rng();

    let mut history = Vec::with_capacity(points);
    for i in 0..points {
        let timestamp = now - Duration::hours((points - i) as i64 * interval_hours);

        let time_factor = i as f64 / points as f64;
        let wave1 = (time_factor * 4.0 * PI).sin() * 0.08;
        let wave2 = (time_factor * 2.0 * PI).sin() * 0.05;
        let trend = (time_factor - 0.5) * 0.1;
        let noise: f64 = rng.gen_range(-0.03..0.03);

        let variation = wave1 + wave2 + trend + noise;
        let min_price = (FALLBACK_MIN_BOB + variation).max(12.50);
        let avg_price =
            (FALLBACK_AVG_BOB + variation + rng.gen_range(0.0..0.08)).max(min_price + 0.02);

        history.push(HistoryPoint {
            timestamp: timestamp.to_rfc3339(),
            usdt_min_bob: round2(min_price),
            usdt_avg_bob: round2(avg_price),
        });
    }

    HistorySeries {
        success: true,
        history,
        timeframe: timeframe.as_str().to_string(),
        count: points,
        source: "generated_realistic".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_counts_per_timeframe() {
        assert_eq!(generate_history(Timeframe::Day).history.len(), 24);
        assert_eq!(generate_history(Timeframe::Week).history.len(), 42);
        assert_eq!(generate_history(Timeframe::Month).history.len(), 30);
    }

    #[test]
    fn test_count_field_matches_series_length() {
        let series = generate_history(Timeframe::Week);
        assert_eq!(series.count, series.history.len());
        assert_eq!(series.timeframe, "7d");
        assert_eq!(series.source, "generated_realistic");
        assert!(series.success);
    }

    #[test]
    fn test_prices_respect_their_floors() {
        for _ in 0..10 {
            let series = generate_history(Timeframe::Day);
            for point in &series.history {
                assert!(point.usdt_min_bob >= 12.50);
                assert!(point.usdt_avg_bob > point.usdt_min_bob);
            }
        }
    }

    #[test]
    fn test_timestamps_are_chronological() {
        let series = generate_history(Timeframe::Month);
        for pair in series.history.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
    }

    #[test]
    fn test_timeframe_parsing() {
        assert_eq!("24h".parse::<Timeframe>().unwrap(), Timeframe::Day);
        assert_eq!("7d".parse::<Timeframe>().unwrap(), Timeframe::Week);
        assert_eq!("30d".parse::<Timeframe>().unwrap(), Timeframe::Month);
        assert!("1y".parse::<Timeframe>().is_err());
    }
}
