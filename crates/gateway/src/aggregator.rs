use anyhow::Result;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use usdt_bob_common::RateError;

use crate::binance::PriceQuote;

/// Reduction of one listing batch: cheapest offer, arithmetic mean, size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatedRates {
    pub min: f64,
    pub avg: f64,
    pub count: usize,
}

/// Reduce a listing batch to its minimum and average price.
///
/// Both values are rounded to the 2 decimal places the rates are shown
/// with, midpoints away from zero. The mean is taken over the full batch;
/// nothing is discarded or reordered.
pub fn aggregate(quotes: &[PriceQuote]) -> Result<AggregatedRates> {
    if quotes.is_empty() {
        return Err(RateError::NoPrices.into());
    }

    let mut min = quotes[0].price;
    let mut sum = Decimal::ZERO;
    for quote in quotes {
        min = min.min(quote.price);
        sum = sum
            .checked_add(quote.price)
            .ok_or(RateError::PriceOverflow)?;
    }
    let avg = sum / Decimal::from(quotes.len());

    Ok(AggregatedRates {
        min: round2(min),
        avg: round2(avg),
        count: quotes.len(),
    })
}

/// Round to 2 decimal places, midpoints away from zero.
fn round2(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn quotes(prices: &[&str]) -> Vec<PriceQuote> {
        prices
            .iter()
            .map(|p| PriceQuote {
                price: Decimal::from_str(p).unwrap(),
            })
            .collect()
    }

    #[test]
    fn test_min_and_avg_over_three_listings() {
        let rates = aggregate(&quotes(&["13.10", "13.20", "13.30"])).unwrap();

        assert_eq!(rates.min, 13.10);
        assert_eq!(rates.avg, 13.20);
        assert_eq!(rates.count, 3);
    }

    #[test]
    fn test_single_listing_is_both_min_and_avg() {
        let rates = aggregate(&quotes(&["13.45"])).unwrap();

        assert_eq!(rates.min, 13.45);
        assert_eq!(rates.avg, 13.45);
        assert_eq!(rates.count, 1);
    }

    #[test]
    fn test_average_rounds_midpoint_away_from_zero() {
        // mean is 13.105, which must round up to 13.11
        let rates = aggregate(&quotes(&["13.10", "13.11"])).unwrap();

        assert_eq!(rates.min, 13.10);
        assert_eq!(rates.avg, 13.11);
    }

    #[test]
    fn test_order_does_not_matter() {
        let sorted = aggregate(&quotes(&["13.10", "13.20", "13.30"])).unwrap();
        let shuffled = aggregate(&quotes(&["13.30", "13.10", "13.20"])).unwrap();

        assert_eq!(sorted, shuffled);
    }

    #[test]
    fn test_empty_batch_is_rejected() {
        let err = aggregate(&[]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RateError>(),
            Some(RateError::NoPrices)
        ));
    }

    #[test]
    fn test_overflowing_price_total_is_an_error() {
        // each price parses on its own, the batch total does not fit
        let batch = quotes(&["9999999999999999999999999999"; 10]);

        let err = aggregate(&batch).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RateError>(),
            Some(RateError::PriceOverflow)
        ));
    }
}
