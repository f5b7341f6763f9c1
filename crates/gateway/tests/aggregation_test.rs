//! Property tests for the listing aggregator.

use proptest::prelude::*;
use rate_gateway::{aggregate, PriceQuote};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Prices as exact two-decimal values between 1.00 and 100.00.
fn price_batch() -> impl Strategy<Value = Vec<PriceQuote>> {
    proptest::collection::vec(100i64..10_000, 1..50).prop_map(|cents| {
        cents
            .into_iter()
            .map(|c| PriceQuote {
                price: Decimal::new(c, 2),
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn min_never_exceeds_any_listing(batch in price_batch()) {
        let rates = aggregate(&batch).unwrap();

        for quote in &batch {
            let price = quote.price.to_f64().unwrap();
            prop_assert!(rates.min <= price + 1e-9);
        }
    }

    #[test]
    fn avg_stays_between_min_and_max(batch in price_batch()) {
        let rates = aggregate(&batch).unwrap();

        let max = batch
            .iter()
            .map(|q| q.price.to_f64().unwrap())
            .fold(f64::MIN, f64::max);

        prop_assert!(rates.avg + 1e-9 >= rates.min);
        prop_assert!(rates.avg <= max + 1e-9);
    }

    #[test]
    fn count_matches_batch_size(batch in price_batch()) {
        let rates = aggregate(&batch).unwrap();
        prop_assert_eq!(rates.count, batch.len());
    }

    #[test]
    fn aggregation_is_deterministic(batch in price_batch()) {
        let first = aggregate(&batch).unwrap();
        let second = aggregate(&batch).unwrap();
        prop_assert_eq!(first, second);
    }
}
