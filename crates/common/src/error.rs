use thiserror::Error;

/// Failures across rate acquisition and conversion.
#[derive(Debug, Error)]
pub enum RateError {
    /// Exchange or proxy answered with a non-success HTTP status.
    #[error("upstream returned HTTP {status}")]
    Upstream { status: u16 },

    /// The listing search came back without a single offer.
    #[error("no listings returned by the exchange")]
    EmptyResult,

    /// A listing carried a price that does not parse as a number.
    #[error("listing price is not a number: {raw:?}")]
    InvalidPrice { raw: String },

    /// Aggregation was asked to reduce an empty price list.
    #[error("cannot aggregate an empty price list")]
    NoPrices,

    /// The listing batch total exceeded the supported numeric range.
    #[error("price total overflowed while aggregating")]
    PriceOverflow,

    /// Conversion input or rate cannot produce a finite result.
    #[error("cannot convert {amount} BOB at rate {rate}")]
    InvalidAmount { amount: f64, rate: f64 },
}
