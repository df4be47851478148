use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Buy rule parameters
///
/// Buys when the baseline net inflow rate is at least
/// `min_average_per_second` and the recent rate, multiplied by
/// `trigger_multiple`, reaches the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyStrategy {
    /// Length of the recent window, seconds
    pub listen_seconds: i64,
    /// Length of the baseline window preceding the recent one, seconds
    pub count_seconds: i64,
    /// Positive floor for the baseline net inflow per second
    pub min_average_per_second: Decimal,
    /// Ratio applied to the recent rate before comparing, may be fractional
    pub trigger_multiple: Decimal,
}

/// Sell rule parameters, the mirror of [`BuyStrategy`]
///
/// Sells when the baseline net inflow rate is at most
/// `max_average_per_second` (a net outflow) and the recent rate, multiplied
/// by `trigger_multiple`, falls to the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellStrategy {
    /// Length of the recent window, seconds
    pub listen_seconds: i64,
    /// Length of the baseline window preceding the recent one, seconds
    pub count_seconds: i64,
    /// Negative ceiling for the baseline net inflow per second
    pub max_average_per_second: Decimal,
    /// Ratio applied to the recent rate before comparing, may be fractional
    pub trigger_multiple: Decimal,
}

/// Strategy decision output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No action should be taken
    Hold,
    /// Convert all cash to coins
    Buy,
    /// Convert all coins to cash
    Sell,
}
