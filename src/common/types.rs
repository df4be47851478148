//! Tick types shared by every pipeline component

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Taker side of a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// A single reported trade from the exchange feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Trade time in milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Execution price
    pub price: Decimal,
    /// Traded amount in coins
    pub amount: Decimal,
    /// Taker side
    pub side: Side,
}

impl Tick {
    pub fn new(timestamp: i64, price: Decimal, amount: Decimal, side: Side) -> Self {
        Self {
            timestamp,
            price,
            amount,
            side,
        }
    }

    /// Traded cash value, `price * amount`
    pub fn cash(&self) -> Decimal {
        self.price * self.amount
    }

    /// Traded cash value truncated to whole units
    ///
    /// Values outside the `i64` range count as zero.
    pub fn whole_cash(&self) -> i64 {
        self.cash().trunc().to_i64().unwrap_or_default()
    }

    /// Trade time in whole seconds
    pub fn seconds(&self) -> i64 {
        self.timestamp / 1000
    }

    /// Trade time as a UTC datetime
    pub fn time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }
}

/// Ordered batch of ticks delivered for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickBatch {
    /// Symbol the ticks belong to, e.g. `btcusdt`
    pub symbol: String,
    /// Ticks in non-decreasing timestamp order
    pub ticks: Vec<Tick>,
}

impl TickBatch {
    pub fn new(symbol: impl Into<String>, ticks: Vec<Tick>) -> Self {
        Self {
            symbol: symbol.into(),
            ticks,
        }
    }

    /// The tick that decides whether a bucket seals
    pub fn last(&self) -> Option<&Tick> {
        self.ticks.last()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_whole_cash_truncates() {
        let tick = Tick::new(1_000, dec!(10.9), dec!(1.5), Side::Buy);
        assert_eq!(tick.cash(), dec!(16.35));
        assert_eq!(tick.whole_cash(), 16);

        let small = Tick::new(1_000, dec!(0.99), dec!(0.99), Side::Sell);
        assert_eq!(small.whole_cash(), 0);
    }

    #[test]
    fn test_seconds_granularity() {
        let tick = Tick::new(1_704_067_200_999, dec!(1), dec!(1), Side::Buy);
        assert_eq!(tick.seconds(), 1_704_067_200);
        assert!(tick.time().is_some());
    }

    #[test]
    fn test_side_serde() {
        let side: Side = serde_json::from_str("\"sell\"").unwrap();
        assert_eq!(side, Side::Sell);
        assert_eq!(Side::Buy.to_string(), "buy");
    }

    #[test]
    fn test_batch_last() {
        let batch = TickBatch::new(
            "btcusdt",
            vec![
                Tick::new(1_000, dec!(1), dec!(1), Side::Buy),
                Tick::new(2_000, dec!(2), dec!(1), Side::Sell),
            ],
        );
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.last().map(|t| t.timestamp), Some(2_000));
        assert!(TickBatch::new("btcusdt", vec![]).is_empty());
    }
}
