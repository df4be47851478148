//! Trade queue: raw buy/sell cash and coin volume with derived unit prices

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::types::{Side, Tick};

/// Cash and coin volume accumulated over one queue period
///
/// "Input" is what the buy side brings in (cash paid by buyers, coins
/// received by sellers), "output" what it gives away. Only the four raw
/// quantities are accumulated; everything else is filled in by
/// [`TradeQueue::calculate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeQueue {
    /// Cash paid by buy-side takers
    pub input_cash: Decimal,
    /// Cash received by sell-side takers
    pub output_cash: Decimal,
    /// `input_cash - output_cash`
    pub inflow_cash: Decimal,
    /// Coins sold by sell-side takers
    pub input_coins: Decimal,
    /// Coins bought by buy-side takers
    pub output_coins: Decimal,
    /// `input_coins - output_coins`
    pub inflow_coins: Decimal,
    /// Average buy unit price, `input_cash / output_coins`
    pub buy_price: Decimal,
    /// Average sell unit price, `output_cash / input_coins`
    pub sell_price: Decimal,
    /// Spread, `buy_price - sell_price`
    pub inflow_price: Decimal,
    /// Queue start in milliseconds
    pub timestamp: i64,
}

impl TradeQueue {
    /// New queue with raw quantities only
    pub fn from_raw(
        input_cash: Decimal,
        output_cash: Decimal,
        input_coins: Decimal,
        output_coins: Decimal,
        timestamp: i64,
    ) -> Self {
        Self {
            input_cash,
            output_cash,
            input_coins,
            output_coins,
            timestamp,
            ..Default::default()
        }
    }

    /// Copy of the raw quantities with net inflows and unit prices derived
    ///
    /// A price whose denominator is zero is reported as zero.
    pub fn calculate(&self) -> TradeQueue {
        let sell_price = if self.input_coins.is_zero() {
            Decimal::ZERO
        } else {
            self.output_cash / self.input_coins
        };
        let buy_price = if self.output_coins.is_zero() {
            Decimal::ZERO
        } else {
            self.input_cash / self.output_coins
        };

        TradeQueue {
            input_cash: self.input_cash,
            output_cash: self.output_cash,
            inflow_cash: self.input_cash - self.output_cash,
            input_coins: self.input_coins,
            output_coins: self.output_coins,
            inflow_coins: self.input_coins - self.output_coins,
            buy_price,
            sell_price,
            inflow_price: buy_price - sell_price,
            timestamp: self.timestamp,
        }
    }

    /// Spread between the average buy and sell unit prices
    pub fn spread(&self) -> Decimal {
        self.inflow_price
    }

    pub(crate) fn add_tick(&mut self, tick: &Tick) {
        let cash = tick.cash();
        match tick.side {
            Side::Buy => {
                self.input_cash += cash;
                self.output_coins += tick.amount;
            }
            Side::Sell => {
                self.output_cash += cash;
                self.input_coins += tick.amount;
            }
        }
    }

    /// Add another queue's raw quantities, leaving derived fields stale
    pub(crate) fn add_raw(&mut self, other: &TradeQueue) {
        self.input_cash += other.input_cash;
        self.output_cash += other.output_cash;
        self.input_coins += other.input_coins;
        self.output_coins += other.output_coins;
    }

    pub(crate) fn reset(&mut self, timestamp: i64) {
        *self = TradeQueue {
            timestamp,
            ..Default::default()
        };
    }
}
