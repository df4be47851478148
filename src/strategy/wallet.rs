//! Paper wallet alternating between cash and coins

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What the wallet currently holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Holding {
    Cash,
    Coins,
}

/// One wallet transition, immutable once recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Time of the queue that triggered the order, milliseconds
    pub timestamp: i64,
    /// Cash spent on a buy, cash received on a sell
    pub cash: Decimal,
    pub price: Decimal,
    pub is_buy: bool,
}

impl Order {
    pub fn time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }
}

/// Holds either cash or coins, never both
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    cash: Decimal,
    coins: Decimal,
    orders: Vec<Order>,
}

impl Wallet {
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            cash: initial_cash,
            coins: Decimal::ZERO,
            orders: Vec::new(),
        }
    }

    pub fn holding(&self) -> Holding {
        if self.coins > Decimal::ZERO {
            Holding::Coins
        } else {
            Holding::Cash
        }
    }

    /// Spend all cash on coins at `price`
    ///
    /// Refused (returns `None`) unless the wallet holds cash, the price is
    /// positive and the coin amount is representable and non-zero.
    pub fn buy(&mut self, timestamp: i64, price: Decimal) -> Option<&Order> {
        if self.holding() != Holding::Cash || self.cash <= Decimal::ZERO || price <= Decimal::ZERO {
            return None;
        }
        let coins = self.cash.checked_div(price).filter(|coins| !coins.is_zero())?;
        self.orders.push(Order {
            timestamp,
            cash: self.cash,
            price,
            is_buy: true,
        });
        self.coins = coins;
        self.cash = Decimal::ZERO;
        self.orders.last()
    }

    /// Sell all coins at `price`
    ///
    /// Refused (returns `None`) unless the wallet holds coins, the price is
    /// positive and the proceeds are representable.
    pub fn sell(&mut self, timestamp: i64, price: Decimal) -> Option<&Order> {
        if self.holding() != Holding::Coins || price <= Decimal::ZERO {
            return None;
        }
        self.cash = self.coins.checked_mul(price)?;
        self.coins = Decimal::ZERO;
        self.orders.push(Order {
            timestamp,
            cash: self.cash,
            price,
            is_buy: false,
        });
        self.orders.last()
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn coins(&self) -> Decimal {
        self.coins
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Wallet worth in cash at `price`, saturating at `Decimal::MAX`
    pub fn value(&self, price: Decimal) -> Decimal {
        self.cash.saturating_add(self.coins.saturating_mul(price))
    }
}
