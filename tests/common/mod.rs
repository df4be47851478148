//! Common test utilities and fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use trade_flow::common::errors::Result;
use trade_flow::common::traits::{Subscription, TickSource};
use trade_flow::common::types::{Side, Tick, TickBatch};
use trade_flow::config::{load_from_str, AppConfig, SymbolSubscription};

/// 2024-01-01T00:00:00Z in milliseconds
pub const T0: i64 = 1_704_067_200_000;

pub const SYMBOL: &str = "btcusdt";

/// A buy tick whose cash value is `cash` at price 1
pub fn buy(timestamp: i64, cash: i64) -> Tick {
    Tick::new(timestamp, Decimal::ONE, Decimal::from(cash), Side::Buy)
}

/// A sell tick whose cash value is `cash` at price 1
pub fn sell(timestamp: i64, cash: i64) -> Tick {
    Tick::new(timestamp, Decimal::ONE, Decimal::from(cash), Side::Sell)
}

pub fn batch(ticks: Vec<Tick>) -> TickBatch {
    TickBatch::new(SYMBOL, ticks)
}

/// One single-tick batch every `step_ms`, starting at `start`
pub fn steady_batches(start: i64, step_ms: i64, inflows: &[i64]) -> Vec<TickBatch> {
    inflows
        .iter()
        .enumerate()
        .map(|(i, inflow)| {
            let timestamp = start + i as i64 * step_ms;
            let tick = if *inflow >= 0 {
                buy(timestamp, *inflow)
            } else {
                sell(timestamp, -inflow)
            };
            batch(vec![tick])
        })
        .collect()
}

pub fn subscription() -> SymbolSubscription {
    SymbolSubscription {
        symbol: SYMBOL.to_string(),
        subscriber_id: "c1".to_string(),
    }
}

/// Validated configuration with a single `btcusdt:c1` subscription
pub fn config_with(extra: &str) -> AppConfig {
    let toml = format!("subscribes = \"btcusdt:c1\"\n{}", extra);
    load_from_str(&toml).expect("fixture config is valid")
}

/// Tick source replaying a fixed list of batches, then idling until cancelled
pub struct ReplaySource {
    pub batches: Vec<TickBatch>,
}

#[async_trait]
impl TickSource for ReplaySource {
    async fn subscribe(
        &self,
        symbol: &str,
        _subscriber_id: &str,
        sender: mpsc::Sender<TickBatch>,
    ) -> Result<Subscription> {
        let batches = self.batches.clone();
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let handle = tokio::spawn(async move {
            for batch in batches {
                if sender.send(batch).await.is_err() {
                    return;
                }
            }
            shutdown_rx.recv().await;
        });
        Ok(Subscription::new(symbol, shutdown_tx, handle))
    }

    fn source_name(&self) -> &'static str {
        "replay"
    }
}
