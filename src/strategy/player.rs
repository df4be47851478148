//! Player: a paper-trading session driven by sealed trade queues

use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

use super::evaluator::evaluate;
use super::types::{BuyStrategy, Decision, SellStrategy};
use super::wallet::{Order, Wallet};
use crate::common::traits::{DecisionListener, QueueListener};
use crate::queue::TradeQueue;

/// Strategy session owning one wallet
///
/// Registered on a [`crate::queue::QueueAccumulator`]; every sealed queue
/// evaluates the sell rule while holding coins or the buy rule while holding
/// cash, and moves the wallet at the last traded price.
pub struct Player {
    name: String,
    buy: BuyStrategy,
    sell: SellStrategy,
    wallet: Mutex<Wallet>,
    listeners: RwLock<Vec<Arc<dyn DecisionListener>>>,
}

impl Player {
    pub fn new(
        name: impl Into<String>,
        initial_cash: Decimal,
        buy: BuyStrategy,
        sell: SellStrategy,
    ) -> Self {
        Self {
            name: name.into(),
            buy,
            sell,
            wallet: Mutex::new(Wallet::new(initial_cash)),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Register a listener notified after every wallet transition
    pub fn on_decision(&self, listener: Arc<dyn DecisionListener>) {
        self.listeners.write().push(listener);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot of the wallet
    pub fn wallet(&self) -> Wallet {
        self.wallet.lock().clone()
    }

    fn apply(
        &self,
        last_price: Decimal,
        queue: &TradeQueue,
        history: &[TradeQueue],
    ) -> Option<Order> {
        let mut wallet = self.wallet.lock();
        let decision = evaluate(wallet.holding(), &self.buy, &self.sell, queue, history);
        match decision {
            Decision::Buy => wallet.buy(queue.timestamp, last_price).cloned(),
            Decision::Sell => wallet.sell(queue.timestamp, last_price).cloned(),
            Decision::Hold => None,
        }
    }
}

impl QueueListener for Player {
    fn on_queue_sealed(
        &self,
        symbol: &str,
        last_price: Decimal,
        queue: &TradeQueue,
        history: &[TradeQueue],
    ) {
        let Some(order) = self.apply(last_price, queue, history) else {
            debug!(player = %self.name, symbol, "Holding position");
            return;
        };

        let side = if order.is_buy { "buy" } else { "sell" };
        info!(
            player = %self.name,
            symbol,
            side,
            time = ?order.time(),
            price = %order.price,
            cash = %order.cash,
            "Wallet order"
        );
        for listener in self.listeners.read().iter() {
            listener.on_decision(&self.name, &order);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::Holding;
    use rust_decimal_macros::dec;

    #[derive(Default)]
    struct Recording {
        orders: Mutex<Vec<Order>>,
    }

    impl DecisionListener for Recording {
        fn on_decision(&self, _player: &str, order: &Order) {
            self.orders.lock().push(order.clone());
        }
    }

    fn player() -> Player {
        Player::new(
            "p1",
            dec!(1000),
            BuyStrategy {
                listen_seconds: 10,
                count_seconds: 30,
                min_average_per_second: dec!(1),
                trigger_multiple: dec!(1),
            },
            SellStrategy {
                listen_seconds: 10,
                count_seconds: 30,
                max_average_per_second: dec!(-1),
                trigger_multiple: dec!(1),
            },
        )
    }

    fn queue(timestamp: i64, inflow: i64) -> TradeQueue {
        let (input, output) = if inflow >= 0 { (inflow, 0) } else { (0, -inflow) };
        TradeQueue::from_raw(
            Decimal::from(input),
            Decimal::from(output),
            dec!(0),
            dec!(0),
            timestamp,
        )
            .calculate()
    }

    #[test]
    fn test_buys_then_sells_on_reversal() {
        let player = player();
        let recording = Arc::new(Recording::default());
        player.on_decision(recording.clone());

        // Steady 10/s inflow then a burst: buy
        let history: Vec<TradeQueue> = (0..4).map(|i| queue(i * 10_000, 100)).collect();
        player.on_queue_sealed("btcusdt", dec!(50), &queue(40_000, 500), &history);
        assert_eq!(player.wallet().holding(), Holding::Coins);
        assert_eq!(player.wallet().coins(), dec!(20));

        // Steady outflow then a dump: sell
        let history: Vec<TradeQueue> = (5..9).map(|i| queue(i * 10_000, -100)).collect();
        player.on_queue_sealed("btcusdt", dec!(55), &queue(90_000, -500), &history);
        let wallet = player.wallet();
        assert_eq!(wallet.holding(), Holding::Cash);
        assert_eq!(wallet.cash(), dec!(1100));

        let orders = recording.orders.lock();
        assert_eq!(orders.len(), 2);
        assert!(orders[0].is_buy);
        assert!(!orders[1].is_buy);
        assert_eq!(orders[1].timestamp, 90_000);
    }

    #[test]
    fn test_holds_without_signal() {
        let player = player();
        let history: Vec<TradeQueue> = (0..4).map(|i| queue(i * 10_000, 0)).collect();
        player.on_queue_sealed("btcusdt", dec!(50), &queue(40_000, 0), &history);
        assert!(player.wallet().orders().is_empty());
        assert_eq!(player.name(), "p1");
    }
}
