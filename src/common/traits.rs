//! Trait definitions for tick sources and pipeline listeners
//!
//! Listeners are invoked inline on the pipeline task while the owning
//! component holds its lock, in registration order, once per seal. They must
//! return quickly; anything slow (database writes, network calls) should be
//! handed off to another task.

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::errors::Result;
use super::types::TickBatch;
use crate::flow::Section;
use crate::queue::TradeQueue;
use crate::strategy::Order;
use crate::watcher::{AlertRule, SectionFlow};

/// Trait for exchange trade feeds
///
/// A source delivers ordered tick batches for a (symbol, subscriber) pair and
/// never reorders batches within one subscription.
#[async_trait]
pub trait TickSource: Send + Sync {
    /// Subscribe to the trade feed of `symbol`, forwarding batches to `sender`
    ///
    /// The returned [`Subscription`] owns the connection task; cancelling it
    /// unsubscribes and closes the connection.
    async fn subscribe(
        &self,
        symbol: &str,
        subscriber_id: &str,
        sender: mpsc::Sender<TickBatch>,
    ) -> Result<Subscription>;

    /// Get the name of the exchange
    fn source_name(&self) -> &'static str;
}

/// Handle to a running tick subscription
pub struct Subscription {
    symbol: String,
    shutdown: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn new(
        symbol: impl Into<String>,
        shutdown: mpsc::Sender<()>,
        handle: JoinHandle<()>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            shutdown,
            handle,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Stop the subscription and wait for its task to finish
    pub async fn cancel(self) {
        if self.shutdown.send(()).await.is_err() {
            debug!(symbol = %self.symbol, "Subscription task already stopped");
        }
        if let Err(e) = self.handle.await {
            debug!(symbol = %self.symbol, "Subscription task ended abnormally: {}", e);
        }
        info!(symbol = %self.symbol, "Subscription cancelled");
    }
}

/// Window lookup handed to [`SectionListener`]s on every seal
pub trait SectionGetter {
    /// Current rolling section of the window with the given duration (seconds)
    fn section(&self, duration: i64) -> Option<Section>;
}

/// Called when a flow bucket seals and every window has been updated
pub trait SectionListener: Send + Sync {
    fn on_bucket_sealed(&self, symbol: &str, last_price: Decimal, sections: &dyn SectionGetter);
}

/// Called when a trade queue seals, before it is appended to `history`
pub trait QueueListener: Send + Sync {
    fn on_queue_sealed(
        &self,
        symbol: &str,
        last_price: Decimal,
        queue: &TradeQueue,
        history: &[TradeQueue],
    );
}

/// Called when an alert rule crosses one of its thresholds
///
/// `flow` carries only the triggered dimensions; the others are zero.
pub trait AlertListener: Send + Sync {
    fn on_alert(&self, symbol: &str, rule: &AlertRule, flow: &SectionFlow);
}

/// Called after a player's wallet has bought or sold
pub trait DecisionListener: Send + Sync {
    fn on_decision(&self, player: &str, order: &Order);
}
