//! Per-period trade queue accumulator with capped history

use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::types::TradeQueue;
use crate::common::history::BoundedHistory;
use crate::common::traits::QueueListener;
use crate::common::types::TickBatch;

const MINUTE_MS: i64 = 60_000;

/// Construction options for a [`QueueAccumulator`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueOptions {
    pub symbol: String,
    pub subscriber_id: String,
    /// Queue period in milliseconds, e.g. 10000
    pub period_ms: i64,
    /// History length that triggers eviction
    pub max_queues: usize,
    /// Number of oldest queues dropped per eviction
    pub evict_queues: usize,
}

struct QueueState {
    queue: TradeQueue,
    history: BoundedHistory<TradeQueue>,
    listeners: Vec<Arc<dyn QueueListener>>,
}

/// Accumulates raw input/output cash and coins per period
///
/// Sealed queues are calculated, handed to every listener together with the
/// history so far, then appended to the history.
pub struct QueueAccumulator {
    symbol: String,
    subscriber_id: String,
    period_ms: i64,
    state: RwLock<QueueState>,
}

impl QueueAccumulator {
    pub fn new(options: QueueOptions) -> Self {
        Self {
            symbol: options.symbol,
            subscriber_id: options.subscriber_id,
            period_ms: options.period_ms,
            state: RwLock::new(QueueState {
                queue: TradeQueue::default(),
                history: BoundedHistory::new(options.max_queues, options.evict_queues),
                listeners: Vec::new(),
            }),
        }
    }

    /// Register a listener invoked on every seal, in registration order
    pub fn handle(&self, listener: Arc<dyn QueueListener>) {
        let mut state = self.state.write();
        state.listeners.push(listener);
        info!(
            symbol = %self.symbol,
            listeners = state.listeners.len(),
            "Queue listener registered"
        );
    }

    /// Consume one ordered batch of ticks
    ///
    /// Returns `true` when the batch sealed a queue.
    pub fn feed(&self, batch: &TickBatch) -> bool {
        let Some(last) = batch.last() else {
            return false;
        };

        let mut state = self.state.write();
        for tick in &batch.ticks {
            if state.queue.timestamp == 0 {
                state.queue.timestamp = tick.timestamp;
            }
            state.queue.add_tick(tick);
        }

        if last.timestamp < state.queue.timestamp + self.period_ms {
            return false;
        }

        let sealed = state.queue.calculate();
        {
            let state = &*state;
            for listener in &state.listeners {
                listener.on_queue_sealed(
                    &self.symbol,
                    last.price,
                    &sealed,
                    state.history.as_slice(),
                );
            }
        }

        debug!(
            symbol = %self.symbol,
            timestamp = sealed.timestamp,
            inflow_cash = %sealed.inflow_cash,
            spread = %sealed.inflow_price,
            "Trade queue sealed"
        );
        let evicted = state.history.push(sealed);
        if evicted > 0 {
            debug!(symbol = %self.symbol, evicted, "Queue history trimmed");
        }
        state.queue.reset(last.timestamp);
        true
    }

    /// The live queue, calculated
    pub fn queue(&self) -> TradeQueue {
        self.state.read().queue.calculate()
    }

    /// All completed queues, oldest first
    pub fn queues(&self) -> Vec<TradeQueue> {
        self.state.read().history.to_vec()
    }

    /// Completed history re-bucketed into `duration_seconds` buckets
    ///
    /// See [`rebucket`].
    pub fn count_queues(&self, duration_seconds: i64) -> Vec<TradeQueue> {
        rebucket(self.state.read().history.as_slice(), duration_seconds)
    }

    /// Net cash and coin inflow of the completed queues in
    /// `[start_ms, start_ms + duration_seconds]`
    pub fn inflows(&self, start_ms: i64, duration_seconds: i64) -> (Decimal, Decimal) {
        let end_ms = start_ms.saturating_add(duration_seconds.saturating_mul(1000));
        let state = self.state.read();
        state
            .history
            .iter()
            .filter(|q| start_ms <= q.timestamp && q.timestamp <= end_ms)
            .fold((Decimal::ZERO, Decimal::ZERO), |(cash, coins), q| {
                (cash + q.inflow_cash, coins + q.inflow_coins)
            })
    }

    pub fn len(&self) -> usize {
        self.state.read().history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().history.is_empty()
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn subscriber_id(&self) -> &str {
        &self.subscriber_id
    }
}

/// Re-aggregate completed queues into coarser buckets
///
/// Counting starts at the first minute boundary at or after the oldest
/// queue; queues before it are skipped. Each bucket opens at a queue's
/// timestamp truncated to whole seconds and absorbs the following queues
/// until one reaches `open + duration`. The last open bucket is never
/// emitted: it may be incomplete and would skew the averages.
pub fn rebucket(history: &[TradeQueue], duration_seconds: i64) -> Vec<TradeQueue> {
    let Some(first) = history.first() else {
        return Vec::new();
    };
    if duration_seconds <= 0 {
        return Vec::new();
    }

    let span = duration_seconds.saturating_mul(1000);
    let start = ceil_to_minute(first.timestamp);

    let mut buckets = Vec::new();
    let mut current: Option<TradeQueue> = None;
    let mut end = 0;

    for entry in history.iter().filter(|q| q.timestamp >= start) {
        if let Some(open) = current.as_mut() {
            if entry.timestamp < end {
                open.add_raw(entry);
                continue;
            }
        }
        if let Some(done) = current.take() {
            buckets.push(done.calculate());
        }
        let timestamp = entry.timestamp.div_euclid(1000) * 1000;
        end = timestamp.saturating_add(span);
        current = Some(TradeQueue::from_raw(
            entry.input_cash,
            entry.output_cash,
            entry.input_coins,
            entry.output_coins,
            timestamp,
        ));
    }
    buckets
}

fn ceil_to_minute(timestamp: i64) -> i64 {
    let minutes = timestamp.div_euclid(MINUTE_MS);
    if timestamp.rem_euclid(MINUTE_MS) == 0 {
        timestamp
    } else {
        (minutes + 1).saturating_mul(MINUTE_MS)
    }
}
