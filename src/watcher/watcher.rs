//! Flow watcher: bucketizer with retained history and threshold alerts

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::rule::{section_flow, AlertRule, SectionFlow};
use crate::common::history::BoundedHistory;
use crate::common::traits::AlertListener;
use crate::common::types::{Side, TickBatch};
use crate::flow::FlowBucket;

/// Construction options for a [`FlowWatcher`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherOptions {
    pub symbol: String,
    pub subscriber_id: String,
    /// Bucket period in seconds
    pub section_seconds: i64,
    /// History length that triggers eviction
    pub max_flows: usize,
    /// Number of oldest buckets dropped per eviction
    pub evict_flows: usize,
}

struct WatchedRule {
    rule: AlertRule,
    listener: Arc<dyn AlertListener>,
}

struct WatcherState {
    flow: FlowBucket,
    flows: BoundedHistory<FlowBucket>,
    rules: Vec<WatchedRule>,
}

/// Buckets ticks like [`crate::flow::FlowClient`] but keeps the bucket
/// history, so arbitrary windows can be summed on demand and alert rules
/// checked on every seal.
pub struct FlowWatcher {
    symbol: String,
    subscriber_id: String,
    section_seconds: i64,
    state: RwLock<WatcherState>,
}

impl FlowWatcher {
    pub fn new(options: WatcherOptions) -> Self {
        Self {
            symbol: options.symbol,
            subscriber_id: options.subscriber_id,
            section_seconds: options.section_seconds,
            state: RwLock::new(WatcherState {
                flow: FlowBucket::default(),
                flows: BoundedHistory::new(options.max_flows, options.evict_flows),
                rules: Vec::new(),
            }),
        }
    }

    /// Register a rule and the listener fired when it alerts
    pub fn handle(&self, rule: AlertRule, listener: Arc<dyn AlertListener>) {
        if !rule.is_monitoring() {
            warn!(
                symbol = %self.symbol,
                rule = %rule.name,
                "Alert rule monitors nothing and will never fire"
            );
        }
        let mut state = self.state.write();
        state.rules.push(WatchedRule { rule, listener });
        info!(symbol = %self.symbol, rules = state.rules.len(), "Alert rule registered");
    }

    /// Consume one ordered batch of ticks
    ///
    /// Returns `true` when the batch sealed a bucket.
    pub fn feed(&self, batch: &TickBatch) -> bool {
        let Some(last) = batch.last() else {
            return false;
        };

        let mut state = self.state.write();
        for tick in &batch.ticks {
            if !state.flow.is_started() {
                state.flow.timestamp = tick.seconds();
            }
            let cash = tick.whole_cash();
            match tick.side {
                Side::Buy => {
                    state.flow.buy += cash;
                    state.flow.inflow += cash;
                }
                Side::Sell => {
                    state.flow.sell += cash;
                    state.flow.inflow -= cash;
                }
            }
        }

        if last.seconds() < state.flow.timestamp + self.section_seconds {
            return false;
        }

        let sealed = std::mem::take(&mut state.flow);
        let evicted = state.flows.push(sealed);
        debug!(
            symbol = %self.symbol,
            timestamp = sealed.timestamp,
            inflow = sealed.inflow,
            evicted,
            "Watcher bucket sealed"
        );

        let state = &*state;
        for watched in &state.rules {
            if let Some(flow) = watched.rule.is_alert(state.flows.as_slice()) {
                watched.listener.on_alert(&self.symbol, &watched.rule, &flow);
            }
        }
        true
    }

    /// Sum of the buckets in `[start_time, start_time + duration]`, seconds
    ///
    /// The live bucket counts once it has received a tick. The window end
    /// saturates at `i64::MAX`.
    pub fn section_flow(&self, start_time: i64, duration: i64) -> SectionFlow {
        let state = self.state.read();
        let live = state.flow.is_started().then_some(&state.flow);
        section_flow(
            state.flows.iter().chain(live),
            start_time,
            start_time.saturating_add(duration),
        )
    }

    /// The live, not yet sealed bucket
    pub fn flow(&self) -> FlowBucket {
        self.state.read().flow
    }

    /// Sealed history followed by the live bucket
    pub fn flows(&self) -> Vec<FlowBucket> {
        let state = self.state.read();
        let mut flows = state.flows.to_vec();
        flows.push(state.flow);
        flows
    }

    pub fn len(&self) -> usize {
        self.state.read().flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().flows.is_empty()
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn subscriber_id(&self) -> &str {
        &self.subscriber_id
    }
}

/// Alert listener that reports through the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertListener;

impl AlertListener for LogAlertListener {
    fn on_alert(&self, symbol: &str, rule: &AlertRule, flow: &SectionFlow) {
        warn!(
            symbol,
            rule = %rule.name,
            buy_cash = flow.buy_cash,
            sell_cash = flow.sell_cash,
            inflow_cash = flow.inflow_cash,
            start_time = flow.start_time,
            end_time = flow.end_time,
            "Flow alert"
        );
    }
}
