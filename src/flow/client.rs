//! Flow bucketizer fanning one tick stream out to several sliding windows

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

use super::section::{FlowBucket, Section, SlidingWindow};
use crate::common::traits::{SectionGetter, SectionListener};
use crate::common::types::{Side, TickBatch};

/// The windows of one client, looked up by duration
#[derive(Debug, Default)]
struct WindowSet {
    windows: Vec<SlidingWindow>,
}

impl WindowSet {
    fn contains(&self, duration: i64) -> bool {
        self.windows.iter().any(|w| w.duration() == duration)
    }

    fn extend(&mut self, durations: &[i64]) {
        for &duration in durations {
            if !self.contains(duration) {
                self.windows.push(SlidingWindow::new(duration));
            }
        }
    }
}

impl SectionGetter for WindowSet {
    fn section(&self, duration: i64) -> Option<Section> {
        self.windows
            .iter()
            .find(|w| w.duration() == duration)
            .map(SlidingWindow::section)
    }
}

#[derive(Default)]
struct FlowState {
    bucket: FlowBucket,
    windows: WindowSet,
    listeners: Vec<Arc<dyn SectionListener>>,
}

/// Accumulates ticks into fixed-period buckets and maintains rolling sections
///
/// Each sealed bucket is pushed into every registered window, so one pass
/// over the ticks yields an independent rolling sum per window duration.
pub struct FlowClient {
    subscriber_id: String,
    symbol: String,
    /// Bucket period in seconds
    period: i64,
    state: RwLock<FlowState>,
}

impl FlowClient {
    /// Create a client sealing a bucket every `period` seconds
    pub fn new(subscriber_id: impl Into<String>, symbol: impl Into<String>, period: i64) -> Self {
        Self {
            subscriber_id: subscriber_id.into(),
            symbol: symbol.into(),
            period,
            state: RwLock::new(FlowState::default()),
        }
    }

    /// Track a window per duration (seconds) without registering a listener
    pub fn track(&self, durations: &[i64]) {
        let mut state = self.state.write();
        state.windows.extend(durations);
    }

    /// Track a window per duration (seconds) and register a seal listener
    pub fn listen(&self, durations: &[i64], listener: Arc<dyn SectionListener>) {
        let mut state = self.state.write();
        state.windows.extend(durations);
        state.listeners.push(listener);
        info!(
            symbol = %self.symbol,
            windows = state.windows.windows.len(),
            listeners = state.listeners.len(),
            "Flow listener registered"
        );
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
            if !state.bucket.is_started() {
                state.bucket.timestamp = tick.seconds();
            }
            let cash = tick.whole_cash();
            match tick.side {
                Side::Buy => {
                    state.bucket.buy += cash;
                    state.bucket.inflow += cash;
                }
                Side::Sell => {
                    state.bucket.sell += cash;
                    state.bucket.inflow -= cash;
                }
            }
        }

        if last.seconds() < state.bucket.timestamp + self.period {
            return false;
        }

        let bucket = std::mem::take(&mut state.bucket);
        for window in state.windows.windows.iter_mut() {
            window.push(bucket);
        }
        debug!(
            symbol = %self.symbol,
            timestamp = bucket.timestamp,
            buy = bucket.buy,
            sell = bucket.sell,
            inflow = bucket.inflow,
            "Flow bucket sealed"
        );

        let state = &*state;
        for listener in &state.listeners {
            listener.on_bucket_sealed(&self.symbol, last.price, &state.windows);
        }
        true
    }

    /// Current section of the window with the given duration
    pub fn section(&self, duration: i64) -> Option<Section> {
        self.state.read().windows.section(duration)
    }

    /// The live, not yet sealed bucket
    pub fn bucket(&self) -> FlowBucket {
        self.state.read().bucket
    }

    /// Durations of all tracked windows, in registration order
    pub fn durations(&self) -> Vec<i64> {
        self.state
            .read()
            .windows
            .windows
            .iter()
            .map(SlidingWindow::duration)
            .collect()
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn subscriber_id(&self) -> &str {
        &self.subscriber_id
    }

    pub fn period(&self) -> i64 {
        self.period
    }
}
