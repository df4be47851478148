//! Alert rules evaluated over time-offset windows of flow buckets

use serde::{Deserialize, Serialize};

use crate::flow::FlowBucket;

/// Threshold alert over a window ending `offset_seconds` before the latest bucket
///
/// A threshold of 0 means the dimension is not monitored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRule {
    /// Label used in logs
    #[serde(default)]
    pub name: String,
    /// How far the window end lies before the latest bucket, in seconds
    #[serde(default)]
    pub offset_seconds: i64,
    /// Window length in seconds
    pub duration_seconds: i64,
    /// Alert when total buy cash reaches this value
    #[serde(default)]
    pub buy_cash: i64,
    /// Alert when total sell cash reaches this value
    #[serde(default)]
    pub sell_cash: i64,
    /// Positive: alert when net inflow reaches it. Negative: alert when net
    /// inflow falls to it (net outflow).
    #[serde(default)]
    pub inflow_cash: i64,
}

/// Summed flow over a closed time window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionFlow {
    pub buy_cash: i64,
    pub sell_cash: i64,
    /// Negative on net outflow
    pub inflow_cash: i64,
    /// Window start in seconds
    pub start_time: i64,
    /// Window end in seconds
    pub end_time: i64,
}

/// Sum chronologically ordered buckets whose timestamp lies in `[start, end]`
///
/// Walks from the newest bucket backwards and stops at the first one older
/// than `start`.
pub fn section_flow<'a, I>(buckets: I, start: i64, end: i64) -> SectionFlow
where
    I: DoubleEndedIterator<Item = &'a FlowBucket>,
{
    let mut flow = SectionFlow {
        start_time: start,
        end_time: end,
        ..Default::default()
    };
    for bucket in buckets.rev() {
        if bucket.timestamp > end {
            continue;
        }
        if bucket.timestamp < start {
            break;
        }
        flow.buy_cash += bucket.buy;
        flow.sell_cash += bucket.sell;
        flow.inflow_cash += bucket.inflow;
    }
    flow
}

impl AlertRule {
    /// Evaluate the rule against chronologically ordered history
    ///
    /// Returns the window flow with only the triggered dimensions set, or
    /// `None` when no monitored dimension crossed its threshold.
    pub fn is_alert(&self, history: &[FlowBucket]) -> Option<SectionFlow> {
        let latest = history.last()?.timestamp;
        let end = latest.saturating_sub(self.offset_seconds);
        let start = end.saturating_sub(self.duration_seconds);
        let mut flow = section_flow(history.iter(), start, end);

        let inflow = (self.inflow_cash > 0 && flow.inflow_cash >= self.inflow_cash)
            || (self.inflow_cash < 0 && flow.inflow_cash <= self.inflow_cash);
        if !inflow {
            flow.inflow_cash = 0;
        }

        let buy = self.buy_cash > 0 && flow.buy_cash >= self.buy_cash;
        if !buy {
            flow.buy_cash = 0;
        }

        let sell = self.sell_cash > 0 && flow.sell_cash >= self.sell_cash;
        if !sell {
            flow.sell_cash = 0;
        }

        (inflow || buy || sell).then_some(flow)
    }

    /// Whether any dimension is monitored at all
    pub fn is_monitoring(&self) -> bool {
        self.buy_cash != 0 || self.sell_cash != 0 || self.inflow_cash != 0
    }
}
