//! Flow buckets and the sliding windows that sum them

use serde::{Deserialize, Serialize};

/// Cash flow accumulated over one bucket period
///
/// All cash values are whole units. `timestamp` is the bucket start in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowBucket {
    pub buy: i64,
    pub sell: i64,
    /// Buy minus sell, negative on net selling
    pub inflow: i64,
    pub timestamp: i64,
}

impl FlowBucket {
    /// Whether any tick has opened this bucket yet
    pub fn is_started(&self) -> bool {
        self.timestamp != 0
    }
}

/// Rolling sums over the buckets retained by one window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub buy: i64,
    pub sell: i64,
    pub inflow: i64,
    /// Timestamp of the oldest retained bucket
    pub start_time: i64,
    /// Timestamp of the most recently pushed bucket
    pub end_time: i64,
}

/// Fixed-duration window maintained incrementally as buckets arrive
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    duration: i64,
    section: Section,
    buckets: Vec<FlowBucket>,
}

impl SlidingWindow {
    /// Create an empty window spanning `duration` seconds
    pub fn new(duration: i64) -> Self {
        Self {
            duration,
            section: Section::default(),
            buckets: Vec::new(),
        }
    }

    /// Add a sealed bucket and evict everything older than the window
    pub fn push(&mut self, bucket: FlowBucket) {
        self.section.end_time = bucket.timestamp;

        let min_time = bucket.timestamp - self.duration;

        self.section.buy += bucket.buy;
        self.section.sell += bucket.sell;
        self.section.inflow += bucket.inflow;
        self.buckets.push(bucket);

        let mut expired = 0;
        for old in &self.buckets {
            if old.timestamp < min_time {
                self.section.buy -= old.buy;
                self.section.sell -= old.sell;
                self.section.inflow -= old.inflow;
                expired += 1;
            } else {
                self.section.start_time = old.timestamp;
                break;
            }
        }
        if expired > 0 {
            self.buckets.drain(..expired);
        }
    }

    pub fn duration(&self) -> i64 {
        self.duration
    }

    pub fn section(&self) -> Section {
        self.section
    }

    /// Number of retained buckets
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bucket(timestamp: i64, buy: i64, sell: i64) -> FlowBucket {
        FlowBucket {
            buy,
            sell,
            inflow: buy - sell,
            timestamp,
        }
    }

    #[test]
    fn test_three_buckets_fifteen_second_window() {
        let mut window = SlidingWindow::new(15);
        window.push(bucket(0, 100, 0));
        window.push(bucket(10, 100, 0));
        window.push(bucket(20, 100, 0));

        assert_eq!(
            window.section(),
            Section {
                buy: 200,
                sell: 0,
                inflow: 200,
                start_time: 10,
                end_time: 20,
            }
        );
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn test_bucket_on_window_edge_is_kept() {
        let mut window = SlidingWindow::new(10);
        window.push(bucket(0, 5, 1));
        window.push(bucket(10, 7, 2));

        // 0 is not < 10 - 10, so it stays
        let section = window.section();
        assert_eq!(section.buy, 12);
        assert_eq!(section.start_time, 0);
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn test_evicts_exactly_the_expired_prefix() {
        let mut window = SlidingWindow::new(30);
        for ts in [0, 10, 20, 30] {
            window.push(bucket(ts, 10, 4));
        }
        assert_eq!(window.section().buy, 40);

        // A jump far ahead removes all four prior buckets and nothing else
        window.push(bucket(100, 1, 3));
        assert_eq!(
            window.section(),
            Section {
                buy: 1,
                sell: 3,
                inflow: -2,
                start_time: 100,
                end_time: 100,
            }
        );
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_sums_match_retained_buckets_after_every_push() {
        let durations = [10, 30, 60];
        let mut windows: Vec<SlidingWindow> =
            durations.iter().map(|d| SlidingWindow::new(*d)).collect();
        let mut pushed = Vec::new();

        for i in 0..40i64 {
            let b = bucket(i * 7, (i * 13) % 17, (i * 5) % 11);
            pushed.push(b);
            for window in windows.iter_mut() {
                window.push(b);
                let end = b.timestamp;
                let start = end - window.duration();
                let in_range: Vec<&FlowBucket> = pushed
                    .iter()
                    .filter(|p| p.timestamp >= start && p.timestamp <= end)
                    .collect();
                let section = window.section();
                assert_eq!(section.buy, in_range.iter().map(|p| p.buy).sum::<i64>());
                assert_eq!(section.sell, in_range.iter().map(|p| p.sell).sum::<i64>());
                assert_eq!(section.inflow, in_range.iter().map(|p| p.inflow).sum::<i64>());
                assert_eq!(section.start_time, in_range[0].timestamp);
                assert_eq!(section.end_time, end);
            }
        }
    }
}
