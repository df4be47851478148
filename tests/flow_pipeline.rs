//! End-to-end tests: tick feed -> pipeline -> windows, watcher and recorder

mod common;

use common::*;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use std::sync::Arc;
use trade_flow::common::traits::AlertListener;
use trade_flow::common::types::{Side, Tick, TickBatch};
use trade_flow::persistence::{InMemorySectionStore, SectionStore};
use trade_flow::{AlertRule, FlowWatcher, PipelineRegistry, SectionFlow, WatcherOptions};

const S0: i64 = T0 / 1000;

#[test_log::test(tokio::test)]
async fn test_feed_to_recorded_sections() {
    let config = config_with(
        r#"
[flow]
durations = [10, 30, 60]
"#,
    );
    let source = ReplaySource {
        batches: steady_batches(T0, 10_000, &[100, 200, -50, 300, 400, -100]),
    };
    let store = Arc::new(InMemorySectionStore::new());
    let registry = PipelineRegistry::new();

    let pipeline = registry
        .launch(&config, &subscription(), &source, Some(store.clone()))
        .await
        .unwrap();
    assert_eq!(registry.symbols(), vec![SYMBOL.to_string()]);
    registry.shutdown(SYMBOL).await.unwrap();

    // Buckets: S0 {buy 300}, S0+20 {buy 300, sell 50}, S0+40 {buy 400, sell 100}
    let thirty = pipeline.flow().section(30).unwrap();
    assert_eq!((thirty.buy, thirty.sell, thirty.inflow), (700, 150, 550));
    assert_eq!(thirty.start_time, S0 + 20);
    assert_eq!(thirty.end_time, S0 + 40);

    let records = store.find_sections(10, 0).await.unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].triple(10), Some((300, 0, 300)));
    assert_eq!(records[1].triple(30), Some((600, 50, 550)));

    let last = &records[2];
    assert_eq!(last.triple(10), Some((400, 100, 300)));
    assert_eq!(last.triple(30), Some((700, 150, 550)));
    assert_eq!(last.triple(60), Some((1000, 150, 850)));
    assert_eq!(last.triple(300), Some((0, 0, 0)));
    assert_eq!(last.end_time, S0 + 40);
}

#[tokio::test]
async fn test_windows_match_watcher_history() {
    let config = config_with(
        r#"
[flow]
durations = [10, 30, 60, 300]
"#,
    );

    // Irregular multi-tick batches from a fixed LCG sequence
    let mut seed: u64 = 42;
    let mut next = move || {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (seed >> 33) as i64
    };
    let mut timestamp = T0;
    let mut batches = Vec::new();
    for _ in 0..400 {
        let ticks: Vec<Tick> = (0..1 + next() % 4)
            .map(|_| {
                timestamp += next() % 1500;
                let side = if next() % 2 == 0 { Side::Buy } else { Side::Sell };
                Tick::new(timestamp, dec!(1.5), rust_decimal::Decimal::from(1 + next() % 500), side)
            })
            .collect();
        batches.push(TickBatch::new(SYMBOL, ticks));
    }

    let registry = PipelineRegistry::new();
    let pipeline = registry
        .launch(&config, &subscription(), &ReplaySource { batches }, None)
        .await
        .unwrap();
    registry.shutdown_all().await;

    assert!(pipeline.watcher().len() > 10);
    for duration in [10, 30, 60, 300] {
        let section = pipeline.flow().section(duration).unwrap();
        let expected = pipeline
            .watcher()
            .section_flow(section.end_time - duration, duration);
        assert_eq!(section.buy, expected.buy_cash, "buy over {}s", duration);
        assert_eq!(section.sell, expected.sell_cash, "sell over {}s", duration);
        assert_eq!(section.inflow, expected.inflow_cash, "inflow over {}s", duration);
        assert_eq!(section.inflow, section.buy - section.sell);
    }
}

#[derive(Default)]
struct Alerts {
    fired: Mutex<Vec<(String, SectionFlow)>>,
}

impl AlertListener for Alerts {
    fn on_alert(&self, _symbol: &str, rule: &AlertRule, flow: &SectionFlow) {
        self.fired.lock().push((rule.name.clone(), *flow));
    }
}

#[test]
fn test_inflow_rule_fires_with_other_dimensions_zeroed() {
    let watcher = FlowWatcher::new(WatcherOptions {
        symbol: SYMBOL.to_string(),
        subscriber_id: "c1".to_string(),
        section_seconds: 10,
        max_flows: 100,
        evict_flows: 10,
    });
    let alerts = Arc::new(Alerts::default());
    watcher.handle(
        AlertRule {
            name: "inflow".to_string(),
            duration_seconds: 60,
            inflow_cash: 500,
            ..Default::default()
        },
        alerts.clone(),
    );
    watcher.handle(
        AlertRule {
            name: "sell".to_string(),
            duration_seconds: 60,
            sell_cash: 1000,
            ..Default::default()
        },
        alerts.clone(),
    );

    // Sealed buckets: S0 {buy 300, sell 100}, S0+20 {buy 400}
    watcher.feed(&batch(vec![buy(T0, 300), sell(T0 + 1_000, 100)]));
    watcher.feed(&batch(vec![buy(T0 + 10_000, 0)]));
    assert!(alerts.fired.lock().is_empty());

    watcher.feed(&batch(vec![buy(T0 + 20_000, 400)]));
    watcher.feed(&batch(vec![buy(T0 + 30_000, 0)]));

    let fired = alerts.fired.lock();
    assert_eq!(fired.len(), 1);
    let (name, flow) = &fired[0];
    assert_eq!(name, "inflow");
    assert_eq!(flow.inflow_cash, 600);
    assert_eq!(flow.buy_cash, 0);
    assert_eq!(flow.sell_cash, 0);
}
