//! Inflow-rate buy/sell rules
//!
//! Both rules compare a short recent window against the longer baseline
//! window right before it. Each window's net cash inflow is divided by its
//! length, so the two rates share a per-second unit and thresholds do not
//! depend on the chosen durations. The reference time is the timestamp of
//! the queue that just sealed.
//!
//! ```text
//!   baseline: [now - listen - count, now - listen)    history only
//!   recent:   [now - listen, now]                      history + sealed queue
//! ```

use rust_decimal::Decimal;
use std::iter;

use super::types::{BuyStrategy, Decision, SellStrategy};
use super::wallet::Holding;
use crate::queue::TradeQueue;

/// Net cash inflow of the queues with timestamps in `[start, end]`
///
/// Queues must be chronologically ordered; the walk starts at the newest and
/// stops at the first queue older than `start`.
pub fn inflow_cash_between<'a, I>(queues: I, start: i64, end: i64) -> Decimal
where
    I: DoubleEndedIterator<Item = &'a TradeQueue>,
{
    let mut total = Decimal::ZERO;
    for queue in queues.rev() {
        if queue.timestamp > end {
            continue;
        }
        if queue.timestamp < start {
            break;
        }
        total += queue.inflow_cash;
    }
    total
}

/// Baseline and recent net inflow per second
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InflowRates {
    pub baseline: Decimal,
    pub recent: Decimal,
}

fn baseline_rate(
    listen_seconds: i64,
    count_seconds: i64,
    queue: &TradeQueue,
    history: &[TradeQueue],
) -> Option<Decimal> {
    if listen_seconds <= 0 || count_seconds <= 0 {
        return None;
    }
    let now = queue.timestamp;
    let end = now - listen_seconds * 1000;
    let start = end - count_seconds * 1000;
    let total = inflow_cash_between(history.iter(), start, end - 1);
    Some(total / Decimal::from(count_seconds))
}

fn recent_rate(listen_seconds: i64, queue: &TradeQueue, history: &[TradeQueue]) -> Decimal {
    let now = queue.timestamp;
    let start = now - listen_seconds * 1000;
    let total = inflow_cash_between(history.iter().chain(iter::once(queue)), start, now);
    total / Decimal::from(listen_seconds)
}

/// Both rates for the given window lengths, `None` if either length is not positive
pub fn inflow_rates(
    listen_seconds: i64,
    count_seconds: i64,
    queue: &TradeQueue,
    history: &[TradeQueue],
) -> Option<InflowRates> {
    let baseline = baseline_rate(listen_seconds, count_seconds, queue, history)?;
    Some(InflowRates {
        baseline,
        recent: recent_rate(listen_seconds, queue, history),
    })
}

/// Whether a wallet holding cash should buy now
pub fn should_buy(strategy: &BuyStrategy, queue: &TradeQueue, history: &[TradeQueue]) -> bool {
    let Some(baseline) = baseline_rate(
        strategy.listen_seconds,
        strategy.count_seconds,
        queue,
        history,
    ) else {
        return false;
    };
    if baseline < strategy.min_average_per_second {
        return false;
    }
    let recent = recent_rate(strategy.listen_seconds, queue, history);
    recent * strategy.trigger_multiple >= baseline
}

/// Whether a wallet holding coins should sell now
pub fn should_sell(strategy: &SellStrategy, queue: &TradeQueue, history: &[TradeQueue]) -> bool {
    let Some(baseline) = baseline_rate(
        strategy.listen_seconds,
        strategy.count_seconds,
        queue,
        history,
    ) else {
        return false;
    };
    if baseline > strategy.max_average_per_second {
        return false;
    }
    let recent = recent_rate(strategy.listen_seconds, queue, history);
    recent * strategy.trigger_multiple <= baseline
}

/// Pick the rule matching what the wallet holds and evaluate it
pub fn evaluate(
    holding: Holding,
    buy: &BuyStrategy,
    sell: &SellStrategy,
    queue: &TradeQueue,
    history: &[TradeQueue],
) -> Decision {
    match holding {
        Holding::Coins if should_sell(sell, queue, history) => Decision::Sell,
        Holding::Cash if should_buy(buy, queue, history) => Decision::Buy,
        _ => Decision::Hold,
    }
}
