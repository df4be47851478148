//! Trade Flow Library
//!
//! Real-time aggregation of exchange trade ticks per symbol: rolling
//! buy/sell/inflow windows, per-period trade queues, threshold alerts and a
//! paper-trading strategy, fed from the Huobi trade feed.

pub mod common;
pub mod config;
pub mod flow;
pub mod huobi;
pub mod persistence;
pub mod pipeline;
pub mod queue;
pub mod strategy;
pub mod watcher;

// Re-export commonly used types
pub use common::errors::{FlowError, Result};
pub use common::history::BoundedHistory;
pub use common::traits::{
    AlertListener, DecisionListener, QueueListener, SectionGetter, SectionListener, Subscription,
    TickSource,
};
pub use common::types::{Side, Tick, TickBatch};
pub use config::types::AppConfig;
pub use flow::{FlowBucket, FlowClient, Section, SlidingWindow};
pub use huobi::HuobiTradeSource;
pub use persistence::{
    InMemorySectionStore, PgSectionStore, SectionRecord, SectionRecorder, SectionStore,
};
pub use pipeline::{Pipeline, PipelineRegistry};
pub use queue::{QueueAccumulator, QueueOptions, TradeQueue};
pub use watcher::{AlertRule, FlowWatcher, LogAlertListener, SectionFlow, WatcherOptions};

// Strategy types
pub use strategy::{BuyStrategy, Decision, Holding, Order, Player, SellStrategy, Wallet};
