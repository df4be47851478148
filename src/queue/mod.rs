//! Queue module - per-period cash/coin accumulation with derived unit prices

pub mod accumulator;
pub mod types;

pub use accumulator::{rebucket, QueueAccumulator, QueueOptions};
pub use types::TradeQueue;
