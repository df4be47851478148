//! Strategy module - paper trading on inflow-rate heuristics
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  QueueAccumulator seals a TradeQueue                        │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  Player.on_queue_sealed(last_price, queue, history)         │
//! │       │                                                     │
//! │       ├── holding coins → evaluator::should_sell            │
//! │       └── holding cash  → evaluator::should_buy             │
//! │       │                                                     │
//! │       ▼ (if triggered)                                      │
//! │  Wallet.buy / Wallet.sell → Order → DecisionListeners       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The evaluator only reads history; the wallet is only ever moved in the
//! direction its current holding allows, so there is no error path for
//! selling without coins or buying without cash.

pub mod evaluator;
mod player;
mod types;
mod wallet;

pub use evaluator::{evaluate, inflow_rates, should_buy, should_sell, InflowRates};
pub use player::Player;
pub use types::{BuyStrategy, Decision, SellStrategy};
pub use wallet::{Holding, Order, Wallet};
