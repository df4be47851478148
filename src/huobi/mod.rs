//! Huobi exchange integration
//!
//! Provides the [`HuobiTradeSource`] trade feed, a [`crate::common::traits::TickSource`]
//! that turns the `market.<symbol>.trade.detail` channel into tick batches.

pub mod messages;
pub mod websocket;

pub use messages::{trade_detail_channel, HuobiMessage, TradeDetail, TradeDetailPush};
pub use websocket::HuobiTradeSource;
