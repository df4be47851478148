//! Huobi market WebSocket message types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::types::{Side, Tick, TickBatch};

/// Channel name of a symbol's trade detail feed
pub fn trade_detail_channel(symbol: &str) -> String {
    format!("market.{}.trade.detail", symbol)
}

/// Subscribe request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubRequest {
    pub sub: String,
    pub id: String,
}

/// Unsubscribe request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsubRequest {
    pub unsub: String,
    pub id: String,
}

/// Server heartbeat, `{"ping": <ts>}`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Ping {
    pub ping: i64,
}

/// Heartbeat reply, `{"pong": <ts>}`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pong {
    pub pong: i64,
}

/// Acknowledgement of a sub/unsub request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubResponse {
    #[serde(default)]
    pub id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub subbed: Option<String>,
    #[serde(default)]
    pub unsubbed: Option<String>,
    #[serde(rename = "err-code", default)]
    pub err_code: Option<String>,
    #[serde(rename = "err-msg", default)]
    pub err_msg: Option<String>,
    #[serde(default)]
    pub ts: i64,
}

/// Trade detail push
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeDetailPush {
    pub ch: String,
    pub ts: i64,
    pub tick: TradeDetailTick,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeDetailTick {
    #[serde(default)]
    pub id: i64,
    pub ts: i64,
    #[serde(default)]
    pub data: Vec<TradeDetail>,
}

/// A single executed trade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeDetail {
    #[serde(rename = "tradeId", default)]
    pub trade_id: i64,
    /// Execution time in milliseconds
    pub ts: i64,
    pub price: Decimal,
    pub amount: Decimal,
    /// Taker direction, `buy` or `sell`
    pub direction: String,
}

impl TradeDetail {
    fn side(&self) -> Option<Side> {
        match self.direction.as_str() {
            "buy" => Some(Side::Buy),
            "sell" => Some(Side::Sell),
            _ => None,
        }
    }
}

impl TradeDetailPush {
    /// Symbol encoded in the channel name
    pub fn symbol(&self) -> Option<&str> {
        self.ch
            .strip_prefix("market.")
            .and_then(|rest| rest.strip_suffix(".trade.detail"))
    }

    /// Convert into a time-ordered batch
    ///
    /// Trades with an unknown direction or a negative price or amount are
    /// skipped.
    pub fn into_batch(self, symbol: &str) -> TickBatch {
        let mut ticks: Vec<Tick> = self
            .tick
            .data
            .iter()
            .filter(|trade| trade.price >= Decimal::ZERO && trade.amount >= Decimal::ZERO)
            .filter_map(|trade| {
                let side = trade.side()?;
                Some(Tick::new(trade.ts, trade.price, trade.amount, side))
            })
            .collect();
        ticks.sort_by_key(|tick| tick.timestamp);
        TickBatch::new(symbol, ticks)
    }
}

/// Any message the trade feed can send
#[derive(Debug, Clone)]
pub enum HuobiMessage {
    Ping(Ping),
    Trade(TradeDetailPush),
    SubResponse(SubResponse),
    Unknown(serde_json::Value),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_trade_push_into_batch() {
        let json = r#"{
            "ch": "market.btcusdt.trade.detail",
            "ts": 1630994963175,
            "tick": {
                "id": 137005445109,
                "ts": 1630994963173,
                "data": [
                    {"id": 1, "ts": 1630994963173, "tradeId": 102523573487, "amount": 0.5, "price": 52648.62, "direction": "sell"},
                    {"id": 2, "ts": 1630994963170, "tradeId": 102523573486, "amount": 0.006754, "price": 52648.62, "direction": "buy"},
                    {"id": 3, "ts": 1630994963174, "tradeId": 102523573488, "amount": 1, "price": 1, "direction": "hold"}
                ]
            }
        }"#;
        let push: TradeDetailPush = serde_json::from_str(json).unwrap();
        assert_eq!(push.symbol(), Some("btcusdt"));

        let batch = push.into_batch("btcusdt");
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.ticks[0].timestamp, 1630994963170);
        assert_eq!(batch.ticks[0].side, Side::Buy);
        assert_eq!(batch.ticks[0].amount, dec!(0.006754));
        assert_eq!(batch.ticks[1].side, Side::Sell);
        assert_eq!(batch.ticks[1].price, dec!(52648.62));
    }

    #[test]
    fn test_requests_serialize() {
        let sub = SubRequest {
            sub: trade_detail_channel("ethusdt"),
            id: "c1".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&sub).unwrap(),
            r#"{"sub":"market.ethusdt.trade.detail","id":"c1"}"#
        );
        assert_eq!(serde_json::to_string(&Pong { pong: 42 }).unwrap(), r#"{"pong":42}"#);
    }
}
