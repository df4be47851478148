//! WebSocket trade feed for Huobi

use async_trait::async_trait;
use flate2::read::GzDecoder;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::io::Read;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, error, info, instrument, warn};

use super::messages::*;
use crate::common::errors::{FlowError, Result};
use crate::common::traits::{Subscription, TickSource};
use crate::common::types::TickBatch;
use crate::config::AppConfig;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWrite = SplitSink<WsStream, Message>;

/// Trade feed over the Huobi market WebSocket
///
/// Each subscription owns one connection. Frames arrive gzip-compressed;
/// server pings are answered with pongs; the connection is re-established
/// after `reconnect_delay` until `max_reconnect_attempts` consecutive
/// failed connects (0 = retry forever).
#[derive(Debug, Clone)]
pub struct HuobiTradeSource {
    url: String,
    reconnect_delay: Duration,
    max_reconnect_attempts: u32,
}

impl HuobiTradeSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_delay: Duration::from_millis(5000),
            max_reconnect_attempts: 0,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.exchange.websocket_url.clone()).with_reconnect(
            config.settings.reconnect_delay_ms,
            config.settings.max_reconnect_attempts,
        )
    }

    /// Set the reconnection policy
    pub fn with_reconnect(mut self, delay_ms: u64, max_attempts: u32) -> Self {
        self.reconnect_delay = Duration::from_millis(delay_ms);
        self.max_reconnect_attempts = max_attempts;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Inflate a gzip-compressed binary frame
    pub fn inflate(data: &[u8]) -> Result<String> {
        let mut text = String::new();
        GzDecoder::new(data).read_to_string(&mut text)?;
        Ok(text)
    }

    /// Classify an incoming text message
    pub fn parse_message(text: &str) -> Result<HuobiMessage> {
        let value: serde_json::Value = serde_json::from_str(text)?;

        if value.get("ping").is_some() {
            return Ok(HuobiMessage::Ping(serde_json::from_value(value)?));
        }
        if value.get("ch").is_some() && value.get("tick").is_some() {
            return Ok(HuobiMessage::Trade(serde_json::from_value(value)?));
        }
        if value.get("status").is_some() {
            return Ok(HuobiMessage::SubResponse(serde_json::from_value(value)?));
        }
        Ok(HuobiMessage::Unknown(value))
    }
}

#[async_trait]
impl TickSource for HuobiTradeSource {
    #[instrument(skip(self, sender))]
    async fn subscribe(
        &self,
        symbol: &str,
        subscriber_id: &str,
        sender: mpsc::Sender<TickBatch>,
    ) -> Result<Subscription> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        let feed = TradeFeed {
            url: self.url.clone(),
            symbol: symbol.to_string(),
            subscriber_id: subscriber_id.to_string(),
            reconnect_delay: self.reconnect_delay,
            max_reconnect_attempts: self.max_reconnect_attempts,
        };
        let handle = tokio::spawn(feed.run(sender, shutdown_rx));
        Ok(Subscription::new(symbol, shutdown_tx, handle))
    }

    fn source_name(&self) -> &'static str {
        "huobi"
    }
}

/// Why a connection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    Shutdown,
    Disconnected,
    ReceiverClosed,
}

struct TradeFeed {
    url: String,
    symbol: String,
    subscriber_id: String,
    reconnect_delay: Duration,
    max_reconnect_attempts: u32,
}

impl TradeFeed {
    async fn run(self, sender: mpsc::Sender<TickBatch>, mut shutdown: mpsc::Receiver<()>) {
        let mut failures: u32 = 0;
        loop {
            match self.session(&sender, &mut shutdown).await {
                Ok(SessionEnd::Shutdown) | Ok(SessionEnd::ReceiverClosed) => break,
                Ok(SessionEnd::Disconnected) => failures = 0,
                Err(e) => {
                    failures += 1;
                    error!(symbol = %self.symbol, attempt = failures, "Trade feed error: {}", e);
                }
            }

            if self.max_reconnect_attempts > 0 && failures >= self.max_reconnect_attempts {
                error!(
                    symbol = %self.symbol,
                    "Giving up after {} reconnect attempts",
                    self.max_reconnect_attempts
                );
                break;
            }

            info!(symbol = %self.symbol, "Reconnecting in {:?}", self.reconnect_delay);
            tokio::select! {
                _ = tokio::time::sleep(self.reconnect_delay) => {}
                _ = shutdown.recv() => break,
            }
        }
        info!(symbol = %self.symbol, "Trade feed stopped");
    }

    async fn session(
        &self,
        sender: &mpsc::Sender<TickBatch>,
        shutdown: &mut mpsc::Receiver<()>,
    ) -> Result<SessionEnd> {
        info!(symbol = %self.symbol, "Connecting to Huobi WebSocket: {}", self.url);
        let (ws_stream, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|e| FlowError::WebSocketConnection(e.to_string()))?;
        info!(symbol = %self.symbol, "WebSocket connection established");

        let (mut write, mut read) = ws_stream.split();

        let channel = trade_detail_channel(&self.symbol);
        let request = SubRequest {
            sub: channel.clone(),
            id: self.subscriber_id.clone(),
        };
        write
            .send(Message::Text(serde_json::to_string(&request)?))
            .await?;
        debug!(symbol = %self.symbol, "Subscription sent: {}", channel);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    self.unsubscribe(&mut write, channel).await;
                    return Ok(SessionEnd::Shutdown);
                }
                msg = read.next() => {
                    if let Some(end) = self.handle_frame(msg, &mut write, sender).await? {
                        return Ok(end);
                    }
                }
            }
        }
    }

    async fn handle_frame(
        &self,
        msg: Option<std::result::Result<Message, tokio_tungstenite::tungstenite::Error>>,
        write: &mut WsWrite,
        sender: &mpsc::Sender<TickBatch>,
    ) -> Result<Option<SessionEnd>> {
        let text = match msg {
            Some(Ok(Message::Binary(data))) => match HuobiTradeSource::inflate(&data) {
                Ok(text) => text,
                Err(e) => {
                    warn!(symbol = %self.symbol, "Failed to inflate frame: {}", e);
                    return Ok(None);
                }
            },
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Ping(data))) => {
                write.send(Message::Pong(data)).await?;
                return Ok(None);
            }
            Some(Ok(Message::Close(frame))) => {
                info!(symbol = %self.symbol, "WebSocket closed: {:?}", frame);
                return Ok(Some(SessionEnd::Disconnected));
            }
            Some(Err(e)) => {
                error!(symbol = %self.symbol, "WebSocket error: {}", e);
                return Ok(Some(SessionEnd::Disconnected));
            }
            None => {
                info!(symbol = %self.symbol, "WebSocket stream ended");
                return Ok(Some(SessionEnd::Disconnected));
            }
            Some(Ok(_)) => return Ok(None),
        };

        match HuobiTradeSource::parse_message(&text) {
            Ok(HuobiMessage::Ping(ping)) => {
                let pong = serde_json::to_string(&Pong { pong: ping.ping })?;
                write.send(Message::Text(pong)).await?;
            }
            Ok(HuobiMessage::Trade(push)) => {
                let batch = push.into_batch(&self.symbol);
                if batch.is_empty() {
                    return Ok(None);
                }
                if sender.send(batch).await.is_err() {
                    info!(symbol = %self.symbol, "Tick receiver dropped");
                    return Ok(Some(SessionEnd::ReceiverClosed));
                }
            }
            Ok(HuobiMessage::SubResponse(response)) if response.status == "ok" => {
                info!(symbol = %self.symbol, subbed = ?response.subbed, "Subscribed");
            }
            Ok(HuobiMessage::SubResponse(response)) => {
                warn!(
                    symbol = %self.symbol,
                    code = ?response.err_code,
                    "Subscription rejected: {:?}",
                    response.err_msg
                );
            }
            Ok(HuobiMessage::Unknown(value)) => {
                debug!(symbol = %self.symbol, "Ignoring message: {}", value);
            }
            Err(e) => {
                warn!(symbol = %self.symbol, "Failed to parse message: {} - {}", e, text);
            }
        }
        Ok(None)
    }

    async fn unsubscribe(&self, write: &mut WsWrite, channel: String) {
        let request = UnsubRequest {
            unsub: channel,
            id: self.subscriber_id.clone(),
        };
        let sent = match serde_json::to_string(&request) {
            Ok(json) => write.send(Message::Text(json)).await,
            Err(e) => {
                warn!(symbol = %self.symbol, "Failed to encode unsubscribe: {}", e);
                Ok(())
            }
        };
        if let Err(e) = sent {
            debug!(symbol = %self.symbol, "Unsubscribe not delivered: {}", e);
        }
        if let Err(e) = write.close().await {
            debug!(symbol = %self.symbol, "Close not delivered: {}", e);
        }
    }
}
