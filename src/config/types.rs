//! Configuration types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::errors::{FlowError, Result};
use crate::queue::QueueOptions;
use crate::strategy::{BuyStrategy, SellStrategy};
use crate::watcher::{AlertRule, WatcherOptions};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Exchange connection configuration
    #[serde(default)]
    pub exchange: ExchangeConfig,
    /// Database configuration (optional, sections are not recorded without it)
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
    /// Subscriptions in `"symbol:client_id, symbol:client_id"` form
    #[serde(default)]
    pub subscribes: String,
    #[serde(default)]
    pub flow: FlowConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub watcher: WatcherConfig,
    /// Paper-trading session attached to every pipeline (optional)
    #[serde(default)]
    pub player: Option<PlayerConfig>,
}

/// One `symbol:client_id` entry of [`AppConfig::subscribes`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolSubscription {
    pub symbol: String,
    pub subscriber_id: String,
}

impl AppConfig {
    /// Parse the subscription list
    ///
    /// Whitespace is removed before splitting; empty entries are skipped.
    pub fn subscriptions(&self) -> Result<Vec<SymbolSubscription>> {
        let compact: String = self.subscribes.chars().filter(|c| !c.is_whitespace()).collect();
        let mut subscriptions = Vec::new();
        for entry in compact.split(',').filter(|entry| !entry.is_empty()) {
            let Some((symbol, subscriber_id)) = entry.split_once(':') else {
                return Err(FlowError::Configuration(format!(
                    "subscription '{}' is not in symbol:client_id form",
                    entry
                )));
            };
            if symbol.is_empty() || subscriber_id.is_empty() || subscriber_id.contains(':') {
                return Err(FlowError::Configuration(format!(
                    "subscription '{}' is not in symbol:client_id form",
                    entry
                )));
            }
            if !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(FlowError::Configuration(format!(
                    "symbol '{}' must be alphanumeric",
                    symbol
                )));
            }
            let symbol = symbol.to_lowercase();
            if subscriptions
                .iter()
                .any(|existing: &SymbolSubscription| existing.symbol == symbol)
            {
                return Err(FlowError::Configuration(format!(
                    "symbol '{}' is subscribed twice",
                    symbol
                )));
            }
            subscriptions.push(SymbolSubscription {
                symbol,
                subscriber_id: subscriber_id.to_string(),
            });
        }
        Ok(subscriptions)
    }

    /// Reject configurations the pipelines cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.flow.period_seconds <= 0 {
            return Err(invalid("flow.period_seconds must be positive"));
        }
        if self.flow.durations.is_empty() {
            return Err(invalid("flow.durations must not be empty"));
        }
        if self.flow.durations.iter().any(|d| *d <= 0) {
            return Err(invalid("flow.durations must all be positive"));
        }
        if self.queue.period_ms <= 0 {
            return Err(invalid("queue.period_ms must be positive"));
        }
        check_capacity("queue", self.queue.max_queues, self.queue.evict_queues)?;
        if self.watcher.section_seconds <= 0 {
            return Err(invalid("watcher.section_seconds must be positive"));
        }
        check_capacity("watcher", self.watcher.max_flows, self.watcher.evict_flows)?;
        if self
            .watcher
            .rules
            .iter()
            .any(|rule| rule.duration_seconds <= 0 || rule.offset_seconds < 0)
        {
            return Err(invalid("watcher rules need a positive duration and a non-negative offset"));
        }
        if self.settings.channel_size == 0 || self.settings.record_channel_size == 0 {
            return Err(invalid("channel sizes must be at least 1"));
        }
        if let Some(player) = &self.player {
            if player.initial_cash <= Decimal::ZERO {
                return Err(invalid("player.initial_cash must be positive"));
            }
        }
        if self.subscriptions()?.is_empty() {
            return Err(invalid("at least one subscription is required"));
        }
        Ok(())
    }

    /// Accumulator options for one subscription
    pub fn queue_options(&self, subscription: &SymbolSubscription) -> QueueOptions {
        QueueOptions {
            symbol: subscription.symbol.clone(),
            subscriber_id: subscription.subscriber_id.clone(),
            period_ms: self.queue.period_ms,
            max_queues: self.queue.max_queues,
            evict_queues: self.queue.evict_queues,
        }
    }

    /// Watcher options for one subscription
    pub fn watcher_options(&self, subscription: &SymbolSubscription) -> WatcherOptions {
        WatcherOptions {
            symbol: subscription.symbol.clone(),
            subscriber_id: subscription.subscriber_id.clone(),
            section_seconds: self.watcher.section_seconds,
            max_flows: self.watcher.max_flows,
            evict_flows: self.watcher.evict_flows,
        }
    }
}

fn invalid(message: &str) -> FlowError {
    FlowError::Configuration(message.to_string())
}

fn check_capacity(section: &str, max: usize, evict: usize) -> Result<()> {
    if max == 0 {
        return Err(FlowError::Configuration(format!("{}: capacity must be at least 1", section)));
    }
    if evict == 0 || evict > max {
        return Err(FlowError::Configuration(format!(
            "{}: eviction count must be between 1 and {}",
            section, max
        )));
    }
    Ok(())
}

/// Exchange connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// WebSocket URL for the trade feed
    #[serde(default = "default_websocket_url")]
    pub websocket_url: String,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            websocket_url: default_websocket_url(),
        }
    }
}

fn default_websocket_url() -> String {
    "wss://api.huobi.pro/ws".to_string()
}

/// Database configuration for section snapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_seconds: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_connection_timeout() -> u64 {
    30
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Delay between reconnection attempts in milliseconds
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
    /// Maximum reconnection attempts (0 = infinite)
    #[serde(default)]
    pub max_reconnect_attempts: u32,
    /// Capacity of each symbol's tick channel
    #[serde(default = "default_channel_size")]
    pub channel_size: usize,
    /// Capacity of each symbol's section record channel
    #[serde(default = "default_record_channel_size")]
    pub record_channel_size: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            reconnect_delay_ms: default_reconnect_delay(),
            max_reconnect_attempts: 0,
            channel_size: default_channel_size(),
            record_channel_size: default_record_channel_size(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_reconnect_delay() -> u64 {
    5000
}

fn default_channel_size() -> usize {
    1000
}

fn default_record_channel_size() -> usize {
    256
}

/// Bucketizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Bucket period in seconds
    #[serde(default = "default_flow_period")]
    pub period_seconds: i64,
    /// Sliding window durations in seconds
    #[serde(default = "default_flow_durations")]
    pub durations: Vec<i64>,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            period_seconds: default_flow_period(),
            durations: default_flow_durations(),
        }
    }
}

fn default_flow_period() -> i64 {
    10
}

fn default_flow_durations() -> Vec<i64> {
    vec![10, 30, 60, 300, 900, 3600, 14400]
}

/// Trade queue accumulator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Queue period in milliseconds
    #[serde(default = "default_queue_period")]
    pub period_ms: i64,
    #[serde(default = "default_max_history")]
    pub max_queues: usize,
    #[serde(default = "default_evict_history")]
    pub evict_queues: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            period_ms: default_queue_period(),
            max_queues: default_max_history(),
            evict_queues: default_evict_history(),
        }
    }
}

fn default_queue_period() -> i64 {
    10_000
}

// One day of 10s periods, trimmed an hour at a time
fn default_max_history() -> usize {
    8640
}

fn default_evict_history() -> usize {
    360
}

/// Alert watcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Bucket period in seconds
    #[serde(default = "default_flow_period")]
    pub section_seconds: i64,
    #[serde(default = "default_max_history")]
    pub max_flows: usize,
    #[serde(default = "default_evict_history")]
    pub evict_flows: usize,
    #[serde(default)]
    pub rules: Vec<AlertRule>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            section_seconds: default_flow_period(),
            max_flows: default_max_history(),
            evict_flows: default_evict_history(),
            rules: Vec::new(),
        }
    }
}

/// Paper-trading session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_player_name")]
    pub name: String,
    #[serde(default = "default_initial_cash")]
    pub initial_cash: Decimal,
    pub buy: BuyStrategy,
    pub sell: SellStrategy,
}

fn default_player_name() -> String {
    "player".to_string()
}

fn default_initial_cash() -> Decimal {
    Decimal::from(1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config(subscribes: &str) -> AppConfig {
        AppConfig {
            exchange: ExchangeConfig::default(),
            database: None,
            settings: AppSettings::default(),
            subscribes: subscribes.to_string(),
            flow: FlowConfig::default(),
            queue: QueueConfig::default(),
            watcher: WatcherConfig::default(),
            player: None,
        }
    }

    #[test]
    fn test_subscriptions_parse_with_whitespace() {
        let subscriptions = config(" btcusdt:c1, ethusdt : c2 ,").subscriptions().unwrap();
        assert_eq!(
            subscriptions,
            vec![
                SymbolSubscription {
                    symbol: "btcusdt".to_string(),
                    subscriber_id: "c1".to_string(),
                },
                SymbolSubscription {
                    symbol: "ethusdt".to_string(),
                    subscriber_id: "c2".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_malformed_subscriptions_are_rejected() {
        assert!(config("btcusdt").subscriptions().is_err());
        assert!(config("btcusdt:").subscriptions().is_err());
        assert!(config(":c1").subscriptions().is_err());
        assert!(config("btc-usdt:c1").subscriptions().is_err());
        assert!(config("btcusdt:c1,btcusdt:c2").subscriptions().is_err());
    }

    #[test]
    fn test_defaults_validate() {
        let config = config("btcusdt:c1");
        assert!(config.validate().is_ok());
        assert_eq!(config.flow.durations, vec![10, 30, 60, 300, 900, 3600, 14400]);
        assert_eq!(config.exchange.websocket_url, "wss://api.huobi.pro/ws");
    }

    #[test]
    fn test_validation_errors() {
        assert!(config("").validate().is_err());

        let mut bad = config("btcusdt:c1");
        bad.flow.durations = vec![10, 0];
        assert!(bad.validate().is_err());

        let mut bad = config("btcusdt:c1");
        bad.queue.evict_queues = bad.queue.max_queues + 1;
        assert!(bad.validate().is_err());

        let mut bad = config("btcusdt:c1");
        bad.watcher.max_flows = 0;
        assert!(bad.validate().is_err());

        let mut bad = config("btcusdt:c1");
        bad.queue.period_ms = 0;
        assert!(matches!(bad.validate(), Err(FlowError::Configuration(_))));
    }

    #[test]
    fn test_component_options() {
        let config = config("btcusdt:c1");
        let subscription = &config.subscriptions().unwrap()[0];
        let queue = config.queue_options(subscription);
        assert_eq!(queue.symbol, "btcusdt");
        assert_eq!(queue.period_ms, 10_000);
        let watcher = config.watcher_options(subscription);
        assert_eq!(watcher.subscriber_id, "c1");
        assert_eq!(watcher.section_seconds, 10);
    }
}
