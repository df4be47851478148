//! Configuration loader

use config::{Config, Environment, File, FileFormat};
use std::path::Path;

use super::types::AppConfig;
use crate::common::errors::{FlowError, Result};

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. `subscribes`, when given (command line)
/// 2. Environment variables (prefixed with APP__, e.g. `APP__SUBSCRIBES`)
/// 3. Configuration file (TOML format)
/// 4. Default values
///
/// A `.env` file in the working directory is loaded first. The result is
/// validated after every source has been applied.
pub fn load_config(config_path: Option<&str>, subscribes: Option<&str>) -> Result<AppConfig> {
    dotenvy::dotenv().ok();

    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("APP")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let builder = builder.set_override_option("subscribes", subscribes)?;
    finish(builder)
}

/// Load configuration from a TOML string, without file or environment sources
pub fn load_from_str(toml: &str) -> Result<AppConfig> {
    let builder = Config::builder().add_source(File::from_str(toml, FileFormat::Toml));
    finish(builder)
}

fn finish(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<AppConfig> {
    let config = builder
        .build()
        .map_err(|e| FlowError::Configuration(e.to_string()))?;

    let app: AppConfig = config
        .try_deserialize()
        .map_err(|e| FlowError::Configuration(e.to_string()))?;

    app.validate()?;
    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_load_full_config() {
        let config = load_from_str(
            r#"
subscribes = "btcusdt:c1, ethusdt:c2"

[exchange]
websocket_url = "wss://example.invalid/ws"

[settings]
reconnect_delay_ms = 100

[flow]
period_seconds = 5
durations = [5, 60]

[queue]
period_ms = 5000
max_queues = 100
evict_queues = 10

[watcher]
section_seconds = 10

[[watcher.rules]]
name = "burst"
duration_seconds = 60
inflow_cash = 500

[player]
name = "p1"

[player.buy]
listen_seconds = 10
count_seconds = 60
min_average_per_second = "1"
trigger_multiple = "2"

[player.sell]
listen_seconds = 10
count_seconds = 60
max_average_per_second = "-1"
trigger_multiple = "2"
"#,
        )
        .unwrap();

        assert_eq!(config.subscriptions().unwrap().len(), 2);
        assert_eq!(config.exchange.websocket_url, "wss://example.invalid/ws");
        assert_eq!(config.settings.reconnect_delay_ms, 100);
        assert_eq!(config.flow.durations, vec![5, 60]);
        assert_eq!(config.queue.max_queues, 100);
        assert_eq!(config.watcher.rules.len(), 1);
        assert_eq!(config.watcher.rules[0].inflow_cash, 500);
        assert_eq!(config.watcher.rules[0].offset_seconds, 0);

        let player = config.player.unwrap();
        assert_eq!(player.initial_cash, dec!(1000));
        assert_eq!(player.buy.trigger_multiple, dec!(2));
        assert_eq!(player.sell.max_average_per_second, dec!(-1));
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = load_from_str(r#"subscribes = "btcusdt:c1""#).unwrap();
        assert_eq!(config.flow.period_seconds, 10);
        assert_eq!(config.queue.period_ms, 10_000);
        assert!(config.database.is_none());
        assert!(config.player.is_none());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = load_from_str(
            r#"
subscribes = "btcusdt:c1"

[queue]
max_queues = 10
evict_queues = 20
"#,
        );
        assert!(matches!(result, Err(FlowError::Configuration(_))));

        assert!(load_from_str(r#"subscribes = "btcusdt""#).is_err());
    }

    #[test]
    fn test_subscribes_override_without_config_file() {
        let path = "does-not-exist/trade_flow.toml";

        let config = load_config(Some(path), Some("ethusdt:c9")).unwrap();
        let subscriptions = config.subscriptions().unwrap();
        assert_eq!(subscriptions.len(), 1);
        assert_eq!(subscriptions[0].symbol, "ethusdt");
        assert_eq!(subscriptions[0].subscriber_id, "c9");

        assert!(matches!(
            load_config(Some(path), Some("ethusdt")),
            Err(FlowError::Configuration(_))
        ));
    }
}
