//! Configuration module - TOML file, `APP__` environment overrides and validation

pub mod loader;
pub mod types;

pub use loader::{load_config, load_from_str};
pub use types::{
    AppConfig, AppSettings, DatabaseConfig, ExchangeConfig, FlowConfig, PlayerConfig, QueueConfig,
    SymbolSubscription, WatcherConfig,
};
