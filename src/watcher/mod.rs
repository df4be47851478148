//! Watcher module - bucket history with on-demand windows and threshold alerts

pub mod rule;
#[allow(clippy::module_inception)]
pub mod watcher;

pub use rule::{section_flow, AlertRule, SectionFlow};
pub use watcher::{FlowWatcher, LogAlertListener, WatcherOptions};
