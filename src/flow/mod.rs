//! Flow module - rolling buy/sell/inflow sums over multiple windows

pub mod client;
pub mod section;

pub use client::FlowClient;
pub use section::{FlowBucket, Section, SlidingWindow};
