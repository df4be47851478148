//! Pipeline module - one single-writer task per subscribed symbol

pub mod registry;

pub use registry::{Pipeline, PipelineRegistry};
