//! Shared types, traits and plumbing used by every pipeline component

pub mod errors;
pub mod history;
pub mod traits;
pub mod types;
