//! Persistence module - flattened section snapshots per symbol
//!
//! The flow client's [`SectionRecorder`] turns each sealed bucket into a
//! [`SectionRecord`] and hands it to a writer task backed by a
//! [`SectionStore`]: Postgres through `sqlx` when a database is configured,
//! process memory otherwise.

pub mod record;
pub mod recorder;
pub mod store;

pub use record::{SectionRecord, COLUMNS, RECORDED_DURATIONS};
pub use recorder::SectionRecorder;
pub use store::{connect_pool, table_name, InMemorySectionStore, PgSectionStore, SectionStore};
