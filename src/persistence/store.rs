//! Section snapshot storage

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

use super::record::{SectionRecord, COLUMNS};
use crate::common::errors::{FlowError, Result};
use crate::config::DatabaseConfig;

/// Storage for one symbol's section snapshots
#[async_trait]
pub trait SectionStore: Send + Sync {
    /// Create the backing table if it does not exist
    async fn migrate(&self) -> Result<()>;

    /// Insert a snapshot and return its assigned id
    async fn create_section(&self, record: &SectionRecord) -> Result<i64>;

    async fn count_sections(&self) -> Result<i64>;

    /// Snapshots in insertion order, paged
    async fn find_sections(&self, limit: i64, offset: i64) -> Result<Vec<SectionRecord>>;
}

/// Table holding the snapshots of `symbol`
pub fn table_name(symbol: &str) -> Result<String> {
    if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(FlowError::Configuration(format!(
            "symbol '{}' cannot be used as a table prefix",
            symbol
        )));
    }
    Ok(format!("{}_sections", symbol.to_lowercase()))
}

/// Open a Postgres pool that several symbol stores can share
pub async fn connect_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
        .connect(&config.url)
        .await?;
    info!(max_connections = config.max_connections, "Database pool ready");
    Ok(pool)
}

/// Postgres-backed store, one table per symbol
pub struct PgSectionStore {
    pool: PgPool,
    table: String,
}

impl PgSectionStore {
    /// Share an existing pool
    pub fn with_pool(pool: PgPool, symbol: &str) -> Result<Self> {
        Ok(Self {
            pool,
            table: table_name(symbol)?,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

#[async_trait]
impl SectionStore for PgSectionStore {
    async fn migrate(&self) -> Result<()> {
        let columns: Vec<String> = COLUMNS
            .iter()
            .map(|column| format!("{} BIGINT NOT NULL DEFAULT 0", column))
            .collect();
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (id BIGSERIAL PRIMARY KEY, {})",
            self.table,
            columns.join(", ")
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        info!(table = %self.table, "Section table ready");
        Ok(())
    }

    async fn create_section(&self, record: &SectionRecord) -> Result<i64> {
        let placeholders: Vec<String> = (1..=COLUMNS.len()).map(|i| format!("${}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING id",
            self.table,
            COLUMNS.join(", "),
            placeholders.join(", ")
        );
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for value in record.values() {
            query = query.bind(value);
        }
        Ok(query.fetch_one(&self.pool).await?)
    }

    async fn count_sections(&self) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        Ok(sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_sections(&self, limit: i64, offset: i64) -> Result<Vec<SectionRecord>> {
        let sql = format!(
            "SELECT id, {} FROM {} ORDER BY id LIMIT $1 OFFSET $2",
            COLUMNS.join(", "),
            self.table
        );
        Ok(sqlx::query_as::<_, SectionRecord>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?)
    }
}

/// Store kept in process memory, used when no database is configured
#[derive(Default)]
pub struct InMemorySectionStore {
    records: Mutex<Vec<SectionRecord>>,
}

impl InMemorySectionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SectionStore for InMemorySectionStore {
    async fn migrate(&self) -> Result<()> {
        Ok(())
    }

    async fn create_section(&self, record: &SectionRecord) -> Result<i64> {
        let mut records = self.records.lock();
        let id = records.len() as i64 + 1;
        records.push(SectionRecord {
            id,
            ..record.clone()
        });
        Ok(id)
    }

    async fn count_sections(&self) -> Result<i64> {
        Ok(self.records.lock().len() as i64)
    }

    async fn find_sections(&self, limit: i64, offset: i64) -> Result<Vec<SectionRecord>> {
        let records = self.records.lock();
        let offset = usize::try_from(offset).unwrap_or(0);
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(records.iter().skip(offset).take(limit).cloned().collect())
    }
}
