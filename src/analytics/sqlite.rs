//! SQLite-backed analytics repository.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;

use super::{AnalyticsRepository, RequestRecord};
use crate::error::Result;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS requests (
    id TEXT PRIMARY KEY,
    timestamp TEXT NOT NULL,
    model TEXT NOT NULL,
    provider TEXT NOT NULL,
    cost REAL NOT NULL,
    latency REAL NOT NULL,
    tokens INTEGER NOT NULL
)";

pub struct SqliteAnalyticsStore {
    pool: SqlitePool,
}

impl SqliteAnalyticsStore {
    /// Open (or create) the database file and ensure the schema exists.
    ///
    /// WAL journal mode is used for concurrent read/write performance.
    pub async fn connect(db_path: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(&format!("sqlite://{db_path}"))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;

        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl AnalyticsRepository for SqliteAnalyticsStore {
    async fn save(&self, record: &RequestRecord) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO requests (
                id, timestamp, model, provider, cost, latency, tokens
            ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.timestamp)
        .bind(&record.model)
        .bind(&record.provider)
        .bind(record.cost)
        .bind(record.latency)
        .bind(record.tokens)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_since(&self, since: &str) -> Result<Vec<RequestRecord>> {
        let records = sqlx::query_as::<_, RequestRecord>(
            "SELECT id, timestamp, model, provider, cost, latency, tokens
             FROM requests WHERE timestamp >= ? ORDER BY timestamp ASC",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn find_by_model(&self, model: &str) -> Result<Vec<RequestRecord>> {
        let records = sqlx::query_as::<_, RequestRecord>(
            "SELECT id, timestamp, model, provider, cost, latency, tokens
             FROM requests WHERE model = ? ORDER BY timestamp ASC",
        )
        .bind(model)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}
