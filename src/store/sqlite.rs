use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_rusqlite::Connection;
use uuid::Uuid;

use crate::error::{AppError, AppResult, StoreError};
use crate::health::HealthCheckRecord;

use super::ResultStore;
use super::record::LoadTestRecord;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS load_test_results (
        id TEXT PRIMARY KEY,
        target_id TEXT,
        scenario_name TEXT NOT NULL,
        executed_at TEXT NOT NULL,
        total_requests INTEGER NOT NULL,
        successful_requests INTEGER NOT NULL,
        failed_requests INTEGER NOT NULL,
        avg_ms INTEGER NOT NULL,
        median_ms INTEGER NOT NULL,
        p95_ms INTEGER NOT NULL,
        p99_ms INTEGER NOT NULL,
        min_ms INTEGER NOT NULL,
        max_ms INTEGER NOT NULL,
        requests_per_second_x100 INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_load_test_results_executed_at
        ON load_test_results(executed_at);
    CREATE TABLE IF NOT EXISTS health_check_results (
        id TEXT PRIMARY KEY,
        target_id TEXT NOT NULL,
        target_name TEXT NOT NULL,
        checked_at TEXT NOT NULL,
        status TEXT NOT NULL,
        error_message TEXT
    );";

/// Raw column values of a `load_test_results` row.
type LoadTestRow = (
    String,
    Option<String>,
    String,
    String,
    [i64; 10],
);

/// SQLite-backed store on a background connection thread.
#[derive(Clone)]
pub struct SqliteResultStore {
    conn: Connection,
}

impl SqliteResultStore {
    /// Opens (or creates) the database file and its tables.
    ///
    /// # Errors
    ///
    /// Returns an error when the database cannot be opened or migrated.
    pub async fn open(path: &Path) -> AppResult<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|err| sqlite_error("open sqlite db", err))?;
        Self::migrate(conn).await
    }

    /// # Errors
    ///
    /// Returns an error when the in-memory database cannot be created.
    pub async fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|err| sqlite_error("open sqlite db", err))?;
        Self::migrate(conn).await
    }

    async fn migrate(conn: Connection) -> AppResult<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await
        .map_err(|err| sqlite_error("create sqlite tables", err))?;
        Ok(Self { conn })
    }

    /// Most recent load tests first.
    ///
    /// # Errors
    ///
    /// Returns an error when the query fails or a row cannot be decoded.
    pub async fn recent_load_tests(&self, limit: usize) -> AppResult<Vec<LoadTestRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<LoadTestRow> = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, target_id, scenario_name, executed_at, total_requests,
                            successful_requests, failed_requests, avg_ms, median_ms, p95_ms,
                            p99_ms, min_ms, max_ms, requests_per_second_x100
                     FROM load_test_results ORDER BY executed_at DESC LIMIT ?1",
                )?;
                let rows = stmt
                    .query_map([limit], |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            [
                                row.get(4)?,
                                row.get(5)?,
                                row.get(6)?,
                                row.get(7)?,
                                row.get(8)?,
                                row.get(9)?,
                                row.get(10)?,
                                row.get(11)?,
                                row.get(12)?,
                                row.get(13)?,
                            ],
                        ))
                    })?
                    .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                Ok(rows)
            })
            .await
            .map_err(|err| sqlite_error("read sqlite load tests", err))?;

        rows.into_iter().map(decode_load_test).collect()
    }

    /// Health-check statuses recorded for a target, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error when the query fails.
    pub async fn health_statuses(&self, target_id: Uuid) -> AppResult<Vec<String>> {
        let target = target_id.to_string();
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT status FROM health_check_results
                     WHERE target_id = ?1 ORDER BY checked_at DESC",
                )?;
                let statuses = stmt
                    .query_map([target], |row| row.get(0))?
                    .collect::<Result<Vec<String>, rusqlite::Error>>()?;
                Ok(statuses)
            })
            .await
            .map_err(|err| sqlite_error("read sqlite health checks", err))
    }
}

#[async_trait]
impl ResultStore for SqliteResultStore {
    async fn persist_load_test(&self, record: &LoadTestRecord) -> AppResult<()> {
        let record = record.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO load_test_results (
                        id, target_id, scenario_name, executed_at, total_requests,
                        successful_requests, failed_requests, avg_ms, median_ms, p95_ms,
                        p99_ms, min_ms, max_ms, requests_per_second_x100
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                    rusqlite::params![
                        record.id.to_string(),
                        record.target_id.map(|id| id.to_string()),
                        record.scenario_name,
                        record.executed_at.to_rfc3339(),
                        clamp_i64(record.total_requests),
                        clamp_i64(record.successful_requests),
                        clamp_i64(record.failed_requests),
                        clamp_i64(record.avg_ms),
                        clamp_i64(record.median_ms),
                        clamp_i64(record.p95_ms),
                        clamp_i64(record.p99_ms),
                        clamp_i64(record.min_ms),
                        clamp_i64(record.max_ms),
                        clamp_i64(record.requests_per_second_x100)
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(|err| sqlite_error("write sqlite load test", err))
    }

    async fn persist_health_check(&self, record: &HealthCheckRecord) -> AppResult<()> {
        let id = record.id.to_string();
        let target_id = record.target_id.to_string();
        let target_name = record.target_name.clone();
        let checked_at = record.checked_at.to_rfc3339();
        let status = record.status.as_str();
        let error_message = record.error_message.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO health_check_results (
                        id, target_id, target_name, checked_at, status, error_message
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    rusqlite::params![id, target_id, target_name, checked_at, status, error_message],
                )?;
                Ok(())
            })
            .await
            .map_err(|err| sqlite_error("write sqlite health check", err))
    }
}

fn decode_load_test(row: LoadTestRow) -> AppResult<LoadTestRecord> {
    let (id, target_id, scenario_name, executed_at, counters) = row;
    let [total, successful, failed, avg, median, p95, p99, min, max, rps_x100] = counters;
    Ok(LoadTestRecord {
        id: parse_uuid(&id)?,
        target_id: target_id.as_deref().map(parse_uuid).transpose()?,
        scenario_name,
        executed_at: DateTime::parse_from_rfc3339(&executed_at)
            .map(|value| value.with_timezone(&Utc))
            .map_err(|err| malformed(format!("executed_at '{}': {}", executed_at, err)))?,
        total_requests: clamp_u64(total),
        successful_requests: clamp_u64(successful),
        failed_requests: clamp_u64(failed),
        avg_ms: clamp_u64(avg),
        median_ms: clamp_u64(median),
        p95_ms: clamp_u64(p95),
        p99_ms: clamp_u64(p99),
        min_ms: clamp_u64(min),
        max_ms: clamp_u64(max),
        requests_per_second_x100: clamp_u64(rps_x100),
    })
}

fn parse_uuid(value: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value).map_err(|err| malformed(format!("id '{}': {}", value, err)))
}

fn malformed(message: String) -> AppError {
    AppError::store(StoreError::MalformedRow { message })
}

fn sqlite_error<E>(context: &'static str, err: E) -> AppError
where
    E: std::error::Error + Send + Sync + 'static,
{
    AppError::store(StoreError::Sqlite {
        context,
        source: Box::new(err),
    })
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn clamp_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
