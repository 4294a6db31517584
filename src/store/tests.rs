use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use tempfile::tempdir;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::health::{HealthCheckRecord, TargetStatus};
use crate::metrics::{LatencyStats, MetricsSnapshot};
use crate::test_support::run_async_test;

use super::{LoadTestRecord, ResultStore, SqliteResultStore, persist_detached};

fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        total_requests: 120,
        successful_requests: 114,
        failed_requests: 6,
        latency: LatencyStats {
            count: 114,
            avg_ms: 42,
            p50_ms: 40,
            p95_ms: 88,
            p99_ms: 130,
            min_ms: 7,
            max_ms: 151,
        },
        ..MetricsSnapshot::default()
    }
}

#[test]
fn record_takes_latency_and_throughput_from_snapshot() -> AppResult<()> {
    let executed_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().ok_or("timestamp")?;
    let record = LoadTestRecord::from_snapshot(
        None,
        "checkout",
        &snapshot(),
        Duration::from_secs(60),
        executed_at,
    );
    if record.median_ms != 40 || record.p99_ms != 130 || record.failed_requests != 6 {
        return Err(AppError::from(format!("unexpected record {:?}", record)));
    }
    if record.requests_per_second_x100 != 200 {
        return Err(AppError::from(format!(
            "expected 2.00 rps, got {}",
            record.requests_per_second_x100
        )));
    }
    Ok(())
}

#[test]
fn zero_elapsed_reports_zero_throughput() -> AppResult<()> {
    let record =
        LoadTestRecord::from_snapshot(None, "s", &snapshot(), Duration::ZERO, Utc::now());
    if record.requests_per_second_x100 != 0 {
        return Err(AppError::from(format!(
            "expected 0 rps, got {}",
            record.requests_per_second_x100
        )));
    }
    Ok(())
}

#[test]
fn load_tests_survive_reopen() -> AppResult<()> {
    run_async_test(async {
        let dir = tempdir()?;
        let path = dir.path().join("results.db");
        let target = Uuid::new_v4();
        let executed_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().ok_or("timestamp")?;
        let record = LoadTestRecord::from_snapshot(
            Some(target),
            "checkout",
            &snapshot(),
            Duration::from_secs(30),
            executed_at,
        );

        let store = SqliteResultStore::open(&path).await?;
        store.persist_load_test(&record).await?;
        drop(store);

        let reopened = SqliteResultStore::open(&path).await?;
        let stored = reopened.recent_load_tests(10).await?;
        if stored != vec![record] {
            return Err(AppError::from(format!("unexpected rows {:?}", stored)));
        }
        Ok(())
    })
}

#[test]
fn duplicate_ids_are_rejected() -> AppResult<()> {
    run_async_test(async {
        let store = SqliteResultStore::open_in_memory().await?;
        let record =
            LoadTestRecord::from_snapshot(None, "s", &snapshot(), Duration::from_secs(1), Utc::now());
        store.persist_load_test(&record).await?;
        if store.persist_load_test(&record).await.is_ok() {
            return Err("second insert with the same id should fail".into());
        }
        Ok(())
    })
}

#[test]
fn health_checks_are_recorded_per_target() -> AppResult<()> {
    run_async_test(async {
        let store = SqliteResultStore::open_in_memory().await?;
        let target_id = Uuid::new_v4();
        for (offset, status) in [(0, TargetStatus::Up), (1, TargetStatus::Down)] {
            let record = HealthCheckRecord {
                id: Uuid::new_v4(),
                target_id,
                target_name: "shop".to_owned(),
                checked_at: Utc
                    .with_ymd_and_hms(2024, 5, 1, 12, offset, 0)
                    .single()
                    .ok_or("timestamp")?,
                status,
                error_message: None,
                report: None,
            };
            store.persist_health_check(&record).await?;
        }
        let statuses = store.health_statuses(target_id).await?;
        if statuses != ["DOWN", "UP"] {
            return Err(AppError::from(format!("unexpected statuses {:?}", statuses)));
        }
        Ok(())
    })
}

#[test]
fn detached_persist_writes_in_background() -> AppResult<()> {
    run_async_test(async {
        let store = Arc::new(SqliteResultStore::open_in_memory().await?);
        let record =
            LoadTestRecord::from_snapshot(None, "bg", &snapshot(), Duration::from_secs(2), Utc::now());
        persist_detached(store.clone(), record.clone()).await?;
        let stored = store.recent_load_tests(1).await?;
        if stored.first().map(|row| row.id) != Some(record.id) {
            return Err(AppError::from(format!("record not stored: {:?}", stored)));
        }
        Ok(())
    })
}
