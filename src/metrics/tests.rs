use crate::error::{AppError, AppResult};

use super::{LatencyStats, MetricsSnapshot, StepKey, average, format_x100, percentile, rate_x100};

#[test]
fn nearest_rank_over_five_values() -> AppResult<()> {
    let sorted = [10, 20, 30, 40, 50];
    let stats = LatencyStats::from_sorted(&sorted);
    let expected = LatencyStats {
        count: 5,
        avg_ms: 30,
        p50_ms: 30,
        p95_ms: 50,
        p99_ms: 50,
        min_ms: 10,
        max_ms: 50,
    };
    if stats != expected {
        return Err(AppError::from(format!("unexpected stats {:?}", stats)));
    }
    Ok(())
}

#[test]
fn percentile_edges() -> AppResult<()> {
    if percentile(&[], 50) != 0 || average(&[]) != 0 {
        return Err("empty input should yield zero".into());
    }
    if percentile(&[7], 1) != 7 || percentile(&[7], 99) != 7 {
        return Err("single value is every percentile".into());
    }
    let hundred: Vec<u64> = (1..=100).collect();
    if percentile(&hundred, 95) != 95 || percentile(&hundred, 99) != 99 {
        return Err("nearest rank over 1..=100 should be the percent itself".into());
    }
    if percentile(&hundred, 0) != 1 || percentile(&hundred, 100) != 100 {
        return Err("rank should clamp to the slice".into());
    }
    if average(&[1, 2]) != 1 {
        return Err("average truncates".into());
    }
    Ok(())
}

#[test]
fn unsorted_input_is_sorted_first() -> AppResult<()> {
    let stats = LatencyStats::from_unsorted(vec![50, 10, 40, 20, 30]);
    if stats.min_ms != 10 || stats.max_ms != 50 || stats.p50_ms != 30 {
        return Err(AppError::from(format!("unexpected stats {:?}", stats)));
    }
    Ok(())
}

#[test]
fn success_rate_has_two_implied_decimals() -> AppResult<()> {
    let empty = MetricsSnapshot::default();
    if empty.success_rate_x100() != 0 {
        return Err("empty snapshot rate should be 0".into());
    }
    let snapshot = MetricsSnapshot {
        total_requests: 4,
        successful_requests: 3,
        failed_requests: 1,
        ..MetricsSnapshot::default()
    };
    if snapshot.success_rate_x100() != 7_500 || format_x100(snapshot.success_rate_x100()) != "75.00" {
        return Err(AppError::from(format!("unexpected rate {}", snapshot.success_rate_x100())));
    }
    Ok(())
}

#[test]
fn step_key_display() -> AppResult<()> {
    let key = StepKey {
        index: 1,
        name: "login".to_owned(),
    };
    if key.to_string() != "step_1_login" {
        return Err(AppError::from(format!("unexpected key {}", key)));
    }
    Ok(())
}
