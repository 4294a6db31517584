use serde::Serialize;

use crate::health::HealthCheckRecord;
use crate::metrics::{MetricsSnapshot, format_x100};
use crate::result::StepResult;
use crate::service::LoadTestOutcome;

#[derive(Debug, Serialize)]
struct JsonSummary<'a> {
    scenario: &'a str,
    started_at: String,
    elapsed_ms: u64,
    cancelled: bool,
    workers: usize,
    failed_workers: usize,
    requests_per_second: String,
    success_rate: String,
    metrics: &'a MetricsSnapshot,
}

pub(crate) fn summary_json(outcome: &LoadTestOutcome) -> Result<String, serde_json::Error> {
    let record = outcome.to_record(None);
    serde_json::to_string_pretty(&JsonSummary {
        scenario: &outcome.scenario_name,
        started_at: outcome.started_at.to_rfc3339(),
        elapsed_ms: u64::try_from(outcome.report.elapsed.as_millis()).unwrap_or(u64::MAX),
        cancelled: outcome.report.cancelled,
        workers: outcome.report.workers,
        failed_workers: outcome.report.failed_workers,
        requests_per_second: format_x100(record.requests_per_second_x100),
        success_rate: format_x100(outcome.metrics.success_rate_x100()),
        metrics: &outcome.metrics,
    })
}

pub(crate) fn summary_lines(outcome: &LoadTestOutcome) -> Vec<String> {
    let metrics = &outcome.metrics;
    let report = &outcome.report;
    let record = outcome.to_record(None);
    let mut lines = vec![
        format!("Scenario: {}", outcome.scenario_name),
        format!(
            "Duration: {}.{:03}s{}",
            report.elapsed.as_secs(),
            report.elapsed.subsec_millis(),
            if report.cancelled { " (cancelled)" } else { "" }
        ),
        format!(
            "Workers: {} ({} failed)",
            report.workers, report.failed_workers
        ),
        format!("Total Requests: {}", metrics.total_requests),
        format!(
            "Successful: {} ({}%)",
            metrics.successful_requests,
            format_x100(metrics.success_rate_x100())
        ),
        format!("Failed: {}", metrics.failed_requests),
        format!(
            "Latency avg/min/max: {}ms / {}ms / {}ms",
            metrics.latency.avg_ms, metrics.latency.min_ms, metrics.latency.max_ms
        ),
        format!(
            "Latency p50/p95/p99: {}ms / {}ms / {}ms",
            metrics.latency.p50_ms, metrics.latency.p95_ms, metrics.latency.p99_ms
        ),
        format!("Avg RPS: {}", format_x100(record.requests_per_second_x100)),
    ];

    for step in &metrics.steps {
        lines.push(format!(
            "  {}: {} requests, {} failed, p50 {}ms, p95 {}ms",
            step.key, step.requests, step.failures, step.latency.p50_ms, step.latency.p95_ms
        ));
    }
    for (kind, count) in &metrics.errors {
        lines.push(format!("  {}: {}", kind, count));
    }
    lines
}

pub(crate) fn failure_lines(results: &[StepResult]) -> Vec<String> {
    results
        .iter()
        .filter_map(|result| {
            result.failure().map(|failure| {
                format!(
                    "[worker {}, iter {}] {} {} {}: {} {}",
                    result.worker_id,
                    result.iteration,
                    result.step_name,
                    result.request.method,
                    result.request.url,
                    failure.kind,
                    failure.message
                )
            })
        })
        .collect()
}

pub(crate) fn health_line(record: &HealthCheckRecord) -> String {
    record.error_message.as_deref().map_or_else(
        || format!("{}: {}", record.target_name, record.status),
        |message| format!("{}: {} ({})", record.target_name, record.status, message),
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::engine::RunReport;
    use crate::error::{AppError, AppResult};
    use crate::health::TargetStatus;
    use crate::metrics::LatencyStats;
    use crate::result::ErrorKind;
    use crate::test_support::failed_result;

    fn outcome() -> LoadTestOutcome {
        LoadTestOutcome {
            scenario_name: "checkout".to_owned(),
            started_at: Utc::now(),
            report: RunReport {
                workers: 4,
                completed_workers: 4,
                elapsed: Duration::from_millis(2_500),
                ..RunReport::default()
            },
            metrics: MetricsSnapshot {
                total_requests: 10,
                successful_requests: 9,
                failed_requests: 1,
                latency: LatencyStats {
                    count: 9,
                    avg_ms: 12,
                    p50_ms: 11,
                    p95_ms: 20,
                    p99_ms: 21,
                    min_ms: 5,
                    max_ms: 21,
                },
                ..MetricsSnapshot::default()
            },
        }
    }

    #[test]
    fn summary_reports_rate_and_throughput() -> AppResult<()> {
        let lines = summary_lines(&outcome());
        let expected = [
            "Duration: 2.500s",
            "Successful: 9 (90.00%)",
            "Latency p50/p95/p99: 11ms / 20ms / 21ms",
            "Avg RPS: 4.00",
        ];
        for line in expected {
            if !lines.iter().any(|candidate| candidate == line) {
                return Err(AppError::from(format!("missing '{}' in {:?}", line, lines)));
            }
        }
        Ok(())
    }

    #[test]
    fn json_summary_carries_metrics() -> AppResult<()> {
        let value: serde_json::Value = serde_json::from_str(&summary_json(&outcome())?)?;
        if value.pointer("/metrics/latency/p95_ms") != Some(&serde_json::Value::from(20))
            || value.get("scenario").and_then(serde_json::Value::as_str) != Some("checkout")
            || value.get("success_rate").and_then(serde_json::Value::as_str) != Some("90.00")
            || value.get("requests_per_second").and_then(serde_json::Value::as_str) != Some("4.00")
        {
            return Err(AppError::from(format!("unexpected json {}", value)));
        }
        Ok(())
    }

    #[test]
    fn failures_are_listed_with_kind() -> AppResult<()> {
        let lines = failure_lines(&[failed_result(1, "pay", ErrorKind::HttpServer)]);
        let Some(line) = lines.first() else {
            return Err("expected one failure line".into());
        };
        if !line.contains("pay GET http://localhost/test: HTTP_SERVER_ERROR failed") {
            return Err(AppError::from(format!("unexpected line '{}'", line)));
        }
        Ok(())
    }

    #[test]
    fn health_line_includes_reason_when_down() -> AppResult<()> {
        let record = HealthCheckRecord {
            id: Uuid::new_v4(),
            target_id: Uuid::new_v4(),
            target_name: "shop".to_owned(),
            checked_at: Utc::now(),
            status: TargetStatus::Down,
            error_message: Some("HTTP status 500".to_owned()),
            report: None,
        };
        let line = health_line(&record);
        if line != "shop: DOWN (HTTP status 500)" {
            return Err(AppError::from(format!("unexpected line '{}'", line)));
        }
        Ok(())
    }
}
