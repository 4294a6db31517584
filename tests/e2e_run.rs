
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tempfile::tempdir;

use support_server::{describe, run_loadprobe, spawn_http_server_or_skip};

fn login_scenario(url: &str, runs: u64, users: u64) -> Value {
    json!({
        "name": "login-flow",
        "runs": runs,
        "virtualUsers": users,
        "steps": [
            {
                "name": "login",
                "request": {
                    "method": "POST",
                    "url": format!("{}/login", url),
                    "body": { "user": "demo-${randomUUID}" }
                },
                "extract": { "token": "jsonpath:$.token" }
            },
            {
                "name": "profile",
                "request": {
                    "method": "GET",
                    "url": format!("{}/profile", url),
                    "headers": { "Authorization": "Bearer ${token}" }
                }
            }
        ]
    })
}

fn write_file(dir: &Path, name: &str, content: &str) -> Result<PathBuf, String> {
    let path = dir.join(name);
    fs::write(&path, content).map_err(|err| format!("write {} failed: {}", name, err))?;
    Ok(path)
}

fn write_scenario(dir: &Path, scenario: &Value) -> Result<PathBuf, String> {
    write_file(dir, "scenario.json", &scenario.to_string())
}

fn json_summary(stdout: &[u8]) -> Result<Value, String> {
    serde_json::from_slice(stdout).map_err(|err| {
        format!(
            "summary is not JSON ({}): {}",
            err,
            String::from_utf8_lossy(stdout)
        )
    })
}

#[test]
fn e2e_run_chains_extracted_token() -> Result<(), String> {
    let Some((url, server)) = spawn_http_server_or_skip()? else {
        return Ok(());
    };
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let scenario = write_scenario(dir.path(), &login_scenario(&url, 2, 3))?;

    let output = run_loadprobe([
        OsStr::new("run"),
        scenario.as_os_str(),
        OsStr::new("--raise-for-status"),
        OsStr::new("--json"),
    ])?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let summary = json_summary(&output.stdout)?;
    let total = summary.pointer("/metrics/total_requests").and_then(Value::as_u64);
    let failed = summary.pointer("/metrics/failed_requests").and_then(Value::as_u64);
    if total != Some(12) || failed != Some(0) {
        return Err(format!("unexpected summary: {}", summary));
    }
    if server.hits() < 12 {
        return Err(format!("server saw only {} connections", server.hits()));
    }
    Ok(())
}

#[test]
fn e2e_run_counts_server_errors_when_raised() -> Result<(), String> {
    let Some((url, _server)) = spawn_http_server_or_skip()? else {
        return Ok(());
    };
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let scenario = json!({
        "name": "broken",
        "runs": 3,
        "virtualUsers": 1,
        "steps": [
            { "name": "fail", "request": { "method": "GET", "url": format!("{}/fail", url) } }
        ]
    });
    let path = write_scenario(dir.path(), &scenario)?;

    let output = run_loadprobe([
        OsStr::new("run"),
        path.as_os_str(),
        OsStr::new("--raise-for-status"),
        OsStr::new("--json"),
    ])?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let summary = json_summary(&output.stdout)?;
    let server_errors = summary
        .pointer("/metrics/errors/HTTP_SERVER_ERROR")
        .and_then(Value::as_u64);
    if server_errors != Some(3) {
        return Err(format!("unexpected summary: {}", summary));
    }
    Ok(())
}

#[test]
fn e2e_run_stores_result_in_sqlite() -> Result<(), String> {
    let Some((url, _server)) = spawn_http_server_or_skip()? else {
        return Ok(());
    };
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let scenario = write_scenario(dir.path(), &login_scenario(&url, 1, 2))?;
    let db = dir.path().join("results.db");

    let output = run_loadprobe([
        OsStr::new("run"),
        scenario.as_os_str(),
        OsStr::new("--db"),
        db.as_os_str(),
    ])?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.contains("Total Requests: 4") {
        return Err(format!("unexpected summary: {}", stdout));
    }

    let conn = rusqlite::Connection::open(&db).map_err(|err| format!("open db failed: {}", err))?;
    let (count, total): (i64, i64) = conn
        .query_row(
            "SELECT COUNT(*), COALESCE(SUM(total_requests), 0) FROM load_test_results",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(|err| format!("query failed: {}", err))?;
    if count != 1 || total != 4 {
        return Err(format!("expected one row with 4 requests, got {} / {}", count, total));
    }
    Ok(())
}

#[test]
fn e2e_run_reads_config_file() -> Result<(), String> {
    let Some((url, _server)) = spawn_http_server_or_skip()? else {
        return Ok(());
    };
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let scenario = json!({
        "runs": 2,
        "virtualUsers": 1,
        "steps": [
            { "request": { "method": "GET", "url": format!("{}/profile", url) } }
        ]
    });
    let path = write_scenario(dir.path(), &scenario)?;
    let config = write_file(
        dir.path(),
        "loadprobe.toml",
        "[http]\nraise_for_status = true\nrequest_timeout = \"5s\"\n",
    )?;

    let output = run_loadprobe([
        OsStr::new("run"),
        path.as_os_str(),
        OsStr::new("--config"),
        config.as_os_str(),
        OsStr::new("--json"),
    ])?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let summary = json_summary(&output.stdout)?;
    let client_errors = summary
        .pointer("/metrics/errors/HTTP_CLIENT_ERROR")
        .and_then(Value::as_u64);
    if client_errors != Some(2) || summary.get("scenario").and_then(Value::as_str) != Some("scenario") {
        return Err(format!("unexpected summary: {}", summary));
    }
    Ok(())
}

#[test]
fn e2e_run_rejects_conflicting_run_modes() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let scenario = json!({
        "runs": 2,
        "durationSeconds": 5,
        "virtualUsers": 1,
        "steps": [ { "request": { "method": "GET", "url": "http://127.0.0.1:9/" } } ]
    });
    let path = write_scenario(dir.path(), &scenario)?;

    let output = run_loadprobe([OsStr::new("run"), path.as_os_str()])?;
    if output.status.success() {
        return Err(format!("expected failure\n{}", describe(&output)));
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.contains("both runs and durationSeconds") {
        return Err(format!("unexpected error output\n{}", describe(&output)));
    }
    Ok(())
}
