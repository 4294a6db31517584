use std::num::{NonZeroU64, NonZeroUsize};
use std::time::Duration;

use crate::error::{AppError, AppResult, ValidationError};

use super::{ExtractionScheme, RequestTemplate, RunMode, Scenario, Step, parse_scenario};

fn expect_validation(result: AppResult<Scenario>, label: &str) -> AppResult<ValidationError> {
    match result {
        Ok(_) => Err(AppError::from(format!("{}: expected validation error", label))),
        Err(AppError::Validation(err)) => Ok(err),
        Err(other) => Err(AppError::from(format!("{}: unexpected error {}", label, other))),
    }
}

#[test]
fn parses_runs_scenario_with_extraction() -> AppResult<()> {
    let scenario = parse_scenario(
        r#"{
  "name": "login flow",
  "runs": 3,
  "virtualUsers": 2,
  "steps": [
    {
      "name": "login",
      "request": {
        "method": "POST",
        "url": "http://localhost:8080/login",
        "headers": { "X-Trace": "${randomUUID}" },
        "body": { "user": "alice" }
      },
      "extract": { "token": "jsonpath:$.token", "other": "xpath://token" }
    },
    {
      "request": { "method": "GET", "url": "http://localhost:8080/me" }
    }
  ]
}"#,
    )?;

    if scenario.name() != "login flow" {
        return Err(AppError::from(format!("unexpected name {}", scenario.name())));
    }
    if scenario.run_mode() != RunMode::Iterations(NonZeroU64::MIN.saturating_add(2)) {
        return Err("expected three iterations".into());
    }
    if scenario.virtual_users().get() != 2 {
        return Err("expected two virtual users".into());
    }
    let login = scenario.steps().first().ok_or("missing first step")?;
    let token = login
        .extract
        .iter()
        .find(|rule| rule.variable == "token")
        .ok_or("missing token rule")?;
    if token.scheme != ExtractionScheme::JsonPath("$.token".to_owned()) {
        return Err("token rule should be jsonpath".into());
    }
    let other = login
        .extract
        .iter()
        .find(|rule| rule.variable == "other")
        .ok_or("missing other rule")?;
    if !matches!(other.scheme, ExtractionScheme::Unsupported(_)) {
        return Err("xpath rule should be kept as unsupported".into());
    }
    let unnamed = scenario.steps().get(1).ok_or("missing second step")?;
    if unnamed.name != "step 2" {
        return Err(AppError::from(format!("unexpected default name {}", unnamed.name)));
    }
    if scenario.expected_results() != 12 {
        return Err(AppError::from(format!(
            "unexpected expected results {}",
            scenario.expected_results()
        )));
    }
    Ok(())
}

#[test]
fn parses_duration_scenario() -> AppResult<()> {
    let scenario = parse_scenario(
        r#"{"name":"soak","durationSeconds":30,"virtualUsers":4,
            "steps":[{"name":"ping","request":{"method":"GET","url":"http://x/ping"}}]}"#,
    )?;
    if scenario.run_mode() != RunMode::Duration(Duration::from_secs(30)) {
        return Err("expected duration mode".into());
    }
    if scenario.expected_results() != 1200 {
        return Err("duration mode should assume ten results per second per user".into());
    }
    Ok(())
}

#[test]
fn rejects_empty_steps() -> AppResult<()> {
    let err = expect_validation(
        parse_scenario(r#"{"runs":1,"virtualUsers":1,"steps":[]}"#),
        "empty steps",
    )?;
    if !matches!(err, ValidationError::ScenarioMissingSteps) {
        return Err(AppError::from(format!("unexpected error {}", err)));
    }
    Ok(())
}

#[test]
fn rejects_non_positive_virtual_users() -> AppResult<()> {
    for users in ["0", "-3"] {
        let json = format!(
            r#"{{"runs":1,"virtualUsers":{},"steps":[{{"request":{{"method":"GET","url":"http://x"}}}}]}}"#,
            users
        );
        let err = expect_validation(parse_scenario(&json), "virtual users")?;
        if !matches!(err, ValidationError::VirtualUsersNotPositive) {
            return Err(AppError::from(format!("unexpected error {}", err)));
        }
    }
    Ok(())
}

#[test]
fn run_mode_must_be_exactly_one() -> AppResult<()> {
    let both = expect_validation(
        parse_scenario(
            r#"{"runs":1,"durationSeconds":5,"virtualUsers":1,"steps":[{"request":{"method":"GET","url":"http://x"}}]}"#,
        ),
        "both",
    )?;
    if !matches!(both, ValidationError::RunModeConflict) {
        return Err(AppError::from(format!("unexpected error {}", both)));
    }

    let neither = expect_validation(
        parse_scenario(
            r#"{"virtualUsers":1,"steps":[{"request":{"method":"GET","url":"http://x"}}]}"#,
        ),
        "neither",
    )?;
    if !matches!(neither, ValidationError::RunModeMissing) {
        return Err(AppError::from(format!("unexpected error {}", neither)));
    }

    let zero_runs = expect_validation(
        parse_scenario(
            r#"{"runs":0,"virtualUsers":1,"steps":[{"request":{"method":"GET","url":"http://x"}}]}"#,
        ),
        "zero runs",
    )?;
    if !matches!(zero_runs, ValidationError::RunsNotPositive) {
        return Err(AppError::from(format!("unexpected error {}", zero_runs)));
    }
    Ok(())
}

#[test]
fn rejects_malformed_json() -> AppResult<()> {
    let err = expect_validation(parse_scenario("{not json"), "malformed")?;
    if !matches!(err, ValidationError::ScenarioJson { .. }) {
        return Err(AppError::from(format!("unexpected error {}", err)));
    }
    Ok(())
}

#[test]
fn typed_constructor_requires_steps_and_urls() -> AppResult<()> {
    let mode = RunMode::Iterations(NonZeroU64::MIN);
    let err = expect_validation(
        Scenario::new("empty", Vec::new(), mode, NonZeroUsize::MIN),
        "typed empty",
    )?;
    if !matches!(err, ValidationError::ScenarioMissingSteps) {
        return Err(AppError::from(format!("unexpected error {}", err)));
    }

    let blank = vec![Step::new("blank", RequestTemplate::new("GET", "  "))];
    let err = expect_validation(Scenario::new("blank", blank, mode, NonZeroUsize::MIN), "blank url")?;
    if !matches!(err, ValidationError::StepUrlEmpty { index: 0 }) {
        return Err(AppError::from(format!("unexpected error {}", err)));
    }
    Ok(())
}

#[test]
fn typed_constructor_checks_duration_bounds() -> AppResult<()> {
    let steps = || vec![Step::new("get", RequestTemplate::new("GET", "http://x"))];

    let zero = expect_validation(
        Scenario::new("zero", steps(), RunMode::Duration(Duration::ZERO), NonZeroUsize::MIN),
        "zero duration",
    )?;
    if !matches!(zero, ValidationError::DurationNotPositive) {
        return Err(AppError::from(format!("unexpected error {}", zero)));
    }

    let sub_second = expect_validation(
        Scenario::new(
            "short",
            steps(),
            RunMode::Duration(Duration::from_millis(500)),
            NonZeroUsize::MIN,
        ),
        "sub-second duration",
    )?;
    if !matches!(sub_second, ValidationError::DurationNotPositive) {
        return Err(AppError::from(format!("unexpected error {}", sub_second)));
    }

    let huge = expect_validation(
        Scenario::new("huge", steps(), RunMode::Duration(Duration::MAX), NonZeroUsize::MIN),
        "huge duration",
    )?;
    if !matches!(huge, ValidationError::DurationTooLong { .. }) {
        return Err(AppError::from(format!("unexpected error {}", huge)));
    }

    Scenario::new("ok", steps(), RunMode::Duration(Duration::from_secs(1)), NonZeroUsize::MIN)?;
    Ok(())
}

#[test]
fn rejects_duration_seconds_beyond_a_year() -> AppResult<()> {
    let err = expect_validation(
        parse_scenario(
            r#"{"durationSeconds":9223372036854775807,"virtualUsers":1,"steps":[{"request":{"method":"GET","url":"http://x"}}]}"#,
        ),
        "huge durationSeconds",
    )?;
    if !matches!(err, ValidationError::DurationTooLong { max_seconds: 31_536_000 }) {
        return Err(AppError::from(format!("unexpected error {}", err)));
    }

    let at_limit = parse_scenario(
        r#"{"durationSeconds":31536000,"virtualUsers":1,"steps":[{"request":{"method":"GET","url":"http://x"}}]}"#,
    )?;
    if at_limit.run_mode() != RunMode::Duration(Duration::from_secs(31_536_000)) {
        return Err(AppError::from(format!("unexpected run mode {:?}", at_limit.run_mode())));
    }
    Ok(())
}

#[test]
fn definition_round_trips_through_wire_form() -> AppResult<()> {
    let step = Step::new("get", RequestTemplate::new("GET", "http://x/items"))
        .with_extract("id", "jsonpath:$.items[0].id");
    let scenario = Scenario::new(
        "wire",
        vec![step],
        RunMode::Iterations(NonZeroU64::MIN),
        NonZeroUsize::MIN,
    )?;
    let json = serde_json::to_string(&scenario.to_definition())?;
    let reparsed = parse_scenario(&json)?;
    if reparsed != scenario {
        return Err(AppError::from(format!("round trip changed scenario: {}", json)));
    }
    Ok(())
}
