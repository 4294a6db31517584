use std::num::{NonZeroU64, NonZeroUsize};
use std::path::Path;
use std::time::Duration;

use crate::error::{AppError, AppResult, ConfigError, ValidationError};

use super::types::{ExtractionRule, RunMode, Scenario, ScenarioDefinition, Step, StepDefinition};

const DEFAULT_SCENARIO_NAME: &str = "scenario";
/// Upper bound on `durationSeconds`: one year.
const MAX_DURATION_SECONDS: u64 = 31_536_000;

/// Parses and validates a scenario from its JSON wire form.
///
/// # Errors
///
/// Returns an error when the JSON is malformed or the scenario is invalid.
pub fn parse_scenario(content: &str) -> AppResult<Scenario> {
    let definition: ScenarioDefinition = serde_json::from_str(content)
        .map_err(|source| AppError::validation(ValidationError::ScenarioJson { source }))?;
    Scenario::try_from(definition)
}

/// Reads a scenario file from disk.
///
/// # Errors
///
/// Returns an error when the file cannot be read or the scenario is invalid.
pub fn load_scenario(path: &Path) -> AppResult<Scenario> {
    let content = std::fs::read_to_string(path).map_err(|source| {
        AppError::config(ConfigError::ReadScenario {
            path: path.to_path_buf(),
            source,
        })
    })?;
    parse_scenario(&content)
}

impl Scenario {
    /// Builds a scenario from already typed parts.
    ///
    /// # Errors
    ///
    /// Returns an error when `steps` is empty, a step has an empty url, or
    /// a duration run mode is shorter than a second or longer than a year.
    pub fn new(
        name: &str,
        steps: Vec<Step>,
        run_mode: RunMode,
        virtual_users: NonZeroUsize,
    ) -> AppResult<Self> {
        validate_run_mode(run_mode)?;
        validate_steps(&steps)?;
        Ok(Self {
            name: name.to_owned(),
            steps,
            run_mode,
            virtual_users,
        })
    }
}

impl TryFrom<ScenarioDefinition> for Scenario {
    type Error = AppError;

    fn try_from(definition: ScenarioDefinition) -> AppResult<Self> {
        let ScenarioDefinition {
            name,
            duration_seconds,
            runs,
            virtual_users,
            steps,
        } = definition;

        if steps.is_empty() {
            return Err(AppError::validation(ValidationError::ScenarioMissingSteps));
        }
        let virtual_users = virtual_users
            .and_then(|value| usize::try_from(value).ok())
            .and_then(NonZeroUsize::new)
            .ok_or_else(|| AppError::validation(ValidationError::VirtualUsersNotPositive))?;
        let run_mode = resolve_run_mode(runs, duration_seconds)?;

        let steps: Vec<Step> = steps
            .into_iter()
            .enumerate()
            .map(|(index, step)| step_from_definition(index, step))
            .collect();
        validate_steps(&steps)?;

        Ok(Self {
            name: name.unwrap_or_else(|| DEFAULT_SCENARIO_NAME.to_owned()),
            steps,
            run_mode,
            virtual_users,
        })
    }
}

fn resolve_run_mode(runs: Option<i64>, duration_seconds: Option<i64>) -> AppResult<RunMode> {
    match (runs, duration_seconds) {
        (Some(_), Some(_)) => Err(AppError::validation(ValidationError::RunModeConflict)),
        (None, None) => Err(AppError::validation(ValidationError::RunModeMissing)),
        (Some(runs), None) => u64::try_from(runs)
            .ok()
            .and_then(NonZeroU64::new)
            .map(RunMode::Iterations)
            .ok_or_else(|| AppError::validation(ValidationError::RunsNotPositive)),
        (None, Some(seconds)) => {
            let seconds = u64::try_from(seconds)
                .ok()
                .filter(|seconds| *seconds > 0)
                .ok_or_else(|| AppError::validation(ValidationError::DurationNotPositive))?;
            let run_mode = RunMode::Duration(Duration::from_secs(seconds));
            validate_run_mode(run_mode)?;
            Ok(run_mode)
        }
    }
}

fn validate_run_mode(run_mode: RunMode) -> AppResult<()> {
    match run_mode {
        RunMode::Iterations(_) => Ok(()),
        RunMode::Duration(duration) if duration < Duration::from_secs(1) => {
            Err(AppError::validation(ValidationError::DurationNotPositive))
        }
        RunMode::Duration(duration) if duration > Duration::from_secs(MAX_DURATION_SECONDS) => {
            Err(AppError::validation(ValidationError::DurationTooLong {
                max_seconds: MAX_DURATION_SECONDS,
            }))
        }
        RunMode::Duration(_) => Ok(()),
    }
}

fn step_from_definition(index: usize, definition: StepDefinition) -> Step {
    let name = definition
        .name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| format!("step {}", index.saturating_add(1)));
    let extract = definition
        .extract
        .iter()
        .map(|(variable, expression)| ExtractionRule::parse(variable, expression))
        .collect();
    Step {
        name,
        request: definition.request,
        extract,
    }
}

fn validate_steps(steps: &[Step]) -> AppResult<()> {
    if steps.is_empty() {
        return Err(AppError::validation(ValidationError::ScenarioMissingSteps));
    }
    for (index, step) in steps.iter().enumerate() {
        if step.request.url.trim().is_empty() {
            return Err(AppError::validation(ValidationError::StepUrlEmpty { index }));
        }
    }
    Ok(())
}
