use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Scenario must include at least one step.")]
    ScenarioMissingSteps,
    #[error("virtualUsers must be greater than 0.")]
    VirtualUsersNotPositive,
    #[error("Scenario must set exactly one of runs or durationSeconds.")]
    RunModeMissing,
    #[error("Scenario cannot set both runs and durationSeconds.")]
    RunModeConflict,
    #[error("runs must be greater than 0.")]
    RunsNotPositive,
    #[error("durationSeconds must be greater than 0.")]
    DurationNotPositive,
    #[error("durationSeconds must not exceed {max_seconds}.")]
    DurationTooLong { max_seconds: u64 },
    #[error("Scenario step {index} has an empty url.")]
    StepUrlEmpty { index: usize },
    #[error("Failed to parse scenario: {source}")]
    ScenarioJson {
        #[source]
        source: serde_json::Error,
    },
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("Duration must be > 0.")]
    DurationZero,
    #[error("Value must be >= {min}.")]
    ValueTooSmall { min: u64 },
    #[error("Invalid value: {source}")]
    InvalidNumber {
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Failed to build runtime: {source}")]
    RuntimeBuildFailed {
        #[source]
        source: std::io::Error,
    },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
