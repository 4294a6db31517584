//! Scenario model: wire shape, validation, and the typed run configuration.
mod types;
mod validate;

#[cfg(test)]
mod tests;

pub use types::{
    ExtractionRule, ExtractionScheme, RequestTemplate, RunMode, Scenario, ScenarioDefinition,
    Step, StepDefinition,
};
pub use validate::{load_scenario, parse_scenario};
