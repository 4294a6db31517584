use std::collections::BTreeMap;
use std::num::{NonZeroU64, NonZeroUsize};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Prefix of the only extraction scheme the executor understands.
pub(crate) const JSONPATH_PREFIX: &str = "jsonpath:";

/// Scenario as it arrives on the wire. Nothing is validated yet.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<i64>,
    #[serde(default)]
    pub runs: Option<i64>,
    #[serde(default)]
    pub virtual_users: Option<i64>,
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StepDefinition {
    #[serde(default)]
    pub name: Option<String>,
    pub request: RequestTemplate,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extract: BTreeMap<String, String>,
}

/// One request with `${name}` placeholders still in place.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RequestTemplate {
    pub method: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Map<String, Value>>,
}

impl RequestTemplate {
    #[must_use]
    pub fn new(method: &str, url: &str) -> Self {
        Self {
            method: method.to_owned(),
            url: url.to_owned(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_owned(), value.to_owned());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Map<String, Value>) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Every virtual user runs the full step sequence this many times.
    Iterations(NonZeroU64),
    /// Every virtual user repeats the sequence until the wall-clock budget is spent.
    Duration(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionScheme {
    JsonPath(String),
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRule {
    pub variable: String,
    pub scheme: ExtractionScheme,
}

impl ExtractionRule {
    #[must_use]
    pub fn parse(variable: &str, expression: &str) -> Self {
        let scheme = expression.strip_prefix(JSONPATH_PREFIX).map_or_else(
            || ExtractionScheme::Unsupported(expression.to_owned()),
            |path| ExtractionScheme::JsonPath(path.to_owned()),
        );
        Self {
            variable: variable.to_owned(),
            scheme,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub name: String,
    pub request: RequestTemplate,
    pub extract: Vec<ExtractionRule>,
}

impl Step {
    #[must_use]
    pub fn new(name: &str, request: RequestTemplate) -> Self {
        Self {
            name: name.to_owned(),
            request,
            extract: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_extract(mut self, variable: &str, expression: &str) -> Self {
        self.extract.push(ExtractionRule::parse(variable, expression));
        self
    }
}

/// A validated scenario. Construct through [`Scenario::new`] or
/// `Scenario::try_from(ScenarioDefinition)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub(crate) name: String,
    pub(crate) steps: Vec<Step>,
    pub(crate) run_mode: RunMode,
    pub(crate) virtual_users: NonZeroUsize,
}

impl Scenario {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    #[must_use]
    pub const fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    #[must_use]
    pub const fn virtual_users(&self) -> NonZeroUsize {
        self.virtual_users
    }

    /// Expected number of results for a complete run. Duration mode has no
    /// exact answer, so it assumes ten results per second per virtual user.
    #[must_use]
    pub fn expected_results(&self) -> u64 {
        let users = u64::try_from(self.virtual_users.get()).unwrap_or(u64::MAX);
        match self.run_mode {
            RunMode::Iterations(runs) => {
                let steps = u64::try_from(self.steps.len()).unwrap_or(u64::MAX);
                runs.get().saturating_mul(users).saturating_mul(steps)
            }
            RunMode::Duration(duration) => duration
                .as_secs()
                .saturating_mul(users)
                .saturating_mul(DURATION_RESULTS_PER_SECOND),
        }
    }

    /// Wire form of this scenario.
    #[must_use]
    pub fn to_definition(&self) -> ScenarioDefinition {
        let (runs, duration_seconds) = match self.run_mode {
            RunMode::Iterations(runs) => (Some(i64::try_from(runs.get()).unwrap_or(i64::MAX)), None),
            RunMode::Duration(duration) => (
                None,
                Some(i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)),
            ),
        };
        ScenarioDefinition {
            name: Some(self.name.clone()),
            duration_seconds,
            runs,
            virtual_users: Some(i64::try_from(self.virtual_users.get()).unwrap_or(i64::MAX)),
            steps: self
                .steps
                .iter()
                .map(|step| StepDefinition {
                    name: Some(step.name.clone()),
                    request: step.request.clone(),
                    extract: step
                        .extract
                        .iter()
                        .map(|rule| {
                            let expression = match &rule.scheme {
                                ExtractionScheme::JsonPath(path) => {
                                    format!("{}{}", JSONPATH_PREFIX, path)
                                }
                                ExtractionScheme::Unsupported(raw) => raw.clone(),
                            };
                            (rule.variable.clone(), expression)
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

const DURATION_RESULTS_PER_SECOND: u64 = 10;
