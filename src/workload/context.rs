use std::collections::BTreeMap;

use chrono::Utc;
use uuid::Uuid;

/// Variables owned by one worker for the length of its run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableContext {
    values: BTreeMap<String, String>,
}

impl VariableContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: String) {
        self.values.insert(name.to_owned(), value);
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// Built-in variables, fixed to one moment. Never stored in a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Builtins {
    timestamp_ms: i64,
}

impl Builtins {
    pub(crate) const RANDOM_UUID: &'static str = "randomUUID";
    pub(crate) const TIMESTAMP: &'static str = "timestamp";

    #[must_use]
    pub fn now() -> Self {
        Self {
            timestamp_ms: Utc::now().timestamp_millis(),
        }
    }

    #[must_use]
    pub const fn at(timestamp_ms: i64) -> Self {
        Self { timestamp_ms }
    }

    #[must_use]
    pub const fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    /// `randomUUID` yields a fresh value on every call.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<String> {
        match name {
            Self::RANDOM_UUID => Some(Uuid::new_v4().to_string()),
            Self::TIMESTAMP => Some(self.timestamp_ms.to_string()),
            _ => None,
        }
    }
}
