use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

/// String parameters supplied when a job is started or restarted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobParameters {
    inner: BTreeMap<String, String>,
}

impl JobParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.inner
    }

    /// Returns a copy where every entry of `overrides` replaces the current value.
    pub fn merged(&self, overrides: &JobParameters) -> JobParameters {
        let mut inner = self.inner.clone();
        for (key, value) in &overrides.inner {
            inner.insert(key.clone(), value.clone());
        }
        JobParameters { inner }
    }
}

impl FromIterator<(String, String)> for JobParameters {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for JobParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .inner
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        write!(f, "{{{}}}", pairs.join(", "))
    }
}

/// A single `key=value` pair, as accepted on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterPair(pub String, pub String);

impl FromStr for ParameterPair {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok(ParameterPair(key.trim().to_string(), value.to_string()))
            }
            _ => Err(format!("expected KEY=VALUE, got '{s}'")),
        }
    }
}
