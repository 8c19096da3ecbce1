//! Data-access abstraction
//!
//! The only seam between the services and the database. Implementations own
//! connection handling; callers own their parameter sets.

use crate::data::command::CommandKind;
use crate::data::params::QueryParams;
use crate::data::record::Record;
use crate::error::DataAccessError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

/// Named output values populated by a write call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputValues {
    values: BTreeMap<String, Value>,
}

impl OutputValues {
    /// Create an empty set of outputs
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set an output value
    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.values.insert(name.to_string(), value.into());
    }

    /// Raw value of an output, `None` when the procedure did not populate it.
    /// A populated SQL NULL also reads as `None`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).filter(|v| !v.is_null())
    }

    /// Whether the procedure populated this output, NULL included
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Output as an integer (numeric text is accepted)
    ///
    /// `Ok(None)` when unpopulated or NULL. A populated value with no integer
    /// reading is an error, never a silent `None`.
    pub fn get_i64(&self, name: &str) -> Result<Option<i64>, serde_json::Error> {
        let Some(value) = self.get(name) else {
            return Ok(None);
        };
        let lenient = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        };
        match lenient {
            Some(n) => Ok(Some(n)),
            None => serde_json::from_value(value.clone()).map(Some),
        }
    }

    /// Output as text (numbers are rendered)
    pub fn get_string(&self, name: &str) -> Result<Option<String>, serde_json::Error> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(other) => serde_json::from_value(other.clone()).map(Some),
        }
    }

    /// Names of populated outputs
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Whether no outputs were populated
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result of a write call: affected rows plus named output values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteResult {
    /// Number of rows changed by the call
    pub affected_rows: u64,
    /// Output parameters populated by the procedure
    pub outputs: OutputValues,
}

impl WriteResult {
    /// Create a write result
    pub fn new(affected_rows: u64, outputs: OutputValues) -> Self {
        Self {
            affected_rows,
            outputs,
        }
    }
}

/// Data-access abstraction used by every service
///
/// `identifier` is a stored-procedure name or literal SQL text, depending on
/// `kind`. Failures are reported as [`DataAccessError`] and must be surfaced
/// unchanged by callers.
#[async_trait]
pub trait DataAccess: Send + Sync {
    /// Run a command returning a sequence of rows
    async fn query(
        &self,
        identifier: &str,
        params: &QueryParams,
        kind: CommandKind,
    ) -> Result<Vec<Record>, DataAccessError>;

    /// Run a command returning at most one row
    async fn query_single(
        &self,
        identifier: &str,
        params: &QueryParams,
        kind: CommandKind,
    ) -> Result<Option<Record>, DataAccessError>;

    /// Run a write command, returning affected rows and output parameters
    async fn execute(
        &self,
        identifier: &str,
        params: &QueryParams,
        kind: CommandKind,
    ) -> Result<WriteResult, DataAccessError>;

    /// Run a parameterless command (static lookups)
    async fn query_static(
        &self,
        identifier: &str,
        kind: CommandKind,
    ) -> Result<Vec<Record>, DataAccessError> {
        self.query(identifier, &QueryParams::new(), kind).await
    }
}
