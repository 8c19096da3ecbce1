//! Query parameter set
//!
//! Named, typed parameters passed with every call to the data-access layer.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A single typed parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// SQL NULL
    Null,
    /// Integer value
    Integer(i64),
    /// Floating point value
    Real(f64),
    /// Text value
    Text(String),
    /// Boolean value (stored as 0/1 by SQLite)
    Bool(bool),
}

impl ParamValue {
    /// Returns the text payload, if this is a text value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer payload, if this is an integer value
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Whether this value is SQL NULL
    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Integer(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Integer(i64::from(v))
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        ParamValue::Integer(i64::from(v))
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Real(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<NaiveDate> for ParamValue {
    fn from(v: NaiveDate) -> Self {
        ParamValue::Text(v.format("%Y-%m-%d").to_string())
    }
}

impl From<NaiveDateTime> for ParamValue {
    fn from(v: NaiveDateTime) -> Self {
        ParamValue::Text(v.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(ParamValue::Null)
    }
}

/// Direction of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Value supplied by the caller
    Input,
    /// Slot populated by the procedure, read back from the write result
    Output,
    /// Caller-supplied value the procedure may overwrite
    InputOutput,
}

impl Direction {
    /// Whether the procedure reports a value back through this parameter
    pub fn is_output(self) -> bool {
        matches!(self, Direction::Output | Direction::InputOutput)
    }
}

/// One named parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Parameter name, without the `@` prefix
    pub name: String,
    /// Current value (`Null` for output slots)
    pub value: ParamValue,
    /// Input or output
    pub direction: Direction,
}

/// Ordered set of uniquely named parameters for one call
///
/// Adding a name that already exists replaces its value and direction while
/// keeping its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    params: Vec<Param>,
}

impl QueryParams {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an input parameter
    pub fn add(&mut self, name: &str, value: impl Into<ParamValue>) -> &mut Self {
        self.upsert(name, value.into(), Direction::Input)
    }

    /// Declare an output parameter slot
    ///
    /// An existing input keeps its value and becomes input/output.
    pub fn add_output(&mut self, name: &str) -> &mut Self {
        if let Some(existing) = self.params.iter_mut().find(|p| p.name == name) {
            if existing.direction == Direction::Input {
                existing.direction = Direction::InputOutput;
            }
            return self;
        }
        self.upsert(name, ParamValue::Null, Direction::Output)
    }

    /// Builder-style variant of [`QueryParams::add`]
    pub fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.add(name, value);
        self
    }

    /// Builder-style variant of [`QueryParams::add_output`]
    pub fn with_output(mut self, name: &str) -> Self {
        self.add_output(name);
        self
    }

    fn upsert(&mut self, name: &str, value: ParamValue, direction: Direction) -> &mut Self {
        match self.params.iter_mut().find(|p| p.name == name) {
            Some(existing) => {
                existing.value = value;
                existing.direction = direction;
            }
            None => self.params.push(Param {
                name: name.to_string(),
                value,
                direction,
            }),
        }
        self
    }

    /// Look up a parameter value by name
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.params.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    /// Whether a parameter with this name is present
    pub fn contains(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name == name)
    }

    /// Parameter names in insertion order
    pub fn names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name.as_str()).collect()
    }

    /// Names of declared output parameters
    pub fn output_names(&self) -> Vec<&str> {
        self.params
            .iter()
            .filter(|p| p.direction.is_output())
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Iterate over all parameters
    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.iter()
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}
