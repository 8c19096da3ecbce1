//! Query parameter builder
//!
//! Each `add_*` helper encodes one presence rule. A field that is not present
//! is left out of the parameter set entirely, so procedures see "not
//! provided" as a NULL default rather than an explicit value.

use crate::data::params::{ParamValue, QueryParams};
use crate::query::pagination::{Pagination, PaginationDefaults};

/// Search criteria that can be turned into a parameter set
pub trait ToParams {
    /// Build the parameters for this criteria; never fails
    fn to_params(&self, defaults: &PaginationDefaults) -> QueryParams;
}

/// Builder applying per-field presence rules
#[derive(Debug, Clone, Default)]
pub struct ParamsBuilder {
    params: QueryParams,
}

impl ParamsBuilder {
    /// Start an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a parameter set scoped to a tenant
    pub fn for_tenant(tenant_id: i64) -> Self {
        Self::new().add("tenant_id", tenant_id)
    }

    /// Always include the value
    pub fn add(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.params.add(name, value);
        self
    }

    /// Include an id when it is `Some` and positive
    pub fn add_id(self, name: &str, id: Option<i64>) -> Self {
        match id {
            Some(v) if v > 0 => self.add(name, v),
            _ => self,
        }
    }

    /// Include text when it is `Some` and not blank; the trimmed value is sent
    pub fn add_text(self, name: &str, text: Option<&str>) -> Self {
        match text.map(str::trim) {
            Some(t) if !t.is_empty() => self.add(name, t),
            _ => self,
        }
    }

    /// Include a prefix search as `value%` when it is `Some` and not blank
    pub fn add_prefix(self, name: &str, text: Option<&str>) -> Self {
        match text.map(str::trim) {
            Some(t) if !t.is_empty() => self.add(name, format!("{}%", t)),
            _ => self,
        }
    }

    /// Include any value when it is `Some`
    pub fn add_opt<T: Into<ParamValue>>(self, name: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.add(name, v),
            None => self,
        }
    }

    /// Always include `page`, `limit` and `offset`, defaulting absent values
    pub fn add_pagination(self, pagination: &Pagination, defaults: &PaginationDefaults) -> Self {
        let (page, limit) = pagination.resolve(defaults);
        let offset = i64::from(page - 1) * i64::from(limit);
        self.add("page", page)
            .add("limit", limit)
            .add("offset", offset)
    }

    /// Declare an output parameter
    pub fn add_output(mut self, name: &str) -> Self {
        self.params.add_output(name);
        self
    }

    /// Finish building
    pub fn build(self) -> QueryParams {
        self.params
    }
}
