//! Output parameter reader
//!
//! Write procedures report their outcome through output parameters. An
//! [`EnvelopeContract`] names the outputs a procedure defines; reading them
//! back yields an [`OutputEnvelope`].

use crate::data::access::{OutputValues, WriteResult};
use crate::data::params::QueryParams;
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Outcome of one write call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputEnvelope {
    /// Generated or affected id
    pub id: Option<i64>,
    /// Procedure response code (1 = success by convention)
    pub response_code: Option<i64>,
    /// Human-readable message
    pub message: Option<String>,
    /// Supplementary status value
    pub status: Option<String>,
    /// Rows changed by the call
    pub affected_rows: u64,
}

impl OutputEnvelope {
    /// Whether the procedure reported success
    pub fn is_success(&self) -> bool {
        self.response_code == Some(1)
    }
}

/// Names of the output parameters a procedure defines
///
/// `None` means the procedure has no such output; it stays `None` in the
/// envelope and is never read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvelopeContract {
    /// Output carrying the generated/affected id
    pub id: Option<&'static str>,
    /// Output carrying the response code
    pub code: Option<&'static str>,
    /// Output carrying the message
    pub message: Option<&'static str>,
    /// Output carrying the status
    pub status: Option<&'static str>,
}

impl EnvelopeContract {
    /// Contract with `response_code` and `message`
    pub const fn code_and_message() -> Self {
        Self {
            id: None,
            code: Some("response_code"),
            message: Some("message"),
            status: None,
        }
    }

    /// Add an id output
    pub const fn with_id(mut self, name: &'static str) -> Self {
        self.id = Some(name);
        self
    }

    /// Add a status output
    pub const fn with_status(mut self, name: &'static str) -> Self {
        self.status = Some(name);
        self
    }

    /// Names the contract declares, in envelope order
    pub fn names(&self) -> Vec<&'static str> {
        [self.id, self.code, self.message, self.status]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Declare this contract's outputs on a parameter set
    pub fn declare(&self, params: &mut QueryParams) {
        for name in self.names() {
            params.add_output(name);
        }
    }

    /// Read the envelope from a completed write
    ///
    /// Every declared output must have been populated by the procedure, or the
    /// call fails with [`AppError::MissingOutput`]. A populated NULL reads as
    /// `None`; a value of the wrong shape is [`AppError::Mapping`].
    pub fn read(&self, procedure: &str, result: &WriteResult) -> AppResult<OutputEnvelope> {
        for name in self.names() {
            if !result.outputs.contains(name) {
                return Err(AppError::MissingOutput {
                    procedure: procedure.to_string(),
                    parameter: name.to_string(),
                });
            }
        }

        let outputs = &result.outputs;
        Ok(OutputEnvelope {
            id: read_i64(outputs, procedure, self.id)?,
            response_code: read_i64(outputs, procedure, self.code)?,
            message: read_string(outputs, procedure, self.message)?,
            status: read_string(outputs, procedure, self.status)?,
            affected_rows: result.affected_rows,
        })
    }
}

fn read_i64(outputs: &OutputValues, procedure: &str, name: Option<&str>) -> AppResult<Option<i64>> {
    match name {
        Some(name) => outputs
            .get_i64(name)
            .map_err(|source| mapping_error(procedure, name, source)),
        None => Ok(None),
    }
}

fn read_string(
    outputs: &OutputValues,
    procedure: &str,
    name: Option<&str>,
) -> AppResult<Option<String>> {
    match name {
        Some(name) => outputs
            .get_string(name)
            .map_err(|source| mapping_error(procedure, name, source)),
        None => Ok(None),
    }
}

fn mapping_error(procedure: &str, name: &str, source: serde_json::Error) -> AppError {
    AppError::Mapping {
        identifier: format!("{} output {}", procedure, name),
        source,
    }
}
