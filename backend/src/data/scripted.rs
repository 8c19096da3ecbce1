//! Scripted data access
//!
//! An in-memory [`DataAccess`] that answers from queued responses and records
//! every call it receives. Used by the service tests in place of a database.

use crate::data::access::{DataAccess, WriteResult};
use crate::data::command::CommandKind;
use crate::data::params::QueryParams;
use crate::data::record::Record;
use crate::error::DataAccessError;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// Which trait operation a call went through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `DataAccess::query`
    Query,
    /// `DataAccess::query_single`
    QuerySingle,
    /// `DataAccess::execute`
    Execute,
}

/// A call received by the scripted data access
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Trait operation used
    pub operation: Operation,
    /// Procedure name or query text
    pub identifier: String,
    /// Parameters as passed by the caller
    pub params: QueryParams,
    /// Command kind
    pub kind: CommandKind,
}

/// A queued answer
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Row set
    Rows(Vec<Record>),
    /// Single nullable row
    Single(Option<Record>),
    /// Write result
    Write(WriteResult),
    /// Failure surfaced as `DataAccessError::Scripted`
    Fail(String),
}

#[derive(Default)]
struct Script {
    responses: HashMap<String, VecDeque<ScriptedResponse>>,
    calls: Vec<RecordedCall>,
}

/// Call-recording data access with per-identifier response queues
///
/// Responses are keyed by procedure name. Text commands also match a key the
/// query text contains, so tests can key on a table name or fragment. An
/// identifier with nothing queued answers with an empty result.
#[derive(Default)]
pub struct ScriptedDataAccess {
    script: Mutex<Script>,
}

impl ScriptedDataAccess {
    /// Create an empty script
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a raw response for an identifier
    pub fn push(&self, identifier: &str, response: ScriptedResponse) -> &Self {
        self.lock()
            .responses
            .entry(identifier.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Queue a row set
    pub fn push_rows(&self, identifier: &str, rows: Vec<Record>) -> &Self {
        self.push(identifier, ScriptedResponse::Rows(rows))
    }

    /// Queue a single nullable row
    pub fn push_single(&self, identifier: &str, row: Option<Record>) -> &Self {
        self.push(identifier, ScriptedResponse::Single(row))
    }

    /// Queue a write result
    pub fn push_write(&self, identifier: &str, result: WriteResult) -> &Self {
        self.push(identifier, ScriptedResponse::Write(result))
    }

    /// Queue a failure
    pub fn push_failure(&self, identifier: &str, message: &str) -> &Self {
        self.push(identifier, ScriptedResponse::Fail(message.to_string()))
    }

    /// All calls received so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Calls whose identifier equals (or, for text, contains) `identifier`
    pub fn calls_to(&self, identifier: &str) -> Vec<RecordedCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches_key(&c.identifier, c.kind, identifier))
            .cloned()
            .collect()
    }

    /// Parameters of the most recent call to `identifier`
    pub fn last_params(&self, identifier: &str) -> Option<QueryParams> {
        self.calls_to(identifier).pop().map(|c| c.params)
    }

    fn record(
        &self,
        operation: Operation,
        identifier: &str,
        params: &QueryParams,
        kind: CommandKind,
    ) -> Option<ScriptedResponse> {
        let mut script = self.lock();
        script.calls.push(RecordedCall {
            operation,
            identifier: identifier.to_string(),
            params: params.clone(),
            kind,
        });

        let key = script
            .responses
            .iter()
            .filter(|(_, queue)| !queue.is_empty())
            .map(|(key, _)| key.clone())
            .filter(|key| matches_key(identifier, kind, key))
            // Exact matches win over fragment matches
            .max_by_key(|key| (key == identifier, key.len()))?;

        script.responses.get_mut(&key)?.pop_front()
    }
}

fn matches_key(identifier: &str, kind: CommandKind, key: &str) -> bool {
    identifier == key || (kind == CommandKind::Text && identifier.contains(key))
}

#[async_trait]
impl DataAccess for ScriptedDataAccess {
    async fn query(
        &self,
        identifier: &str,
        params: &QueryParams,
        kind: CommandKind,
    ) -> Result<Vec<Record>, DataAccessError> {
        match self.record(Operation::Query, identifier, params, kind) {
            Some(ScriptedResponse::Rows(rows)) => Ok(rows),
            Some(ScriptedResponse::Single(row)) => Ok(row.into_iter().collect()),
            Some(ScriptedResponse::Fail(message)) => Err(DataAccessError::Scripted(message)),
            Some(ScriptedResponse::Write(_)) | None => Ok(Vec::new()),
        }
    }

    async fn query_single(
        &self,
        identifier: &str,
        params: &QueryParams,
        kind: CommandKind,
    ) -> Result<Option<Record>, DataAccessError> {
        match self.record(Operation::QuerySingle, identifier, params, kind) {
            Some(ScriptedResponse::Single(row)) => Ok(row),
            Some(ScriptedResponse::Rows(rows)) => Ok(rows.into_iter().next()),
            Some(ScriptedResponse::Fail(message)) => Err(DataAccessError::Scripted(message)),
            Some(ScriptedResponse::Write(_)) | None => Ok(None),
        }
    }

    async fn execute(
        &self,
        identifier: &str,
        params: &QueryParams,
        kind: CommandKind,
    ) -> Result<WriteResult, DataAccessError> {
        match self.record(Operation::Execute, identifier, params, kind) {
            Some(ScriptedResponse::Write(result)) => Ok(result),
            Some(ScriptedResponse::Fail(message)) => Err(DataAccessError::Scripted(message)),
            Some(ScriptedResponse::Rows(_)) | Some(ScriptedResponse::Single(_)) | None => {
                Ok(WriteResult::default())
            }
        }
    }
}
