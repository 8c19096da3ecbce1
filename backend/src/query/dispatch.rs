//! Query dispatcher
//!
//! Typed front end over a [`DataAccess`] implementation. Errors from the data
//! layer are passed through unchanged; only row decoding can add an error.

use crate::data::access::{DataAccess, WriteResult};
use crate::data::command::Command;
use crate::data::params::QueryParams;
use crate::data::record::Record;
use crate::error::{AppError, AppResult};
use crate::query::output::{EnvelopeContract, OutputEnvelope};
use crate::query::pagination::{Page, PageRow};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Row answered by a count procedure
#[derive(Debug, Deserialize)]
struct PageTotal {
    total_count: i64,
}

/// Dispatches commands and decodes their rows
#[derive(Clone)]
pub struct QueryDispatcher {
    data: Arc<dyn DataAccess>,
}

impl QueryDispatcher {
    /// Wrap a data-access implementation
    pub fn new(data: Arc<dyn DataAccess>) -> Self {
        Self { data }
    }

    /// Run a command and decode every row
    pub async fn fetch_all<T: DeserializeOwned>(
        &self,
        command: &Command,
        params: &QueryParams,
    ) -> AppResult<Vec<T>> {
        debug!(
            command = %command.label(),
            kind = %command.kind,
            params = ?params.names(),
            "Dispatching query"
        );
        let rows = self
            .data
            .query(&command.identifier, params, command.kind)
            .await?;
        decode_rows(command, rows)
    }

    /// Run a command and decode the first row, if any
    pub async fn fetch_optional<T: DeserializeOwned>(
        &self,
        command: &Command,
        params: &QueryParams,
    ) -> AppResult<Option<T>> {
        debug!(
            command = %command.label(),
            kind = %command.kind,
            params = ?params.names(),
            "Dispatching single-row query"
        );
        self.data
            .query_single(&command.identifier, params, command.kind)
            .await?
            .map(|row| decode_row(command, row))
            .transpose()
    }

    /// Run a paged search procedure and build its page
    ///
    /// The total comes from the rows' `total_count`. A page past the end has
    /// no rows to carry it, so `count_procedure` is asked for it instead.
    pub async fn fetch_page<T: DeserializeOwned + PageRow>(
        &self,
        procedure: &str,
        count_procedure: &str,
        params: &QueryParams,
        page: u32,
        limit: u32,
    ) -> AppResult<Page<T>> {
        let items: Vec<T> = self
            .fetch_all(&Command::procedure(procedure), params)
            .await?;
        if !items.is_empty() || page <= 1 {
            return Ok(Page::from_rows(items, page, limit));
        }

        let total = self
            .fetch_optional::<PageTotal>(&Command::procedure(count_procedure), params)
            .await?
            .map_or(0, |row| row.total_count);
        debug!(procedure, page, total_count = total, "Requested page is past the end");
        Ok(Page::new(items, total, page, limit))
    }

    /// Run a parameterless command and decode every row
    pub async fn fetch_static<T: DeserializeOwned>(&self, command: &Command) -> AppResult<Vec<T>> {
        debug!(command = %command.label(), kind = %command.kind, "Dispatching static query");
        let rows = self
            .data
            .query_static(&command.identifier, command.kind)
            .await?;
        decode_rows(command, rows)
    }

    /// Run a write command
    pub async fn execute(&self, command: &Command, params: &QueryParams) -> AppResult<WriteResult> {
        debug!(
            command = %command.label(),
            kind = %command.kind,
            params = ?params.names(),
            outputs = ?params.output_names(),
            "Dispatching write"
        );
        let result = self
            .data
            .execute(&command.identifier, params, command.kind)
            .await?;
        debug!(
            command = %command.label(),
            affected_rows = result.affected_rows,
            "Write completed"
        );
        Ok(result)
    }

    /// Execute a write procedure and read its output envelope
    ///
    /// The contract's outputs are declared on `params` before dispatch.
    pub async fn execute_procedure(
        &self,
        procedure: &str,
        mut params: QueryParams,
        contract: EnvelopeContract,
    ) -> AppResult<OutputEnvelope> {
        contract.declare(&mut params);
        let result = self.execute(&Command::procedure(procedure), &params).await?;
        contract.read(procedure, &result)
    }
}

fn decode_row<T: DeserializeOwned>(command: &Command, row: Record) -> AppResult<T> {
    row.decode().map_err(|source| AppError::Mapping {
        identifier: command.label(),
        source,
    })
}

fn decode_rows<T: DeserializeOwned>(command: &Command, rows: Vec<Record>) -> AppResult<Vec<T>> {
    rows.into_iter().map(|row| decode_row(command, row)).collect()
}
