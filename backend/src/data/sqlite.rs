//! SQLite data access
//!
//! Implements [`DataAccess`] over a sqlx connection pool. Text commands run
//! as-is; stored-procedure commands are resolved through a
//! [`ProcedureCatalog`] and run inside a transaction.

use crate::config::DatabaseConfig;
use crate::data::access::{DataAccess, OutputValues, WriteResult};
use crate::data::command::CommandKind;
use crate::data::params::{ParamValue, QueryParams};
use crate::data::procedures::{is_select, Procedure, ProcedureCatalog};
use crate::data::record::Record;
use crate::error::DataAccessError;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{
    Sqlite, SqliteArguments, SqliteConnectOptions, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Column, Row, SqlitePool, TypeInfo, ValueRef};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

/// SQLite-backed data access
pub struct SqliteDataAccess {
    pool: SqlitePool,
    catalog: ProcedureCatalog,
}

impl SqliteDataAccess {
    /// Open the database, apply migrations and install the standard procedures
    ///
    /// # Arguments
    /// * `config` - Database path and pool settings
    ///
    /// # Returns
    /// * `Ok(SqliteDataAccess)` if successful
    /// * `Err(DataAccessError)` if the database could not be opened or migrated
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DataAccessError> {
        Self::connect_with_catalog(config, ProcedureCatalog::standard()).await
    }

    /// Same as [`SqliteDataAccess::connect`] with a custom procedure catalog
    pub async fn connect_with_catalog(
        config: &DatabaseConfig,
        catalog: ProcedureCatalog,
    ) -> Result<Self, DataAccessError> {
        let db_path = config.path.as_str();

        // Ensure parent directory exists
        if !db_path.starts_with("sqlite:") {
            if let Some(parent) = PathBuf::from(db_path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        DataAccessError::Connection(format!(
                            "Failed to create db directory: {}",
                            e
                        ))
                    })?;
                }
            }
        }

        // SQLite connection string format: sqlite://path/to/db.db
        let connection_string = if db_path.starts_with("sqlite:") {
            db_path.to_string()
        } else {
            format!("sqlite:{}", db_path)
        };

        let options = SqliteConnectOptions::from_str(&connection_string)
            .map_err(|e| DataAccessError::Connection(format!("Invalid database path: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .acquire_timeout(config.acquire_timeout())
            .connect_with(options)
            .await
            .map_err(|e| {
                DataAccessError::Connection(format!("Failed to connect to database: {}", e))
            })?;

        info!("Connected to SQLite database at: {}", db_path);

        let data = Self { pool, catalog };
        data.run_migrations().await?;

        Ok(data)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<(), DataAccessError> {
        info!("Running database migrations...");

        let migration_sql = include_str!("../../migrations/001_create_schema.sql");

        for statement in split_statements(migration_sql) {
            sqlx::query(&statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    DataAccessError::Migration(format!(
                        "{} - Statement: {}",
                        e,
                        statement.chars().take(100).collect::<String>()
                    ))
                })?;
        }

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the database pool (for seeding and advanced operations)
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The procedure catalog used for stored-procedure commands
    pub fn catalog(&self) -> &ProcedureCatalog {
        &self.catalog
    }

    fn procedure(&self, name: &str) -> Result<&Procedure, DataAccessError> {
        self.catalog
            .get(name)
            .ok_or_else(|| DataAccessError::UnknownProcedure(name.to_string()))
    }

    /// Run every statement of a procedure in one transaction
    ///
    /// Returns rows changed by the non-projecting statements, and the rows of
    /// the final statement when it is a `SELECT`.
    async fn run_procedure(
        &self,
        name: &str,
        params: &QueryParams,
    ) -> Result<(u64, Vec<Record>), DataAccessError> {
        let procedure = self.procedure(name)?;
        let last = procedure.statements.len().saturating_sub(1);

        // Rolled back on drop unless committed
        let mut tx = self.pool.begin().await?;
        let mut affected_rows = 0;
        let mut rows = Vec::new();

        for (index, statement) in procedure.statements.iter().enumerate() {
            let (sql, values) = compile_placeholders(statement, params);
            let query = bind_values(sqlx::query(&sql), &values);

            if index == last && is_select(statement) {
                let fetched = query.fetch_all(&mut *tx).await?;
                rows = fetched
                    .iter()
                    .map(row_to_record)
                    .collect::<Result<Vec<_>, _>>()?;
            } else {
                affected_rows += query.execute(&mut *tx).await?.rows_affected();
            }
        }

        tx.commit().await?;
        Ok((affected_rows, rows))
    }

    async fn run_text_query(
        &self,
        sql: &str,
        params: &QueryParams,
    ) -> Result<Vec<Record>, DataAccessError> {
        let (sql, values) = compile_placeholders(sql, params);
        let mut conn = self.pool.acquire().await?;
        let fetched = bind_values(sqlx::query(&sql), &values)
            .fetch_all(&mut *conn)
            .await?;

        fetched
            .iter()
            .map(row_to_record)
            .collect::<Result<Vec<_>, _>>()
            .map_err(DataAccessError::from)
    }
}

#[async_trait]
impl DataAccess for SqliteDataAccess {
    async fn query(
        &self,
        identifier: &str,
        params: &QueryParams,
        kind: CommandKind,
    ) -> Result<Vec<Record>, DataAccessError> {
        debug!(identifier = %identifier, kind = %kind, "Running query");
        match kind {
            CommandKind::StoredProcedure => {
                let (_, rows) = self.run_procedure(identifier, params).await?;
                Ok(rows)
            }
            CommandKind::Text => self.run_text_query(identifier, params).await,
        }
    }

    async fn query_single(
        &self,
        identifier: &str,
        params: &QueryParams,
        kind: CommandKind,
    ) -> Result<Option<Record>, DataAccessError> {
        let rows = self.query(identifier, params, kind).await?;
        Ok(rows.into_iter().next())
    }

    async fn execute(
        &self,
        identifier: &str,
        params: &QueryParams,
        kind: CommandKind,
    ) -> Result<WriteResult, DataAccessError> {
        debug!(identifier = %identifier, kind = %kind, "Executing command");
        match kind {
            CommandKind::StoredProcedure => {
                let (affected_rows, rows) = self.run_procedure(identifier, params).await?;
                let outputs = rows
                    .first()
                    .map(|row| collect_outputs(row, params))
                    .unwrap_or_default();
                Ok(WriteResult::new(affected_rows, outputs))
            }
            CommandKind::Text => {
                let (sql, values) = compile_placeholders(identifier, params);
                let mut conn = self.pool.acquire().await?;
                let result = bind_values(sqlx::query(&sql), &values)
                    .execute(&mut *conn)
                    .await?;
                Ok(WriteResult::new(result.rows_affected(), OutputValues::new()))
            }
        }
    }
}

/// Populate output-direction parameters from the projected row
fn collect_outputs(row: &Record, params: &QueryParams) -> OutputValues {
    let mut outputs = OutputValues::new();
    for name in params.output_names() {
        if let Some(value) = row.get_ignore_case(name) {
            outputs.insert(name, value.clone());
        }
    }
    outputs
}

/// Rewrite `@name` placeholders to positional `?` and collect their values
///
/// Placeholders inside quoted literals and `--` or `/* */` comments are left
/// alone. A name missing from the parameter set binds NULL.
pub fn compile_placeholders(sql: &str, params: &QueryParams) -> (String, Vec<ParamValue>) {
    let mut compiled = String::with_capacity(sql.len());
    let mut values = Vec::new();
    let mut quote: Option<char> = None;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
                compiled.push(c);
            }
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                compiled.push(c);
            }
            None if c == '-' && chars.peek() == Some(&'-') => {
                compiled.push(c);
                for n in chars.by_ref() {
                    compiled.push(n);
                    if n == '\n' {
                        break;
                    }
                }
            }
            None if c == '/' && chars.peek() == Some(&'*') => {
                compiled.push(c);
                if let Some(star) = chars.next() {
                    compiled.push(star);
                }
                let mut prev = '\0';
                for n in chars.by_ref() {
                    compiled.push(n);
                    if prev == '*' && n == '/' {
                        break;
                    }
                    prev = n;
                }
            }
            None if c == '@' && chars.peek().is_some_and(|n| n.is_ascii_alphabetic() || *n == '_') => {
                let mut name = String::new();
                while let Some(&n) = chars.peek() {
                    if n.is_ascii_alphanumeric() || n == '_' {
                        name.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                compiled.push('?');
                values.push(params.get(&name).cloned().unwrap_or(ParamValue::Null));
            }
            None => compiled.push(c),
        }
    }

    (compiled, values)
}

fn bind_values<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    values: &'q [ParamValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in values {
        query = match value {
            ParamValue::Null => query.bind(None::<i64>),
            ParamValue::Integer(v) => query.bind(*v),
            ParamValue::Real(v) => query.bind(*v),
            ParamValue::Text(v) => query.bind(v.as_str()),
            ParamValue::Bool(v) => query.bind(*v),
        };
    }
    query
}

fn row_to_record(row: &SqliteRow) -> Result<Record, sqlx::Error> {
    let mut record = Record::new();
    for column in row.columns() {
        let value = decode_column(row, column.ordinal())?;
        record.insert(column.name(), value);
    }
    Ok(record)
}

fn decode_column(row: &SqliteRow, index: usize) -> Result<Value, sqlx::Error> {
    let type_name = {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        raw.type_info().name().to_ascii_uppercase()
    };

    let decoded = match type_name.as_str() {
        "INTEGER" | "INT8" | "BOOLEAN" => row.try_get::<i64, _>(index).map(Value::from),
        "REAL" | "NUMERIC" => row.try_get::<f64, _>(index).map(Value::from),
        "BLOB" => row
            .try_get::<Vec<u8>, _>(index)
            .map(|bytes| Value::from(String::from_utf8_lossy(&bytes).into_owned())),
        _ => row.try_get::<String, _>(index).map(Value::from),
    };

    // Declared and stored types can disagree in SQLite; fall back to text
    decoded.or_else(|_| row.try_get_unchecked::<String, _>(index).map(Value::from))
}

/// Split a migration script into statements, dropping `--` comments
fn split_statements(script: &str) -> Vec<String> {
    let mut cleaned_sql = String::new();
    for line in script.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("--") {
            continue;
        }
        let without_comments = match trimmed.find("--") {
            Some(comment_pos) => &trimmed[..comment_pos],
            None => trimmed,
        };
        cleaned_sql.push_str(without_comments.trim());
        cleaned_sql.push(' ');
    }

    cleaned_sql
        .split(';')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
