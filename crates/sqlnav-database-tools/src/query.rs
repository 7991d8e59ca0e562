//! Guarded SQL execution shared by the database backends

use crate::config::{DatabaseToolConfig, SqlOperation};
use crate::statement::split_statements;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlnav_core::{Error, Result, Tool, ToolResponse};
use sqlnav_tool::params::required_str;
use sqlnav_tool::{FunctionTool, ToolSchema};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Message returned when the policy refuses a statement
pub const MODIFICATION_REJECTED: &str =
    "Modification queries not allowed. Enable writes to run them.";

pub const MULTIPLE_STATEMENTS: &str =
    "Multiple SQL statements detected. Please provide one statement at a time.";

pub const EMPTY_STATEMENT: &str = "Empty or invalid SQL statement";

/// Outcome of one statement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column names in result order; empty when no row came back
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
    pub row_count: usize,
    pub execution_time_ms: f64,
    /// More than `max_rows` rows were available
    pub truncated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows_affected: Option<u64>,
}

impl QueryResult {
    /// Builds a read result from up to `max_rows + 1` fetched rows
    pub fn from_rows(columns: Vec<String>, mut rows: Vec<Map<String, Value>>, max_rows: usize) -> Self {
        let truncated = rows.len() > max_rows;
        rows.truncate(max_rows);
        Self {
            columns,
            row_count: rows.len(),
            rows,
            truncated,
            ..Default::default()
        }
    }

    pub fn affected(rows_affected: u64) -> Self {
        Self {
            row_count: rows_affected as usize,
            rows_affected: Some(rows_affected),
            ..Default::default()
        }
    }
}

/// A backend able to run SQL statements
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Runs a single statement that already passed [`authorize`].
    ///
    /// Anything not classified as a modification runs in a read-only session,
    /// so the database refuses writes the keyword check missed. Reads must
    /// fetch at most `max_rows + 1` rows.
    async fn run(&self, sql: &str, operation: SqlOperation, max_rows: usize) -> Result<QueryResult>;

    /// The planner's view of a statement, read-only and without executing it
    async fn explain(&self, sql: &str) -> Result<Value>;
}

/// Refuses anything but a single statement the config permits.
pub fn authorize(sql: &str, config: &DatabaseToolConfig) -> Result<SqlOperation> {
    let statements = split_statements(sql)
        .map_err(|e| Error::QueryRejected(format!("Syntax error: {}", e)))?;

    let tokens = match statements.as_slice() {
        [] => return Err(Error::QueryRejected(EMPTY_STATEMENT.to_string())),
        [tokens] => tokens,
        _ => {
            tracing::warn!(statements = statements.len(), "Rejected multi-statement input");
            return Err(Error::QueryRejected(MULTIPLE_STATEMENTS.to_string()));
        }
    };

    let operation = SqlOperation::from_tokens(tokens);
    if config.permits(operation) {
        Ok(operation)
    } else {
        tracing::warn!(?operation, "Rejected modification statement");
        Err(Error::QueryRejected(MODIFICATION_REJECTED.to_string()))
    }
}

/// Authorizes, then runs the statement under the configured timeout
pub async fn execute_query(
    executor: &dyn QueryExecutor,
    sql: &str,
    config: &DatabaseToolConfig,
) -> Result<QueryResult> {
    let operation = authorize(sql, config)?;

    if operation.is_modification() {
        tracing::warn!(sql = %sql, "Executing write operation");
    } else {
        tracing::debug!(sql = %sql, "Executing query");
    }

    let started = Instant::now();
    let mut result = tokio::time::timeout(
        Duration::from_secs(config.timeout_secs),
        executor.run(sql, operation, config.max_rows),
    )
    .await
    .map_err(|_| {
        Error::QueryFailed(format!("Query timed out after {}s", config.timeout_secs))
    })??;

    result.execution_time_ms = started.elapsed().as_secs_f64() * 1000.0;
    Ok(result)
}

/// Create the `<prefix>_query` tool
pub fn create_query_tool(
    executor: Arc<dyn QueryExecutor>,
    prefix: &str,
    config: DatabaseToolConfig,
) -> Result<Arc<dyn Tool>> {
    let description = if config.read_only {
        "Execute a read-only SQL query and return the rows as JSON"
    } else {
        "Execute a SQL statement; permitted modifications report rows affected"
    };

    let schema = ToolSchema::new()
        .property("sql", "string", "SQL statement to execute")
        .required("sql")
        .build();

    let tool = FunctionTool::builder()
        .name(format!("{}_query", prefix))
        .description(description)
        .schema(schema)
        .execute(move |ctx, params| {
            let executor = executor.clone();
            let config = config.clone();
            async move {
                let sql = required_str(&params, "sql")?;

                tracing::debug!(
                    invocation_id = %ctx.invocation_id(),
                    read_only = config.read_only,
                    "Running query tool"
                );

                let result = execute_query(executor.as_ref(), sql, &config).await?;
                ToolResponse::from_serializable(&result)
            }
        })
        .build()?;

    Ok(Arc::new(tool))
}
