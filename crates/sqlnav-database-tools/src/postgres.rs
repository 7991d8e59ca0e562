//! PostgreSQL catalog and query backend

use crate::catalog::{SchemaCatalog, mask_connection_string};
use crate::config::{DatabaseToolConfig, SqlOperation};
use crate::query::{QueryExecutor, QueryResult};
use crate::relationship_tools::create_database_tools;
use crate::schema::{ColumnInfo, ConstraintInfo, IndexInfo, TableInfo, TableStructure};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use serde_json::{Map, Value};
use sqlnav_core::{CacheConfig, Error, Result, Tool};
use sqlnav_relations::ForeignKey;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions, PgRow};
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{Column, Row, TypeInfo};
use std::sync::Arc;
use std::time::Duration;

/// Schema used when none is configured
pub const DEFAULT_SCHEMA: &str = "public";

/// One row per foreign-key column pair.
///
/// The referenced side is matched through `position_in_unique_constraint`
/// so composite keys pair up column by column.
const FOREIGN_KEYS_QUERY: &str = r#"
    SELECT
        rc.constraint_name::text AS constraint_name,
        kcu.table_name::text AS from_table,
        kcu.column_name::text AS from_column,
        ref.table_name::text AS to_table,
        ref.column_name::text AS to_column,
        rc.update_rule::text AS on_update,
        rc.delete_rule::text AS on_delete
    FROM information_schema.referential_constraints rc
    JOIN information_schema.key_column_usage kcu
        ON kcu.constraint_schema = rc.constraint_schema
        AND kcu.constraint_name = rc.constraint_name
    JOIN information_schema.key_column_usage ref
        ON ref.constraint_schema = rc.unique_constraint_schema
        AND ref.constraint_name = rc.unique_constraint_name
        AND ref.ordinal_position = kcu.position_in_unique_constraint
    WHERE kcu.table_schema = $1
    ORDER BY kcu.table_name, rc.constraint_name, kcu.ordinal_position
"#;

const COLUMN_COUNT_QUERY: &str = r#"
    SELECT COUNT(*) AS column_count
    FROM information_schema.columns
    WHERE table_schema = $1 AND table_name = $2
"#;

const TABLE_LIST_QUERY: &str = r#"
    SELECT
        t.table_name::text AS name,
        t.table_type::text AS table_type,
        c.reltuples::bigint AS row_count_estimate
    FROM information_schema.tables t
    LEFT JOIN pg_catalog.pg_namespace n ON n.nspname = t.table_schema
    LEFT JOIN pg_catalog.pg_class c ON c.relnamespace = n.oid AND c.relname = t.table_name
    WHERE t.table_schema = $1
    ORDER BY t.table_name
"#;

const COLUMN_LIST_QUERY: &str = r#"
    SELECT
        column_name::text AS name,
        data_type::text AS data_type,
        is_nullable = 'YES' AS nullable,
        column_default::text AS default_value,
        ordinal_position::bigint AS position
    FROM information_schema.columns
    WHERE table_schema = $1 AND table_name = $2
    ORDER BY ordinal_position
"#;

const INDEX_LIST_QUERY: &str = r#"
    SELECT
        i.relname::text AS name,
        array_agg(a.attname::text ORDER BY k.ord) AS columns,
        ix.indisunique AS is_unique,
        ix.indisprimary AS is_primary,
        am.amname::text AS index_type
    FROM pg_index ix
    JOIN pg_class t ON t.oid = ix.indrelid
    JOIN pg_class i ON i.oid = ix.indexrelid
    JOIN pg_namespace n ON n.oid = t.relnamespace
    JOIN pg_am am ON am.oid = i.relam
    CROSS JOIN LATERAL unnest(ix.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord)
    JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum
    WHERE n.nspname = $1 AND t.relname = $2
    GROUP BY i.relname, ix.indisunique, ix.indisprimary, am.amname
    ORDER BY i.relname
"#;

/// Not-null checks are left out; the column listing already reports them.
const CONSTRAINT_LIST_QUERY: &str = r#"
    SELECT
        tc.constraint_name::text AS name,
        tc.constraint_type::text AS constraint_type,
        COALESCE(
            array_agg(kcu.column_name::text ORDER BY kcu.ordinal_position)
                FILTER (WHERE kcu.column_name IS NOT NULL),
            '{}'::text[]
        ) AS columns,
        cc.check_clause::text AS check_clause
    FROM information_schema.table_constraints tc
    LEFT JOIN information_schema.key_column_usage kcu
        ON kcu.constraint_schema = tc.constraint_schema
        AND kcu.constraint_name = tc.constraint_name
        AND kcu.table_name = tc.table_name
    LEFT JOIN information_schema.check_constraints cc
        ON cc.constraint_schema = tc.constraint_schema
        AND cc.constraint_name = tc.constraint_name
    WHERE tc.table_schema = $1 AND tc.table_name = $2
        AND NOT (tc.constraint_type = 'CHECK' AND cc.check_clause LIKE '% IS NOT NULL')
    GROUP BY tc.constraint_name, tc.constraint_type, cc.check_clause
    ORDER BY tc.constraint_type, tc.constraint_name
"#;

/// A pooled PostgreSQL connection
pub struct PostgresDatabase {
    pool: PgPool,
    endpoint: String,
}

impl PostgresDatabase {
    pub async fn connect(connection_string: &str, config: &DatabaseToolConfig) -> Result<Self> {
        let endpoint = mask_connection_string(connection_string);

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(config.timeout_secs))
            .connect(connection_string)
            .await
            .map_err(|e| {
                Error::catalog_error(format!("Failed to connect to PostgreSQL at {}: {}", endpoint, e))
            })?;

        tracing::info!(endpoint = %endpoint, "Connected to PostgreSQL");

        Ok(Self { pool, endpoint })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SchemaCatalog for PostgresDatabase {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn default_schema(&self) -> &str {
        DEFAULT_SCHEMA
    }

    async fn list_foreign_keys(&self, schema: &str) -> Result<Vec<ForeignKey>> {
        let rows = sqlx::query(FOREIGN_KEYS_QUERY)
            .bind(schema)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::catalog_error(format!("Failed to read foreign keys: {}", e)))?;

        rows.iter()
            .map(|row| {
                let fk = ForeignKey::new(
                    row.try_get::<String, _>("constraint_name")?,
                    row.try_get::<String, _>("from_table")?,
                    row.try_get::<String, _>("from_column")?,
                    row.try_get::<String, _>("to_table")?,
                    row.try_get::<String, _>("to_column")?,
                )
                .with_rules(
                    row.try_get::<String, _>("on_update")?,
                    row.try_get::<String, _>("on_delete")?,
                );
                Ok(fk)
            })
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| Error::catalog_error(format!("Unexpected foreign key row: {}", e)))
    }

    async fn column_count(&self, schema: &str, table: &str) -> Result<usize> {
        let count: i64 = sqlx::query_scalar(COLUMN_COUNT_QUERY)
            .bind(schema)
            .bind(table)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                Error::catalog_error(format!("Failed to count columns of {}: {}", table, e))
            })?;
        Ok(count as usize)
    }

    async fn list_tables(&self, schema: &str) -> Result<Vec<TableInfo>> {
        let rows: Vec<(String, String, Option<i64>)> = sqlx::query_as(TABLE_LIST_QUERY)
            .bind(schema)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::catalog_error(format!("Failed to list tables in {}: {}", schema, e)))?;

        Ok(rows
            .into_iter()
            .map(|(name, table_type, row_count_estimate)| TableInfo {
                name,
                table_type,
                // -1 means the table was never analyzed
                row_count_estimate: row_count_estimate.filter(|rows| *rows >= 0),
            })
            .collect())
    }

    async fn describe_table(&self, schema: &str, table: &str) -> Result<TableStructure> {
        let columns: Vec<(String, String, bool, Option<String>, i64)> =
            sqlx::query_as(COLUMN_LIST_QUERY)
                .bind(schema)
                .bind(table)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    Error::catalog_error(format!("Failed to read columns of {}: {}", table, e))
                })?;

        let indexes: Vec<(String, Vec<String>, bool, bool, String)> =
            sqlx::query_as(INDEX_LIST_QUERY)
                .bind(schema)
                .bind(table)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    Error::catalog_error(format!("Failed to read indexes of {}: {}", table, e))
                })?;

        let constraints: Vec<(String, String, Vec<String>, Option<String>)> =
            sqlx::query_as(CONSTRAINT_LIST_QUERY)
                .bind(schema)
                .bind(table)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    Error::catalog_error(format!("Failed to read constraints of {}: {}", table, e))
                })?;

        Ok(TableStructure {
            columns: columns
                .into_iter()
                .map(|(name, data_type, nullable, default, position)| ColumnInfo {
                    name,
                    data_type,
                    nullable,
                    default,
                    position,
                })
                .collect(),
            indexes: indexes
                .into_iter()
                .map(|(name, columns, unique, primary, index_type)| IndexInfo {
                    name,
                    columns,
                    unique,
                    primary,
                    index_type,
                })
                .collect(),
            constraints: constraints
                .into_iter()
                .map(|(name, constraint_type, columns, check_clause)| ConstraintInfo {
                    name,
                    constraint_type,
                    columns,
                    check_clause,
                })
                .collect(),
        })
    }
}

async fn set_read_only(conn: &mut PgConnection) -> Result<()> {
    sqlx::query("SET TRANSACTION READ ONLY")
        .execute(conn)
        .await
        .map(|_| ())
        .map_err(|e| Error::QueryFailed(format!("Failed to start read-only transaction: {}", e)))
}

#[async_trait]
impl QueryExecutor for PostgresDatabase {
    async fn run(&self, sql: &str, operation: SqlOperation, max_rows: usize) -> Result<QueryResult> {
        if operation.is_modification() {
            let done = sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| Error::QueryFailed(e.to_string()))?;
            return Ok(QueryResult::affected(done.rows_affected()));
        }

        // reads never commit; dropping the transaction rolls it back
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::QueryFailed(e.to_string()))?;
        set_read_only(&mut *tx).await?;

        let rows: Vec<PgRow> = sqlx::query(sql)
            .fetch(&mut *tx)
            .take(max_rows + 1)
            .try_collect()
            .await
            .map_err(|e| Error::QueryFailed(e.to_string()))?;
        tx.rollback().await.map_err(|e| Error::QueryFailed(e.to_string()))?;

        let columns = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        Ok(QueryResult::from_rows(columns, rows.iter().map(row_to_json).collect(), max_rows))
    }

    async fn explain(&self, sql: &str) -> Result<Value> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::QueryFailed(e.to_string()))?;
        set_read_only(&mut *tx).await?;

        let plan: Value = sqlx::query_scalar(&format!("EXPLAIN (FORMAT JSON, VERBOSE) {}", sql))
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| Error::QueryFailed(e.to_string()))?;
        tx.rollback().await.map_err(|e| Error::QueryFailed(e.to_string()))?;

        Ok(plan)
    }
}

fn row_to_json(row: &PgRow) -> Map<String, Value> {
    row.columns()
        .iter()
        .map(|column| {
            let value = decode_column(row, column.ordinal(), column.type_info().name());
            (column.name().to_string(), value)
        })
        .collect()
}

/// Decodes by Postgres type name; unsupported types become `null`
fn decode_column(row: &PgRow, index: usize, type_name: &str) -> Value {
    fn get<'r, T>(row: &'r PgRow, index: usize) -> Option<T>
    where
        T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
    {
        row.try_get::<Option<T>, _>(index).ok().flatten()
    }

    let value = match type_name {
        "INT2" => get::<i16>(row, index).map(Value::from),
        "INT4" => get::<i32>(row, index).map(Value::from),
        "INT8" => get::<i64>(row, index).map(Value::from),
        "FLOAT4" => get::<f32>(row, index).map(Value::from),
        "FLOAT8" => get::<f64>(row, index).map(Value::from),
        "BOOL" => get::<bool>(row, index).map(Value::from),
        "JSON" | "JSONB" => get::<Value>(row, index),
        "TIMESTAMPTZ" => get::<DateTime<Utc>>(row, index).map(|v| Value::from(v.to_rfc3339())),
        "TIMESTAMP" => get::<NaiveDateTime>(row, index).map(|v| Value::from(v.to_string())),
        "DATE" => get::<NaiveDate>(row, index).map(|v| Value::from(v.to_string())),
        "UUID" => get::<sqlx::types::Uuid>(row, index).map(|v| Value::from(v.to_string())),
        _ => get::<String>(row, index).map(Value::from),
    };
    value.unwrap_or(Value::Null)
}

/// Create PostgreSQL tools with default configuration (read-only, cached)
pub async fn create_postgres_tools(connection_string: &str) -> Result<Vec<Arc<dyn Tool>>> {
    create_postgres_tools_with_config(
        connection_string,
        DatabaseToolConfig::default(),
        &CacheConfig::default(),
    )
    .await
}

/// Create PostgreSQL tools with custom configuration
pub async fn create_postgres_tools_with_config(
    connection_string: &str,
    config: DatabaseToolConfig,
    cache: &CacheConfig,
) -> Result<Vec<Arc<dyn Tool>>> {
    let db = Arc::new(PostgresDatabase::connect(connection_string, &config).await?);
    create_database_tools(db.clone(), db, "postgres", config, cache)
}
