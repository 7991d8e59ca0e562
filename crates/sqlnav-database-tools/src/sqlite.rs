//! SQLite catalog and query backend

use crate::catalog::{SchemaCatalog, mask_connection_string};
use crate::config::{DatabaseToolConfig, SqlOperation};
use crate::query::{QueryExecutor, QueryResult};
use crate::relationship_tools::create_database_tools;
use crate::schema::{ColumnInfo, ConstraintInfo, IndexInfo, TableInfo, TableStructure};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use serde_json::{Map, Value, json};
use sqlnav_core::{CacheConfig, Error, Result, Tool};
use sqlnav_relations::ForeignKey;
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, ValueRef};
use std::sync::Arc;
use std::time::Duration;

/// Schema used when none is configured
pub const DEFAULT_SCHEMA: &str = "main";

const FOREIGN_KEY_LIST_QUERY: &str = r#"
    SELECT id, seq, "table", "from", "to", on_update, on_delete
    FROM pragma_foreign_key_list(?1, ?2)
    ORDER BY id, seq
"#;

const PRIMARY_KEY_QUERY: &str = r#"
    SELECT name FROM pragma_table_info(?1, ?2)
    WHERE pk > 0
    ORDER BY pk
"#;

const COLUMN_COUNT_QUERY: &str = "SELECT COUNT(*) FROM pragma_table_info(?1, ?2)";

const COLUMN_LIST_QUERY: &str = r#"
    SELECT cid, name, type, "notnull", dflt_value, pk
    FROM pragma_table_info(?1, ?2)
    ORDER BY cid
"#;

const INDEX_LIST_QUERY: &str = r#"
    SELECT name, "unique", origin
    FROM pragma_index_list(?1, ?2)
    ORDER BY name
"#;

const INDEX_COLUMNS_QUERY: &str = "SELECT name FROM pragma_index_info(?1, ?2) ORDER BY seqno";

/// A pooled SQLite connection
pub struct SqliteDatabase {
    pool: SqlitePool,
    endpoint: String,
}

impl SqliteDatabase {
    /// Opens the database. In-memory databases use a single long-lived
    /// connection, since every connection would otherwise see its own database.
    pub async fn connect(connection_string: &str, config: &DatabaseToolConfig) -> Result<Self> {
        let endpoint = mask_connection_string(connection_string);
        let in_memory = connection_string.contains(":memory:") || connection_string.contains("mode=memory");

        let mut options = SqlitePoolOptions::new()
            .acquire_timeout(Duration::from_secs(config.timeout_secs));
        options = if in_memory {
            options.max_connections(1).idle_timeout(None).max_lifetime(None)
        } else {
            options.max_connections(10)
        };

        let pool = options.connect(connection_string).await.map_err(|e| {
            Error::catalog_error(format!("Failed to connect to SQLite at {}: {}", endpoint, e))
        })?;

        tracing::info!(endpoint = %endpoint, in_memory, "Opened SQLite database");

        Ok(Self { pool, endpoint })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn table_names(&self, schema: &str) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT name FROM {}.sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
            quote_identifier(schema)
        );

        sqlx::query_scalar(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::catalog_error(format!("Failed to list tables in {}: {}", schema, e)))
    }

    async fn tables_and_views(&self, schema: &str) -> Result<Vec<TableInfo>> {
        let sql = format!(
            "SELECT name, type FROM {}.sqlite_master \
             WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
            quote_identifier(schema)
        );

        let rows: Vec<(String, String)> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::catalog_error(format!("Failed to list tables in {}: {}", schema, e)))?;

        Ok(rows
            .into_iter()
            .map(|(name, kind)| TableInfo {
                name,
                table_type: if kind == "view" { "VIEW" } else { "BASE TABLE" }.to_string(),
                row_count_estimate: None,
            })
            .collect())
    }

    async fn columns(&self, schema: &str, table: &str) -> Result<Vec<(ColumnInfo, i64)>> {
        let rows: Vec<(i64, String, String, i64, Option<String>, i64)> =
            sqlx::query_as(COLUMN_LIST_QUERY)
                .bind(table)
                .bind(schema)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    Error::catalog_error(format!("Failed to read columns of {}: {}", table, e))
                })?;

        Ok(rows
            .into_iter()
            .map(|(cid, name, data_type, not_null, default, pk)| {
                let column = ColumnInfo {
                    name,
                    data_type,
                    nullable: not_null == 0 && pk == 0,
                    default,
                    position: cid + 1,
                };
                (column, pk)
            })
            .collect())
    }

    async fn indexes(&self, schema: &str, table: &str) -> Result<Vec<(IndexInfo, String)>> {
        let listed: Vec<(String, i64, String)> = sqlx::query_as(INDEX_LIST_QUERY)
            .bind(table)
            .bind(schema)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::catalog_error(format!("Failed to read indexes of {}: {}", table, e)))?;

        let mut indexes = Vec::with_capacity(listed.len());
        for (name, unique, origin) in listed {
            // expression index members have no column name
            let columns: Vec<Option<String>> = sqlx::query_scalar(INDEX_COLUMNS_QUERY)
                .bind(&name)
                .bind(schema)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    Error::catalog_error(format!("Failed to read index {}: {}", name, e))
                })?;

            let index = IndexInfo {
                name,
                columns: columns.into_iter().flatten().collect(),
                unique: unique != 0,
                primary: origin == "pk",
                index_type: "btree".to_string(),
            };
            indexes.push((index, origin));
        }
        Ok(indexes)
    }

    async fn primary_key(&self, schema: &str, table: &str) -> Result<Vec<String>> {
        sqlx::query_scalar(PRIMARY_KEY_QUERY)
            .bind(table)
            .bind(schema)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                Error::catalog_error(format!("Failed to read primary key of {}: {}", table, e))
            })
    }

    async fn table_foreign_keys(&self, schema: &str, table: &str) -> Result<Vec<ForeignKey>> {
        let rows = sqlx::query(FOREIGN_KEY_LIST_QUERY)
            .bind(table)
            .bind(schema)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                Error::catalog_error(format!("Failed to read foreign keys of {}: {}", table, e))
            })?;

        let mut foreign_keys = Vec::with_capacity(rows.len());
        for row in &rows {
            let fk = pragma_row(row)
                .map_err(|e| Error::catalog_error(format!("Unexpected foreign key row: {}", e)))?;

            // `REFERENCES parent` without a column list targets the parent's primary key
            let to_column = match fk.to_column {
                Some(column) => column,
                None => self
                    .primary_key(schema, &fk.to_table)
                    .await?
                    .into_iter()
                    .nth(fk.seq as usize)
                    .ok_or_else(|| {
                        Error::catalog_error(format!(
                            "{} references {} which has no matching primary key column",
                            table, fk.to_table
                        ))
                    })?,
            };

            foreign_keys.push(
                ForeignKey::new(
                    format!("fk_{}_{:04}", table, fk.id),
                    table,
                    fk.from_column,
                    fk.to_table,
                    to_column,
                )
                .with_rules(fk.on_update, fk.on_delete),
            );
        }
        Ok(foreign_keys)
    }
}

struct PragmaForeignKey {
    id: i64,
    seq: i64,
    to_table: String,
    from_column: String,
    to_column: Option<String>,
    on_update: String,
    on_delete: String,
}

fn pragma_row(row: &SqliteRow) -> std::result::Result<PragmaForeignKey, sqlx::Error> {
    Ok(PragmaForeignKey {
        id: row.try_get("id")?,
        seq: row.try_get("seq")?,
        to_table: row.try_get("table")?,
        from_column: row.try_get("from")?,
        to_column: row.try_get("to")?,
        on_update: row.try_get("on_update")?,
        on_delete: row.try_get("on_delete")?,
    })
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[async_trait]
impl SchemaCatalog for SqliteDatabase {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn default_schema(&self) -> &str {
        DEFAULT_SCHEMA
    }

    async fn list_foreign_keys(&self, schema: &str) -> Result<Vec<ForeignKey>> {
        let mut foreign_keys = Vec::new();
        for table in self.table_names(schema).await? {
            foreign_keys.extend(self.table_foreign_keys(schema, &table).await?);
        }
        Ok(foreign_keys)
    }

    async fn column_count(&self, schema: &str, table: &str) -> Result<usize> {
        let count: i64 = sqlx::query_scalar(COLUMN_COUNT_QUERY)
            .bind(table)
            .bind(schema)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                Error::catalog_error(format!("Failed to count columns of {}: {}", table, e))
            })?;
        Ok(count as usize)
    }

    async fn list_tables(&self, schema: &str) -> Result<Vec<TableInfo>> {
        self.tables_and_views(schema).await
    }

    async fn describe_table(&self, schema: &str, table: &str) -> Result<TableStructure> {
        let columns = self.columns(schema, table).await?;
        let indexes = self.indexes(schema, table).await?;
        let foreign_keys = self.table_foreign_keys(schema, table).await?;

        let mut constraints = Vec::new();

        let mut key: Vec<&(ColumnInfo, i64)> = columns.iter().filter(|(_, pk)| *pk > 0).collect();
        key.sort_by_key(|(_, pk)| *pk);
        if !key.is_empty() {
            constraints.push(ConstraintInfo {
                name: format!("pk_{}", table),
                constraint_type: "PRIMARY KEY".to_string(),
                columns: key.iter().map(|(column, _)| column.name.clone()).collect(),
                check_clause: None,
            });
        }

        for (index, origin) in &indexes {
            if origin == "u" {
                constraints.push(ConstraintInfo {
                    name: index.name.clone(),
                    constraint_type: "UNIQUE".to_string(),
                    columns: index.columns.clone(),
                    check_clause: None,
                });
            }
        }

        // composite keys arrive as consecutive rows sharing a name
        for fk in foreign_keys {
            match constraints.last_mut() {
                Some(last) if last.name == fk.constraint_name => last.columns.push(fk.from_column),
                _ => constraints.push(ConstraintInfo {
                    name: fk.constraint_name,
                    constraint_type: "FOREIGN KEY".to_string(),
                    columns: vec![fk.from_column],
                    check_clause: None,
                }),
            }
        }

        constraints.sort_by(|a, b| {
            a.constraint_type
                .cmp(&b.constraint_type)
                .then_with(|| a.name.cmp(&b.name))
        });

        Ok(TableStructure {
            columns: columns.into_iter().map(|(column, _)| column).collect(),
            indexes: indexes.into_iter().map(|(index, _)| index).collect(),
            constraints,
        })
    }
}

/// Turns `PRAGMA query_only` on or off for one pooled connection
async fn set_query_only(conn: &mut SqliteConnection, enabled: bool) -> Result<()> {
    let pragma = if enabled {
        "PRAGMA query_only = ON"
    } else {
        "PRAGMA query_only = OFF"
    };
    sqlx::query(pragma)
        .execute(conn)
        .await
        .map(|_| ())
        .map_err(|e| Error::QueryFailed(format!("Failed to set read-only mode: {}", e)))
}

#[async_trait]
impl QueryExecutor for SqliteDatabase {
    async fn run(&self, sql: &str, operation: SqlOperation, max_rows: usize) -> Result<QueryResult> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| Error::QueryFailed(e.to_string()))?;

        // set both ways: a cancelled read may have returned the connection with it on
        set_query_only(&mut *conn, !operation.is_modification()).await?;

        if operation.is_modification() {
            let done = sqlx::query(sql)
                .execute(&mut *conn)
                .await
                .map_err(|e| Error::QueryFailed(e.to_string()))?;
            return Ok(QueryResult::affected(done.rows_affected()));
        }

        let fetched: std::result::Result<Vec<SqliteRow>, sqlx::Error> = sqlx::query(sql)
            .fetch(&mut *conn)
            .take(max_rows + 1)
            .try_collect()
            .await;
        set_query_only(&mut *conn, false).await?;
        let rows = fetched.map_err(|e| Error::QueryFailed(e.to_string()))?;

        let columns = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        Ok(QueryResult::from_rows(columns, rows.iter().map(row_to_json).collect(), max_rows))
    }

    async fn explain(&self, sql: &str) -> Result<Value> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| Error::QueryFailed(e.to_string()))?;

        set_query_only(&mut *conn, true).await?;
        let planned = sqlx::query(&format!("EXPLAIN QUERY PLAN {}", sql))
            .fetch_all(&mut *conn)
            .await;
        set_query_only(&mut *conn, false).await?;

        let mut steps = Vec::new();
        for row in planned.map_err(|e| Error::QueryFailed(e.to_string()))? {
            let id: i64 = row.try_get("id").map_err(|e| Error::QueryFailed(e.to_string()))?;
            let parent: i64 = row.try_get("parent").map_err(|e| Error::QueryFailed(e.to_string()))?;
            let detail: String = row.try_get("detail").map_err(|e| Error::QueryFailed(e.to_string()))?;
            steps.push(json!({"id": id, "parent": parent, "detail": detail}));
        }
        Ok(Value::Array(steps))
    }
}

fn row_to_json(row: &SqliteRow) -> Map<String, Value> {
    row.columns()
        .iter()
        .map(|column| (column.name().to_string(), decode_column(row, column.ordinal())))
        .collect()
}

/// SQLite values are dynamically typed, so try the storage classes in turn
fn decode_column(row: &SqliteRow, index: usize) -> Value {
    match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Err(_) => return Value::Null,
        Ok(_) => {}
    }

    if let Ok(v) = row.try_get::<i64, _>(index) {
        Value::from(v)
    } else if let Ok(v) = row.try_get::<f64, _>(index) {
        Value::from(v)
    } else if let Ok(v) = row.try_get::<String, _>(index) {
        Value::from(v)
    } else if let Ok(v) = row.try_get::<Vec<u8>, _>(index) {
        Value::from(hex::encode(v))
    } else {
        Value::Null
    }
}

/// Create SQLite tools with default configuration (read-only, cached)
pub async fn create_sqlite_tools(connection_string: &str) -> Result<Vec<Arc<dyn Tool>>> {
    create_sqlite_tools_with_config(
        connection_string,
        DatabaseToolConfig::default(),
        &CacheConfig::default(),
    )
    .await
}

/// Create SQLite tools with custom configuration
pub async fn create_sqlite_tools_with_config(
    connection_string: &str,
    config: DatabaseToolConfig,
    cache: &CacheConfig,
) -> Result<Vec<Arc<dyn Tool>>> {
    let db = Arc::new(SqliteDatabase::connect(connection_string, &config).await?);
    create_database_tools(db.clone(), db, "sqlite", config, cache)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::execute_query;
    use crate::schema::scan_schema;
    use sqlnav_relations::extract_foreign_keys;

    const SHOP: &[&str] = &[
        "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
        "CREATE TABLE products (id INTEGER PRIMARY KEY, title TEXT, price REAL)",
        "CREATE TABLE orders (
            id INTEGER PRIMARY KEY,
            customer_id INTEGER REFERENCES customers(id) ON DELETE CASCADE
        )",
        "CREATE TABLE order_products (
            order_id INTEGER REFERENCES orders,
            product_id INTEGER REFERENCES products(id),
            PRIMARY KEY (order_id, product_id)
        )",
        "CREATE UNIQUE INDEX products_title_idx ON products (title)",
        "CREATE VIEW big_spenders AS SELECT * FROM customers",
        "INSERT INTO customers (id, name) VALUES (1, 'Ada'), (2, 'Grace'), (3, 'Edsger')",
    ];

    async fn shop() -> SqliteDatabase {
        let db = SqliteDatabase::connect("sqlite::memory:", &DatabaseToolConfig::default())
            .await
            .unwrap();
        for statement in SHOP {
            sqlx::query(statement).execute(db.pool()).await.unwrap();
        }
        db
    }

    #[tokio::test]
    async fn test_list_foreign_keys() {
        let db = shop().await;
        let fks = db.list_foreign_keys("main").await.unwrap();
        assert_eq!(fks.len(), 3);

        let orders_fk = fks.iter().find(|fk| fk.from_table == "orders").unwrap();
        assert_eq!(orders_fk.to_table, "customers");
        assert_eq!(orders_fk.to_column, "id");
        assert_eq!(orders_fk.on_delete, "CASCADE");
        assert_eq!(orders_fk.on_update, "NO ACTION");
        assert!(orders_fk.constraint_name.starts_with("fk_orders_"));
    }

    #[tokio::test]
    async fn test_constraint_names_sort_by_key_id() {
        let db = shop().await;
        let columns: Vec<String> = (0..12)
            .map(|i| format!("c{i} INTEGER REFERENCES customers(id)"))
            .collect();
        sqlx::query(&format!("CREATE TABLE wide ({})", columns.join(", ")))
            .execute(db.pool())
            .await
            .unwrap();

        let fks = extract_foreign_keys(db.list_foreign_keys("main").await.unwrap());
        let names: Vec<&str> = fks
            .iter()
            .filter(|fk| fk.from_table == "wide")
            .map(|fk| fk.constraint_name.as_str())
            .collect();
        let expected: Vec<String> = (0..12).map(|i| format!("fk_wide_{:04}", i)).collect();
        assert_eq!(names, expected);
    }

    #[tokio::test]
    async fn test_implicit_reference_targets_primary_key() {
        let db = shop().await;
        let fks = db.list_foreign_keys("main").await.unwrap();

        let implicit = fks
            .iter()
            .find(|fk| fk.from_table == "order_products" && fk.to_table == "orders")
            .unwrap();
        assert_eq!(implicit.from_column, "order_id");
        assert_eq!(implicit.to_column, "id");
    }

    #[tokio::test]
    async fn test_column_count() {
        let db = shop().await;
        assert_eq!(db.column_count("main", "products").await.unwrap(), 3);
        assert_eq!(db.column_count("main", "order_products").await.unwrap(), 2);
        assert_eq!(db.column_count("main", "missing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_schema_is_a_catalog_error() {
        let db = shop().await;
        let err = db.list_foreign_keys("nope").await.unwrap_err();
        assert!(matches!(err, Error::Catalog(_)));
    }

    #[tokio::test]
    async fn test_query_truncates_and_decodes() {
        let db = shop().await;
        let config = DatabaseToolConfig::default().with_max_rows(2);

        let result = execute_query(&db, "SELECT id, name, NULL AS note FROM customers ORDER BY id", &config)
            .await
            .unwrap();
        assert_eq!(result.columns, vec!["id", "name", "note"]);
        assert_eq!(result.row_count, 2);
        assert!(result.truncated);
        assert_eq!(result.rows[0]["id"], 1);
        assert_eq!(result.rows[0]["name"], "Ada");
        assert_eq!(result.rows[0]["note"], Value::Null);
    }

    #[tokio::test]
    async fn test_empty_result_has_no_columns() {
        let db = shop().await;
        let result = execute_query(&db, "SELECT * FROM orders", &DatabaseToolConfig::default())
            .await
            .unwrap();
        assert_eq!(result.row_count, 0);
        assert!(result.columns.is_empty());
        assert!(!result.truncated);
    }

    #[tokio::test]
    async fn test_writes_need_permission() {
        let db = shop().await;
        let sql = "DELETE FROM customers WHERE id = 3";

        let err = execute_query(&db, sql, &DatabaseToolConfig::default()).await.unwrap_err();
        assert!(matches!(err, Error::QueryRejected(_)));

        let result = execute_query(&db, sql, &DatabaseToolConfig::with_write_enabled())
            .await
            .unwrap();
        assert_eq!(result.rows_affected, Some(1));
    }

    async fn customer_count(db: &SqliteDatabase) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_delete_behind_cte_is_rejected() {
        let db = shop().await;
        let sql = "WITH x AS (SELECT 1) DELETE FROM customers WHERE id = 3";

        let err = execute_query(&db, sql, &DatabaseToolConfig::default()).await.unwrap_err();
        assert!(matches!(err, Error::QueryRejected(_)));
        assert_eq!(customer_count(&db).await, 3);
    }

    #[tokio::test]
    async fn test_stacked_statements_are_rejected() {
        let db = shop().await;
        let sql = "SELECT 1; DELETE FROM customers";

        let err = execute_query(&db, sql, &DatabaseToolConfig::default()).await.unwrap_err();
        assert!(err.to_string().contains("Multiple SQL statements detected"));
        assert_eq!(customer_count(&db).await, 3);
    }

    #[tokio::test]
    async fn test_reads_run_in_query_only_mode() {
        let db = shop().await;

        // a write the classifier took for a read still cannot change anything
        let err = db
            .run("WITH x AS (SELECT 1) DELETE FROM customers WHERE id = 3", SqlOperation::Other, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::QueryFailed(_)));
        assert_eq!(customer_count(&db).await, 3);

        // the connection is writable again for permitted modifications
        let result = execute_query(
            &db,
            "DELETE FROM customers WHERE id = 3",
            &DatabaseToolConfig::with_write_enabled(),
        )
        .await
        .unwrap();
        assert_eq!(result.rows_affected, Some(1));
        assert_eq!(customer_count(&db).await, 2);
    }

    #[tokio::test]
    async fn test_explain_query_plan() {
        let db = shop().await;
        let plan = db.explain("SELECT * FROM customers WHERE id = 1").await.unwrap();

        let steps = plan.as_array().unwrap();
        assert!(!steps.is_empty());
        assert!(steps[0]["detail"].as_str().unwrap().contains("customers"));

        assert!(db.explain("SELECT * FROM missing").await.is_err());
    }

    #[tokio::test]
    async fn test_list_tables_and_views() {
        let db = shop().await;
        let tables = db.list_tables("main").await.unwrap();

        let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["big_spenders", "customers", "order_products", "orders", "products"]);
        assert_eq!(tables[0].table_type, "VIEW");
        assert_eq!(tables[1].table_type, "BASE TABLE");
    }

    #[tokio::test]
    async fn test_describe_table() {
        let db = shop().await;

        let products = db.describe_table("main", "products").await.unwrap();
        assert_eq!(products.columns.len(), 3);
        assert_eq!(products.columns[0].name, "id");
        assert!(!products.columns[0].nullable);
        assert_eq!(products.columns[2].data_type, "REAL");
        assert_eq!(products.columns[2].position, 3);
        assert_eq!(products.indexes[0].name, "products_title_idx");
        assert_eq!(products.indexes[0].columns, vec!["title"]);
        assert!(products.indexes[0].unique);

        let junction = db.describe_table("main", "order_products").await.unwrap();
        let kinds: Vec<&str> = junction
            .constraints
            .iter()
            .map(|c| c.constraint_type.as_str())
            .collect();
        assert_eq!(kinds, vec!["FOREIGN KEY", "FOREIGN KEY", "PRIMARY KEY"]);
        assert_eq!(junction.constraints[2].columns, vec!["order_id", "product_id"]);
        assert!(junction.indexes.iter().any(|i| i.primary));
    }

    #[tokio::test]
    async fn test_scan_schema() {
        let db = shop().await;
        let scan = scan_schema(&db, "main", Some("orders")).await.unwrap();

        assert_eq!(scan.table_count, 1);
        assert_eq!(scan.tables[0].structure.columns.len(), 2);
        assert_eq!(scan.tables[0].structure.constraints[0].name, "fk_orders_0000");
    }

    #[tokio::test]
    async fn test_sqlite_tools() {
        let tools = create_sqlite_tools("sqlite::memory:").await.unwrap();
        let names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec![
                "sqlite_list_relationships",
                "sqlite_suggest_join",
                "sqlite_generate_join",
                "sqlite_detect_many_to_many",
                "sqlite_list_tables",
                "sqlite_scan_schema",
                "sqlite_validate_sql",
                "sqlite_query",
            ]
        );
    }
}
