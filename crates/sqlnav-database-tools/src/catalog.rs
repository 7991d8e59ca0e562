//! Schema catalog abstraction and connection setup

use crate::config::DatabaseToolConfig;
use crate::postgres::PostgresDatabase;
use crate::query::QueryExecutor;
use crate::schema::{TableInfo, TableStructure};
use crate::sqlite::SqliteDatabase;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlnav_core::{Error, Result};
use sqlnav_relations::{
    ColumnCounts, ForeignKey, RelationshipGraph, build_graph, extract_foreign_keys,
    tables_with_two_keys,
};
use std::sync::Arc;

/// Source of schema metadata for a database
#[async_trait]
pub trait SchemaCatalog: Send + Sync {
    /// Connection endpoint with any password masked
    fn endpoint(&self) -> &str;

    /// Schema inspected when callers don't name one
    fn default_schema(&self) -> &str;

    /// Every foreign-key column pair in the schema
    async fn list_foreign_keys(&self, schema: &str) -> Result<Vec<ForeignKey>>;

    /// Total number of columns of a table
    async fn column_count(&self, schema: &str, table: &str) -> Result<usize>;

    /// Tables and views of the schema, ordered by name
    async fn list_tables(&self, schema: &str) -> Result<Vec<TableInfo>>;

    /// Columns, indexes and constraints of one table
    async fn describe_table(&self, schema: &str, table: &str) -> Result<TableStructure>;
}

/// Everything the graph builder needs from one catalog read.
///
/// Snapshots are shared through `Arc` and never modified after loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub schema: String,
    pub foreign_keys: Vec<ForeignKey>,
    pub column_counts: ColumnCounts,
}

impl CatalogSnapshot {
    /// Builds a fresh relationship graph from this snapshot
    pub fn graph(&self) -> RelationshipGraph {
        build_graph(self.foreign_keys.clone(), &self.column_counts)
    }
}

/// Reads foreign keys, then column counts for the tables that could be junctions.
pub async fn load_snapshot(catalog: &dyn SchemaCatalog, schema: &str) -> Result<CatalogSnapshot> {
    let foreign_keys = extract_foreign_keys(catalog.list_foreign_keys(schema).await?);

    let mut column_counts = ColumnCounts::new();
    for table in tables_with_two_keys(&foreign_keys) {
        let count = catalog.column_count(schema, &table).await?;
        column_counts.insert(table, count);
    }

    tracing::debug!(
        endpoint = %catalog.endpoint(),
        schema = %schema,
        foreign_keys = foreign_keys.len(),
        "Loaded catalog snapshot"
    );

    Ok(CatalogSnapshot {
        schema: schema.to_string(),
        foreign_keys,
        column_counts,
    })
}

/// Mask the password in a connection string for logs and cache keys
pub fn mask_connection_string(connection_string: &str) -> String {
    match url::Url::parse(connection_string) {
        Ok(mut parsed) => {
            if parsed.password().is_some() && parsed.set_password(Some("***")).is_ok() {
                parsed.to_string()
            } else {
                connection_string.to_string()
            }
        }
        Err(_) => "***connection string***".to_string(),
    }
}

/// A connected database seen both as a catalog and as a query executor
#[derive(Clone)]
pub struct DatabaseHandle {
    pub catalog: Arc<dyn SchemaCatalog>,
    pub executor: Arc<dyn QueryExecutor>,
}

/// Connect to PostgreSQL or SQLite, chosen by the URL scheme
pub async fn connect_database(
    connection_string: &str,
    config: &DatabaseToolConfig,
) -> Result<DatabaseHandle> {
    if connection_string.starts_with("sqlite:") {
        let db = Arc::new(SqliteDatabase::connect(connection_string, config).await?);
        Ok(DatabaseHandle {
            catalog: db.clone(),
            executor: db,
        })
    } else if connection_string.starts_with("postgres://")
        || connection_string.starts_with("postgresql://")
    {
        let db = Arc::new(PostgresDatabase::connect(connection_string, config).await?);
        Ok(DatabaseHandle {
            catalog: db.clone(),
            executor: db,
        })
    } else {
        Err(Error::config_error(format!(
            "Unsupported connection string '{}': expected postgresql:// or sqlite:",
            mask_connection_string(connection_string)
        )))
    }
}
