//! Database tools for sqlnav
//!
//! This crate connects the relationship graph engine to live databases:
//! catalog providers for PostgreSQL and SQLite, a snapshot cache, schema
//! listings, SQL validation, guarded query execution, and agent tools
//! exposing join suggestions.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod postgres;
pub mod query;
pub mod relationship_tools;
pub mod schema;
pub mod service;
pub mod sqlite;
pub mod statement;
pub mod validate;

// Re-exports
pub use cache::{SchemaCache, cache_key};
pub use catalog::{
    CatalogSnapshot, DatabaseHandle, SchemaCatalog, connect_database, load_snapshot,
    mask_connection_string,
};
pub use config::{DatabaseToolConfig, SqlOperation};
pub use postgres::{PostgresDatabase, create_postgres_tools, create_postgres_tools_with_config};
pub use query::{
    EMPTY_STATEMENT, MODIFICATION_REJECTED, MULTIPLE_STATEMENTS, QueryExecutor, QueryResult, authorize, create_query_tool,
    execute_query,
};
pub use relationship_tools::{create_database_tools, create_relationship_tools};
pub use schema::{
    ColumnInfo, ConstraintInfo, IndexInfo, SchemaScan, TableDetails, TableInfo, TableStructure,
    create_schema_tools, scan_schema,
};
pub use service::RelationshipService;
pub use sqlite::{SqliteDatabase, create_sqlite_tools, create_sqlite_tools_with_config};
pub use statement::{dialect_for, referenced_tables, split_statements};
pub use validate::{PlanSummary, SqlValidator, ValidationReport, create_validate_tool};
