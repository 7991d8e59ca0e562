//! Table, column, index and constraint listings

use crate::catalog::SchemaCatalog;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlnav_core::{Error, Result, Tool, ToolResponse};
use sqlnav_tool::params::str_or;
use sqlnav_tool::{FunctionTool, ToolSchema};
use std::sync::Arc;

/// A table or view in a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    /// `BASE TABLE` or `VIEW`
    #[serde(rename = "type")]
    pub table_type: String,
    /// Planner statistics; not available on every backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count_estimate: Option<i64>,
}

impl TableInfo {
    pub fn base_table(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_type: "BASE TABLE".to_string(),
            row_count_estimate: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    /// 1-based ordinal position
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
    pub primary: bool,
    /// Access method, e.g. `btree`
    #[serde(rename = "type")]
    pub index_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintInfo {
    pub name: String,
    /// `PRIMARY KEY`, `UNIQUE`, `FOREIGN KEY` or `CHECK`
    #[serde(rename = "type")]
    pub constraint_type: String,
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_clause: Option<String>,
}

/// Everything listed for one table besides its name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableStructure {
    pub columns: Vec<ColumnInfo>,
    pub indexes: Vec<IndexInfo>,
    pub constraints: Vec<ConstraintInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDetails {
    #[serde(flatten)]
    pub table: TableInfo,
    #[serde(flatten)]
    pub structure: TableStructure,
}

/// Result of scanning a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaScan {
    pub schema: String,
    pub table_count: usize,
    pub tables: Vec<TableDetails>,
}

/// Describes every table of `schema`, or only `only_table` when given.
///
/// Naming a table the schema does not have is an invalid parameter.
pub async fn scan_schema(
    catalog: &dyn SchemaCatalog,
    schema: &str,
    only_table: Option<&str>,
) -> Result<SchemaScan> {
    let mut tables = catalog.list_tables(schema).await?;

    if let Some(wanted) = only_table {
        tables.retain(|t| t.name == wanted);
        if tables.is_empty() {
            return Err(Error::invalid_parameter(format!(
                "Table '{}' does not exist in schema '{}'",
                wanted, schema
            )));
        }
    }

    let mut details = Vec::with_capacity(tables.len());
    for table in tables {
        tracing::debug!(schema = %schema, table = %table.name, "Scanning table");
        let structure = catalog.describe_table(schema, &table.name).await?;
        details.push(TableDetails { table, structure });
    }

    tracing::info!(
        endpoint = %catalog.endpoint(),
        schema = %schema,
        tables = details.len(),
        "Scanned schema"
    );

    Ok(SchemaScan {
        schema: schema.to_string(),
        table_count: details.len(),
        tables: details,
    })
}

/// Create `<prefix>_list_tables` and `<prefix>_scan_schema`
pub fn create_schema_tools(
    catalog: Arc<dyn SchemaCatalog>,
    prefix: &str,
) -> Result<Vec<Arc<dyn Tool>>> {
    let schema_description = format!("Database schema (default: '{}')", catalog.default_schema());

    let list_catalog = catalog.clone();
    let list_tables = FunctionTool::builder()
        .name(format!("{}_list_tables", prefix))
        .description("List the tables and views of a schema")
        .schema(
            ToolSchema::new()
                .property("schema", "string", schema_description.clone())
                .build(),
        )
        .execute(move |ctx, params| {
            let catalog = list_catalog.clone();
            async move {
                let schema_name = str_or(&params, "schema", catalog.default_schema());

                tracing::debug!(
                    invocation_id = %ctx.invocation_id(),
                    schema = %schema_name,
                    "Listing tables"
                );

                let tables = catalog.list_tables(schema_name).await?;
                Ok(ToolResponse {
                    result: json!({
                        "schema": schema_name,
                        "table_count": tables.len(),
                        "tables": tables,
                    }),
                })
            }
        })
        .build()?;

    let scan = FunctionTool::builder()
        .name(format!("{}_scan_schema", prefix))
        .description("Describe columns, indexes and constraints of every table in a schema, or of one table")
        .schema(
            ToolSchema::new()
                .property("schema", "string", schema_description)
                .property("table", "string", "Only describe this table")
                .build(),
        )
        .execute(move |ctx, params| {
            let catalog = catalog.clone();
            async move {
                let schema_name = str_or(&params, "schema", catalog.default_schema());
                let table = params["table"].as_str();

                tracing::debug!(
                    invocation_id = %ctx.invocation_id(),
                    schema = %schema_name,
                    table = ?table,
                    "Scanning schema"
                );

                let scan = scan_schema(catalog.as_ref(), schema_name, table).await?;
                ToolResponse::from_serializable(&scan)
            }
        })
        .build()?;

    Ok(vec![Arc::new(list_tables), Arc::new(scan)])
}
