//! Agent tools exposing the relationship graph

use crate::catalog::SchemaCatalog;
use crate::config::DatabaseToolConfig;
use crate::query::{QueryExecutor, create_query_tool};
use crate::schema::create_schema_tools;
use crate::service::RelationshipService;
use crate::validate::{SqlValidator, create_validate_tool};
use serde_json::json;
use sqlnav_core::{CacheConfig, Result, Tool, ToolResponse};
use sqlnav_relations::{ForeignKey, JunctionCandidate};
use sqlnav_tool::params::{bool_or, required_str, required_str_list, str_or};
use sqlnav_tool::{FunctionTool, ToolSchema};
use std::sync::Arc;

/// Create the relationship tools for a service.
///
/// Tool names are `<prefix>_list_relationships`, `<prefix>_suggest_join`,
/// `<prefix>_generate_join` and `<prefix>_detect_many_to_many`.
pub fn create_relationship_tools(
    service: Arc<RelationshipService>,
    prefix: &str,
) -> Result<Vec<Arc<dyn Tool>>> {
    let mut tools: Vec<Arc<dyn Tool>> = Vec::new();

    tools.push(Arc::new(create_list_relationships_tool(service.clone(), prefix)?));
    tools.push(Arc::new(create_suggest_join_tool(service.clone(), prefix)?));
    tools.push(Arc::new(create_generate_join_tool(service.clone(), prefix)?));
    tools.push(Arc::new(create_detect_many_to_many_tool(service, prefix)?));

    Ok(tools)
}

/// Every tool for one database.
///
/// The relationship tools share a service whose snapshot cache follows
/// `cache`. They are followed by `<prefix>_list_tables`,
/// `<prefix>_scan_schema`, `<prefix>_validate_sql` and `<prefix>_query`.
pub fn create_database_tools(
    catalog: Arc<dyn SchemaCatalog>,
    executor: Arc<dyn QueryExecutor>,
    prefix: &str,
    config: DatabaseToolConfig,
    cache: &CacheConfig,
) -> Result<Vec<Arc<dyn Tool>>> {
    let service = Arc::new(RelationshipService::from_config(catalog.clone(), cache));

    let mut tools = create_relationship_tools(service, prefix)?;
    tools.extend(create_schema_tools(catalog.clone(), prefix)?);

    let validator = Arc::new(SqlValidator::new(catalog, executor.clone()));
    tools.push(create_validate_tool(validator, prefix)?);
    tools.push(create_query_tool(executor, prefix, config)?);
    Ok(tools)
}

fn schema_description(service: &RelationshipService) -> String {
    format!("Database schema (default: '{}')", service.default_schema())
}

fn create_list_relationships_tool(
    service: Arc<RelationshipService>,
    prefix: &str,
) -> Result<FunctionTool> {
    let schema = ToolSchema::new()
        .property("schema", "string", schema_description(&service))
        .property(
            "table",
            "string",
            "Only show relationships touching this table",
        )
        .build();

    FunctionTool::builder()
        .name(format!("{}_list_relationships", prefix))
        .description("List foreign key and many-to-many relationships between tables")
        .schema(schema)
        .execute(move |ctx, params| {
            let service = service.clone();
            async move {
                let schema_name = str_or(&params, "schema", service.default_schema());
                let table = params["table"].as_str();

                tracing::debug!(
                    invocation_id = %ctx.invocation_id(),
                    schema = %schema_name,
                    table = ?table,
                    "Listing relationships"
                );

                let graph = service.graph(schema_name).await?;
                let (foreign_keys, many_to_many): (Vec<ForeignKey>, Vec<JunctionCandidate>) = match table {
                    Some(table) => (
                        graph
                            .foreign_keys
                            .iter()
                            .filter(|fk| fk.from_table == table || fk.to_table == table)
                            .cloned()
                            .collect(),
                        graph.junctions_for(table).into_iter().cloned().collect(),
                    ),
                    None => (graph.foreign_keys.clone(), graph.many_to_many.clone()),
                };

                Ok(ToolResponse {
                    result: json!({
                        "schema": schema_name,
                        "foreign_keys": foreign_keys,
                        "many_to_many": many_to_many,
                    }),
                })
            }
        })
        .build()
}

fn create_suggest_join_tool(service: Arc<RelationshipService>, prefix: &str) -> Result<FunctionTool> {
    let schema = ToolSchema::new()
        .property("table1", "string", "Table to join from")
        .property("table2", "string", "Table to join to")
        .property("schema", "string", schema_description(&service))
        .required("table1")
        .required("table2")
        .build();

    FunctionTool::builder()
        .name(format!("{}_suggest_join", prefix))
        .description("Suggest the JOIN clause connecting two tables along the shortest foreign key path")
        .schema(schema)
        .execute(move |ctx, params| {
            let service = service.clone();
            async move {
                let table1 = required_str(&params, "table1")?;
                let table2 = required_str(&params, "table2")?;
                let schema_name = str_or(&params, "schema", service.default_schema());

                tracing::debug!(
                    invocation_id = %ctx.invocation_id(),
                    schema = %schema_name,
                    table1 = %table1,
                    table2 = %table2,
                    "Suggesting join"
                );

                let suggestion = service.suggest_join(schema_name, table1, table2).await?;
                ToolResponse::from_serializable(&suggestion)
            }
        })
        .build()
}

fn create_generate_join_tool(service: Arc<RelationshipService>, prefix: &str) -> Result<FunctionTool> {
    let schema = ToolSchema::new()
        .array_property(
            "tables",
            "string",
            "Tables to connect; the first one is the FROM table",
        )
        .property(
            "select_all",
            "boolean",
            "Use SELECT * instead of one <table>.* per requested table (default: false)",
        )
        .property("schema", "string", schema_description(&service))
        .required("tables")
        .build();

    FunctionTool::builder()
        .name(format!("{}_generate_join", prefix))
        .description("Generate a SELECT joining all given tables through foreign keys")
        .schema(schema)
        .execute(move |ctx, params| {
            let service = service.clone();
            async move {
                let tables = required_str_list(&params, "tables")?;
                let select_all = bool_or(&params, "select_all", false);
                let schema_name = str_or(&params, "schema", service.default_schema());

                tracing::debug!(
                    invocation_id = %ctx.invocation_id(),
                    schema = %schema_name,
                    tables = tables.len(),
                    "Generating join"
                );

                let result = service.generate_join(schema_name, &tables, select_all).await?;
                ToolResponse::from_serializable(&result)
            }
        })
        .build()
}

fn create_detect_many_to_many_tool(
    service: Arc<RelationshipService>,
    prefix: &str,
) -> Result<FunctionTool> {
    let schema = ToolSchema::new()
        .property("schema", "string", schema_description(&service))
        .build();

    FunctionTool::builder()
        .name(format!("{}_detect_many_to_many", prefix))
        .description("Find junction tables that link two other tables many-to-many")
        .schema(schema)
        .execute(move |ctx, params| {
            let service = service.clone();
            async move {
                let schema_name = str_or(&params, "schema", service.default_schema());

                tracing::debug!(
                    invocation_id = %ctx.invocation_id(),
                    schema = %schema_name,
                    "Detecting many-to-many relationships"
                );

                let relationships = service.many_to_many(schema_name).await?;
                Ok(ToolResponse {
                    result: json!({
                        "schema": schema_name,
                        "count": relationships.len(),
                        "relationships": relationships,
                    }),
                })
            }
        })
        .build()
}
