//! Rendering of command results
//!
//! Every report renders as Markdown or JSON. Query rows additionally render
//! as a grid table or CSV; other reports asked for those formats fall back
//! to Markdown.

use clap::ValueEnum;
use serde::Serialize;
use serde_json::{Value, json};
use sqlnav_database_tools::{QueryResult, SchemaScan, ValidationReport};
use sqlnav_relations::{ForeignKey, JoinSuggestion, JunctionCandidate, MultiJoinResult};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Markdown,
    Json,
    /// Grid table with a summary footer
    Table,
    Csv,
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Relationship report: foreign keys grouped by source table, then junction tables
pub fn relationships(
    foreign_keys: &[ForeignKey],
    many_to_many: &[JunctionCandidate],
    format: OutputFormat,
) -> anyhow::Result<String> {
    if format == OutputFormat::Json {
        return to_json(&json!({
            "foreign_keys": foreign_keys,
            "many_to_many": many_to_many,
        }));
    }

    let mut lines = vec!["# Database Relationships".to_string(), String::new()];
    lines.push(format!("## Foreign Keys ({})", foreign_keys.len()));
    lines.push(String::new());

    if foreign_keys.is_empty() {
        lines.push("*No foreign keys found*".to_string());
        lines.push(String::new());
    } else {
        let mut by_table: BTreeMap<&str, Vec<&ForeignKey>> = BTreeMap::new();
        for fk in foreign_keys {
            by_table.entry(fk.from_table.as_str()).or_default().push(fk);
        }

        for (table, fks) in by_table {
            lines.push(format!("### {}", table));
            for fk in fks {
                lines.push(format!(
                    "- `{}` → `{}.{}` (ON DELETE: {}, ON UPDATE: {})",
                    fk.from_column, fk.to_table, fk.to_column, fk.on_delete, fk.on_update
                ));
            }
            lines.push(String::new());
        }
    }

    lines.extend(many_to_many_section(many_to_many));
    Ok(lines.join("\n"))
}

/// Junction table report
pub fn many_to_many(relationships: &[JunctionCandidate], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => to_json(&json!({ "many_to_many": relationships })),
        _ => Ok(many_to_many_section(relationships).join("\n")),
    }
}

fn many_to_many_section(relationships: &[JunctionCandidate]) -> Vec<String> {
    let mut lines = vec![
        format!("## Many-to-Many Relationships ({})", relationships.len()),
        String::new(),
    ];

    if relationships.is_empty() {
        lines.push("*No many-to-many relationships detected*".to_string());
        lines.push(String::new());
        return lines;
    }

    for m2m in relationships {
        lines.push(format!("### {} ↔ {}", m2m.table1, m2m.table2));
        lines.push(format!("- Junction table: `{}`", m2m.junction_table));
        lines.push(format!(
            "- {}.{} ← {}.{}",
            m2m.table1, m2m.table1_column, m2m.junction_table, m2m.junction_column1
        ));
        lines.push(format!(
            "- {}.{} ← {}.{}",
            m2m.table2, m2m.table2_column, m2m.junction_table, m2m.junction_column2
        ));
        lines.push(String::new());
    }
    lines
}

fn sql_block(sql: &str) -> String {
    format!("```sql\n{}\n```", sql)
}

pub fn suggestion(
    table1: &str,
    table2: &str,
    suggestion: &JoinSuggestion,
    format: OutputFormat,
) -> anyhow::Result<String> {
    if format == OutputFormat::Json {
        return to_json(suggestion);
    }

    let mut out = format!(
        "# JOIN Suggestion: {} → {}\n\n**{}**\n\n",
        table1, table2, suggestion.explanation
    );
    match &suggestion.sql {
        Some(sql) if suggestion.found => out.push_str(&sql_block(sql)),
        _ => out.push_str("*No relationship path found*"),
    }
    Ok(out)
}

pub fn multi_join(result: &MultiJoinResult, format: OutputFormat) -> anyhow::Result<String> {
    if format == OutputFormat::Json {
        return to_json(result);
    }

    let mut out = format!("# Multi-Table JOIN\n\n**{}**\n\n", result.explanation);
    match &result.sql {
        Some(sql) if result.found => out.push_str(&sql_block(sql)),
        _ => out.push_str(&format!("*Error: {}*", result.explanation)),
    }
    Ok(out)
}

/// Query rows in the requested format
pub fn query_result(result: &QueryResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => to_json(result),
        OutputFormat::Markdown => Ok(markdown_rows(result)),
        OutputFormat::Table => Ok(grid_rows(result)),
        OutputFormat::Csv => csv_rows(result),
    }
}

/// GitHub-style table followed by a summary line
fn markdown_rows(result: &QueryResult) -> String {
    if let Some(affected) = result.rows_affected {
        return format!("*Query executed successfully. {} row(s) affected.*", affected);
    }
    if result.rows.is_empty() {
        return "*Query returned no rows.*".to_string();
    }

    let mut lines = vec![
        format!("| {} |", result.columns.join(" | ")),
        format!("|{}", "---|".repeat(result.columns.len())),
    ];
    for row in &result.rows {
        let cells: Vec<String> = result
            .columns
            .iter()
            .map(|column| cell(row.get(column).unwrap_or(&Value::Null)))
            .collect();
        lines.push(format!("| {} |", cells.join(" | ")));
    }

    lines.push(String::new());
    lines.push(format!(
        "*{} row(s) returned in {:.2} ms*",
        result.row_count, result.execution_time_ms
    ));
    if result.truncated {
        lines.push("*⚠️  Results truncated*".to_string());
    }
    lines.join("\n")
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.replace('|', "\\|"),
        other => other.to_string(),
    }
}

/// Text of a value outside Markdown; NULL is empty
fn plain(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Boxed grid, numbers right-aligned, then row count and timing
fn grid_rows(result: &QueryResult) -> String {
    if let Some(affected) = result.rows_affected {
        return format!("Query executed successfully. {} row(s) affected.", affected);
    }
    if result.rows.is_empty() {
        return "Query returned no rows.".to_string();
    }

    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| {
            result
                .columns
                .iter()
                .map(|column| plain(row.get(column).unwrap_or(&Value::Null)))
                .collect()
        })
        .collect();

    let numeric: Vec<bool> = result
        .columns
        .iter()
        .map(|column| {
            result.rows.iter().all(|row| match row.get(column) {
                Some(Value::Number(_)) | Some(Value::Null) | None => true,
                Some(_) => false,
            })
        })
        .collect();

    let widths: Vec<usize> = result
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(column.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let rule = |fill: char| {
        let segments: Vec<String> = widths.iter().map(|w| fill.to_string().repeat(w + 2)).collect();
        format!("+{}+", segments.join("+"))
    };
    let line = |values: &[String]| {
        let padded: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                if numeric[i] {
                    format!(" {:>width$} ", value, width = widths[i])
                } else {
                    format!(" {:<width$} ", value, width = widths[i])
                }
            })
            .collect();
        format!("|{}|", padded.join("|"))
    };

    let mut lines = vec![rule('-'), line(&result.columns), rule('=')];
    for row in &cells {
        lines.push(line(row));
        lines.push(rule('-'));
    }

    lines.push(String::new());
    lines.push(format!("Rows returned: {}", result.row_count));
    if result.truncated {
        lines.push(format!(
            "⚠️  Results truncated (showing first {} rows)",
            result.row_count
        ));
    }
    lines.push(format!("Execution time: {:.2} ms", result.execution_time_ms));
    lines.join("\n")
}

/// Header row then one record per row; no rows renders nothing
fn csv_rows(result: &QueryResult) -> anyhow::Result<String> {
    if result.rows.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&result.columns)?;
    for row in &result.rows {
        writer.write_record(
            result
                .columns
                .iter()
                .map(|column| plain(row.get(column).unwrap_or(&Value::Null))),
        )?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Validation status, the statement, then any errors, warnings, suggestions and plan estimates
pub fn validation(report: &ValidationReport, format: OutputFormat) -> anyhow::Result<String> {
    if format == OutputFormat::Json {
        return to_json(report);
    }

    let status = if report.valid { "✓ Valid" } else { "✗ Invalid" };
    let mut lines = vec![
        "# SQL Validation Results".to_string(),
        String::new(),
        format!("**Status:** {}", status),
        String::new(),
        "## Query".to_string(),
        sql_block(&report.sql),
        String::new(),
    ];

    let sections: [(&str, &str, &[String]); 3] = [
        ("Errors", "❌ ", &report.errors),
        ("Warnings", "⚠️  ", &report.warnings),
        ("Suggestions", "💡 ", &report.suggestions),
    ];
    for (title, marker, items) in sections {
        if items.is_empty() {
            continue;
        }
        lines.push(format!("## {}", title));
        lines.extend(items.iter().map(|item| format!("- {}{}", marker, item)));
        lines.push(String::new());
    }

    if let Some(plan) = &report.explain {
        lines.push("## Query Plan Analysis".to_string());
        lines.push(String::new());
        if let Some(cost) = plan.total_cost {
            lines.push(format!("- **Estimated Cost:** {:.2}", cost));
        }
        if let Some(rows) = plan.estimated_rows {
            lines.push(format!("- **Estimated Rows:** {}", thousands(rows)));
        }
        lines.push(String::new());
    }

    Ok(lines.join("\n"))
}

fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    out
}

/// Per-table columns, indexes and non-index constraints
pub fn schema_scan(scan: &SchemaScan, format: OutputFormat) -> anyhow::Result<String> {
    if format == OutputFormat::Json {
        return to_json(scan);
    }

    let mut lines = vec![
        format!("# Database Schema: {}", scan.schema),
        String::new(),
        format!("Total tables: {}", scan.table_count),
    ];

    for details in &scan.tables {
        let table = &details.table;
        lines.push(String::new());
        lines.push(format!("## Table: `{}`", table.name));

        let mut metadata = vec![format!("Type: {}", table.table_type)];
        if let Some(rows) = table.row_count_estimate {
            metadata.push(format!("Rows: ~{}", thousands(rows.max(0) as u64)));
        }
        lines.push(String::new());
        lines.push(format!("*{}*", metadata.join(" | ")));

        lines.push(String::new());
        lines.push("### Columns".to_string());
        lines.push(String::new());
        lines.push("| Column | Type | Nullable | Default |".to_string());
        lines.push("|--------|------|----------|---------|".to_string());
        for column in &details.structure.columns {
            lines.push(format!(
                "| `{}` | {} | {} | {} |",
                column.name,
                column.data_type,
                if column.nullable { "✓" } else { "✗" },
                column.default.as_deref().unwrap_or("-")
            ));
        }

        if !details.structure.indexes.is_empty() {
            lines.push(String::new());
            lines.push("### Indexes".to_string());
            for index in &details.structure.indexes {
                let mut kind = Vec::new();
                if index.primary {
                    kind.push("PRIMARY KEY".to_string());
                } else if index.unique {
                    kind.push("UNIQUE".to_string());
                }
                kind.push(index.index_type.to_uppercase());
                lines.push(format!(
                    "- **{}** ({}): {}",
                    index.name,
                    kind.join(" "),
                    quoted_list(&index.columns)
                ));
            }
        }

        let constraints: Vec<_> = details
            .structure
            .constraints
            .iter()
            .filter(|c| c.constraint_type != "PRIMARY KEY" && c.constraint_type != "UNIQUE")
            .collect();
        if !constraints.is_empty() {
            lines.push(String::new());
            lines.push("### Constraints".to_string());
            for constraint in constraints {
                let body = match constraint.check_clause.as_deref() {
                    Some(clause) if constraint.constraint_type == "CHECK" => clause.to_string(),
                    _ => quoted_list(&constraint.columns),
                };
                lines.push(format!(
                    "- **{}** ({}): {}",
                    constraint.name, constraint.constraint_type, body
                ));
            }
        }
    }

    Ok(lines.join("\n"))
}

fn quoted_list(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("`{}`", name))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use sqlnav_database_tools::{
        ColumnInfo, ConstraintInfo, IndexInfo, PlanSummary, TableDetails, TableInfo, TableStructure,
    };
    use sqlnav_relations::{ColumnCounts, build_graph, suggest_pairwise, synthesize_multi};

    fn shop_keys() -> Vec<ForeignKey> {
        vec![
            ForeignKey::new("orders_customer_fk", "orders", "customer_id", "customers", "id")
                .with_rules("NO ACTION", "CASCADE"),
            ForeignKey::new("op_order_fk", "order_products", "order_id", "orders", "id"),
            ForeignKey::new("op_product_fk", "order_products", "product_id", "products", "id"),
        ]
    }

    fn shop_junctions() -> Vec<JunctionCandidate> {
        let counts = ColumnCounts::from([("order_products".to_string(), 2)]);
        build_graph(shop_keys(), &counts).many_to_many
    }

    #[test]
    fn test_relationships_markdown() {
        let text = relationships(&shop_keys(), &shop_junctions(), OutputFormat::Markdown).unwrap();

        assert!(text.starts_with("# Database Relationships\n\n## Foreign Keys (3)\n"));
        assert!(text.contains(
            "### orders\n- `customer_id` → `customers.id` (ON DELETE: CASCADE, ON UPDATE: NO ACTION)"
        ));
        assert!(text.contains("## Many-to-Many Relationships (1)"));
        assert!(text.contains("### orders ↔ products\n- Junction table: `order_products`"));
        assert!(text.contains("- orders.id ← order_products.order_id"));

        // Source tables are listed alphabetically
        let order_products = text.find("### order_products").unwrap();
        let orders = text.find("### orders\n").unwrap();
        assert!(order_products < orders);
    }

    #[test]
    fn test_relationships_empty() {
        let text = relationships(&[], &[], OutputFormat::Markdown).unwrap();
        assert!(text.contains("*No foreign keys found*"));
        assert!(text.contains("*No many-to-many relationships detected*"));
    }

    #[test]
    fn test_relationships_json() {
        let text = relationships(&shop_keys(), &[], OutputFormat::Json).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["foreign_keys"][0]["on_delete"], "CASCADE");
        assert_eq!(value["many_to_many"], json!([]));
    }

    #[test]
    fn test_suggestion_markdown() {
        let graph = build_graph(shop_keys(), &ColumnCounts::new());

        let found = suggest_pairwise(&graph, "orders", "customers");
        let text = suggestion("orders", "customers", &found, OutputFormat::Markdown).unwrap();
        assert!(text.starts_with("# JOIN Suggestion: orders → customers\n\n**Direct relationship"));
        assert!(text.ends_with("```sql\nFROM orders\nJOIN customers ON orders.customer_id = customers.id\n```"));

        let missing = suggest_pairwise(&graph, "orders", "users");
        let text = suggestion("orders", "users", &missing, OutputFormat::Markdown).unwrap();
        assert!(text.ends_with("*No relationship path found*"));
    }

    #[test]
    fn test_suggestion_json_has_null_path() {
        let graph = build_graph(shop_keys(), &ColumnCounts::new());
        let missing = suggest_pairwise(&graph, "orders", "users");

        let value: Value = serde_json::from_str(&suggestion("orders", "users", &missing, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(value["found"], false);
        assert!(value["path"].is_null());
        assert!(value["sql"].is_null());
    }

    #[test]
    fn test_multi_join_failure_markdown() {
        let graph = build_graph(shop_keys(), &ColumnCounts::new());
        let tables = vec!["orders".to_string()];
        let result = synthesize_multi(&graph, &tables, false);

        let text = multi_join(&result, OutputFormat::Markdown).unwrap();
        assert!(text.ends_with("*Error: Need at least 2 tables to generate JOIN (got 1)*"));
    }

    #[test]
    fn test_query_result_markdown() {
        let mut row = Map::new();
        row.insert("id".to_string(), json!(1));
        row.insert("name".to_string(), json!("a|b"));
        row.insert("note".to_string(), Value::Null);

        let mut result = QueryResult::from_rows(
            vec!["id".to_string(), "name".to_string(), "note".to_string()],
            vec![row.clone(), row],
            1,
        );
        result.execution_time_ms = 1.5;

        let text = query_result(&result, OutputFormat::Markdown).unwrap();
        assert_eq!(
            text,
            "| id | name | note |\n|---|---|---|\n| 1 | a\\|b | NULL |\n\n\
             *1 row(s) returned in 1.50 ms*\n*⚠️  Results truncated*"
        );
    }

    #[test]
    fn test_query_result_write() {
        let text = query_result(&QueryResult::affected(2), OutputFormat::Markdown).unwrap();
        assert_eq!(text, "*Query executed successfully. 2 row(s) affected.*");
    }

    fn people() -> QueryResult {
        let rows = [
            (json!(1), json!("Lovelace, Ada"), json!("said \"hi\"")),
            (json!(12), json!("Grace"), Value::Null),
        ]
        .into_iter()
        .map(|(id, name, note)| {
            let mut row = Map::new();
            row.insert("id".to_string(), id);
            row.insert("name".to_string(), name);
            row.insert("note".to_string(), note);
            row
        })
        .collect();

        let mut result = QueryResult::from_rows(
            vec!["id".to_string(), "name".to_string(), "note".to_string()],
            rows,
            100,
        );
        result.execution_time_ms = 3.25;
        result
    }

    #[test]
    fn test_query_result_csv() {
        let text = query_result(&people(), OutputFormat::Csv).unwrap();
        assert_eq!(
            text,
            "id,name,note\n1,\"Lovelace, Ada\",\"said \"\"hi\"\"\"\n12,Grace,\n"
        );

        let empty = QueryResult::from_rows(vec!["id".to_string()], Vec::new(), 10);
        assert_eq!(query_result(&empty, OutputFormat::Csv).unwrap(), "");
    }

    #[test]
    fn test_query_result_table() {
        let text = query_result(&people(), OutputFormat::Table).unwrap();
        assert_eq!(
            text,
            "+----+---------------+-----------+\n\
             | id | name          | note      |\n\
             +====+===============+===========+\n\
             |  1 | Lovelace, Ada | said \"hi\" |\n\
             +----+---------------+-----------+\n\
             | 12 | Grace         |           |\n\
             +----+---------------+-----------+\n\
             \n\
             Rows returned: 2\n\
             Execution time: 3.25 ms"
        );

        let write = query_result(&QueryResult::affected(3), OutputFormat::Table).unwrap();
        assert_eq!(write, "Query executed successfully. 3 row(s) affected.");
    }

    #[test]
    fn test_other_reports_fall_back_to_markdown() {
        let text = relationships(&shop_keys(), &[], OutputFormat::Csv).unwrap();
        assert!(text.starts_with("# Database Relationships"));
        let text = many_to_many(&shop_junctions(), OutputFormat::Table).unwrap();
        assert!(text.starts_with("## Many-to-Many Relationships (1)"));
    }

    #[test]
    fn test_validation_markdown() {
        let report = ValidationReport {
            sql: "SELECT * FROM orders".to_string(),
            valid: true,
            errors: Vec::new(),
            warnings: vec!["Sequential scan on orders".to_string()],
            suggestions: vec!["Name the columns you need".to_string()],
            explain: Some(PlanSummary {
                plan: json!([]),
                total_cost: Some(35.5),
                estimated_rows: Some(1234567),
            }),
        };

        let text = validation(&report, OutputFormat::Markdown).unwrap();
        assert!(text.starts_with("# SQL Validation Results\n\n**Status:** ✓ Valid\n\n## Query\n```sql\nSELECT * FROM orders\n```"));
        assert!(!text.contains("## Errors"));
        assert!(text.contains("## Warnings\n- ⚠️  Sequential scan on orders\n"));
        assert!(text.contains("## Suggestions\n- 💡 Name the columns you need\n"));
        assert!(text.contains("- **Estimated Cost:** 35.50\n- **Estimated Rows:** 1,234,567"));

        let invalid = ValidationReport {
            sql: "SELEC 1".to_string(),
            errors: vec!["Syntax error".to_string()],
            ..Default::default()
        };
        let text = validation(&invalid, OutputFormat::Markdown).unwrap();
        assert!(text.contains("**Status:** ✗ Invalid"));
        assert!(text.contains("## Errors\n- ❌ Syntax error"));
    }

    #[test]
    fn test_schema_markdown() {
        let scan = SchemaScan {
            schema: "public".to_string(),
            table_count: 1,
            tables: vec![TableDetails {
                table: TableInfo {
                    name: "orders".to_string(),
                    table_type: "BASE TABLE".to_string(),
                    row_count_estimate: Some(4200),
                },
                structure: TableStructure {
                    columns: vec![
                        ColumnInfo {
                            name: "id".to_string(),
                            data_type: "integer".to_string(),
                            nullable: false,
                            default: Some("nextval('orders_id_seq')".to_string()),
                            position: 1,
                        },
                        ColumnInfo {
                            name: "customer_id".to_string(),
                            data_type: "integer".to_string(),
                            nullable: true,
                            default: None,
                            position: 2,
                        },
                    ],
                    indexes: vec![IndexInfo {
                        name: "orders_pkey".to_string(),
                        columns: vec!["id".to_string()],
                        unique: true,
                        primary: true,
                        index_type: "btree".to_string(),
                    }],
                    constraints: vec![
                        ConstraintInfo {
                            name: "orders_pkey".to_string(),
                            constraint_type: "PRIMARY KEY".to_string(),
                            columns: vec!["id".to_string()],
                            check_clause: None,
                        },
                        ConstraintInfo {
                            name: "orders_customer_fk".to_string(),
                            constraint_type: "FOREIGN KEY".to_string(),
                            columns: vec!["customer_id".to_string()],
                            check_clause: None,
                        },
                    ],
                },
            }],
        };

        let text = schema_scan(&scan, OutputFormat::Markdown).unwrap();
        assert!(text.starts_with("# Database Schema: public\n\nTotal tables: 1\n\n## Table: `orders`\n\n*Type: BASE TABLE | Rows: ~4,200*"));
        assert!(text.contains("| `id` | integer | ✗ | nextval('orders_id_seq') |"));
        assert!(text.contains("| `customer_id` | integer | ✓ | - |"));
        assert!(text.contains("### Indexes\n- **orders_pkey** (PRIMARY KEY BTREE): `id`"));
        assert!(text.contains("### Constraints\n- **orders_customer_fk** (FOREIGN KEY): `customer_id`"));
        assert!(!text.contains("(PRIMARY KEY): `id`"));

        let value: Value = serde_json::from_str(&schema_scan(&scan, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(value["tables"][0]["indexes"][0]["type"], "btree");
    }
}
