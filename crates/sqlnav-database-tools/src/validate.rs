//! Pre-flight checks for a SQL statement
//!
//! Validation runs in stages and stops at the first one that fails:
//!
//! 1. The text must hold exactly one statement the dialect parser accepts.
//! 2. Every table named after FROM, JOIN, UPDATE or INTO must exist. Misses
//!    come with close matches from the catalog.
//! 3. Patterns typical of injected SQL become warnings, and common
//!    performance mistakes become suggestions. Neither makes a statement invalid.
//! 4. On request, the planner's estimate is attached. The statement itself is
//!    never executed.

use crate::catalog::SchemaCatalog;
use crate::config::SqlOperation;
use crate::query::{EMPTY_STATEMENT, MULTIPLE_STATEMENTS, QueryExecutor};
use crate::statement::{dialect_for, referenced_tables, split_statements};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlnav_core::{Result, Tool, ToolResponse};
use sqlnav_tool::params::{bool_or, required_str, str_or};
use sqlnav_tool::{FunctionTool, ToolSchema};
use sqlparser::parser::Parser;
use sqlparser::tokenizer::Token;
use std::sync::{Arc, OnceLock};

/// Most close matches offered for a missing table
const MAX_SUGGESTED_TABLES: usize = 3;

/// Estimated rows above which a sequential scan is worth a warning
const SEQ_SCAN_WARNING_ROWS: u64 = 1000;

/// Outcome of validating one statement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub sql: String,
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
    pub explain: Option<PlanSummary>,
}

/// Planner output with the headline estimates pulled out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub plan: Value,
    pub total_cost: Option<f64>,
    pub estimated_rows: Option<u64>,
}

/// Checks statements against a live catalog
pub struct SqlValidator {
    catalog: Arc<dyn SchemaCatalog>,
    executor: Arc<dyn QueryExecutor>,
}

impl SqlValidator {
    pub fn new(catalog: Arc<dyn SchemaCatalog>, executor: Arc<dyn QueryExecutor>) -> Self {
        Self { catalog, executor }
    }

    pub fn default_schema(&self) -> &str {
        self.catalog.default_schema()
    }

    pub async fn validate(&self, sql: &str, schema: &str, explain: bool) -> ValidationReport {
        let mut report = ValidationReport {
            sql: sql.to_string(),
            ..Default::default()
        };

        let tokens = match check_syntax(sql, self.catalog.endpoint()) {
            Ok(tokens) => tokens,
            Err(error) => {
                report.errors.push(error);
                return report;
            }
        };

        report.errors = self.missing_tables(&tokens, schema).await;
        if !report.errors.is_empty() {
            return report;
        }

        report.warnings = injection_warnings(sql);
        report.suggestions = improvement_suggestions(sql, SqlOperation::from_tokens(&tokens));
        report.valid = true;

        if explain {
            match self.executor.explain(sql).await {
                Ok(plan) => {
                    report.warnings.extend(plan_warnings(&plan));
                    report.explain = Some(summarize_plan(plan));
                }
                Err(e) => report.warnings.push(format!("EXPLAIN failed: {}", e)),
            }
        }

        tracing::debug!(
            schema = %schema,
            valid = report.valid,
            warnings = report.warnings.len(),
            "Validated statement"
        );
        report
    }

    /// One error per table the schema lacks.
    ///
    /// A catalog that cannot be read skips the check rather than failing
    /// validation.
    async fn missing_tables(&self, tokens: &[Token], schema: &str) -> Vec<String> {
        let referenced = referenced_tables(tokens);
        if referenced.is_empty() {
            return Vec::new();
        }

        let known: Vec<String> = match self.catalog.list_tables(schema).await {
            Ok(tables) => tables.into_iter().map(|t| t.name).collect(),
            Err(e) => {
                tracing::warn!(schema = %schema, error = %e, "Skipping table existence check");
                return Vec::new();
            }
        };

        referenced
            .iter()
            .filter(|table| !known.contains(*table))
            .map(|table| {
                let mut message = format!("Table '{}' does not exist in schema '{}'", table, schema);
                let similar = similar_names(table, &known);
                if !similar.is_empty() {
                    message.push_str(&format!(". Did you mean: {}?", similar.join(", ")));
                }
                message
            })
            .collect()
    }
}

/// Exactly one statement, accepted by the parser for the endpoint's dialect
fn check_syntax(sql: &str, endpoint: &str) -> std::result::Result<Vec<Token>, String> {
    let mut statements =
        split_statements(sql).map_err(|e| format!("Syntax error: {}", e))?;
    match statements.len() {
        0 => return Err(EMPTY_STATEMENT.to_string()),
        1 => {}
        _ => return Err(MULTIPLE_STATEMENTS.to_string()),
    }

    let dialect = dialect_for(endpoint);
    Parser::parse_sql(dialect.as_ref(), sql).map_err(|e| format!("Syntax error: {}", e))?;

    Ok(statements.remove(0))
}

/// Up to three known names containing, contained in, or within a small edit
/// distance of `name`, closest first
fn similar_names(name: &str, known: &[String]) -> Vec<String> {
    let needle = name.to_lowercase();
    let needle_chars: Vec<char> = needle.chars().collect();
    let max_distance = (needle_chars.len() / 3).max(1);

    let mut scored: Vec<(usize, &String)> = known
        .iter()
        .filter_map(|candidate| {
            let lower = candidate.to_lowercase();
            if lower.contains(&needle) || needle.contains(&lower) {
                return Some((0, candidate));
            }
            let distance = edit_distance_within(&lower, &needle_chars, max_distance);
            (distance <= max_distance).then_some((distance, candidate))
        })
        .collect();

    scored.sort();
    scored
        .into_iter()
        .take(MAX_SUGGESTED_TABLES)
        .map(|(_, name)| name.clone())
        .collect()
}

/// Levenshtein distance, giving up with `max + 1` once every path exceeds `max`
fn edit_distance_within(value: &str, needle: &[char], max: usize) -> usize {
    let n = needle.len();
    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr: Vec<usize> = vec![0; n + 1];

    for (i, c) in value.chars().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];

        for j in 1..=n {
            let cost = usize::from(c != needle[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
            row_min = row_min.min(curr[j]);
        }

        if row_min > max {
            return max + 1;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

fn injection_rules() -> &'static [(Regex, &'static str)] {
    static RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            (r"(?i);\s*DROP\s+", "Detected DROP statement after semicolon"),
            (r"(?i);\s*DELETE\s+", "Detected DELETE statement after semicolon"),
            (r"(?i);\s*UPDATE\s+", "Detected UPDATE statement after semicolon"),
            (r"(?i);\s*INSERT\s+", "Detected INSERT statement after semicolon"),
            (r"--\s*$", "SQL comment at end of query"),
            (r"/\*.*\*/", "Block comment detected"),
            (r#"\+\s*['"]|['"]\s*\+"#, "Possible string concatenation detected"),
        ]
        .into_iter()
        .filter_map(|(pattern, warning)| Regex::new(pattern).ok().map(|re| (re, warning)))
        .collect()
    })
}

/// Warnings for text shaped like an injection attempt
pub fn injection_warnings(sql: &str) -> Vec<String> {
    injection_rules()
        .iter()
        .filter(|(pattern, _)| pattern.is_match(sql))
        .map(|(_, warning)| warning.to_string())
        .collect()
}

/// Compiles `source` into `cell` on first use
fn cached_match(cell: &'static OnceLock<Option<Regex>>, source: &str, sql: &str) -> bool {
    cell.get_or_init(|| Regex::new(source).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(sql))
}

/// Performance and safety hints that do not affect validity
pub fn improvement_suggestions(sql: &str, operation: SqlOperation) -> Vec<String> {
    static SELECT_STAR: OnceLock<Option<Regex>> = OnceLock::new();
    static WHERE: OnceLock<Option<Regex>> = OnceLock::new();
    static LEADING_WILDCARD: OnceLock<Option<Regex>> = OnceLock::new();
    static LIMIT: OnceLock<Option<Regex>> = OnceLock::new();

    let mut suggestions = Vec::new();

    if cached_match(&SELECT_STAR, r"(?i)SELECT\s+\*", sql) {
        suggestions.push(
            "Consider selecting specific columns instead of SELECT * for better performance"
                .to_string(),
        );
    }
    if matches!(operation, SqlOperation::Update | SqlOperation::Delete)
        && !cached_match(&WHERE, r"(?i)\bWHERE\b", sql)
    {
        suggestions.push("WARNING: UPDATE/DELETE without WHERE clause will affect all rows!".to_string());
    }
    if cached_match(&LEADING_WILDCARD, r#"(?i)LIKE\s+['"]%"#, sql) {
        suggestions.push("LIKE with leading wildcard (%) cannot use indexes efficiently".to_string());
    }
    if operation == SqlOperation::Select && !cached_match(&LIMIT, r"(?i)\bLIMIT\b", sql) {
        suggestions.push("Consider adding LIMIT clause to restrict result set size".to_string());
    }

    suggestions
}

/// Root node of a PostgreSQL JSON plan
fn plan_root(plan: &Value) -> Option<&Value> {
    plan.get(0).and_then(|p| p.get("Plan"))
}

fn summarize_plan(plan: Value) -> PlanSummary {
    let root = plan_root(&plan);
    PlanSummary {
        total_cost: root.and_then(|r| r["Total Cost"].as_f64()),
        estimated_rows: root.and_then(|r| r["Plan Rows"].as_u64()),
        plan,
    }
}

/// Sequential scans over large estimated row counts, anywhere in the plan
fn plan_warnings(plan: &Value) -> Vec<String> {
    fn visit(node: &Value, warnings: &mut Vec<String>) {
        if node["Node Type"] == "Seq Scan" {
            let rows = node["Plan Rows"].as_u64().unwrap_or(0);
            if rows > SEQ_SCAN_WARNING_ROWS {
                let table = node["Relation Name"].as_str().unwrap_or("unknown");
                warnings.push(format!(
                    "Sequential scan on table '{}' (~{} rows). Consider adding an index.",
                    table, rows
                ));
            }
        }
        if let Some(children) = node["Plans"].as_array() {
            for child in children {
                visit(child, warnings);
            }
        }
    }

    let mut warnings = Vec::new();
    if let Some(root) = plan_root(plan) {
        visit(root, &mut warnings);
    }
    warnings
}

/// Create the `<prefix>_validate_sql` tool
pub fn create_validate_tool(validator: Arc<SqlValidator>, prefix: &str) -> Result<Arc<dyn Tool>> {
    let schema = ToolSchema::new()
        .property("sql", "string", "SQL statement to check")
        .property(
            "schema",
            "string",
            format!("Database schema (default: '{}')", validator.default_schema()),
        )
        .property(
            "explain",
            "boolean",
            "Attach the query planner's estimate (default: false)",
        )
        .required("sql")
        .build();

    let tool = FunctionTool::builder()
        .name(format!("{}_validate_sql", prefix))
        .description(
            "Check a SQL statement's syntax and table names against the schema without running it",
        )
        .schema(schema)
        .execute(move |ctx, params| {
            let validator = validator.clone();
            async move {
                let sql = required_str(&params, "sql")?;
                let schema_name = str_or(&params, "schema", validator.default_schema());
                let explain = bool_or(&params, "explain", false);

                tracing::debug!(
                    invocation_id = %ctx.invocation_id(),
                    schema = %schema_name,
                    explain,
                    "Validating SQL"
                );

                let report = validator.validate(sql, schema_name, explain).await;
                ToolResponse::from_serializable(&report)
            }
        })
        .build()?;

    Ok(Arc::new(tool))
}
