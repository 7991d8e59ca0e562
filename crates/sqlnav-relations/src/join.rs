//! JOIN synthesis over the relationship graph

use crate::graph::RelationshipGraph;
use crate::path::find_path;
use crate::types::{JoinPath, JoinStep};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Why a join could not be produced. These are reported in results, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JoinFailure {
    #[error("No foreign key relationship found between '{from}' and '{to}'")]
    NotFound { from: String, to: String },

    #[error("Need at least 2 tables to generate JOIN (got {requested})")]
    InsufficientInput { requested: usize },

    #[error("Cannot find path from {base} to {target}")]
    UnreachableTarget { base: String, target: String },
}

/// Result of joining two tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSuggestion {
    pub found: bool,
    /// `None` when no path exists; empty when both tables are the same
    pub path: Option<JoinPath>,
    pub sql: Option<String>,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<JoinFailure>,
}

/// Result of joining an ordered list of tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiJoinResult {
    pub found: bool,
    pub sql: Option<String>,
    pub explanation: String,
    /// Deduplicated steps on success; the steps gathered before failing otherwise
    pub joins: Vec<JoinStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<JoinFailure>,
}

impl JoinSuggestion {
    fn failed(failure: JoinFailure) -> Self {
        Self {
            found: false,
            path: None,
            sql: None,
            explanation: failure.to_string(),
            failure: Some(failure),
        }
    }
}

impl MultiJoinResult {
    fn failed(failure: JoinFailure, joins: Vec<JoinStep>) -> Self {
        Self {
            found: false,
            sql: None,
            explanation: failure.to_string(),
            joins,
            failure: Some(failure),
        }
    }
}

/// Suggests the JOIN connecting two tables along their shortest path.
///
/// SQL is `FROM <first table>` followed by one `JOIN` line per step. Each line
/// only references tables introduced above it, since every step starts at a
/// table the search already reached.
pub fn suggest_pairwise(graph: &RelationshipGraph, table1: &str, table2: &str) -> JoinSuggestion {
    let Some(path) = find_path(graph, table1, table2) else {
        return JoinSuggestion::failed(JoinFailure::NotFound {
            from: table1.to_string(),
            to: table2.to_string(),
        });
    };

    let base = path.first().map_or(table1, |step| step.from_table.as_str());
    let mut lines = vec![format!("FROM {}", base)];
    lines.extend(render_join_lines(&path));

    let explanation = match path.as_slice() {
        [] => format!("'{}' and '{}' are the same table; no join needed", table1, table2),
        [step] => format!(
            "Direct relationship: {}.{} → {}.{}",
            step.from_table, step.from_column, step.to_table, step.to_column
        ),
        steps => {
            let mut tables: Vec<&str> = steps.iter().map(|s| s.from_table.as_str()).collect();
            tables.push(&steps[steps.len() - 1].to_table);
            format!(
                "Path through {} relationships: {}",
                steps.len(),
                tables.join(" → ")
            )
        }
    };

    JoinSuggestion {
        found: true,
        path: Some(path),
        sql: Some(lines.join("\n")),
        explanation,
        failure: None,
    }
}

/// Synthesizes one query joining every table in `tables`.
///
/// `tables[0]` is the base. Each later table is connected from the first
/// already-joined table (in the order tables joined) that has a path to it,
/// and every table on that path joins the set, including ones the caller did
/// not ask for. Targets already joined need no new steps. An unreachable
/// target fails the whole request; no SQL omitting a table is ever returned.
///
/// Repeated steps, compared on `(from_table, to_table, from_column, to_column)`,
/// are emitted once at their first position.
pub fn synthesize_multi(graph: &RelationshipGraph, tables: &[String], select_all: bool) -> MultiJoinResult {
    if tables.len() < 2 {
        return MultiJoinResult::failed(
            JoinFailure::InsufficientInput {
                requested: tables.len(),
            },
            Vec::new(),
        );
    }

    let base = tables[0].as_str();
    let mut joined: Vec<String> = vec![base.to_string()];
    let mut accumulated: Vec<JoinStep> = Vec::new();

    for target in &tables[1..] {
        if joined.contains(target) {
            continue;
        }

        let path = joined
            .iter()
            .find_map(|from| find_path(graph, from, target));

        let Some(path) = path else {
            tracing::debug!(base, target = %target, "Join target unreachable from joined tables");
            return MultiJoinResult::failed(
                JoinFailure::UnreachableTarget {
                    base: base.to_string(),
                    target: target.clone(),
                },
                accumulated,
            );
        };

        for step in &path {
            if !joined.contains(&step.to_table) {
                joined.push(step.to_table.clone());
            }
        }
        accumulated.extend(path);
    }

    let joins = dedup_steps(accumulated);

    let select_clause = if select_all {
        "SELECT *".to_string()
    } else {
        let columns: Vec<String> = tables.iter().map(|t| format!("{}.*", t)).collect();
        format!("SELECT\n    {}", columns.join(",\n    "))
    };

    let mut lines = vec![select_clause, format!("FROM {}", base)];
    lines.extend(render_join_lines(&joins));

    MultiJoinResult {
        found: true,
        sql: Some(lines.join("\n")),
        explanation: format!(
            "Generated JOIN connecting {} tables using {} relationships",
            tables.len(),
            joins.len()
        ),
        joins,
        failure: None,
    }
}

/// One `JOIN ... ON ...` line per step, in order
pub fn render_join_lines(steps: &[JoinStep]) -> Vec<String> {
    steps.iter().map(JoinStep::to_join_clause).collect()
}

fn dedup_steps(steps: Vec<JoinStep>) -> Vec<JoinStep> {
    let mut seen = HashSet::new();
    steps
        .into_iter()
        .filter(|step| seen.insert(step.dedup_key()))
        .collect()
}
