//! Relationship graph construction

use crate::classify::classify_junctions;
use crate::types::{ColumnCounts, Edge, ForeignKey, JunctionCandidate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Foreign-key topology of one schema.
///
/// Every foreign key contributes a forward edge under its owning table and a
/// reverse edge under the referenced table, so traversal ignores direction.
/// A graph is never mutated after [`build_graph`] returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipGraph {
    /// Every table touched by a foreign key, sorted
    pub nodes: Vec<String>,
    /// Outgoing edges per table, in foreign-key order
    pub adjacency: BTreeMap<String, Vec<Edge>>,
    pub foreign_keys: Vec<ForeignKey>,
    pub many_to_many: Vec<JunctionCandidate>,
}

/// Builds the graph for an extracted foreign-key list.
///
/// `column_counts` only feeds the junction classifier; tables missing from it
/// are simply not classified.
pub fn build_graph(foreign_keys: Vec<ForeignKey>, column_counts: &ColumnCounts) -> RelationshipGraph {
    let mut adjacency: BTreeMap<String, Vec<Edge>> = BTreeMap::new();
    let mut nodes = BTreeSet::new();

    for fk in &foreign_keys {
        nodes.insert(fk.from_table.clone());
        nodes.insert(fk.to_table.clone());

        adjacency
            .entry(fk.from_table.clone())
            .or_default()
            .push(Edge::forward(fk));
        adjacency
            .entry(fk.to_table.clone())
            .or_default()
            .push(Edge::reverse(fk));
    }

    let many_to_many = classify_junctions(&foreign_keys, |table| column_counts.get(table).copied());

    tracing::debug!(
        tables = nodes.len(),
        foreign_keys = foreign_keys.len(),
        junctions = many_to_many.len(),
        "Built relationship graph"
    );

    RelationshipGraph {
        nodes: nodes.into_iter().collect(),
        adjacency,
        foreign_keys,
        many_to_many,
    }
}

impl RelationshipGraph {
    /// True when the table has at least one edge in either direction
    pub fn contains(&self, table: &str) -> bool {
        self.adjacency.contains_key(table)
    }

    /// Outgoing edges of a table; empty for unknown tables
    pub fn edges(&self, table: &str) -> &[Edge] {
        self.adjacency.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Distinct directly related tables, in edge order
    pub fn neighbors(&self, table: &str) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.edges(table)
            .iter()
            .map(|edge| edge.to_table.as_str())
            .filter(|to| seen.insert(*to))
            .collect()
    }

    /// Junction candidates bridging the given table
    pub fn junctions_for(&self, table: &str) -> Vec<&JunctionCandidate> {
        self.many_to_many
            .iter()
            .filter(|j| j.table1 == table || j.table2 == table)
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }
}
