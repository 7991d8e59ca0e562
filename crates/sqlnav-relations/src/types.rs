//! Records shared by the extractor, graph builder and join synthesizer

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Referential action reported when the catalog gives none
pub const DEFAULT_REFERENTIAL_ACTION: &str = "NO ACTION";

/// Total column count per table, used only for junction classification
pub type ColumnCounts = BTreeMap<String, usize>;

/// One column pair of a foreign-key constraint.
///
/// Multi-column constraints appear as several records sharing
/// `constraint_name`, so the name groups rows but does not identify one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKey {
    pub constraint_name: String,
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    pub on_update: String,
    pub on_delete: String,
}

impl ForeignKey {
    /// Foreign key with `NO ACTION` update and delete rules
    pub fn new(
        constraint_name: impl Into<String>,
        from_table: impl Into<String>,
        from_column: impl Into<String>,
        to_table: impl Into<String>,
        to_column: impl Into<String>,
    ) -> Self {
        Self {
            constraint_name: constraint_name.into(),
            from_table: from_table.into(),
            from_column: from_column.into(),
            to_table: to_table.into(),
            to_column: to_column.into(),
            on_update: DEFAULT_REFERENTIAL_ACTION.to_string(),
            on_delete: DEFAULT_REFERENTIAL_ACTION.to_string(),
        }
    }

    pub fn with_rules(mut self, on_update: impl Into<String>, on_delete: impl Into<String>) -> Self {
        self.on_update = on_update.into();
        self.on_delete = on_delete.into();
        self
    }

    pub fn is_self_referencing(&self) -> bool {
        self.from_table == self.to_table
    }
}

/// A table that looks like a many-to-many bridge between two others
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JunctionCandidate {
    pub junction_table: String,
    pub table1: String,
    pub table1_column: String,
    pub table2: String,
    pub table2_column: String,
    pub junction_column1: String,
    pub junction_column2: String,
}

/// Adjacency entry. Reverse edges walk a foreign key from the referenced side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub to_table: String,
    pub from_column: String,
    pub to_column: String,
    pub constraint_name: String,
    pub is_reverse: bool,
}

impl Edge {
    pub(crate) fn forward(fk: &ForeignKey) -> Self {
        Self {
            to_table: fk.to_table.clone(),
            from_column: fk.from_column.clone(),
            to_column: fk.to_column.clone(),
            constraint_name: fk.constraint_name.clone(),
            is_reverse: false,
        }
    }

    pub(crate) fn reverse(fk: &ForeignKey) -> Self {
        Self {
            to_table: fk.from_table.clone(),
            from_column: fk.to_column.clone(),
            to_column: fk.from_column.clone(),
            constraint_name: fk.constraint_name.clone(),
            is_reverse: true,
        }
    }
}

/// One hop of a join path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinStep {
    pub from_table: String,
    pub to_table: String,
    pub from_column: String,
    pub to_column: String,
    pub constraint_name: String,
    pub is_reverse: bool,
}

impl JoinStep {
    pub(crate) fn along(from_table: &str, edge: &Edge) -> Self {
        Self {
            from_table: from_table.to_string(),
            to_table: edge.to_table.clone(),
            from_column: edge.from_column.clone(),
            to_column: edge.to_column.clone(),
            constraint_name: edge.constraint_name.clone(),
            is_reverse: edge.is_reverse,
        }
    }

    /// `JOIN <to> ON <from>.<col> = <to>.<col>`
    pub fn to_join_clause(&self) -> String {
        format!(
            "JOIN {} ON {}.{} = {}.{}",
            self.to_table, self.from_table, self.from_column, self.to_table, self.to_column
        )
    }

    /// Columns that make two steps render the same JOIN line
    pub(crate) fn dedup_key(&self) -> (String, String, String, String) {
        (
            self.from_table.clone(),
            self.to_table.clone(),
            self.from_column.clone(),
            self.to_column.clone(),
        )
    }
}

/// Ordered hops from a start table to an end table; empty when they are the same table
pub type JoinPath = Vec<JoinStep>;
