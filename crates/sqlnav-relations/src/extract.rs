//! Normalizes catalog foreign-key rows into extraction order

use crate::types::ForeignKey;
use std::collections::BTreeMap;

/// Orders foreign keys by `(from_table, constraint_name)`.
///
/// The sort is stable, so the column pairs of a multi-column constraint keep
/// the order the catalog reported them in. Nothing is filtered out:
/// self-referencing keys stay in the list.
pub fn extract_foreign_keys(mut rows: Vec<ForeignKey>) -> Vec<ForeignKey> {
    rows.sort_by(|a, b| {
        a.from_table
            .cmp(&b.from_table)
            .then_with(|| a.constraint_name.cmp(&b.constraint_name))
    });

    tracing::debug!(foreign_keys = rows.len(), "Extracted foreign keys");
    rows
}

/// Tables owning exactly two foreign-key rows, the only ones whose column
/// count the junction classifier needs.
pub fn tables_with_two_keys(foreign_keys: &[ForeignKey]) -> Vec<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for fk in foreign_keys {
        *counts.entry(fk.from_table.as_str()).or_default() += 1;
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count == 2)
        .map(|(table, _)| table.to_string())
        .collect()
}
