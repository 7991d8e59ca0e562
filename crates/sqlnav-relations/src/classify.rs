//! Junction-table heuristic
//!
//! A table is treated as a many-to-many bridge when it owns exactly two
//! foreign-key rows and has at most [`MAX_JUNCTION_COLUMNS`] columns in total
//! (the two key columns plus room for an identity and a timestamp column).
//! This is approximate on purpose: unique constraints are not consulted, and a
//! table with three or more foreign keys is never classified.

use crate::types::{ForeignKey, JunctionCandidate};
use std::collections::BTreeMap;

/// Largest total column count a junction table may have
pub const MAX_JUNCTION_COLUMNS: usize = 4;

/// Flags junction tables among the owners of `foreign_keys`.
///
/// Groups are visited in the order their table first appears in the list, and
/// `table1`/`table2` follow the order of the two rows inside the group. A table
/// whose column count is unknown is not classified.
pub fn classify_junctions<F>(foreign_keys: &[ForeignKey], column_count: F) -> Vec<JunctionCandidate>
where
    F: Fn(&str) -> Option<usize>,
{
    let mut groups: Vec<(&str, Vec<&ForeignKey>)> = Vec::new();
    let mut positions: BTreeMap<&str, usize> = BTreeMap::new();
    for fk in foreign_keys {
        let table = fk.from_table.as_str();
        match positions.get(table) {
            Some(&position) => groups[position].1.push(fk),
            None => {
                positions.insert(table, groups.len());
                groups.push((table, vec![fk]));
            }
        }
    }

    groups
        .into_iter()
        .filter_map(|(table, members)| {
            let [first, second] = members.as_slice() else {
                return None;
            };

            let columns = column_count(table)?;
            if columns > MAX_JUNCTION_COLUMNS {
                tracing::trace!(table, columns, "Two foreign keys but too many columns for a junction");
                return None;
            }

            Some(JunctionCandidate {
                junction_table: table.to_string(),
                table1: first.to_table.clone(),
                table1_column: first.to_column.clone(),
                table2: second.to_table.clone(),
                table2_column: second.to_column.clone(),
                junction_column1: first.from_column.clone(),
                junction_column2: second.from_column.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn bridge(table: &str) -> Vec<ForeignKey> {
        vec![
            ForeignKey::new(format!("{table}_order_fk"), table, "order_id", "orders", "id"),
            ForeignKey::new(format!("{table}_product_fk"), table, "product_id", "products", "id"),
        ]
    }

    #[test]
    fn test_two_keys_four_columns_is_junction() {
        let fks = bridge("order_products");
        let counts = HashMap::from([("order_products", 4)]);

        let junctions = classify_junctions(&fks, |t| counts.get(t).copied());
        assert_eq!(junctions.len(), 1);

        let j = &junctions[0];
        assert_eq!(j.junction_table, "order_products");
        assert_eq!(j.table1, "orders");
        assert_eq!(j.table1_column, "id");
        assert_eq!(j.table2, "products");
        assert_eq!(j.junction_column1, "order_id");
        assert_eq!(j.junction_column2, "product_id");
    }

    #[test]
    fn test_two_keys_five_columns_is_not_junction() {
        let fks = bridge("order_products");
        let junctions = classify_junctions(&fks, |_| Some(5));
        assert!(junctions.is_empty());
    }

    #[test]
    fn test_three_keys_never_junction() {
        let mut fks = bridge("order_products");
        fks.push(ForeignKey::new("op_store_fk", "order_products", "store_id", "stores", "id"));

        for columns in [2, 3, 4, 10] {
            assert!(classify_junctions(&fks, |_| Some(columns)).is_empty());
        }
    }

    #[test]
    fn test_unknown_column_count_is_not_junction() {
        let fks = bridge("order_products");
        assert!(classify_junctions(&fks, |_| None).is_empty());
    }

    #[test]
    fn test_groups_in_first_appearance_order() {
        let mut fks = bridge("z_links");
        fks.extend(bridge("a_links"));

        let junctions = classify_junctions(&fks, |_| Some(3));
        let names: Vec<&str> = junctions.iter().map(|j| j.junction_table.as_str()).collect();
        assert_eq!(names, vec!["z_links", "a_links"]);
    }

    #[test]
    fn test_interleaved_rows_group_by_owner() {
        let z = bridge("z_links");
        let a = bridge("a_links");
        let fks = vec![
            z[0].clone(),
            a[0].clone(),
            ForeignKey::new("m_fk", "m_links", "order_id", "orders", "id"),
            z[1].clone(),
            a[1].clone(),
        ];

        let junctions = classify_junctions(&fks, |_| Some(2));
        let names: Vec<&str> = junctions.iter().map(|j| j.junction_table.as_str()).collect();
        assert_eq!(names, vec!["z_links", "a_links"]);
        assert_eq!(junctions[0].table1, "orders");
        assert_eq!(junctions[0].table2, "products");
    }
}
