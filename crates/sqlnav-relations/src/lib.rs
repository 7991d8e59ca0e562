//! Relationship graph engine
//!
//! Builds a direction-agnostic graph from a schema's foreign keys, flags
//! junction tables, finds fewest-hop join paths and renders JOIN SQL that
//! connects any set of tables.
//!
//! Everything here is synchronous and pure: callers hand in a fully fetched
//! foreign-key list and get back immutable values.
//!
//! ```
//! use sqlnav_relations::{ColumnCounts, ForeignKey, build_graph, suggest_pairwise};
//!
//! let fks = vec![
//!     ForeignKey::new("orders_customer_fk", "orders", "customer_id", "customers", "id"),
//!     ForeignKey::new("items_order_fk", "order_items", "order_id", "orders", "id"),
//! ];
//! let graph = build_graph(fks, &ColumnCounts::new());
//!
//! let suggestion = suggest_pairwise(&graph, "order_items", "customers");
//! assert!(suggestion.found);
//! assert_eq!(suggestion.path.unwrap().len(), 2);
//! ```

pub mod classify;
pub mod extract;
pub mod graph;
pub mod join;
pub mod path;
pub mod types;

pub use classify::{MAX_JUNCTION_COLUMNS, classify_junctions};
pub use extract::{extract_foreign_keys, tables_with_two_keys};
pub use graph::{RelationshipGraph, build_graph};
pub use join::{
    JoinFailure, JoinSuggestion, MultiJoinResult, render_join_lines, suggest_pairwise,
    synthesize_multi,
};
pub use path::find_path;
pub use types::{ColumnCounts, Edge, ForeignKey, JoinPath, JoinStep, JunctionCandidate};
