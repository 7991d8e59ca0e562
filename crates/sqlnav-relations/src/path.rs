//! Fewest-hop join paths

use crate::graph::RelationshipGraph;
use crate::types::{JoinPath, JoinStep};
use std::collections::{HashSet, VecDeque};

/// Finds the shortest join path from `start` to `end`.
///
/// Identical endpoints yield an empty path ("no join needed"). A table with no
/// edges in either direction, or one in a disjoint component, yields `None`.
///
/// The search is breadth-first with an explicit queue, so the first path that
/// reaches `end` has the fewest edges; among equally short paths the one using
/// earlier adjacency entries wins.
pub fn find_path(graph: &RelationshipGraph, start: &str, end: &str) -> Option<JoinPath> {
    if start == end {
        return Some(Vec::new());
    }
    if !graph.contains(start) || !graph.contains(end) {
        return None;
    }

    let mut visited: HashSet<&str> = HashSet::from([start]);
    let mut queue: VecDeque<(&str, JoinPath)> = VecDeque::from([(start, Vec::new())]);

    while let Some((current, path)) = queue.pop_front() {
        for edge in graph.edges(current) {
            let next = edge.to_table.as_str();
            if visited.contains(next) {
                continue;
            }

            let mut extended = path.clone();
            extended.push(JoinStep::along(current, edge));

            if next == end {
                tracing::trace!(start, end, hops = extended.len(), "Found join path");
                return Some(extended);
            }

            visited.insert(next);
            queue.push_back((next, extended));
        }
    }

    tracing::trace!(start, end, "No join path");
    None
}
