//! Circular dependency detection for formula cells.
//!
//! A cycle exists when a formula reads itself through a chain of references
//! (e.g., A1 references B1, B1 references C1, C1 references A1). Evaluation
//! reports such cells as `#ERROR!`; this module finds the cycle path for the
//! warning logged alongside it.

use std::collections::HashSet;

use super::{CellRef, DependencyGraph};

/// Detect circular dependencies starting from a cell.
/// Returns Some(cycle_path) if a cycle is found, None otherwise.
/// The path ends with the cell that closes the loop.
///
/// The walk keeps its own stack, so long reference chains cannot overflow
/// the call stack.
pub fn detect_cycle(start: &CellRef, graph: &DependencyGraph) -> Option<Vec<CellRef>> {
    let mut visiting: HashSet<CellRef> = HashSet::from([*start]);
    let mut done: HashSet<CellRef> = HashSet::new();
    let mut path = vec![*start];
    // Precedents still to visit, one entry per cell on `path`.
    let mut pending = vec![unvisited(graph, start)];

    while let Some(next) = pending.last_mut() {
        let Some(cell) = next.pop() else {
            pending.pop();
            if let Some(finished) = path.pop() {
                visiting.remove(&finished);
                done.insert(finished);
            }
            continue;
        };
        if visiting.contains(&cell) {
            path.push(cell);
            return Some(path);
        }
        if done.contains(&cell) {
            continue;
        }
        visiting.insert(cell);
        path.push(cell);
        pending.push(unvisited(graph, &cell));
    }
    None
}

/// Precedents of `cell` in reverse, so popping yields them row-major.
fn unvisited(graph: &DependencyGraph, cell: &CellRef) -> Vec<CellRef> {
    graph.precedents_of(cell).rev().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRID: (usize, usize) = (20, 15);

    fn r(text: &str) -> CellRef {
        CellRef::from_str(text).unwrap()
    }

    #[test]
    fn test_detect_cycle_no_cycle() {
        let mut graph = DependencyGraph::new();
        graph.add_edges("A1 + B1", r("C1"), GRID);
        assert!(detect_cycle(&r("C1"), &graph).is_none());
    }

    #[test]
    fn test_detect_cycle_direct() {
        let mut graph = DependencyGraph::new();
        graph.add_edges("B1", r("A1"), GRID);
        graph.add_edges("A1", r("B1"), GRID);
        assert!(detect_cycle(&r("A1"), &graph).is_some());
        assert!(detect_cycle(&r("B1"), &graph).is_some());
    }

    #[test]
    fn test_detect_cycle_indirect() {
        let mut graph = DependencyGraph::new();
        graph.add_edges("B1", r("A1"), GRID);
        graph.add_edges("C1", r("B1"), GRID);
        graph.add_edges("A1", r("C1"), GRID);
        let path = detect_cycle(&r("A1"), &graph).unwrap();
        assert_eq!(path, vec![r("A1"), r("B1"), r("C1"), r("A1")]);
    }

    #[test]
    fn test_detect_cycle_self_reference() {
        let mut graph = DependencyGraph::new();
        graph.add_edges("A1+1", r("A1"), GRID);
        assert_eq!(detect_cycle(&r("A1"), &graph), Some(vec![r("A1"), r("A1")]));
    }

    #[test]
    fn test_detect_cycle_through_range() {
        let mut graph = DependencyGraph::new();
        graph.add_edges("SUM(A1:A3)", r("A2"), GRID);
        assert!(detect_cycle(&r("A2"), &graph).is_some());
    }

    #[test]
    fn test_detect_cycle_long_chain() {
        let mut graph = DependencyGraph::new();
        for row in 0..50_000 {
            graph.add_dependencies(CellRef::new(row, 0), [CellRef::new(row + 1, 0)]);
        }
        assert!(detect_cycle(&CellRef::new(0, 0), &graph).is_none());

        graph.add_dependencies(CellRef::new(50_000, 0), [CellRef::new(0, 0)]);
        let path = detect_cycle(&CellRef::new(0, 0), &graph).unwrap();
        assert_eq!(path.len(), 50_002);
        assert_eq!(path.last(), Some(&CellRef::new(0, 0)));
    }
}
