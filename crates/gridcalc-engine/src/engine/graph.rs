//! Dependency graph between cells.
//!
//! Tracks both directions of every edge:
//! - dependents: cell -> cells whose formulas read it ("this cell affects those")
//! - precedents: cell -> cells its own formula reads
//!
//! Edge `A -> B` exists iff B's formula references A directly or through a
//! range containing A. Keeping the precedents side means a cell's outgoing
//! edges can be dropped exactly when its formula changes, so stale fan-out
//! never accumulates. Cycles are allowed in the graph; traversals guard
//! against them with visited sets.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use super::cell_ref::CellRef;
use super::deps::extract_dependencies;

#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    dependents: HashMap<CellRef, BTreeSet<CellRef>>,
    precedents: HashMap<CellRef, BTreeSet<CellRef>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `dependent` reads every reference (and range member) in
    /// `formula` that lies inside a grid of `bounds`. Idempotent.
    ///
    /// Edges depend on the grid size; callers rebuild them after a resize.
    pub fn add_edges(&mut self, formula: &str, dependent: CellRef, bounds: (usize, usize)) {
        self.add_dependencies(dependent, extract_dependencies(formula, bounds));
    }

    /// Record that `dependent` reads each of `precedents`.
    pub fn add_dependencies(
        &mut self,
        dependent: CellRef,
        precedents: impl IntoIterator<Item = CellRef>,
    ) {
        for precedent in precedents {
            self.dependents
                .entry(precedent)
                .or_default()
                .insert(dependent);
            self.precedents
                .entry(dependent)
                .or_default()
                .insert(precedent);
        }
    }

    /// Drop every edge recorded for `dependent`'s formula.
    pub fn remove_edges(&mut self, dependent: &CellRef) {
        let Some(old) = self.precedents.remove(dependent) else {
            return;
        };
        for precedent in old {
            if let Some(set) = self.dependents.get_mut(&precedent) {
                set.remove(dependent);
                if set.is_empty() {
                    self.dependents.remove(&precedent);
                }
            }
        }
    }

    /// Replace `dependent`'s edges with those of `formula`.
    pub fn set_formula(&mut self, formula: &str, dependent: CellRef, bounds: (usize, usize)) {
        self.remove_edges(&dependent);
        self.add_edges(formula, dependent, bounds);
    }

    /// Cells that directly read `cell`, row-major.
    pub fn dependents_of(&self, cell: &CellRef) -> impl DoubleEndedIterator<Item = &CellRef> {
        self.dependents.get(cell).into_iter().flatten()
    }

    /// Cells that `cell`'s formula directly reads, row-major.
    pub fn precedents_of(&self, cell: &CellRef) -> impl DoubleEndedIterator<Item = &CellRef> {
        self.precedents.get(cell).into_iter().flatten()
    }

    pub fn has_dependent(&self, cell: &CellRef, dependent: &CellRef) -> bool {
        self.dependents
            .get(cell)
            .is_some_and(|set| set.contains(dependent))
    }

    /// Every cell that must be recomputed when `cell` changes, in depth-first
    /// discovery order. Each cell appears once; `cell` itself is never listed.
    pub fn get_transitive_dependents(&self, cell: &CellRef) -> Vec<CellRef> {
        let mut visited: HashSet<CellRef> = HashSet::from([*cell]);
        let mut order = Vec::new();
        let mut stack: Vec<CellRef> = self.dependents_of(cell).rev().copied().collect();

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            order.push(current);
            for next in self.dependents_of(&current).rev() {
                if !visited.contains(next) {
                    stack.push(*next);
                }
            }
        }

        order
    }

    /// The transitive dependents of `cell`, ordered so each cell comes after
    /// every cell it reads within the set. Cells caught in a cycle cannot be
    /// ordered and are appended in discovery order.
    pub fn recalc_order(&self, cell: &CellRef) -> Vec<CellRef> {
        let discovered = self.get_transitive_dependents(cell);
        let members: HashSet<CellRef> = discovered.iter().copied().collect();

        let mut in_degree: HashMap<CellRef, usize> = discovered
            .iter()
            .map(|c| {
                let count = self
                    .precedents_of(c)
                    .filter(|p| members.contains(*p))
                    .count();
                (*c, count)
            })
            .collect();

        let mut ready: VecDeque<CellRef> = discovered
            .iter()
            .filter(|c| in_degree[*c] == 0)
            .copied()
            .collect();
        let mut order = Vec::with_capacity(discovered.len());
        let mut placed: HashSet<CellRef> = HashSet::new();

        while let Some(current) = ready.pop_front() {
            order.push(current);
            placed.insert(current);
            for next in self.dependents_of(&current) {
                if let Some(degree) = in_degree.get_mut(next) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push_back(*next);
                    }
                }
            }
        }

        if order.len() < discovered.len() {
            order.extend(discovered.into_iter().filter(|c| !placed.contains(c)));
        }
        order
    }

    /// Whether `reader`'s formula reads `target`, directly or through other formulas.
    pub fn reads_transitively(&self, reader: &CellRef, target: &CellRef) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![*reader];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            for precedent in self.precedents_of(&current) {
                if precedent == target {
                    return true;
                }
                stack.push(*precedent);
            }
        }
        false
    }

    /// Number of cells with at least one dependent.
    pub fn len(&self) -> usize {
        self.dependents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }

    pub fn clear(&mut self) {
        self.dependents.clear();
        self.precedents.clear();
    }
}
