use crate::error::{GridcalcError, Result};
use gridcalc_engine::builtins::FunctionRegistry;
use gridcalc_engine::engine::{
    CellRange, CellRef, CellType, DependencyGraph, GridStore, SheetGrid, Value, evaluate_formula,
};
use serde::Serialize;
use std::path::PathBuf;

/// Default grid height for new documents.
pub const DEFAULT_ROWS: usize = 20;
/// Default grid width for new documents.
pub const DEFAULT_COLS: usize = 15;

/// One cell as returned by range queries.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CellSnapshot {
    pub cell: CellRef,
    pub raw: CellType,
    /// Computed value of a formula cell; `None` for literals and stale formulas.
    pub display: Option<Value>,
}

/// A spreadsheet: cells, the dependency graph between them, and the
/// functions formulas may call.
///
/// Every mutating entry point takes `&mut self` and finishes its
/// recalculation before returning, so edits are applied one at a time.
pub struct Document {
    pub grid: SheetGrid,
    pub graph: DependencyGraph,
    pub registry: FunctionRegistry,
    /// Current file path
    pub file_path: Option<PathBuf>,
    /// Whether the grid has been modified since it was loaded or saved
    pub modified: bool,
    /// Bulk loads never shrink the grid below this size.
    pub(crate) min_bounds: (usize, usize),
}

impl Document {
    /// Create an empty document with the default 20x15 grid.
    ///
    /// This constructor is side-effect free: it does not touch the filesystem.
    pub fn new() -> Self {
        Self::with_size(DEFAULT_ROWS, DEFAULT_COLS)
    }

    /// Create an empty document with the given grid size.
    pub fn with_size(rows: usize, cols: usize) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        Document {
            grid: SheetGrid::new(rows, cols),
            graph: DependencyGraph::new(),
            registry: FunctionRegistry::new(),
            file_path: None,
            modified: false,
            min_bounds: (rows, cols),
        }
    }

    /// Grid size as `(rows, cols)`.
    pub fn bounds(&self) -> (usize, usize) {
        self.grid.bounds()
    }

    pub(crate) fn check_bounds(&self, cell: &CellRef) -> Result<()> {
        if self.grid.in_bounds(cell) {
            return Ok(());
        }
        let (rows, cols) = self.bounds();
        Err(GridcalcError::OutOfBounds {
            cell: cell.to_string(),
            rows,
            cols,
        })
    }

    /// Raw contents of a cell as the user would edit them (formulas keep `=`).
    pub fn raw_text(&self, cell: &CellRef) -> String {
        self.grid.raw_value(cell).to_input_string()
    }

    /// The value a cell shows: the computed value of a formula, or the
    /// literal itself.
    pub fn display_value(&self, cell: &CellRef) -> Value {
        match self.grid.raw_value(cell) {
            CellType::Formula(_) => self.grid.display_value(cell).unwrap_or(Value::Empty),
            other => other.literal_value().unwrap_or(Value::Empty),
        }
    }

    /// Display text for a cell: the formatted result of a formula, or the
    /// literal as entered.
    pub fn display_text(&self, cell: &CellRef) -> String {
        self.display_value(cell).to_string()
    }

    /// Every cell of `range`, row-major, with raw and computed values.
    /// Cells outside the grid are skipped.
    pub fn get_cells_in_range(&self, range: &CellRange) -> Vec<CellSnapshot> {
        range
            .iter()
            .filter(|cell| self.grid.in_bounds(cell))
            .map(|cell| CellSnapshot {
                cell,
                raw: self.grid.raw_value(&cell),
                display: self.grid.display_value(&cell),
            })
            .collect()
    }

    /// Evaluate a formula against the current sheet without storing it.
    ///
    /// The formula is evaluated as if it lived just outside the grid, so it
    /// can read every cell and can never be part of a cycle.
    pub fn evaluate_adhoc(&self, formula: &str) -> Value {
        let (rows, cols) = self.bounds();
        self.evaluate_at(formula, CellRef::new(rows, cols))
    }

    pub(crate) fn evaluate_at(&self, formula: &str, cell: CellRef) -> Value {
        evaluate_formula(formula, cell, &self.grid, &self.graph, &self.registry)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
