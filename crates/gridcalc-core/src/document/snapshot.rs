use super::Document;
use gridcalc_engine::engine::{CellRef, CellType, GridStore, SheetGrid};
use serde::{Deserialize, Serialize};

/// Raw contents and size of a sheet, enough to rebuild it exactly.
/// Computed values are not stored; restoring recomputes them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<(CellRef, CellType)>,
}

impl Document {
    /// Capture the current raw state, e.g. for an undo stack.
    pub fn snapshot(&self) -> Snapshot {
        let (rows, cols) = self.bounds();
        Snapshot {
            rows,
            cols,
            cells: self.grid.occupied(),
        }
    }

    /// Replace the sheet with a snapshot and recompute every formula.
    /// Cells outside the snapshot's bounds are dropped.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        let mut grid = SheetGrid::new(snapshot.rows.max(1), snapshot.cols.max(1));
        for (cell, contents) in &snapshot.cells {
            if grid.in_bounds(cell) {
                grid.set_raw_value(*cell, contents.clone());
            }
        }
        self.grid = grid;
        log::debug!("restored snapshot with {} cells", self.grid.len());
        self.recalculate_all();
        self.modified = true;
    }
}
