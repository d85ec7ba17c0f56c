use super::Document;
use crate::error::{GridcalcError, Result};
use gridcalc_engine::engine::{
    CellRef, CellType, GridStore, ShiftOperation, shift_formula_references,
};

/// Dimension for row/column operations
#[derive(Copy, Clone, Debug)]
enum Dimension {
    Row,
    Column,
}

impl Dimension {
    fn name(&self) -> &'static str {
        match self {
            Dimension::Row => "row",
            Dimension::Column => "column",
        }
    }

    /// Current extent of the grid along this dimension
    fn len(&self, bounds: (usize, usize)) -> usize {
        match self {
            Dimension::Row => bounds.0,
            Dimension::Column => bounds.1,
        }
    }

    fn insert(&self, at: usize) -> ShiftOperation {
        match self {
            Dimension::Row => ShiftOperation::InsertRow(at),
            Dimension::Column => ShiftOperation::InsertColumn(at),
        }
    }

    fn delete(&self, at: usize) -> ShiftOperation {
        match self {
            Dimension::Row => ShiftOperation::DeleteRow(at),
            Dimension::Column => ShiftOperation::DeleteColumn(at),
        }
    }

    /// Bounds after growing (+1) or shrinking (-1) along this dimension
    fn resized(&self, (rows, cols): (usize, usize), grow: bool) -> (usize, usize) {
        let step = |n: usize| if grow { n + 1 } else { n - 1 };
        match self {
            Dimension::Row => (step(rows), cols),
            Dimension::Column => (rows, step(cols)),
        }
    }
}

impl Document {
    /// Apply a user edit: store the parsed raw value, then recalculate the
    /// cell and everything that depends on it.
    pub fn on_cell_edit(&mut self, cell: CellRef, raw_text: &str) -> Result<()> {
        self.check_bounds(&cell)?;
        let contents = CellType::from_input(raw_text);
        log::debug!("edit {} <- {:?}", cell, contents);
        self.grid.set_raw_value(cell, contents);
        self.modified = true;
        self.recalculate_from(cell);
        Ok(())
    }

    /// Set cell contents from input string.
    pub fn set_cell(&mut self, cell: CellRef, input: &str) -> Result<()> {
        self.on_cell_edit(cell, input)
    }

    /// Clear the specified cell: its raw value, computed value and
    /// outgoing dependency edges.
    pub fn clear_cell(&mut self, cell: &CellRef) -> Result<()> {
        self.on_cell_edit(*cell, "")
    }

    /// Insert an empty row before `at` (`at == rows` appends).
    pub fn insert_row(&mut self, at: usize) -> Result<()> {
        self.insert_dimension(Dimension::Row, at)
    }

    /// Insert an empty column before `at` (`at == cols` appends).
    pub fn insert_column(&mut self, at: usize) -> Result<()> {
        self.insert_dimension(Dimension::Column, at)
    }

    /// Delete row `at`. References to it become `#REF!`.
    pub fn delete_row(&mut self, at: usize) -> Result<()> {
        self.delete_dimension(Dimension::Row, at)
    }

    /// Delete column `at`. References to it become `#REF!`.
    pub fn delete_column(&mut self, at: usize) -> Result<()> {
        self.delete_dimension(Dimension::Column, at)
    }

    /// Generic insert operation for row or column
    fn insert_dimension(&mut self, dim: Dimension, at: usize) -> Result<()> {
        let bounds = self.bounds();
        let len = dim.len(bounds);
        if at > len {
            return Err(GridcalcError::IndexOutOfRange {
                what: dim.name(),
                index: at,
                len,
            });
        }
        self.restructure(dim.insert(at), dim.resized(bounds, true));
        log::debug!("inserted {} {}", dim.name(), at);
        Ok(())
    }

    /// Generic delete operation for row or column
    fn delete_dimension(&mut self, dim: Dimension, at: usize) -> Result<()> {
        let bounds = self.bounds();
        let len = dim.len(bounds);
        if at >= len {
            return Err(GridcalcError::IndexOutOfRange {
                what: dim.name(),
                index: at,
                len,
            });
        }
        if len == 1 {
            return Err(GridcalcError::LastDimension(dim.name()));
        }
        self.restructure(dim.delete(at), dim.resized(bounds, false));
        log::debug!("deleted {} {}", dim.name(), at);
        Ok(())
    }

    /// Move every cell and rewrite every formula for `op`, resize the grid,
    /// then recompute the whole sheet.
    fn restructure(&mut self, op: ShiftOperation, (rows, cols): (usize, usize)) {
        let cells = self.grid.occupied();
        self.grid.clear();
        self.grid.resize(rows, cols);

        for (cell, contents) in cells {
            let Some(target) = op.apply(cell) else {
                continue;
            };
            let contents = match contents {
                CellType::Formula(formula) => {
                    CellType::Formula(shift_formula_references(&formula, op))
                }
                other => other,
            };
            self.grid.set_raw_value(target, contents);
        }

        self.modified = true;
        self.recalculate_all();
    }
}
