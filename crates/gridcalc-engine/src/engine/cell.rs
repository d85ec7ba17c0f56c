//! Cell data structures for the spreadsheet grid.
//!
//! This module provides the core data types for representing cells:
//! - [`CellType`] - The raw content of a cell (empty, text, number, or formula)
//! - [`Cell`] - Raw content plus the last computed display value
//! - [`GridStore`] - The accessor the evaluator reads cells through
//! - [`SheetGrid`] - Bounded sparse storage for cells (backed by `DashMap`)

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::cell_ref::{CellRange, CellRef};
use super::value::{Value, parse_number};

/// The raw content stored in a cell, as entered by the user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CellType {
    Empty,
    Text(String),
    Number(f64),
    /// Formula body, stored without the leading '='.
    Formula(String),
}

impl CellType {
    /// Parse user input into a raw cell value.
    /// - Empty string or whitespace -> Empty
    /// - Starts with '=' -> Formula (without the '=')
    /// - Quoted string -> Text (without quotes)
    /// - Number with a leading zero like "007" -> Text
    /// - Valid number -> Number
    /// - Otherwise -> Text
    pub fn from_input(input: &str) -> CellType {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return CellType::Empty;
        }

        if let Some(formula) = trimmed.strip_prefix('=') {
            return CellType::Formula(formula.trim().to_string());
        }

        if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
            return CellType::Text(trimmed[1..trimmed.len() - 1].to_string());
        }

        if trimmed.starts_with('0')
            && trimmed.len() > 1
            && trimmed.as_bytes()[1].is_ascii_digit()
        {
            return CellType::Text(trimmed.to_string());
        }

        match parse_number(trimmed) {
            Some(n) => CellType::Number(n),
            None => CellType::Text(trimmed.to_string()),
        }
    }

    /// Text suitable for an edit box (formulas keep their '=').
    ///
    /// Feeding the result back through [`CellType::from_input`] gives the same
    /// value: text that would read as a number, a formula or blank is quoted.
    pub fn to_input_string(&self) -> String {
        match self {
            CellType::Empty => String::new(),
            CellType::Text(s) => match CellType::from_input(s) {
                CellType::Text(parsed) if parsed == *s => s.clone(),
                _ => format!("\"{}\"", s),
            },
            CellType::Number(n) => Value::Number(*n).to_string(),
            CellType::Formula(s) => format!("={}", s),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellType::Empty)
    }

    pub fn formula(&self) -> Option<&str> {
        match self {
            CellType::Formula(f) => Some(f),
            _ => None,
        }
    }

    /// The value a non-formula cell contributes to formulas that read it.
    /// Formula cells have no literal value; their display value is used instead.
    pub fn literal_value(&self) -> Option<Value> {
        match self {
            CellType::Empty => Some(Value::Empty),
            CellType::Text(s) => Some(Value::Text(s.clone())),
            CellType::Number(n) => Some(Value::Number(*n)),
            CellType::Formula(_) => None,
        }
    }
}

/// A cell in the spreadsheet grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub contents: CellType,
    /// Last computed value of a formula cell. `None` until evaluated.
    pub display: Option<Value>,
}

impl Cell {
    pub fn new(contents: CellType) -> Cell {
        Cell {
            contents,
            display: None,
        }
    }

    pub fn new_empty() -> Cell {
        Cell::new(CellType::Empty)
    }
}

/// Accessor for the cell store the engine evaluates against.
///
/// Raw values are authoritative; display values are derived and written back
/// by the recalculation scheduler.
pub trait GridStore {
    fn raw_value(&self, cell: &CellRef) -> CellType;
    fn set_raw_value(&mut self, cell: CellRef, value: CellType);
    fn display_value(&self, cell: &CellRef) -> Option<Value>;
    fn set_display_value(&mut self, cell: CellRef, value: Option<Value>);
    /// Grid size as `(rows, cols)`.
    fn bounds(&self) -> (usize, usize);

    fn in_bounds(&self, cell: &CellRef) -> bool {
        let (rows, cols) = self.bounds();
        cell.row < rows && cell.col < cols
    }
}

/// Sparse cell storage.
pub type Grid = DashMap<CellRef, Cell>;

/// A bounded sheet: sparse cells plus the row/column extent formulas may address.
#[derive(Debug)]
pub struct SheetGrid {
    cells: Grid,
    rows: usize,
    cols: usize,
}

impl SheetGrid {
    pub fn new(rows: usize, cols: usize) -> SheetGrid {
        SheetGrid {
            cells: Grid::new(),
            rows,
            cols,
        }
    }

    /// Build a grid from rows of raw input strings. Empty strings stay unstored.
    pub fn from_rows(rows: &[Vec<String>], min_rows: usize, min_cols: usize) -> SheetGrid {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let grid = SheetGrid::new(rows.len().max(min_rows), width.max(min_cols));
        for (r, row) in rows.iter().enumerate() {
            for (c, input) in row.iter().enumerate() {
                let contents = CellType::from_input(input);
                if !contents.is_empty() {
                    grid.cells.insert(CellRef::new(r, c), Cell::new(contents));
                }
            }
        }
        grid
    }

    pub fn resize(&mut self, rows: usize, cols: usize) {
        self.rows = rows;
        self.cols = cols;
        self.cells
            .retain(|cell_ref, _| cell_ref.row < rows && cell_ref.col < cols);
    }

    /// Remove every cell, keeping the bounds.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Forget every computed value.
    pub fn clear_display_values(&mut self) {
        for mut entry in self.cells.iter_mut() {
            entry.display = None;
        }
    }

    /// Formula cells in row-major order.
    pub fn formula_cells(&self) -> Vec<(CellRef, String)> {
        let mut formulas: Vec<(CellRef, String)> = self
            .cells
            .iter()
            .filter_map(|entry| {
                entry
                    .contents
                    .formula()
                    .map(|f| (*entry.key(), f.to_string()))
            })
            .collect();
        formulas.sort_by_key(|(cell_ref, _)| *cell_ref);
        formulas
    }

    /// Occupied cells in row-major order.
    pub fn occupied(&self) -> Vec<(CellRef, CellType)> {
        let mut cells: Vec<(CellRef, CellType)> = self
            .cells
            .iter()
            .map(|entry| (*entry.key(), entry.contents.clone()))
            .collect();
        cells.sort_by_key(|(cell_ref, _)| *cell_ref);
        cells
    }

    /// Smallest range anchored at A1 that covers every occupied cell.
    pub fn used_range(&self) -> Option<CellRange> {
        let mut max: Option<CellRef> = None;
        for entry in self.cells.iter() {
            let key = entry.key();
            let current = max.get_or_insert(*key);
            current.row = current.row.max(key.row);
            current.col = current.col.max(key.col);
        }
        max.map(|end| CellRange::new(CellRef::new(0, 0), end))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl GridStore for SheetGrid {
    fn raw_value(&self, cell: &CellRef) -> CellType {
        self.cells
            .get(cell)
            .map(|entry| entry.contents.clone())
            .unwrap_or(CellType::Empty)
    }

    fn set_raw_value(&mut self, cell: CellRef, value: CellType) {
        if value.is_empty() {
            self.cells.remove(&cell);
            return;
        }
        self.cells.entry(cell).or_insert_with(Cell::new_empty).contents = value;
    }

    fn display_value(&self, cell: &CellRef) -> Option<Value> {
        self.cells.get(cell).and_then(|entry| entry.display.clone())
    }

    fn set_display_value(&mut self, cell: CellRef, value: Option<Value>) {
        if let Some(mut entry) = self.cells.get_mut(&cell) {
            entry.display = value;
        }
    }

    fn bounds(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_input() {
        assert_eq!(CellType::from_input("   "), CellType::Empty);
        assert_eq!(
            CellType::from_input("= A1 + 1 "),
            CellType::Formula("A1 + 1".to_string())
        );
        assert_eq!(CellType::from_input("3.5"), CellType::Number(3.5));
        assert_eq!(CellType::from_input("\"12\""), CellType::Text("12".to_string()));
        assert_eq!(CellType::from_input("007"), CellType::Text("007".to_string()));
        assert_eq!(CellType::from_input("0.5"), CellType::Number(0.5));
        assert_eq!(CellType::from_input("hello"), CellType::Text("hello".to_string()));
    }

    #[test]
    fn test_to_input_string() {
        assert_eq!(CellType::Formula("A1*2".into()).to_input_string(), "=A1*2");
        assert_eq!(CellType::Number(4.0).to_input_string(), "4");
        assert_eq!(CellType::Empty.to_input_string(), "");
        assert_eq!(CellType::Text("note".into()).to_input_string(), "note");
    }

    #[test]
    fn test_to_input_string_quotes_ambiguous_text() {
        for text in ["=B1", "12", "  padded ", "", "\"quoted\"", "007", "a\nb"] {
            let contents = CellType::Text(text.to_string());
            assert_eq!(CellType::from_input(&contents.to_input_string()), contents, "{:?}", text);
        }
        assert_eq!(CellType::Text("=B1".into()).to_input_string(), "\"=B1\"");
        assert_eq!(CellType::Text("007".into()).to_input_string(), "007");
    }

    #[test]
    fn test_empty_raw_value_removes_cell() {
        let mut grid = SheetGrid::new(5, 5);
        let a1 = CellRef::new(0, 0);
        grid.set_raw_value(a1, CellType::Number(1.0));
        assert_eq!(grid.len(), 1);
        grid.set_raw_value(a1, CellType::Empty);
        assert!(grid.is_empty());
        assert_eq!(grid.raw_value(&a1), CellType::Empty);
    }

    #[test]
    fn test_display_value_requires_cell() {
        let mut grid = SheetGrid::new(5, 5);
        let b2 = CellRef::new(1, 1);
        grid.set_display_value(b2, Some(Value::Number(1.0)));
        assert_eq!(grid.display_value(&b2), None);

        grid.set_raw_value(b2, CellType::Formula("1".into()));
        grid.set_display_value(b2, Some(Value::Number(1.0)));
        assert_eq!(grid.display_value(&b2), Some(Value::Number(1.0)));
    }

    #[test]
    fn test_from_rows_grows_to_fit() {
        let rows = vec![
            vec!["1".to_string(), "".to_string(), "=A1".to_string()],
            vec!["x".to_string()],
        ];
        let grid = SheetGrid::from_rows(&rows, 1, 1);
        assert_eq!(grid.bounds(), (2, 3));
        assert_eq!(grid.len(), 3);
        assert_eq!(grid.formula_cells(), vec![(CellRef::new(0, 2), "A1".to_string())]);

        let grid = SheetGrid::from_rows(&rows, 20, 15);
        assert_eq!(grid.bounds(), (20, 15));
    }

    #[test]
    fn test_resize_drops_cells_outside() {
        let mut grid = SheetGrid::new(3, 3);
        grid.set_raw_value(CellRef::new(2, 2), CellType::Number(1.0));
        grid.set_raw_value(CellRef::new(0, 0), CellType::Number(2.0));
        grid.resize(2, 2);
        assert_eq!(grid.len(), 1);
        assert!(!grid.in_bounds(&CellRef::new(2, 0)));
    }

    #[test]
    fn test_used_range() {
        let mut grid = SheetGrid::new(10, 10);
        assert_eq!(grid.used_range(), None);
        grid.set_raw_value(CellRef::new(3, 1), CellType::Number(1.0));
        grid.set_raw_value(CellRef::new(0, 4), CellType::Number(1.0));
        assert_eq!(grid.used_range().unwrap().to_string(), "A1:E4");
    }
}
