//! Reference rewriting for row and column insertion/deletion.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use super::cell_ref::{CellRange, CellRef};
use super::deps::strip_string_literals;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftOperation {
    InsertRow(usize),
    DeleteRow(usize),
    InsertColumn(usize),
    DeleteColumn(usize),
}

impl ShiftOperation {
    /// Where `cell` lands after the operation, or None if it was deleted.
    pub fn apply(&self, cell: CellRef) -> Option<CellRef> {
        match *self {
            ShiftOperation::InsertRow(at) if cell.row >= at => {
                Some(CellRef::new(cell.row + 1, cell.col))
            }
            ShiftOperation::DeleteRow(at) if cell.row == at => None,
            ShiftOperation::DeleteRow(at) if cell.row > at => {
                Some(CellRef::new(cell.row - 1, cell.col))
            }
            ShiftOperation::InsertColumn(at) if cell.col >= at => {
                Some(CellRef::new(cell.row, cell.col + 1))
            }
            ShiftOperation::DeleteColumn(at) if cell.col == at => None,
            ShiftOperation::DeleteColumn(at) if cell.col > at => {
                Some(CellRef::new(cell.row, cell.col - 1))
            }
            _ => Some(cell),
        }
    }

    /// New corners of a range. Deleting a line inside a range shrinks it;
    /// the range is gone only when every line it spans was deleted.
    fn apply_range(&self, start: CellRef, end: CellRef) -> Option<(CellRef, CellRef)> {
        let CellRange { start, end } = CellRange::new(start, end);
        match *self {
            ShiftOperation::DeleteRow(at) => {
                if start.row == at && end.row == at {
                    return None;
                }
                let first = if start.row > at { start.row - 1 } else { start.row };
                let last = if end.row >= at { end.row - 1 } else { end.row };
                Some((CellRef::new(first, start.col), CellRef::new(last, end.col)))
            }
            ShiftOperation::DeleteColumn(at) => {
                if start.col == at && end.col == at {
                    return None;
                }
                let first = if start.col > at { start.col - 1 } else { start.col };
                let last = if end.col >= at { end.col - 1 } else { end.col };
                Some((CellRef::new(start.row, first), CellRef::new(end.row, last)))
            }
            _ => Some((self.apply(start)?, self.apply(end)?)),
        }
    }
}

fn reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b([A-Z]+[0-9]+)(?::([A-Z]+[0-9]+))?\b")
            .expect("shift reference regex must compile")
    })
}

/// Shift cell references in a formula when rows/cols are inserted/deleted.
/// Returns the updated formula string.
///
/// Rules:
/// - Insert row at R: refs to row >= R become row + 1
/// - Delete row at R: refs to row > R become row - 1; row == R becomes `#REF!`
/// - Same logic for columns
/// - Ranges shrink when a line inside them is deleted
/// - Text inside string literals is left alone
pub fn shift_formula_references(formula: &str, op: ShiftOperation) -> String {
    let stripped = strip_string_literals(formula);
    let mut out = String::with_capacity(formula.len());
    let mut last = 0;

    for caps in reference_re().captures_iter(&stripped) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&formula[last..whole.start()]);
        out.push_str(&shift_match(&caps, op).unwrap_or_else(|| whole.as_str().to_string()));
        last = whole.end();
    }
    out.push_str(&formula[last..]);
    out
}

fn shift_match(caps: &Captures, op: ShiftOperation) -> Option<String> {
    let start = CellRef::from_str(&caps[1])?;
    let Some(end_text) = caps.get(2) else {
        return Some(match op.apply(start) {
            Some(moved) => moved.to_string(),
            None => "#REF!".to_string(),
        });
    };
    let end = CellRef::from_str(end_text.as_str())?;
    Some(match op.apply_range(start, end) {
        Some((first, last)) => format!("{}:{}", first, last),
        None => "#REF!".to_string(),
    })
}
