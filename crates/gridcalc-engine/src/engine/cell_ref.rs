//! Cell reference parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style cell references
//! (e.g., "A1", "B2", "AA100") and zero-indexed row/column coordinates, plus
//! rectangular ranges ("B2:C9") that expand lazily in row-major order.
//!
//! # Examples
//!
//! ```
//! use gridcalc_engine::engine::CellRef;
//!
//! let cell = CellRef::from_str("B3").unwrap();
//! assert_eq!(cell.row, 2);  // 0-indexed
//! assert_eq!(cell.col, 1);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// A reference to a cell by row and column indices (0-indexed).
///
/// Ordering is row-major, so sorted collections of `CellRef` iterate the
/// sheet top-to-bottom, left-to-right.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

fn a1_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Z]+)(?<numbers>[0-9]+)$")
            .expect("A1 reference regex must compile")
    })
}

impl CellRef {
    pub fn new(row: usize, col: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a cell reference from spreadsheet notation (e.g., "A1", "B2", "AA10").
    /// Only uppercase column letters are accepted. Returns None if the input is invalid.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(name: &str) -> Option<CellRef> {
        Self::parse_a1(name)
    }

    fn parse_a1(name: &str) -> Option<CellRef> {
        let caps = a1_re().captures(name)?;
        let letters = &caps["letters"];
        let numbers = &caps["numbers"];

        let mut col_acc = 0usize;
        for c in letters.bytes() {
            let digit = (c - b'A') as usize + 1;
            col_acc = col_acc.checked_mul(26)?.checked_add(digit)?;
        }
        let col = col_acc.checked_sub(1)?;

        let row = numbers.parse::<usize>().ok()?.checked_sub(1)?;

        Some(CellRef::new(row, col))
    }

    /// Whether `text` has the shape of a single A1 reference.
    pub fn is_reference(text: &str) -> bool {
        a1_re().is_match(text)
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }
}

impl std::str::FromStr for CellRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_a1(s).ok_or_else(|| format!("Invalid cell reference: {}", s))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row + 1)
    }
}

/// A rectangular block of cells, always stored with `start` at the top-left.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct CellRange {
    pub start: CellRef,
    pub end: CellRef,
}

impl CellRange {
    /// Build a range from any two corners.
    pub fn new(a: CellRef, b: CellRef) -> CellRange {
        CellRange {
            start: CellRef::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellRef::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    /// The part of this range inside a `rows` x `cols` grid, if any.
    pub fn clip(&self, rows: usize, cols: usize) -> Option<CellRange> {
        if self.start.row >= rows || self.start.col >= cols {
            return None;
        }
        Some(CellRange {
            start: self.start,
            end: CellRef::new(self.end.row.min(rows - 1), self.end.col.min(cols - 1)),
        })
    }

    pub fn iter(&self) -> CellRangeIter {
        CellRangeIter {
            start_col: self.start.col,
            end_col: self.end.col,
            end_row: self.end.row,
            next: Some(self.start),
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

impl IntoIterator for CellRange {
    type Item = CellRef;
    type IntoIter = CellRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy row-major walk over a [`CellRange`].
#[derive(Clone, Debug)]
pub struct CellRangeIter {
    start_col: usize,
    end_col: usize,
    end_row: usize,
    next: Option<CellRef>,
}

impl CellRangeIter {
    fn empty() -> CellRangeIter {
        CellRangeIter {
            start_col: 0,
            end_col: 0,
            end_row: 0,
            next: None,
        }
    }
}

impl Iterator for CellRangeIter {
    type Item = CellRef;

    fn next(&mut self) -> Option<CellRef> {
        let current = self.next?;
        self.next = if current.col < self.end_col {
            Some(CellRef::new(current.row, current.col + 1))
        } else if current.row < self.end_row {
            Some(CellRef::new(current.row + 1, self.start_col))
        } else {
            None
        };
        Some(current)
    }
}

/// Parse a range token like "A1:B5". The corners may be given in any order.
pub fn parse_range(range: &str) -> Option<CellRange> {
    let (start, end) = range.split_once(':')?;
    let start = CellRef::from_str(start.trim())?;
    let end = CellRef::from_str(end.trim())?;
    Some(CellRange::new(start, end))
}

/// Expand two corner references into every contained cell, row-major.
/// Malformed input yields an empty sequence.
pub fn expand_range(start: &str, end: &str) -> CellRangeIter {
    match (CellRef::from_str(start), CellRef::from_str(end)) {
        (Some(a), Some(b)) => CellRange::new(a, b).iter(),
        _ => CellRangeIter::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_parse_a1_overflow_returns_none() {
        let huge = format!("{}1", "Z".repeat(40));
        assert!(CellRef::from_str(&huge).is_none());
    }

    #[test]
    fn test_col_to_letters_handles_max_usize() {
        let letters = CellRef::col_to_letters(usize::MAX);
        assert!(!letters.is_empty());
        assert!(letters.chars().all(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn test_column_labels() {
        assert_eq!(CellRef::col_to_letters(0), "A");
        assert_eq!(CellRef::col_to_letters(25), "Z");
        assert_eq!(CellRef::col_to_letters(26), "AA");
        assert_eq!(CellRef::col_to_letters(701), "ZZ");
        assert_eq!(CellRef::col_to_letters(702), "AAA");
    }

    #[test]
    fn test_lowercase_is_rejected() {
        assert!(CellRef::from_str("a1").is_none());
        assert!(!CellRef::is_reference("b2"));
        assert!(CellRef::is_reference("B2"));
    }

    #[test]
    fn test_expand_range_normalises_corners() {
        let cells: Vec<String> = expand_range("B2", "A1").map(|c| c.to_string()).collect();
        assert_eq!(cells, vec!["A1", "B1", "A2", "B2"]);
    }

    #[test]
    fn test_expand_range_malformed_is_empty() {
        assert_eq!(expand_range("A1", "nope").count(), 0);
        assert_eq!(expand_range("", "B2").count(), 0);
    }

    #[test]
    fn test_parse_range() {
        let range = parse_range("B2:C9").unwrap();
        assert_eq!(range.start, CellRef::new(1, 1));
        assert_eq!(range.end, CellRef::new(8, 2));
        assert_eq!(range.iter().count(), 16);
        assert_eq!(range.to_string(), "B2:C9");
        assert!(parse_range("A1").is_none());
        assert!(parse_range("A1:").is_none());
    }

    #[test]
    fn test_range_clip() {
        let range = parse_range("B2:Z9999").unwrap();
        assert_eq!(range.clip(20, 15), parse_range("B2:O20"));
        assert_eq!(parse_range("A1:B2").unwrap().clip(20, 15), parse_range("A1:B2"));
        assert_eq!(parse_range("A21:B30").unwrap().clip(20, 15), None);
        assert_eq!(parse_range("P1:Q2").unwrap().clip(20, 15), None);
        assert_eq!(range.clip(0, 0), None);
    }

    proptest! {
        #[test]
        fn reference_round_trip(row in 0usize..1_048_576, col in 0usize..(26 * 26 + 25)) {
            let text = CellRef::new(row, col).to_string();
            prop_assert_eq!(CellRef::from_str(&text), Some(CellRef::new(row, col)));
        }
    }
}
