//! Dependency extraction from formula strings.
//!
//! Parses formula text to find all cell references (e.g., `A1`, `B2:C5`)
//! that the formula depends on. This is used to build the dependency graph
//! for recalculation and cycle detection.
//!
//! Handles:
//! - Simple cell references: `A1`, `B2`
//! - Range references anywhere in the formula: `SUM(A1:B5)`, each member counted
//! - Ignores references inside string literals

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use super::cell_ref::{CellRange, CellRef};

/// Every cell reference a formula reads, as A1 text.
///
/// Single references come first in the order they appear, followed by the
/// members of each `REF:REF` range in row-major order. Duplicates are removed.
pub fn extract_references(formula: &str) -> Vec<String> {
    let (singles, ranges) = scan(formula);
    let mut seen = HashSet::new();
    singles
        .into_iter()
        .chain(ranges.into_iter().flatten())
        .filter(|cell| seen.insert(*cell))
        .map(|cell| cell.to_string())
        .collect()
}

/// The cells of a `rows` x `cols` grid that a formula reads.
///
/// Ranges are clipped to the grid and references outside it are dropped,
/// so the result never holds more cells than the grid does. Order follows
/// [`extract_references`].
pub fn extract_dependencies(formula: &str, (rows, cols): (usize, usize)) -> Vec<CellRef> {
    let (singles, ranges) = scan(formula);
    let mut seen = HashSet::new();
    singles
        .into_iter()
        .filter(|cell| cell.row < rows && cell.col < cols)
        .chain(
            ranges
                .iter()
                .filter_map(|range| range.clip(rows, cols))
                .flatten(),
        )
        .filter(|cell| seen.insert(*cell))
        .collect()
}

/// Single references and ranges outside string literals, in source order.
fn scan(formula: &str) -> (Vec<CellRef>, Vec<CellRange>) {
    let script = strip_string_literals(formula);
    let singles = cell_ref_re()
        .captures_iter(&script)
        .filter_map(|caps| CellRef::from_str(&caps[1]))
        .collect();
    let ranges = range_re()
        .captures_iter(&script)
        .filter_map(|caps| {
            let start = CellRef::from_str(&caps[1])?;
            let end = CellRef::from_str(&caps[2])?;
            Some(CellRange::new(start, end))
        })
        .collect();
    (singles, ranges)
}

fn cell_ref_re() -> &'static Regex {
    static CELL_RE: OnceLock<Regex> = OnceLock::new();
    CELL_RE.get_or_init(|| {
        Regex::new(r"\b([A-Z]+[0-9]+)\b").expect("dependency cell reference regex must compile")
    })
}

fn range_re() -> &'static Regex {
    static RANGE_RE: OnceLock<Regex> = OnceLock::new();
    RANGE_RE.get_or_init(|| {
        Regex::new(r"\b([A-Z]+[0-9]+):([A-Z]+[0-9]+)\b")
            .expect("dependency range regex must compile")
    })
}

/// Blank out the contents of string literals, keeping the quotes and byte
/// offsets of everything else.
pub(crate) fn strip_string_literals(script: &str) -> String {
    let mut out = String::with_capacity(script.len());
    let mut in_string = false;
    let mut escaped = false;

    for ch in script.chars() {
        if in_string {
            if escaped {
                escaped = false;
                out.push_str(&" ".repeat(ch.len_utf8()));
                continue;
            }
            if ch == '\\' {
                escaped = true;
                out.push(' ');
                continue;
            }
            if ch == '"' {
                in_string = false;
                out.push('"');
            } else {
                out.push_str(&" ".repeat(ch.len_utf8()));
            }
        } else if ch == '"' {
            in_string = true;
            out.push('"');
        } else {
            out.push(ch);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_references_single_and_range() {
        assert_eq!(
            extract_references("SUM(A1:A3)+B1*A2"),
            vec!["A1", "A3", "B1", "A2"]
        );
    }

    #[test]
    fn test_extract_references_ignores_strings_and_identifiers() {
        assert_eq!(extract_references(r#"CONCATENATE("A1", B2)"#), vec!["B2"]);
        assert!(extract_references("LOGX + abc1").is_empty());
        assert!(extract_references("10 + 20").is_empty());
    }

    #[test]
    fn test_extract_references_not_followed_by_alnum() {
        assert!(extract_references("A1B").is_empty());
        assert_eq!(extract_references("(C3)"), vec!["C3"]);
    }

    #[test]
    fn test_extract_dependencies_clips_to_grid() {
        let deps = extract_dependencies("SUM(A1:A2000000)+B2", (20, 15));
        assert_eq!(deps.len(), 21);
        assert_eq!(deps[0], CellRef::new(0, 0));
        assert_eq!(deps[1], CellRef::new(1, 1));
        assert_eq!(deps[20], CellRef::new(19, 0));
        assert!(deps.contains(&CellRef::new(1, 0)));

        let wide = extract_dependencies("SUM(A1:ZZ1000)", (20, 15));
        assert_eq!(wide.len(), 300);
    }

    #[test]
    fn test_extract_dependencies_drops_cells_outside_grid() {
        assert!(extract_dependencies("Z9999+SUM(P1:Q5)", (20, 15)).is_empty());
        assert_eq!(
            extract_dependencies("A1+Z9999", (20, 15)),
            vec![CellRef::new(0, 0)]
        );
    }

    #[test]
    fn test_extract_dependencies_reversed_range() {
        let deps = extract_dependencies("SUM(B2:A1)", (20, 15));
        assert_eq!(
            deps,
            vec![
                CellRef::new(1, 1),
                CellRef::new(0, 0),
                CellRef::new(0, 1),
                CellRef::new(1, 0),
            ]
        );
    }

    #[test]
    fn test_strip_string_literals_keeps_offsets() {
        let stripped = strip_string_literals(r#"A1&"B\"2"&C3"#);
        assert_eq!(stripped.len(), r#"A1&"B\"2"&C3"#.len());
        assert_eq!(stripped, r#"A1&"    "&C3"#);
    }

    #[test]
    fn test_escaped_backslash_closes_string() {
        assert_eq!(extract_references(r#"CONCATENATE("a\\", B1)"#), vec!["B1"]);
    }
}
