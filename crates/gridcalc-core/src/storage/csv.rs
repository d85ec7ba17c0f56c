//! CSV import/export functionality

use crate::document::Document;
use crate::error::Result;
use gridcalc_engine::engine::{CellRange, CellRef, GridStore, parse_number};
use serde::Deserialize;
use std::io::Write;

/// Which side of each cell an export writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsvValues {
    /// Raw contents, formulas included, suitable for loading back.
    Raw,
    /// Evaluated values as shown in the grid.
    #[default]
    Display,
}

/// Parse CSV text into rows of raw cell inputs.
///
/// Quoted fields may span lines. Records may have different lengths.
/// Blank lines carry no record and are skipped.
pub fn parse_csv_str(content: &str) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Write part of a document as CSV.
///
/// `range` defaults to the block from A1 to the last occupied cell and is
/// clipped to the grid; an empty document writes nothing.
pub fn write_csv<W: Write>(
    doc: &Document,
    values: CsvValues,
    range: Option<CellRange>,
    writer: W,
) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    let (rows, cols) = doc.grid.bounds();
    let range = range
        .or_else(|| doc.grid.used_range())
        .and_then(|range| range.clip(rows, cols));

    if let Some(range) = range {
        for row in range.start.row..=range.end.row {
            let record = (range.start.col..=range.end.col).map(|col| {
                let cell = CellRef::new(row, col);
                match values {
                    CsvValues::Raw => doc.raw_text(&cell),
                    CsvValues::Display => escape_formula_injection(doc.display_text(&cell)),
                }
            });
            csv_writer.write_record(record)?;
        }
    }

    csv_writer.flush()?;
    Ok(())
}

/// Render part of a document as CSV text. See [`write_csv`].
pub fn to_csv_string(
    doc: &Document,
    values: CsvValues,
    range: Option<CellRange>,
) -> Result<String> {
    let mut out = Vec::new();
    write_csv(doc, values, range, &mut out)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Guard against CSV formula injection in spreadsheet apps.
fn escape_formula_injection(field: String) -> String {
    let first_non_space = field.trim_start_matches([' ', '\t']).chars().next();
    if matches!(first_non_space, Some('=' | '+' | '-' | '@')) && parse_number(&field).is_none() {
        format!("'{}", field)
    } else {
        field
    }
}
