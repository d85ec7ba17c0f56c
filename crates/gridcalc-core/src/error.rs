//! Error types for Gridcalc core.

use thiserror::Error;

/// Errors raised at the document boundary. Formula failures are not errors
/// here; they are stored as cell values.
#[derive(Error, Debug)]
pub enum GridcalcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid cell reference: {0}")]
    InvalidReference(String),

    #[error("Cell {cell} is outside the {rows}x{cols} grid")]
    OutOfBounds {
        cell: String,
        rows: usize,
        cols: usize,
    },

    #[error("No {what} {index} (sheet has {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Cannot delete the only {0}")]
    LastDimension(&'static str),

    #[error("CSV file is empty")]
    EmptyCsv,

    #[error("No file path set")]
    NoFilePath,
}

pub type Result<T> = std::result::Result<T, GridcalcError>;
