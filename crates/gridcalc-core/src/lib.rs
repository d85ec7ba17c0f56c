//! gridcalc-core - Document model, recalculation and storage.

pub mod document;
pub mod error;
pub mod storage;

pub use document::{CellSnapshot, DEFAULT_COLS, DEFAULT_ROWS, Document, Snapshot};
pub use error::{GridcalcError, Result};
pub use storage::CsvValues;

pub use gridcalc_engine::engine::{CellRange, CellRef, CellType, Value};
