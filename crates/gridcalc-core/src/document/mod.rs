//! Document state and logic.

mod io;
mod ops;
mod recalc;
mod snapshot;
mod state;

pub use snapshot::Snapshot;
pub use state::{CellSnapshot, DEFAULT_COLS, DEFAULT_ROWS, Document};
