//! Text formats for loading and saving documents.

pub mod csv;

pub use self::csv::{CsvValues, parse_csv_str, to_csv_string, write_csv};
