use super::Document;
use crate::error::{GridcalcError, Result};
use crate::storage::{CsvValues, parse_csv_str, write_csv};
use gridcalc_engine::engine::{CellRange, SheetGrid};
use std::path::{Path, PathBuf};

const MAX_CSV_BYTES: u64 = 64 * 1_048_576; // 64 MiB

fn read_csv_file(path: &Path) -> Result<String> {
    let meta = std::fs::metadata(path)?;
    if meta.len() > MAX_CSV_BYTES {
        return Err(GridcalcError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CSV_BYTES
            ),
        )));
    }
    Ok(std::fs::read_to_string(path)?)
}

impl Document {
    /// Create a document of the given minimum size and load a file if provided.
    /// A path that does not exist yet becomes the save target.
    pub fn with_file(path: Option<PathBuf>, rows: usize, cols: usize) -> Result<Self> {
        let mut doc = Self::with_size(rows, cols);
        if let Some(p) = path {
            if p.exists() {
                doc.load_csv(&p)?;
            } else {
                doc.file_path = Some(p);
            }
        }
        Ok(doc)
    }

    /// Replace the whole grid with `rows` of raw inputs and recompute.
    ///
    /// The grid grows to fit the data but never below the document's
    /// minimum size.
    pub fn on_bulk_load(&mut self, rows: &[Vec<String>]) {
        let (min_rows, min_cols) = self.min_bounds;
        self.grid = SheetGrid::from_rows(rows, min_rows, min_cols);
        log::debug!(
            "bulk load: {} rows, {} cells, bounds {:?}",
            rows.len(),
            self.grid.len(),
            self.bounds()
        );
        self.recalculate_all();
        self.modified = true;
    }

    /// Load a CSV file, replacing the current grid.
    pub fn load_csv(&mut self, path: &Path) -> Result<()> {
        let content = read_csv_file(path)?;
        let rows = parse_csv_str(&content)?;
        if rows.is_empty() {
            return Err(GridcalcError::EmptyCsv);
        }
        self.on_bulk_load(&rows);
        self.file_path = Some(path.to_path_buf());
        self.modified = false;
        Ok(())
    }

    /// Write the used part of the grid to a CSV file.
    pub fn save_csv(&mut self, path: &Path, values: CsvValues) -> Result<()> {
        self.export_csv(path, values, None)?;
        self.file_path = Some(path.to_path_buf());
        self.modified = false;
        Ok(())
    }

    /// Save to the current file path.
    /// Returns the path saved to.
    pub fn save(&mut self, values: CsvValues) -> Result<PathBuf> {
        let Some(path) = self.file_path.clone() else {
            return Err(GridcalcError::NoFilePath);
        };
        self.save_csv(&path, values)?;
        Ok(path)
    }

    /// Write `range` (or the used part of the grid) to a CSV file without
    /// changing the document's file path.
    pub fn export_csv(
        &self,
        path: &Path,
        values: CsvValues,
        range: Option<CellRange>,
    ) -> Result<()> {
        let file = std::fs::File::create(path)?;
        write_csv(self, values, range, std::io::BufWriter::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridcalc_engine::engine::{CellRef, CellType, GridStore};
    use pretty_assertions::assert_eq;

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "gridcalc_{}_{}_{:?}.csv",
            tag,
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_bulk_load_recomputes_and_keeps_min_bounds() {
        let mut doc = Document::new();
        doc.on_bulk_load(&rows(&[&["1", "2", "=A1+B1"], &["=C1*2"]]));
        assert_eq!(doc.bounds(), (20, 15));
        assert_eq!(doc.display_text(&CellRef::new(0, 2)), "3");
        assert_eq!(doc.display_text(&CellRef::new(1, 0)), "6");
        assert!(doc.graph.has_dependent(&CellRef::new(0, 0), &CellRef::new(0, 2)));
    }

    #[test]
    fn test_bulk_load_grows_to_fit() {
        let mut doc = Document::with_size(2, 2);
        let wide: Vec<&str> = vec!["1"; 30];
        doc.on_bulk_load(&rows(&[&wide[..], &["x"], &["y"]]));
        assert_eq!(doc.bounds(), (3, 30));
    }

    #[test]
    fn test_bulk_load_replaces_previous_cells() {
        let mut doc = Document::new();
        doc.set_cell(CellRef::new(5, 5), "old").unwrap();
        doc.on_bulk_load(&rows(&[&["new"]]));
        assert_eq!(doc.raw_text(&CellRef::new(5, 5)), "");
        assert_eq!(doc.grid.len(), 1);
    }

    #[test]
    fn test_save_and_load_raw_round_trip() {
        let path = temp_path("round_trip");
        let mut doc = Document::new();
        doc.set_cell(CellRef::new(0, 0), "4").unwrap();
        doc.set_cell(CellRef::new(0, 1), "=A1*A1").unwrap();
        doc.set_cell(CellRef::new(1, 0), "hello, world").unwrap();
        doc.save_csv(&path, CsvValues::Raw).unwrap();
        assert!(!doc.modified);

        let loaded = Document::with_file(Some(path.clone()), 20, 15).unwrap();
        assert_eq!(loaded.raw_text(&CellRef::new(0, 1)), "=A1*A1");
        assert_eq!(loaded.display_text(&CellRef::new(0, 1)), "16");
        assert_eq!(loaded.display_text(&CellRef::new(1, 0)), "hello, world");
        assert_eq!(loaded.file_path.as_deref(), Some(path.as_path()));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_raw_save_keeps_text_that_looks_like_input() {
        let path = temp_path("ambiguous_text");
        let mut doc = Document::new();
        doc.set_cell(CellRef::new(0, 0), "\"=B1\"").unwrap();
        doc.set_cell(CellRef::new(0, 1), "\"12\"").unwrap();
        doc.set_cell(CellRef::new(1, 0), "first\nsecond").unwrap();
        doc.set_cell(CellRef::new(1, 1), "=CONCATENATE(A2, \"!\")").unwrap();
        doc.save_csv(&path, CsvValues::Raw).unwrap();

        let loaded = Document::with_file(Some(path.clone()), 20, 15).unwrap();
        assert_eq!(loaded.grid.raw_value(&CellRef::new(0, 0)), CellType::Text("=B1".into()));
        assert_eq!(loaded.grid.raw_value(&CellRef::new(0, 1)), CellType::Text("12".into()));
        assert_eq!(loaded.display_text(&CellRef::new(1, 0)), "first\nsecond");
        assert_eq!(loaded.display_text(&CellRef::new(1, 1)), "first\nsecond!");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_load_empty_csv_fails() {
        let path = temp_path("empty");
        std::fs::write(&path, "").unwrap();
        let mut doc = Document::new();
        assert!(matches!(doc.load_csv(&path), Err(GridcalcError::EmptyCsv)));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_save_without_path_fails() {
        let mut doc = Document::new();
        assert!(matches!(
            doc.save(CsvValues::Display),
            Err(GridcalcError::NoFilePath)
        ));
    }

    #[test]
    fn test_with_file_missing_path_sets_target() {
        let path = temp_path("missing");
        let doc = Document::with_file(Some(path.clone()), 20, 15).unwrap();
        assert_eq!(doc.file_path, Some(path));
        assert!(doc.grid.is_empty());
    }
}
