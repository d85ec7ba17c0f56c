//! Recalculation scheduling.
//!
//! A single edit re-evaluates the edited cell and then every cell that reads
//! it, directly or transitively, in dependency order. Bulk operations rebuild
//! the whole graph and evaluate every formula once in row-major order.

use super::Document;
use gridcalc_engine::engine::{CellRef, CellType, GridStore};

impl Document {
    /// Re-wire `cell`'s dependency edges for its current raw value, evaluate
    /// it, then bring every dependent up to date.
    pub(crate) fn recalculate_from(&mut self, cell: CellRef) {
        match self.grid.raw_value(&cell) {
            CellType::Formula(formula) => {
                self.graph.set_formula(&formula, cell, self.grid.bounds());
                self.evaluate_and_store(cell, &formula);
            }
            _ => {
                self.graph.remove_edges(&cell);
                self.grid.set_display_value(cell, None);
            }
        }

        let order = self.graph.recalc_order(&cell);
        if !order.is_empty() {
            log::debug!("{} changed; recalculating {} dependents", cell, order.len());
        }
        for dependent in order {
            // Skip cells that are no longer formulas.
            if let CellType::Formula(formula) = self.grid.raw_value(&dependent) {
                self.evaluate_and_store(dependent, &formula);
            }
        }
    }

    /// Full-sheet recompute: forget every computed value, rebuild all edges,
    /// then evaluate each formula once in row-major order.
    ///
    /// Formulas that read a formula further down or to the right see it
    /// unevaluated and show `#ERROR!` until the next edit reaches them.
    pub fn recalculate_all(&mut self) {
        self.grid.clear_display_values();
        self.graph.clear();

        let bounds = self.grid.bounds();
        let formulas = self.grid.formula_cells();
        for (cell, formula) in &formulas {
            self.graph.add_edges(formula, *cell, bounds);
        }
        log::debug!("full recalculation of {} formulas", formulas.len());
        for (cell, formula) in formulas {
            self.evaluate_and_store(cell, &formula);
        }
    }

    fn evaluate_and_store(&mut self, cell: CellRef, formula: &str) {
        let value = self.evaluate_at(formula, cell);
        log::trace!("{} = {:?}", cell, value);
        self.grid.set_display_value(cell, Some(value));
    }
}
