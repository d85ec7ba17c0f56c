//! Spreadsheet engine API.
//!
//! This module provides the core computation engine for the spreadsheet:
//!
//! - [`Cell`], [`CellType`], [`SheetGrid`], [`GridStore`] - Cell storage
//! - [`CellRef`], [`CellRange`] - A1 notation <-> zero-based row/col
//! - [`Value`], [`CellError`] - Computed values and error markers
//! - [`split_arguments`], [`extract_arguments`] - Function argument scanning
//! - [`extract_references`], [`extract_dependencies`] - Formula dependencies
//! - [`DependencyGraph`], [`detect_cycle`] - Dependents, precedents, cycles
//! - [`parse`], [`Expr`] - The general-expression grammar
//! - [`Evaluator`], [`evaluate_formula`] - Formula evaluation
//! - [`shift_formula_references`] - Reference rewriting for structure edits

mod cell;
mod cell_ref;
mod cycle;
mod deps;
mod eval;
mod expr;
mod format;
mod graph;
mod shift;
mod tokenize;
mod value;

pub use cell::{Cell, CellType, Grid, GridStore, SheetGrid};
pub use cell_ref::{CellRange, CellRangeIter, CellRef, expand_range, parse_range};
pub use cycle::detect_cycle;
pub use deps::{extract_dependencies, extract_references};
pub use eval::{Evaluator, evaluate_formula};
pub use expr::{BinaryOp, Expr, MAX_DEPTH, Resolver, UnaryOp, eval_str, evaluate, parse};
pub use format::format_number;
pub use graph::DependencyGraph;
pub use shift::{ShiftOperation, shift_formula_references};
pub use tokenize::{extract_arguments, find_matching_paren, single_call, split_arguments, unquote};
pub use value::{CellError, Value, parse_number, round_result};
