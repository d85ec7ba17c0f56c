//! Formula evaluation against a grid.
//!
//! [`Evaluator`] is the context handed to built-in functions: it knows which
//! cell is being evaluated, reads other cells through [`GridStore`], and
//! consults the [`DependencyGraph`] to refuse circular reads. Evaluation never
//! fails outward; every failure ends as a [`Value::Error`] marker.

use std::cell::Cell;

use super::cell::{CellType, GridStore};
use super::cell_ref::{CellRef, parse_range};
use super::cycle::detect_cycle;
use super::expr::{self, MAX_DEPTH, Resolver};
use super::graph::DependencyGraph;
use super::tokenize::{single_call, split_arguments};
use super::value::{CellError, Value, round_result};
use crate::builtins::FunctionRegistry;

pub struct Evaluator<'a> {
    grid: &'a dyn GridStore,
    graph: &'a DependencyGraph,
    registry: &'a FunctionRegistry,
    current: CellRef,
    depth: Cell<usize>,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        grid: &'a dyn GridStore,
        graph: &'a DependencyGraph,
        registry: &'a FunctionRegistry,
        current: CellRef,
    ) -> Self {
        Evaluator {
            grid,
            graph,
            registry,
            current,
            depth: Cell::new(0),
        }
    }

    /// Evaluate formula text (with or without the leading `=`).
    ///
    /// A body that is exactly one call to a registered function goes straight
    /// to its handler; anything else is parsed as a general expression.
    /// Numeric results are rounded to 10 decimal places.
    pub fn evaluate(&self, formula: &str) -> Value {
        let body = formula.trim();
        let body = body.strip_prefix('=').unwrap_or(body).trim();

        let result = match single_call(body) {
            Some((name, inner)) if self.registry.contains(name) => {
                Ok(self.call_builtin(name, &split_arguments(inner)))
            }
            _ => self.eval_expression(body),
        };

        match result {
            Ok(Value::Number(n)) if !n.is_finite() => Value::Error(CellError::Value),
            Ok(Value::Number(n)) => Value::Number(round_result(n)),
            Ok(value) => value,
            Err(err) => Value::Error(err),
        }
    }

    /// Parse and evaluate a general expression in this context.
    pub fn eval_expression(&self, text: &str) -> Result<Value, CellError> {
        let depth = self.depth.get();
        if depth >= MAX_DEPTH {
            return Err(CellError::Error);
        }
        self.depth.set(depth + 1);
        let result = expr::eval_str(text, self);
        self.depth.set(depth);
        result
    }

    /// Value of the cell named by `reference`, or the marker describing why
    /// it cannot be read.
    pub fn get_cell_value(&self, reference: &str) -> Value {
        self.lookup(reference).unwrap_or_else(Value::Error)
    }

    /// Value of `cell` as seen by the evaluating formula.
    ///
    /// Formula cells contribute their last computed display value; a formula
    /// that has not been evaluated yet, or that reads the evaluating cell
    /// (directly or through other formulas), is an error.
    pub fn value_at(&self, cell: CellRef) -> Result<Value, CellError> {
        if !self.grid.in_bounds(&cell) {
            return Err(CellError::Ref);
        }
        match self.grid.raw_value(&cell) {
            CellType::Formula(_) => {
                if cell == self.current || self.graph.reads_transitively(&cell, &self.current) {
                    self.warn_circular(cell);
                    return Err(CellError::Error);
                }
                self.grid.display_value(&cell).ok_or(CellError::Error)
            }
            other => Ok(other.literal_value().unwrap_or(Value::Empty)),
        }
    }

    fn warn_circular(&self, cell: CellRef) {
        if !log::log_enabled!(log::Level::Warn) {
            return;
        }
        match detect_cycle(&self.current, self.graph) {
            Some(path) => {
                let path: Vec<String> = path.iter().map(CellRef::to_string).collect();
                log::warn!("circular reference: {}", path.join(" -> "));
            }
            None => log::warn!("circular reference: {} reads {}", self.current, cell),
        }
    }

    /// Values of every in-bounds cell in a range, row-major. Malformed range
    /// text yields nothing. Unreadable cells appear as error values.
    pub fn range_values(&self, text: &str) -> Vec<Value> {
        let Some(range) = parse_range(text.trim()) else {
            return Vec::new();
        };
        let (rows, cols) = self.grid.bounds();
        let Some(clipped) = range.clip(rows, cols) else {
            return Vec::new();
        };
        clipped
            .iter()
            .map(|cell| self.value_at(cell).unwrap_or_else(Value::Error))
            .collect()
    }

    /// Resolve one raw function argument into the values it stands for:
    /// a range flattens to its cells, a reference to its cell's value, and
    /// anything else is evaluated as an expression.
    pub fn resolve_argument(&self, arg: &str) -> Vec<Value> {
        let arg = arg.trim();
        if arg.is_empty() {
            return Vec::new();
        }
        if arg.contains(':') && parse_range(arg).is_some() {
            return self.range_values(arg);
        }
        if CellRef::is_reference(arg) {
            return vec![self.get_cell_value(arg)];
        }
        vec![self.eval_expression(arg).unwrap_or_else(Value::Error)]
    }

    /// Flatten every argument through [`Evaluator::resolve_argument`].
    pub fn resolve_arguments(&self, args: &[String]) -> Vec<Value> {
        args.iter()
            .flat_map(|arg| self.resolve_argument(arg))
            .collect()
    }

    fn call_builtin(&self, name: &str, args: &[String]) -> Value {
        match self.registry.get(name) {
            Some(builtin) => (builtin.handler)(self, args),
            None => Value::Error(CellError::Name),
        }
    }
}

impl Resolver for Evaluator<'_> {
    fn lookup(&self, reference: &str) -> Result<Value, CellError> {
        let cell = CellRef::from_str(reference).ok_or(CellError::Ref)?;
        self.value_at(cell)
    }

    fn call(&self, name: &str, args: &[String]) -> Result<Value, CellError> {
        if !self.registry.contains(name) {
            return Err(CellError::Name);
        }
        Ok(self.call_builtin(name, args))
    }
}

/// Evaluate `formula` as the contents of `cell`.
pub fn evaluate_formula(
    formula: &str,
    cell: CellRef,
    grid: &dyn GridStore,
    graph: &DependencyGraph,
    registry: &FunctionRegistry,
) -> Value {
    Evaluator::new(grid, graph, registry, cell).evaluate(formula)
}
