//! Computed cell values and error markers.
//!
//! A [`Value`] is what a formula evaluates to and what the grid stores as a
//! cell's display value. Failures are values too: a [`CellError`] marker is
//! shown in the cell and propagates through formulas that read it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error markers a cell can display.
#[derive(Clone, Copy, Debug, Error, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum CellError {
    /// Generic evaluation failure: parse errors, circular references,
    /// unevaluated formula dependencies, error-marker operands.
    #[error("#ERROR!")]
    Error,
    /// Reference that does not parse or points outside the grid.
    #[error("#REF!")]
    Ref,
    #[error("#DIV/0!")]
    DivZero,
    /// Unknown function or name.
    #[error("#NAME?")]
    Name,
    /// Type mismatch, e.g. arithmetic on non-numeric text.
    #[error("#VALUE!")]
    Value,
}

impl CellError {
    pub const ALL: [CellError; 5] = [
        CellError::Error,
        CellError::Ref,
        CellError::DivZero,
        CellError::Name,
        CellError::Value,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CellError::Error => "#ERROR!",
            CellError::Ref => "#REF!",
            CellError::DivZero => "#DIV/0!",
            CellError::Name => "#NAME?",
            CellError::Value => "#VALUE!",
        }
    }

    /// Recognise a marker at the start of `text`, returning it with its length.
    pub fn parse_prefix(text: &str) -> Option<(CellError, usize)> {
        CellError::ALL
            .into_iter()
            .find(|e| text.starts_with(e.as_str()))
            .map(|e| (e, e.as_str().len()))
    }
}

/// The value of a cell after evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    Error(CellError),
}

impl Value {
    /// The numeric reading of this value, if it is numeric-coercible:
    /// a number, or text that parses as a finite number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => parse_number(s),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Truthiness used by `IF`, `&&`, `||` and `!`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Empty | Value::Error(_) => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Text(s) => match parse_number(s) {
                Some(n) => n != 0.0,
                None => !s.is_empty(),
            },
        }
    }
}

impl From<CellError> for Value {
    fn from(err: CellError) -> Self {
        Value::Error(err)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// Parse text as a finite number. Empty or whitespace-only text is not numeric.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Round to 10 decimal places to hide binary floating point noise.
pub fn round_result(n: f64) -> f64 {
    let scaled = n * 1e10;
    if !scaled.is_finite() {
        return n;
    }
    scaled.round() / 1e10
}
