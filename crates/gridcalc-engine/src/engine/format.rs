use std::fmt;

use super::Value;

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Text(s) => f.write_str(s),
            Value::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Value::Error(e) => f.write_str(e.as_str()),
        }
    }
}

/// Format a number for display: integers without a fractional part,
/// everything else in shortest round-trip form.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "#VALUE!".to_string()
    } else if n.is_infinite() {
        "#DIV/0!".to_string()
    } else if n == 0.0 {
        // Avoid printing "-0".
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CellError;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(6.0), "6");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(-12.25), "-12.25");
    }

    #[test]
    fn test_display_values() {
        assert_eq!(Value::Empty.to_string(), "");
        assert_eq!(Value::Bool(false).to_string(), "FALSE");
        assert_eq!(Value::from("hi").to_string(), "hi");
        assert_eq!(Value::Error(CellError::Name).to_string(), "#NAME?");
    }
}
