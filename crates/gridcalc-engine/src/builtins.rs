//! Built-in spreadsheet functions and their metadata.
//!
//! Conventions:
//! - Spreadsheet-facing names are ALL CAPS (e.g. `SUM`); lookup is
//!   case-insensitive.
//! - Handlers receive raw argument text plus the [`Evaluator`] for the cell
//!   being computed, and always return a [`Value`] (errors are markers).
//! - To add a function, write a handler and add an entry to `BUILTINS`.

use std::collections::HashMap;

use crate::engine::{CellError, CellRef, Evaluator, Value, parse_range, unquote};

pub type BuiltinFn = fn(&Evaluator<'_>, &[String]) -> Value;

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub description: &'static str,
    pub handler: BuiltinFn,
}

impl std::fmt::Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).finish()
    }
}

pub const BUILTINS: &[Builtin] = &[
    Builtin {
        name: "SUM",
        description: "Sum of numeric values",
        handler: sum,
    },
    Builtin {
        name: "AVERAGE",
        description: "Average of numeric values (0 when there are none)",
        handler: average,
    },
    Builtin {
        name: "COUNT",
        description: "Count of numeric values",
        handler: count,
    },
    Builtin {
        name: "MAX",
        description: "Largest numeric value (0 when there are none)",
        handler: max,
    },
    Builtin {
        name: "MIN",
        description: "Smallest numeric value (0 when there are none)",
        handler: min,
    },
    Builtin {
        name: "IF",
        description: "IF(condition, when_true, when_false); only the chosen branch is evaluated",
        handler: if_then_else,
    },
    Builtin {
        name: "CONCATENATE",
        description: "Join values as text",
        handler: concatenate,
    },
];

/// Name-to-handler table consulted for every function call.
#[derive(Clone, Debug)]
pub struct FunctionRegistry {
    functions: HashMap<String, Builtin>,
}

impl FunctionRegistry {
    /// A registry holding every entry of [`BUILTINS`].
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for builtin in BUILTINS {
            registry.register(*builtin);
        }
        registry
    }

    pub fn empty() -> Self {
        FunctionRegistry {
            functions: HashMap::new(),
        }
    }

    /// Add or replace a function.
    pub fn register(&mut self, builtin: Builtin) {
        self.functions
            .insert(builtin.name.to_ascii_uppercase(), builtin);
    }

    pub fn get(&self, name: &str) -> Option<&Builtin> {
        self.functions.get(&name.to_ascii_uppercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.functions.values().map(|b| b.name).collect();
        names.sort_unstable();
        names
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn numbers(ctx: &Evaluator<'_>, args: &[String]) -> Vec<f64> {
    ctx.resolve_arguments(args)
        .iter()
        .filter_map(Value::as_number)
        .collect()
}

fn sum(ctx: &Evaluator<'_>, args: &[String]) -> Value {
    Value::Number(numbers(ctx, args).iter().sum())
}

fn average(ctx: &Evaluator<'_>, args: &[String]) -> Value {
    let values = numbers(ctx, args);
    if values.is_empty() {
        return Value::Number(0.0);
    }
    Value::Number(values.iter().sum::<f64>() / values.len() as f64)
}

fn count(ctx: &Evaluator<'_>, args: &[String]) -> Value {
    Value::Number(numbers(ctx, args).len() as f64)
}

fn max(ctx: &Evaluator<'_>, args: &[String]) -> Value {
    let value = numbers(ctx, args).into_iter().reduce(f64::max);
    Value::Number(value.unwrap_or(0.0))
}

fn min(ctx: &Evaluator<'_>, args: &[String]) -> Value {
    let value = numbers(ctx, args).into_iter().reduce(f64::min);
    Value::Number(value.unwrap_or(0.0))
}

fn if_then_else(ctx: &Evaluator<'_>, args: &[String]) -> Value {
    let [condition, when_true, when_false] = args else {
        return Value::Error(CellError::Error);
    };
    let branch = match ctx.eval_expression(condition) {
        Ok(value) if value.is_error() => return Value::Error(CellError::Error),
        Ok(value) if value.is_truthy() => when_true,
        Ok(_) => when_false,
        Err(_) => return Value::Error(CellError::Error),
    };
    ctx.eval_expression(branch).unwrap_or_else(Value::Error)
}

fn concatenate(ctx: &Evaluator<'_>, args: &[String]) -> Value {
    let mut out = String::new();
    for arg in args {
        let arg = arg.trim();
        if CellRef::is_reference(arg) {
            out.push_str(&ctx.get_cell_value(arg).to_string());
        } else if let Some(text) = unquote(arg) {
            out.push_str(&text);
        } else if parse_range(arg).is_some() {
            for value in ctx.range_values(arg) {
                out.push_str(&value.to_string());
            }
        } else {
            match ctx.eval_expression(arg) {
                Ok(value) if !value.is_error() => out.push_str(&value.to_string()),
                _ => out.push_str(arg),
            }
        }
    }
    Value::Text(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CellType, DependencyGraph, GridStore, SheetGrid, evaluate_formula};
    use pretty_assertions::assert_eq;

    fn sheet(cells: &[(&str, &str)]) -> SheetGrid {
        let mut grid = SheetGrid::new(20, 15);
        for (name, input) in cells {
            let cell = CellRef::from_str(name).unwrap();
            grid.set_raw_value(cell, CellType::from_input(input));
        }
        grid
    }

    fn eval(grid: &SheetGrid, formula: &str) -> Value {
        let graph = DependencyGraph::new();
        let registry = FunctionRegistry::new();
        evaluate_formula(formula, CellRef::new(10, 10), grid, &graph, &registry)
    }

    #[test]
    fn test_registry_lookup_is_case_insensitive() {
        let registry = FunctionRegistry::new();
        assert!(registry.contains("sum"));
        assert!(registry.contains("Concatenate"));
        assert!(!registry.contains("AVG"));
        assert_eq!(
            registry.names(),
            vec!["AVERAGE", "CONCATENATE", "COUNT", "IF", "MAX", "MIN", "SUM"]
        );
    }

    #[test]
    fn test_register_custom_function() {
        fn answer(_: &Evaluator<'_>, _: &[String]) -> Value {
            Value::Number(42.0)
        }
        let mut registry = FunctionRegistry::empty();
        registry.register(Builtin {
            name: "ANSWER",
            description: "",
            handler: answer,
        });
        let grid = SheetGrid::new(5, 5);
        let graph = DependencyGraph::new();
        let value = evaluate_formula("=answer()+1", CellRef::new(0, 0), &grid, &graph, &registry);
        assert_eq!(value, Value::Number(43.0));
        let value = evaluate_formula("=SUM(1)", CellRef::new(0, 0), &grid, &graph, &registry);
        assert_eq!(value, Value::Error(CellError::Name));
    }

    #[test]
    fn test_sum() {
        let grid = sheet(&[("A1", "1"), ("A2", "x"), ("A3", "3")]);
        assert_eq!(eval(&grid, "=SUM(1,2,3)"), Value::Number(6.0));
        assert_eq!(eval(&grid, "=SUM(A1:A3)"), Value::Number(4.0));
        assert_eq!(eval(&grid, "=SUM(A1, A3, 10)"), Value::Number(14.0));
        assert_eq!(eval(&grid, "=SUM(TRUE, \"5\")"), Value::Number(5.0));
    }

    #[test]
    fn test_average_count_max_min() {
        let grid = sheet(&[("B1", "4"), ("B2", "text"), ("B3", "-2"), ("B4", "10")]);
        assert_eq!(eval(&grid, "=AVERAGE(B1:B4)"), Value::Number(4.0));
        assert_eq!(eval(&grid, "=AVERAGE(C1:C5)"), Value::Number(0.0));
        assert_eq!(eval(&grid, "=COUNT(B1:B4, 1, \"a\")"), Value::Number(4.0));
        assert_eq!(eval(&grid, "=MAX(B1:B4)"), Value::Number(10.0));
        assert_eq!(eval(&grid, "=MIN(B1:B4)"), Value::Number(-2.0));
        assert_eq!(eval(&grid, "=MAX(C1:C5)"), Value::Number(0.0));
        assert_eq!(eval(&grid, "=MIN(\"a\")"), Value::Number(0.0));
    }

    #[test]
    fn test_aggregates_skip_errors() {
        let mut grid = sheet(&[("A1", "2"), ("A2", "=1/0")]);
        grid.set_display_value(CellRef::new(1, 0), Some(Value::Error(CellError::DivZero)));
        assert_eq!(eval(&grid, "=SUM(A1:A2, Z9999)"), Value::Number(2.0));
    }

    #[test]
    fn test_if() {
        let grid = sheet(&[("A1", "5")]);
        assert_eq!(eval(&grid, "=IF(1>0,\"yes\",\"no\")"), Value::from("yes"));
        assert_eq!(eval(&grid, "=IF(A1 > 10, 1, A1 * 2)"), Value::Number(10.0));
        assert_eq!(eval(&grid, "=IF(1, 2)"), Value::Error(CellError::Error));
        assert_eq!(eval(&grid, "=IF(1,2,3,)"), Value::Error(CellError::Error));
        assert_eq!(eval(&grid, "=IF(bogus, 1, 2)"), Value::Error(CellError::Error));
        assert_eq!(eval(&grid, "=if(\"\", 1, 2)"), Value::Number(2.0));
    }

    #[test]
    fn test_if_only_evaluates_selected_branch() {
        let grid = sheet(&[]);
        assert_eq!(eval(&grid, "=IF(1>0, 1, Z9999)"), Value::Number(1.0));
        assert_eq!(eval(&grid, "=IF(0, Z9999, 2)"), Value::Number(2.0));
        assert_eq!(eval(&grid, "=IF(1, Z9999, 2)"), Value::Error(CellError::Ref));
    }

    #[test]
    fn test_concatenate() {
        let grid = sheet(&[("A1", "Hello"), ("A2", "3")]);
        assert_eq!(
            eval(&grid, "=CONCATENATE(A1, \", \", \"world\")"),
            Value::from("Hello, world")
        );
        assert_eq!(eval(&grid, "=CONCATENATE(A2 * 2, B1)"), Value::from("6"));
        assert_eq!(eval(&grid, "=CONCATENATE(A1:A2)"), Value::from("Hello3"));
        assert_eq!(eval(&grid, "=CONCATENATE(x y, 1)"), Value::from("x y1"));
        assert_eq!(eval(&grid, "=CONCATENATE(\"a,b\", \"c\")"), Value::from("a,bc"));
        assert_eq!(eval(&grid, r#"=CONCATENATE("a\\", A2, "b")"#), Value::from(r"a\3b"));
    }

    #[test]
    fn test_trailing_comma_is_an_empty_argument() {
        let grid = sheet(&[("A1", "4")]);
        assert_eq!(eval(&grid, "=SUM(A1, 1,)"), Value::Number(5.0));
        assert_eq!(eval(&grid, "=COUNT(A1,)"), Value::Number(1.0));
    }
}
