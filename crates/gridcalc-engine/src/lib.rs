//! gridcalc_engine - Formula grammar, function library and dependency graph.

pub mod builtins;
pub mod engine;
