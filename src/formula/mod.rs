//! Spreadsheet-style formula evaluation.
//!
//! This module parses and evaluates arithmetic formulas such as `=B10+B11`
//! or `=grossSalary*0.15` against a [`CellRegistry`], and recalculates sets
//! of declared formulas with [`RecalculationEngine`].
//!
//! The grammar is closed: numbers, references, `+ - * /`, unary sign and
//! parentheses. Nothing in a formula can reach outside that grammar.

mod evaluator;
mod lexer;
mod parser;
mod recalculation;
mod registry;

pub use evaluator::{EvaluationResult, Formula, evaluate};
pub use parser::MAX_NESTING_DEPTH;
pub use recalculation::{MAX_PASSES, RecalculationEngine, RecalculationOutcome};
pub use registry::{CellRegistry, EmptyRegistry, FnRegistry, LayeredRegistry};
