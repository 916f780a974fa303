//! Formula evaluation.
//!
//! A [`Formula`] is parsed once and can then be evaluated any number of times
//! against different registries. Evaluation is pure: the same formula over
//! the same registry values always produces the same result.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::parser::{BinaryOp, Expr, Parser};
use super::registry::CellRegistry;
use crate::error::FormulaError;

/// The outcome of evaluating a formula.
pub type EvaluationResult = Result<Decimal, FormulaError>;

/// A parsed, immutable formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Parses a formula. A leading `=` is optional.
    ///
    /// # Example
    ///
    /// ```
    /// use payslip_engine::formula::Formula;
    ///
    /// let formula = Formula::parse("=B10 + B11").unwrap();
    /// assert_eq!(formula.references(), vec!["B10", "B11"]);
    /// assert_eq!(formula.source(), "=B10 + B11");
    /// ```
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        let body = strip_prefix(source);
        let expr = Parser::new(body)?.parse()?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// The text the formula was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// References used by the formula, deduplicated, in first-use order.
    pub fn references(&self) -> Vec<&str> {
        let mut all = Vec::new();
        self.expr.collect_references(&mut all);
        let mut unique: Vec<&str> = Vec::with_capacity(all.len());
        for reference in all {
            if !unique.contains(&reference) {
                unique.push(reference);
            }
        }
        unique
    }

    /// Evaluates the formula against `registry`.
    pub fn evaluate<R: CellRegistry + ?Sized>(&self, registry: &R) -> EvaluationResult {
        eval_expr(&self.expr, registry)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Serialize for Formula {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Formula {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Formula::parse(&source).map_err(serde::de::Error::custom)
    }
}

fn strip_prefix(source: &str) -> &str {
    let trimmed = source.trim_start();
    trimmed.strip_prefix('=').unwrap_or(trimmed)
}

/// Parses and evaluates `formula` against `registry` in one step.
///
/// Unknown references resolve to zero so that sparse sheets still evaluate.
///
/// # Examples
///
/// ```
/// use payslip_engine::error::FormulaError;
/// use payslip_engine::formula::{evaluate, EmptyRegistry};
/// use rust_decimal::Decimal;
/// use std::collections::HashMap;
///
/// assert_eq!(evaluate("=2+3*4", &EmptyRegistry), Ok(Decimal::from(14)));
/// assert_eq!(evaluate("(2+3)*4", &EmptyRegistry), Ok(Decimal::from(20)));
/// assert_eq!(evaluate("=UNKNOWN+1", &EmptyRegistry), Ok(Decimal::from(1)));
///
/// let mut cells = HashMap::new();
/// cells.insert("A1".to_string(), Decimal::from(5));
/// assert_eq!(evaluate("=A1/0", &cells), Err(FormulaError::DivisionByZero));
/// ```
pub fn evaluate<R: CellRegistry + ?Sized>(formula: &str, registry: &R) -> EvaluationResult {
    Formula::parse(formula)?.evaluate(registry)
}

fn eval_expr<R: CellRegistry + ?Sized>(expr: &Expr, registry: &R) -> EvaluationResult {
    match expr {
        Expr::Number(value) => Ok(*value),
        Expr::Reference(name) => Ok(registry.get(name).unwrap_or(Decimal::ZERO)),
        Expr::Negate(operand) => Ok(-eval_expr(operand, registry)?),
        Expr::Binary { op, left, right } => {
            let lhs = eval_expr(left, registry)?;
            let rhs = eval_expr(right, registry)?;
            match op {
                BinaryOp::Add => lhs.checked_add(rhs).ok_or(FormulaError::Overflow),
                BinaryOp::Subtract => lhs.checked_sub(rhs).ok_or(FormulaError::Overflow),
                BinaryOp::Multiply => lhs.checked_mul(rhs).ok_or(FormulaError::Overflow),
                BinaryOp::Divide => {
                    if rhs.is_zero() {
                        Err(FormulaError::DivisionByZero)
                    } else {
                        lhs.checked_div(rhs).ok_or(FormulaError::Overflow)
                    }
                }
            }
        }
    }
}
