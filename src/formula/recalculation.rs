//! Full-pass recalculation of a declared formula set.
//!
//! The engine does not build a dependency graph. Every pass evaluates every
//! formula against the previous pass's outputs layered over the raw inputs,
//! so the order in which formulas are declared never changes the result.
//! Passes repeat until nothing changes or [`MAX_PASSES`] is reached; targets
//! still moving at that point are reported as circular.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::evaluator::{EvaluationResult, Formula};
use super::registry::{CellRegistry, LayeredRegistry};
use crate::error::FormulaError;

/// Pass ceiling for a single recalculation.
pub const MAX_PASSES: usize = 10;

type PassResults = BTreeMap<String, EvaluationResult>;

/// Result of one recalculation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecalculationOutcome {
    /// Published value for every declared target. Failed targets read zero.
    pub values: BTreeMap<String, Decimal>,
    /// Failure per target, for diagnostics.
    pub failures: BTreeMap<String, FormulaError>,
    /// Number of passes run.
    pub passes: usize,
}

impl RecalculationOutcome {
    /// Value published for `target`, if it was declared.
    pub fn value(&self, target: &str) -> Option<Decimal> {
        self.values.get(target).copied()
    }

    /// Failure recorded for `target`, if any.
    pub fn failure(&self, target: &str) -> Option<&FormulaError> {
        self.failures.get(target)
    }

    /// True when every target evaluated.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A fixed set of `target -> formula` declarations.
#[derive(Debug, Clone, Default)]
pub struct RecalculationEngine {
    formulas: BTreeMap<String, Result<Formula, FormulaError>>,
}

impl RecalculationEngine {
    /// Creates an engine with no formulas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares (or replaces) the formula for `target`.
    ///
    /// A formula that fails to parse is kept and reported for its target on
    /// every recalculation.
    pub fn declare(&mut self, target: impl Into<String>, formula: &str) -> &mut Self {
        self.formulas.insert(target.into(), Formula::parse(formula));
        self
    }

    /// Builds an engine from `(target, formula)` pairs.
    pub fn from_declarations<I, K, V>(declarations: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut engine = Self::new();
        for (target, formula) in declarations {
            engine.declare(target, formula.as_ref());
        }
        engine
    }

    /// Number of declared targets.
    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    /// True when no formulas are declared.
    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }

    /// Re-evaluates every declared formula over `inputs`.
    ///
    /// # Example
    ///
    /// ```
    /// use payslip_engine::formula::RecalculationEngine;
    /// use rust_decimal::Decimal;
    /// use std::collections::HashMap;
    ///
    /// let engine = RecalculationEngine::from_declarations([
    ///     ("B18", "=B15*0.15"),
    ///     ("B15", "=B10+B11"),
    /// ]);
    /// let mut inputs = HashMap::new();
    /// inputs.insert("B10".to_string(), Decimal::from(1000));
    /// inputs.insert("B11".to_string(), Decimal::from(200));
    ///
    /// let outcome = engine.recalculate(&inputs);
    /// assert_eq!(outcome.value("B15"), Some(Decimal::from(1200)));
    /// assert_eq!(outcome.value("B18"), Some(Decimal::from(180)));
    /// assert!(outcome.is_clean());
    /// ```
    pub fn recalculate<R: CellRegistry + ?Sized>(&self, inputs: &R) -> RecalculationOutcome {
        let mut before_last: Option<PassResults> = None;
        let mut last = self.run_pass(&BTreeMap::new(), inputs);
        let mut passes = 1;

        while passes < MAX_PASSES {
            let next = self.run_pass(&last, inputs);
            passes += 1;
            let stable = next == last;
            before_last = Some(std::mem::replace(&mut last, next));
            if stable {
                debug!(passes, targets = self.formulas.len(), "Recalculation settled");
                return self.publish_outcome(last, None, passes);
            }
        }

        self.publish_outcome(last, before_last, passes)
    }

    fn run_pass<R: CellRegistry + ?Sized>(
        &self,
        previous: &PassResults,
        inputs: &R,
    ) -> PassResults {
        let published = published_values(previous);
        let view = LayeredRegistry::new(&published, inputs);

        self.formulas
            .iter()
            .map(|(target, formula)| {
                let result = match formula {
                    Ok(formula) => formula.evaluate(&view),
                    Err(err) => Err(err.clone()),
                };
                (target.clone(), result)
            })
            .collect()
    }

    /// Splits the final pass into values and failures. `unsettled_from` holds
    /// the pass before the final one when the ceiling was hit.
    fn publish_outcome(
        &self,
        last: PassResults,
        unsettled_from: Option<PassResults>,
        passes: usize,
    ) -> RecalculationOutcome {
        let mut values = BTreeMap::new();
        let mut failures = BTreeMap::new();

        for (target, result) in last {
            let still_moving = unsettled_from
                .as_ref()
                .is_some_and(|before| before.get(&target) != Some(&result));

            let result = if still_moving {
                Err(FormulaError::CircularReference {
                    target: target.clone(),
                })
            } else {
                result
            };

            match result {
                Ok(value) => {
                    values.insert(target, value);
                }
                Err(err) => {
                    warn!(target = %target, error = %err, "Formula target failed");
                    values.insert(target.clone(), Decimal::ZERO);
                    failures.insert(target, err);
                }
            }
        }

        RecalculationOutcome {
            values,
            failures,
            passes,
        }
    }
}

fn published_values(results: &PassResults) -> BTreeMap<String, Decimal> {
    results
        .iter()
        .map(|(target, result)| {
            let value = result.as_ref().copied().unwrap_or(Decimal::ZERO);
            (target.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::registry::EmptyRegistry;
    use std::collections::HashMap;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn inputs(pairs: &[(&str, &str)]) -> HashMap<String, Decimal> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), dec(v)))
            .collect()
    }

    #[test]
    fn test_chain_converges_regardless_of_declaration_order() {
        let raw = inputs(&[("B10", "3000"), ("B11", "500")]);

        let forward = RecalculationEngine::from_declarations([
            ("B15", "=B10+B11"),
            ("B18", "=B15*0.15"),
        ]);
        let backward = RecalculationEngine::from_declarations([
            ("B18", "=B15*0.15"),
            ("B15", "=B10+B11"),
        ]);

        let a = forward.recalculate(&raw);
        let b = backward.recalculate(&raw);

        assert_eq!(a.values, b.values);
        assert_eq!(a.value("B15"), Some(dec("3500")));
        assert_eq!(a.value("B18"), Some(dec("525")));
        assert!(a.passes <= MAX_PASSES);
    }

    #[test]
    fn test_chain_depth_bounds_pass_count() {
        let engine = RecalculationEngine::from_declarations([
            ("C1", "=A1+1"),
            ("C2", "=C1+1"),
            ("C3", "=C2+1"),
        ]);
        let outcome = engine.recalculate(&inputs(&[("A1", "1")]));
        assert_eq!(outcome.value("C3"), Some(dec("4")));
        // three levels settle in three passes, plus one to observe stability
        assert_eq!(outcome.passes, 4);
    }

    #[test]
    fn test_failure_is_isolated_per_target() {
        let engine = RecalculationEngine::from_declarations([
            ("RATIO", "=A1/A2"),
            ("TOTAL", "=A1+A2"),
            ("BROKEN", "=A1+*2"),
        ]);
        let outcome = engine.recalculate(&inputs(&[("A1", "10"), ("A2", "0")]));

        assert_eq!(outcome.value("TOTAL"), Some(dec("10")));
        assert_eq!(outcome.value("RATIO"), Some(Decimal::ZERO));
        assert_eq!(outcome.failure("RATIO"), Some(&FormulaError::DivisionByZero));
        assert!(matches!(
            outcome.failure("BROKEN"),
            Some(FormulaError::Syntax { .. })
        ));
        assert_eq!(outcome.value("BROKEN"), Some(Decimal::ZERO));
        assert!(!outcome.is_clean());
    }

    #[test]
    fn test_failed_target_reads_zero_downstream() {
        let engine = RecalculationEngine::from_declarations([
            ("X", "=1/0"),
            ("Y", "=X+5"),
        ]);
        let outcome = engine.recalculate(&EmptyRegistry);
        assert_eq!(outcome.value("Y"), Some(dec("5")));
        assert!(outcome.failure("Y").is_none());
    }

    #[test]
    fn test_self_reference_reports_circular() {
        let engine = RecalculationEngine::from_declarations([("A1", "=A1+1"), ("B1", "=2")]);
        let outcome = engine.recalculate(&EmptyRegistry);

        assert_eq!(outcome.passes, MAX_PASSES);
        assert_eq!(
            outcome.failure("A1"),
            Some(&FormulaError::CircularReference {
                target: "A1".to_string()
            })
        );
        assert_eq!(outcome.value("A1"), Some(Decimal::ZERO));
        assert_eq!(outcome.value("B1"), Some(dec("2")));
    }

    #[test]
    fn test_mutual_cycle_reports_both_targets() {
        let engine = RecalculationEngine::from_declarations([("P", "=Q+1"), ("Q", "=P+1")]);
        let outcome = engine.recalculate(&EmptyRegistry);
        assert!(matches!(
            outcome.failure("P"),
            Some(FormulaError::CircularReference { .. })
        ));
        assert!(matches!(
            outcome.failure("Q"),
            Some(FormulaError::CircularReference { .. })
        ));
    }

    #[test]
    fn test_targets_shadow_raw_inputs() {
        let engine = RecalculationEngine::from_declarations([("B15", "=B10*2")]);
        let outcome = engine.recalculate(&inputs(&[("B10", "4"), ("B15", "999")]));
        assert_eq!(outcome.value("B15"), Some(dec("8")));
    }

    #[test]
    fn test_redeclaring_replaces_formula() {
        let mut engine = RecalculationEngine::new();
        engine.declare("A", "=1").declare("A", "=2");
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.recalculate(&EmptyRegistry).value("A"), Some(dec("2")));
    }

    #[test]
    fn test_empty_engine() {
        let engine = RecalculationEngine::new();
        assert!(engine.is_empty());
        let outcome = engine.recalculate(&EmptyRegistry);
        assert!(outcome.values.is_empty());
        assert!(outcome.is_clean());
    }
}
