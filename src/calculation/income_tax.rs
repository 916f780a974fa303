//! Progressive income tax calculation.
//!
//! Tax is computed with marginal-bracket semantics: each slice of income is
//! taxed at the rate of the bracket it falls into, and the slices are summed.
//! Bracket bounds are annual, so the monthly gross is annualized first and
//! the annual tax is spread back over twelve months.
//!
//! ## Adjustments
//!
//! - **Children:** a fixed monthly credit is subtracted after the brackets.
//! - **Over 65:** accepted but not applied; no age-based table is published
//!   for the engine yet, and a warning says so.
//!
//! The result is never negative.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{RateTable, TaxBracket};
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, AuditWarning, TaxInput};

/// Months in a tax year.
pub const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Warning code recorded when the over-65 flag is set.
pub const AGE_ADJUSTMENT_WARNING: &str = "AGE_ADJUSTMENT_NOT_APPLIED";

/// The part of the income that fell into one bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketSlice {
    /// Lower bound of the bracket.
    pub lower_bound: Decimal,
    /// Upper bound of the bracket, `None` for the top bracket.
    pub upper_bound: Option<Decimal>,
    /// Marginal rate.
    pub rate: Decimal,
    /// Annual income taxed in this bracket.
    pub taxable: Decimal,
    /// Annual tax on that income.
    pub tax: Decimal,
}

/// The result of an income tax calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomeTaxResult {
    /// Monthly tax after credits, floored at zero. Not rounded.
    pub monthly_tax: Decimal,
    /// Annualized taxable income.
    pub annual_income: Decimal,
    /// Annual tax from the brackets, before credits.
    pub annual_bracket_tax: Decimal,
    /// Monthly credit actually used (never more than the tax).
    pub credit_applied: Decimal,
    /// Per-bracket breakdown of the annual tax.
    pub slices: Vec<BracketSlice>,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
    /// Warnings raised while calculating.
    pub warnings: Vec<AuditWarning>,
}

/// Applies a bracket table to an annual income.
///
/// Returns the total tax and the non-empty slices that make it up.
///
/// # Example
///
/// ```
/// use payslip_engine::calculation::bracket_tax;
/// use payslip_engine::config::TaxBracket;
/// use rust_decimal::Decimal;
///
/// let brackets = vec![
///     TaxBracket { upper_bound: Some(Decimal::from(10_000)), rate: Decimal::ZERO },
///     TaxBracket { upper_bound: Some(Decimal::from(20_000)), rate: Decimal::new(10, 2) },
///     TaxBracket { upper_bound: None, rate: Decimal::new(20, 2) },
/// ];
///
/// let (tax, slices) = bracket_tax(Decimal::from(25_000), &brackets);
/// // 10,000 at 10% + 5,000 at 20%
/// assert_eq!(tax, Decimal::from(2_000));
/// assert_eq!(slices.len(), 3);
/// ```
pub fn bracket_tax(
    annual_income: Decimal,
    brackets: &[TaxBracket],
) -> (Decimal, Vec<BracketSlice>) {
    let mut total = Decimal::ZERO;
    let mut slices = Vec::new();
    let mut lower = Decimal::ZERO;

    for bracket in brackets {
        if annual_income <= lower {
            break;
        }

        let top = match bracket.upper_bound {
            Some(upper) if annual_income > upper => upper,
            _ => annual_income,
        };
        let taxable = top - lower;
        let tax = taxable * bracket.rate;
        total += tax;

        slices.push(BracketSlice {
            lower_bound: lower,
            upper_bound: bracket.upper_bound,
            rate: bracket.rate,
            taxable,
            tax,
        });

        match bracket.upper_bound {
            Some(upper) => lower = upper,
            None => break,
        }
    }

    (total, slices)
}

/// Computes the monthly income tax for a payslip.
///
/// # Arguments
///
/// * `input` - Gross salary, tax class and family flags
/// * `table` - The rate table in force for the pay period
/// * `step_number` - The step number for audit trail sequencing
///
/// # Errors
///
/// Returns `NegativeInput` if the gross salary is negative.
///
/// # Example
///
/// ```
/// use payslip_engine::calculation::compute_income_tax;
/// use payslip_engine::config::ConfigLoader;
/// use payslip_engine::models::{TaxClass, TaxInput};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let loader = ConfigLoader::embedded().unwrap();
/// let table = loader.rate_table_for(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()).unwrap();
///
/// let input = TaxInput::new(Decimal::ZERO, TaxClass::Single);
/// let result = compute_income_tax(&input, table, 1).unwrap();
/// assert_eq!(result.monthly_tax, Decimal::ZERO);
/// ```
pub fn compute_income_tax(
    input: &TaxInput,
    table: &RateTable,
    step_number: u32,
) -> EngineResult<IncomeTaxResult> {
    input.validate()?;

    let annual_income = input
        .monthly_gross_salary
        .checked_mul(MONTHS_PER_YEAR)
        .ok_or_else(|| EngineError::CalculationError {
            message: format!(
                "monthly gross salary {} is too large to annualize",
                input.monthly_gross_salary
            ),
        })?;
    let (annual_bracket_tax, slices) =
        bracket_tax(annual_income, table.brackets_for(input.tax_class));
    let monthly_before_credit = annual_bracket_tax / MONTHS_PER_YEAR;

    let credit_applied = if input.has_children {
        table.child_credit_monthly.min(monthly_before_credit)
    } else {
        Decimal::ZERO
    };
    let monthly_tax = (monthly_before_credit - credit_applied).max(Decimal::ZERO);

    let mut warnings = Vec::new();
    if input.is_over_65 {
        warnings.push(AuditWarning::new(
            AGE_ADJUSTMENT_WARNING,
            "Taxpayer is over 65 but no age-based adjustment is defined; standard brackets used",
            "low",
        ));
    }

    debug!(
        tax_class = %input.tax_class,
        annual_income = %annual_income,
        brackets_used = slices.len(),
        monthly_tax = %monthly_tax,
        "Computed income tax"
    );

    let top_rate = slices.last().map(|s| s.rate).unwrap_or(Decimal::ZERO);
    let reasoning = if credit_applied > Decimal::ZERO {
        format!(
            "Annual income {} taxed across {} bracket(s) (top marginal rate {}%): \
             {} per year, {} per month, less child credit {} = {}",
            annual_income.normalize(),
            slices.len(),
            (top_rate * Decimal::from(100)).normalize(),
            annual_bracket_tax.normalize(),
            monthly_before_credit.round_dp(4).normalize(),
            credit_applied.round_dp(4).normalize(),
            monthly_tax.round_dp(4).normalize()
        )
    } else {
        format!(
            "Annual income {} taxed across {} bracket(s) (top marginal rate {}%): \
             {} per year, {} per month",
            annual_income.normalize(),
            slices.len(),
            (top_rate * Decimal::from(100)).normalize(),
            annual_bracket_tax.normalize(),
            monthly_tax.round_dp(4).normalize()
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "income_tax".to_string(),
        rule_name: "Progressive Income Tax".to_string(),
        rate_source: format!(
            "rates {}, class {}",
            table.effective_date, input.tax_class
        ),
        input: serde_json::json!({
            "monthly_gross_salary": input.monthly_gross_salary.to_string(),
            "tax_class": input.tax_class.number(),
            "has_children": input.has_children,
            "is_over_65": input.is_over_65
        }),
        output: serde_json::json!({
            "annual_income": annual_income.to_string(),
            "annual_bracket_tax": annual_bracket_tax.to_string(),
            "credit_applied": credit_applied.to_string(),
            "monthly_tax": monthly_tax.to_string()
        }),
        reasoning,
    };

    Ok(IncomeTaxResult {
        monthly_tax,
        annual_income,
        annual_bracket_tax,
        credit_applied,
        slices,
        audit_step,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use crate::models::TaxClass;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn table() -> RateTable {
        ConfigLoader::embedded()
            .unwrap()
            .rate_table_for(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
            .unwrap()
            .clone()
    }

    fn monthly(gross: &str, class: TaxClass) -> Decimal {
        compute_income_tax(&TaxInput::new(dec(gross), class), &table(), 1)
            .unwrap()
            .monthly_tax
    }

    #[test]
    fn test_zero_income_zero_tax() {
        assert_eq!(monthly("0", TaxClass::Single), Decimal::ZERO);
        assert_eq!(monthly("0", TaxClass::Married), Decimal::ZERO);
    }

    #[test]
    fn test_income_inside_zero_bracket_is_untaxed() {
        // 1,036.50 * 12 = 12,438, exactly the top of the 0% bracket
        assert_eq!(monthly("1036.50", TaxClass::Single), Decimal::ZERO);
    }

    #[test]
    fn test_marginal_not_flat_rate() {
        let tax = monthly("5000", TaxClass::Single);
        assert_eq!(tax, dec("992.7075"));
        // a flat 39% on the whole salary would be far higher
        assert!(tax < dec("5000") * dec("0.39"));
    }

    #[test]
    fn test_class_two_uses_wider_brackets() {
        assert_eq!(monthly("5000", TaxClass::Married), dec("369.88"));
        assert!(monthly("5000", TaxClass::Married) < monthly("5000", TaxClass::Single));
    }

    #[test]
    fn test_top_bracket_is_unbounded() {
        let input = TaxInput::new(dec("30000"), TaxClass::Single);
        let result = compute_income_tax(&input, &table(), 1).unwrap();
        let last = result.slices.last().unwrap();
        assert_eq!(last.upper_bound, None);
        assert_eq!(last.rate, dec("0.42"));
        assert_eq!(result.annual_bracket_tax, dec("134744.58"));
    }

    #[test]
    fn test_slices_sum_to_total() {
        let input = TaxInput::new(dec("4321.09"), TaxClass::Single);
        let result = compute_income_tax(&input, &table(), 1).unwrap();
        let sum: Decimal = result.slices.iter().map(|s| s.tax).sum();
        assert_eq!(sum, result.annual_bracket_tax);
        let taxable: Decimal = result.slices.iter().map(|s| s.taxable).sum();
        assert_eq!(taxable, result.annual_income);
    }

    #[test]
    fn test_child_credit_reduces_tax() {
        let input = TaxInput::new(dec("5000"), TaxClass::Single).with_children(true);
        let result = compute_income_tax(&input, &table(), 1).unwrap();
        assert_eq!(result.credit_applied, dec("125.00"));
        assert_eq!(result.monthly_tax, dec("867.7075"));
        assert!(result.audit_step.reasoning.contains("child credit"));
    }

    #[test]
    fn test_child_credit_never_makes_tax_negative() {
        // 2,000/month: 100.39 of tax, less than the 125 credit
        let input = TaxInput::new(dec("2000"), TaxClass::Single).with_children(true);
        let result = compute_income_tax(&input, &table(), 1).unwrap();
        assert_eq!(result.monthly_tax, Decimal::ZERO);
        assert_eq!(result.credit_applied, dec("100.39"));
    }

    #[test]
    fn test_over_65_has_no_effect_but_warns() {
        let base = TaxInput::new(dec("5000"), TaxClass::Single);
        let plain = compute_income_tax(&base, &table(), 1).unwrap();
        let senior = compute_income_tax(&base.clone().over_65(true), &table(), 1).unwrap();

        assert_eq!(plain.monthly_tax, senior.monthly_tax);
        assert!(plain.warnings.is_empty());
        assert_eq!(senior.warnings.len(), 1);
        assert_eq!(senior.warnings[0].code, AGE_ADJUSTMENT_WARNING);
    }

    #[test]
    fn test_negative_gross_is_rejected() {
        let input = TaxInput::new(dec("-0.01"), TaxClass::Single);
        let result = compute_income_tax(&input, &table(), 1);
        assert!(matches!(result, Err(EngineError::NegativeInput { .. })));
    }

    #[test]
    fn test_unrepresentable_annual_income_is_an_error() {
        let input = TaxInput::new(Decimal::MAX, TaxClass::Single);
        let result = compute_income_tax(&input, &table(), 1);
        assert!(matches!(result, Err(EngineError::CalculationError { .. })));
    }

    #[test]
    fn test_monotonic_over_a_salary_sweep() {
        let table = table();
        for class in [TaxClass::Single, TaxClass::Married] {
            let mut previous = Decimal::ZERO;
            for step in 0..400 {
                let gross = Decimal::from(step * 75);
                let tax = compute_income_tax(&TaxInput::new(gross, class), &table, 1)
                    .unwrap()
                    .monthly_tax;
                assert!(tax >= previous, "tax decreased at gross {}", gross);
                previous = tax;
            }
        }
    }

    #[test]
    fn test_audit_step_records_inputs() {
        let input = TaxInput::new(dec("5000"), TaxClass::Married);
        let result = compute_income_tax(&input, &table(), 3).unwrap();
        assert_eq!(result.audit_step.step_number, 3);
        assert_eq!(result.audit_step.rule_id, "income_tax");
        assert_eq!(result.audit_step.input["tax_class"], 2);
        assert_eq!(result.audit_step.rate_source, "rates 2024-01-01, class 2");
    }
}
