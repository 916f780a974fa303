//! Payslip assembly.
//!
//! Combines gross, tax, contributions and manual deductions into a
//! [`PayrollResult`]. Every component is rounded to cents half away from
//! zero first; all totals are then summed from the rounded components, so
//! the printed figures always add up.

use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;

use crate::error::{EngineError, EngineResult};
use crate::models::{EmployerContributions, PayrollResult, SocialSecurity};

use super::contributions::{EmployeeContributionsResult, EmployerContributionsResult};

/// Decimal places of a currency amount.
pub const CURRENCY_DP: u32 = 2;

/// Rounds to cents, half away from zero.
///
/// ```
/// use payslip_engine::calculation::round_currency;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let dec = |s| Decimal::from_str(s).unwrap();
/// assert_eq!(round_currency(dec("3750.705")), dec("3750.71"));
/// assert_eq!(round_currency(dec("-0.005")), dec("-0.01"));
/// ```
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CURRENCY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// The unrounded parts a payslip is assembled from.
#[derive(Debug, Clone, Copy)]
pub struct PayslipParts<'a> {
    /// Gross salary.
    pub gross_salary: Decimal,
    /// Monthly income tax.
    pub income_tax: Decimal,
    /// Employee contributions.
    pub employee: &'a EmployeeContributionsResult,
    /// Employer contributions.
    pub employer: &'a EmployerContributionsResult,
    /// Manual deductions, already summed.
    pub other_deductions: Decimal,
}

/// Builds the final payslip figures.
///
/// # Errors
///
/// Returns `CalculationError` if a total does not fit in a decimal.
pub fn assemble(parts: PayslipParts<'_>) -> EngineResult<PayrollResult> {
    let gross_salary = round_currency(parts.gross_salary);
    let income_tax = round_currency(parts.income_tax);
    let other_deductions = round_currency(parts.other_deductions);

    let sickness = round_currency(parts.employee.sickness);
    let pension = round_currency(parts.employee.pension);
    let dependency = round_currency(parts.employee.dependency);
    let social_total = checked_sum("social_security.total", [sickness, pension, dependency])?;

    let breakdown: BTreeMap<String, Decimal> = parts
        .employer
        .breakdown
        .iter()
        .map(|(name, amount)| (name.clone(), round_currency(*amount)))
        .collect();
    let employer_total = checked_sum("employer_contributions.total", breakdown.values().copied())?;

    let total_deductions =
        checked_sum("total_deductions", [income_tax, social_total, other_deductions])?;
    let net_salary = gross_salary
        .checked_sub(total_deductions)
        .ok_or_else(|| overflow("net_salary"))?;
    let employer_cost = checked_sum("employer_cost", [gross_salary, employer_total])?;

    Ok(PayrollResult {
        gross_salary,
        income_tax,
        social_security: SocialSecurity {
            sickness,
            pension,
            dependency,
            total: social_total,
        },
        other_deductions,
        total_deductions,
        net_salary,
        employer_contributions: EmployerContributions {
            total: employer_total,
            breakdown,
        },
        employer_cost,
    })
}

fn checked_sum(field: &str, amounts: impl IntoIterator<Item = Decimal>) -> EngineResult<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
        .ok_or_else(|| overflow(field))
}

fn overflow(field: &str) -> EngineError {
    EngineError::CalculationError {
        message: format!("{} is out of range", field),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuditStep;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn step() -> AuditStep {
        AuditStep {
            step_number: 1,
            rule_id: "test".to_string(),
            rule_name: "Test".to_string(),
            rate_source: "test".to_string(),
            input: serde_json::Value::Null,
            output: serde_json::Value::Null,
            reasoning: String::new(),
        }
    }

    fn employee(sickness: &str, pension: &str, dependency: &str) -> EmployeeContributionsResult {
        EmployeeContributionsResult {
            sickness: dec(sickness),
            pension: dec(pension),
            dependency: dec(dependency),
            dependency_base: Decimal::ZERO,
            audit_step: step(),
        }
    }

    fn employer(amounts: &[(&str, &str)]) -> EmployerContributionsResult {
        EmployerContributionsResult {
            breakdown: amounts
                .iter()
                .map(|(name, amount)| (name.to_string(), dec(amount)))
                .collect(),
            audit_step: step(),
        }
    }

    #[test]
    fn test_assembles_5000_payslip() {
        let employee = employee("152.50", "400", "61.22116");
        let employer = employer(&[
            ("sickness", "152.50"),
            ("pension", "400"),
            ("accident_insurance", "37.50"),
            ("health_at_work", "7.00"),
            ("mutuality", "36.00"),
        ]);

        let result = assemble(PayslipParts {
            gross_salary: dec("5000"),
            income_tax: dec("992.7075"),
            employee: &employee,
            employer: &employer,
            other_deductions: Decimal::ZERO,
        })
        .unwrap();

        assert_eq!(result.income_tax, dec("992.71"));
        assert_eq!(result.social_security.dependency, dec("61.22"));
        assert_eq!(result.social_security.total, dec("613.72"));
        assert_eq!(result.total_deductions, dec("1606.43"));
        assert_eq!(result.net_salary, dec("3393.57"));
        assert_eq!(result.employer_contributions.total, dec("633.00"));
        assert_eq!(result.employer_cost, dec("5633.00"));
    }

    #[test]
    fn test_totals_sum_rounded_parts() {
        // each part rounds up by 0.005; the unrounded sum would round differently
        let employee = employee("0.005", "0.005", "0.005");
        let employer = employer(&[("a", "0.005"), ("b", "0.005")]);

        let result = assemble(PayslipParts {
            gross_salary: dec("100"),
            income_tax: Decimal::ZERO,
            employee: &employee,
            employer: &employer,
            other_deductions: Decimal::ZERO,
        })
        .unwrap();

        assert_eq!(result.social_security.total, dec("0.03"));
        assert_eq!(result.employer_contributions.total, dec("0.02"));
        assert_eq!(result.net_salary, dec("99.97"));
    }

    #[test]
    fn test_net_may_go_negative() {
        let employee = employee("0", "0", "0");
        let employer = employer(&[]);

        let result = assemble(PayslipParts {
            gross_salary: dec("100"),
            income_tax: Decimal::ZERO,
            employee: &employee,
            employer: &employer,
            other_deductions: dec("250"),
        })
        .unwrap();

        assert_eq!(result.net_salary, dec("-150"));
        assert_eq!(result.employer_cost, dec("100"));
    }

    #[test]
    fn test_out_of_range_total_is_an_error() {
        let employee = employee("0", "0", "0");
        let employer = employer(&[]);

        let result = assemble(PayslipParts {
            gross_salary: Decimal::ZERO,
            income_tax: Decimal::MAX,
            employee: &employee,
            employer: &employer,
            other_deductions: Decimal::MAX,
        });

        assert!(matches!(result, Err(EngineError::CalculationError { .. })));
    }
}
