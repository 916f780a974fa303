//! Social security contributions.
//!
//! ## Employee side
//!
//! Three flat rates applied to the monthly gross:
//! - **Sickness** and **pension** on the full gross.
//! - **Dependency** on the gross above a monthly abatement, never below zero.
//!
//! ## Employer side
//!
//! A separate set of flat rates on the full gross, reported per rate so the
//! payslip can show a breakdown.
//!
//! Amounts are returned unrounded; rounding happens once, in the assembler.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::config::{ContributionRates, EmployerRates};
use crate::error::EngineResult;
use crate::models::{AuditStep, ensure_non_negative};

/// Employee contributions before rounding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeContributionsResult {
    /// Sickness insurance.
    pub sickness: Decimal,
    /// Pension insurance.
    pub pension: Decimal,
    /// Dependency insurance.
    pub dependency: Decimal,
    /// The gross remaining after the dependency abatement.
    pub dependency_base: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

impl EmployeeContributionsResult {
    /// Sum of the three contributions.
    pub fn total(&self) -> Decimal {
        self.sickness + self.pension + self.dependency
    }
}

/// Employer contributions before rounding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployerContributionsResult {
    /// Amount per named rate.
    pub breakdown: BTreeMap<String, Decimal>,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Computes the employee's social security contributions.
///
/// # Errors
///
/// Returns `NegativeInput` if the gross salary is negative.
///
/// # Example
///
/// ```
/// use payslip_engine::calculation::compute_employee_contributions;
/// use payslip_engine::config::ContributionRates;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let rates = ContributionRates {
///     sickness: Decimal::from_str("0.0305").unwrap(),
///     pension: Decimal::from_str("0.08").unwrap(),
///     dependency: Decimal::from_str("0.014").unwrap(),
///     dependency_abatement: Decimal::from_str("627.06").unwrap(),
/// };
///
/// // Below the abatement no dependency contribution is due
/// let result = compute_employee_contributions(Decimal::from(500), &rates, 1).unwrap();
/// assert_eq!(result.dependency, Decimal::ZERO);
/// assert_eq!(result.pension, Decimal::from(40));
/// ```
pub fn compute_employee_contributions(
    gross: Decimal,
    rates: &ContributionRates,
    step_number: u32,
) -> EngineResult<EmployeeContributionsResult> {
    ensure_non_negative("gross_salary", gross)?;

    let sickness = gross * rates.sickness;
    let pension = gross * rates.pension;
    let dependency_base = (gross - rates.dependency_abatement).max(Decimal::ZERO);
    let dependency = dependency_base * rates.dependency;

    let audit_step = AuditStep {
        step_number,
        rule_id: "employee_contributions".to_string(),
        rule_name: "Employee Social Security".to_string(),
        rate_source: "employee".to_string(),
        input: serde_json::json!({
            "gross_salary": gross.to_string(),
            "sickness_rate": rates.sickness.to_string(),
            "pension_rate": rates.pension.to_string(),
            "dependency_rate": rates.dependency.to_string(),
            "dependency_abatement": rates.dependency_abatement.to_string()
        }),
        output: serde_json::json!({
            "sickness": sickness.to_string(),
            "pension": pension.to_string(),
            "dependency": dependency.to_string()
        }),
        reasoning: format!(
            "{} x {} sickness + {} x {} pension + ({} - {} abatement, min 0) x {} dependency",
            gross.normalize(),
            rates.sickness.normalize(),
            gross.normalize(),
            rates.pension.normalize(),
            gross.normalize(),
            rates.dependency_abatement.normalize(),
            rates.dependency.normalize()
        ),
    };

    Ok(EmployeeContributionsResult {
        sickness,
        pension,
        dependency,
        dependency_base,
        audit_step,
    })
}

/// Computes the employer's contributions, one entry per named rate.
///
/// # Errors
///
/// Returns `NegativeInput` if the gross salary is negative.
pub fn compute_employer_contributions(
    gross: Decimal,
    rates: &EmployerRates,
    step_number: u32,
) -> EngineResult<EmployerContributionsResult> {
    ensure_non_negative("gross_salary", gross)?;

    let breakdown: BTreeMap<String, Decimal> = rates
        .named()
        .into_iter()
        .map(|(name, rate)| (name.to_string(), gross * rate))
        .collect();

    let audit_step = AuditStep {
        step_number,
        rule_id: "employer_contributions".to_string(),
        rule_name: "Employer Social Security".to_string(),
        rate_source: "employer".to_string(),
        input: serde_json::json!({
            "gross_salary": gross.to_string(),
            "rates": rates
                .named()
                .iter()
                .map(|(name, rate)| {
                    ((*name).to_string(), serde_json::Value::String(rate.to_string()))
                })
                .collect::<serde_json::Map<_, _>>()
        }),
        output: serde_json::json!({
            "breakdown": breakdown
                .iter()
                .map(|(name, amount)| (name.clone(), serde_json::Value::String(amount.to_string())))
                .collect::<serde_json::Map<_, _>>()
        }),
        reasoning: format!(
            "{} employer rate(s) applied to gross {}",
            breakdown.len(),
            gross.normalize()
        ),
    };

    Ok(EmployerContributionsResult {
        breakdown,
        audit_step,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn employee_rates() -> ContributionRates {
        ContributionRates {
            sickness: dec("0.0305"),
            pension: dec("0.08"),
            dependency: dec("0.014"),
            dependency_abatement: dec("627.06"),
        }
    }

    fn employer_rates() -> EmployerRates {
        EmployerRates {
            sickness: dec("0.0305"),
            pension: dec("0.08"),
            accident_insurance: dec("0.0075"),
            health_at_work: dec("0.0014"),
            mutuality: dec("0.0072"),
        }
    }

    #[test]
    fn test_employee_contributions_at_5000() {
        let result = compute_employee_contributions(dec("5000"), &employee_rates(), 2).unwrap();

        assert_eq!(result.sickness, dec("152.50"));
        assert_eq!(result.pension, dec("400"));
        assert_eq!(result.dependency_base, dec("4372.94"));
        assert_eq!(result.dependency, dec("61.22116"));
        assert_eq!(result.total(), dec("613.72116"));
        assert_eq!(result.audit_step.step_number, 2);
    }

    #[test]
    fn test_dependency_base_floors_at_zero() {
        let result = compute_employee_contributions(dec("627.06"), &employee_rates(), 1).unwrap();
        assert_eq!(result.dependency_base, Decimal::ZERO);
        assert_eq!(result.dependency, Decimal::ZERO);

        let result = compute_employee_contributions(dec("100"), &employee_rates(), 1).unwrap();
        assert_eq!(result.dependency, Decimal::ZERO);
        assert_eq!(result.sickness, dec("3.05"));
    }

    #[test]
    fn test_zero_gross_gives_zero_contributions() {
        let employee = compute_employee_contributions(Decimal::ZERO, &employee_rates(), 1).unwrap();
        assert_eq!(employee.total(), Decimal::ZERO);

        let employer = compute_employer_contributions(Decimal::ZERO, &employer_rates(), 1).unwrap();
        assert!(employer.breakdown.values().all(|amount| amount.is_zero()));
    }

    #[test]
    fn test_employer_breakdown_at_5000() {
        let result = compute_employer_contributions(dec("5000"), &employer_rates(), 3).unwrap();

        assert_eq!(result.breakdown.len(), 5);
        assert_eq!(result.breakdown["sickness"], dec("152.50"));
        assert_eq!(result.breakdown["pension"], dec("400"));
        assert_eq!(result.breakdown["accident_insurance"], dec("37.50"));
        assert_eq!(result.breakdown["health_at_work"], dec("7.00"));
        assert_eq!(result.breakdown["mutuality"], dec("36.00"));
        assert_eq!(result.audit_step.output["breakdown"]["mutuality"], "36.0000");
    }

    #[test]
    fn test_negative_gross_is_rejected() {
        assert!(matches!(
            compute_employee_contributions(dec("-1"), &employee_rates(), 1),
            Err(EngineError::NegativeInput { .. })
        ));
        assert!(matches!(
            compute_employer_contributions(dec("-1"), &employer_rates(), 1),
            Err(EngineError::NegativeInput { .. })
        ));
    }
}
