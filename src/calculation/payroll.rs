//! Payroll orchestration.
//!
//! Runs the tax and contribution calculations against one rate table,
//! assembles the payslip and collects the audit trace.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use crate::config::RateTable;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, AuditTrace, ManualDeduction, PayrollResult, TaxInput, ensure_non_negative,
};

use super::assembler::{PayslipParts, assemble};
use super::contributions::{compute_employee_contributions, compute_employer_contributions};
use super::income_tax::{BracketSlice, compute_income_tax};

/// A finished payroll calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollCalculation {
    /// The payslip figures.
    pub result: PayrollResult,
    /// Effective date of the rate table used.
    pub rate_table_date: NaiveDate,
    /// How the income tax splits across brackets (annual amounts).
    pub tax_breakdown: Vec<BracketSlice>,
    /// Every step taken, with warnings.
    pub audit_trace: AuditTrace,
}

/// Computes a monthly payslip.
///
/// # Arguments
///
/// * `input` - Gross salary, tax class and family flags
/// * `manual_deductions` - Deductions entered by hand; summed into `other_deductions`
/// * `table` - The rate table for the pay period
///
/// # Errors
///
/// Returns `NegativeInput` for a negative gross salary or deduction, and
/// `CalculationError` when an amount is too large to compute with.
///
/// # Example
///
/// ```
/// use payslip_engine::calculation::compute_payroll;
/// use payslip_engine::config::ConfigLoader;
/// use payslip_engine::models::{TaxClass, TaxInput};
/// use rust_decimal::Decimal;
///
/// let loader = ConfigLoader::embedded().unwrap();
/// let table = loader.config().latest().unwrap();
///
/// let input = TaxInput::new(Decimal::from(5000), TaxClass::Single);
/// let calculation = compute_payroll(&input, &[], table).unwrap();
/// let result = &calculation.result;
/// assert_eq!(result.net_salary, result.gross_salary - result.total_deductions);
/// ```
pub fn compute_payroll(
    input: &TaxInput,
    manual_deductions: &[ManualDeduction],
    table: &RateTable,
) -> EngineResult<PayrollCalculation> {
    let start_time = Instant::now();
    let mut trace = AuditTrace::default();
    let gross = input.monthly_gross_salary;

    input.validate()?;
    for deduction in manual_deductions {
        ensure_non_negative(&deduction.label, deduction.amount)?;
    }

    let tax = compute_income_tax(input, table, trace.next_step_number())?;
    let tax_breakdown = tax.slices;
    trace.steps.push(tax.audit_step);
    trace.warnings.extend(tax.warnings);

    let employee =
        compute_employee_contributions(gross, &table.employee, trace.next_step_number())?;
    trace.steps.push(employee.audit_step.clone());

    let employer =
        compute_employer_contributions(gross, &table.employer, trace.next_step_number())?;
    trace.steps.push(employer.audit_step.clone());

    let other_deductions = manual_deductions
        .iter()
        .try_fold(Decimal::ZERO, |acc, d| acc.checked_add(d.amount))
        .ok_or_else(|| EngineError::CalculationError {
            message: "manual deductions are out of range".to_string(),
        })?;
    if !manual_deductions.is_empty() {
        debug!(
            count = manual_deductions.len(),
            total = %other_deductions,
            "Summed manual deductions"
        );
        trace.steps.push(AuditStep {
            step_number: trace.next_step_number(),
            rule_id: "manual_deductions".to_string(),
            rule_name: "Manual Deductions".to_string(),
            rate_source: "user input".to_string(),
            input: serde_json::json!(manual_deductions
                .iter()
                .map(|d| serde_json::json!({ "label": d.label, "amount": d.amount.to_string() }))
                .collect::<Vec<_>>()),
            output: serde_json::json!({ "other_deductions": other_deductions.to_string() }),
            reasoning: format!(
                "{} manual deduction(s) totalling {}",
                manual_deductions.len(),
                other_deductions
            ),
        });
    }

    let result = assemble(PayslipParts {
        gross_salary: gross,
        income_tax: tax.monthly_tax,
        employee: &employee,
        employer: &employer,
        other_deductions,
    })?;

    trace.steps.push(AuditStep {
        step_number: trace.next_step_number(),
        rule_id: "assemble".to_string(),
        rule_name: "Payslip Totals".to_string(),
        rate_source: "rounded to cents, half away from zero".to_string(),
        input: serde_json::json!({
            "gross_salary": gross.to_string(),
            "income_tax": tax.monthly_tax.to_string(),
            "social_security": employee.total().to_string(),
            "other_deductions": other_deductions.to_string()
        }),
        output: serde_json::json!({
            "total_deductions": result.total_deductions.to_string(),
            "net_salary": result.net_salary.to_string(),
            "employer_cost": result.employer_cost.to_string()
        }),
        reasoning: format!(
            "Net {} = gross {} - deductions {}; employer cost {} = gross + {} contributions",
            result.net_salary,
            result.gross_salary,
            result.total_deductions,
            result.employer_cost,
            result.employer_contributions.total
        ),
    });

    trace.duration_us = start_time.elapsed().as_micros() as u64;

    info!(
        rate_table = %table.effective_date,
        tax_class = %input.tax_class,
        gross = %result.gross_salary,
        net = %result.net_salary,
        steps = trace.steps.len(),
        duration_us = trace.duration_us,
        "Payroll computed"
    );

    Ok(PayrollCalculation {
        result,
        rate_table_date: table.effective_date,
        tax_breakdown,
        audit_trace: trace,
    })
}
