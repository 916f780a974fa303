//! Payroll calculation logic.
//!
//! This module turns a gross salary into a finished payslip: progressive
//! income tax, employee and employer social contributions, and the
//! assembly of rounded totals. [`compute_payroll`] runs all of them against
//! one rate table and records an audit trace.

mod assembler;
mod contributions;
mod income_tax;
mod payroll;

pub use assembler::{CURRENCY_DP, PayslipParts, assemble, round_currency};
pub use contributions::{
    EmployeeContributionsResult, EmployerContributionsResult, compute_employee_contributions,
    compute_employer_contributions,
};
pub use income_tax::{
    AGE_ADJUSTMENT_WARNING, BracketSlice, IncomeTaxResult, MONTHS_PER_YEAR, bracket_tax,
    compute_income_tax,
};
pub use payroll::{PayrollCalculation, compute_payroll};
