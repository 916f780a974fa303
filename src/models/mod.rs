//! Core data models for the payslip engine.
//!
//! This module contains all the domain models used throughout the engine.

mod audit;
mod payroll_result;
mod tax_input;
mod template;

pub use audit::{AuditStep, AuditTrace, AuditWarning};
pub use payroll_result::{EmployerContributions, PayrollField, PayrollResult, SocialSecurity};
pub(crate) use tax_input::ensure_non_negative;
pub use tax_input::{GrossComponents, ManualDeduction, TaxClass, TaxInput};
pub use template::{FieldType, TemplateField};
