//! Request types for the payslip engine API.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{GrossComponents, ManualDeduction, TaxClass, TaxInput, TemplateField};

use super::response::{ApiError, ApiErrorResponse};

/// Request body for the `/payroll` endpoint.
///
/// The gross salary is given either directly or as its components, not both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollRequest {
    /// Monthly gross salary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gross_salary: Option<Decimal>,
    /// Gross salary broken into components.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gross_components: Option<GrossComponents>,
    /// Tax class, `1` or `2`.
    pub tax_class: TaxClass,
    /// Whether the child credit applies.
    #[serde(default)]
    pub has_children: bool,
    /// Accepted; has no effect on the calculation.
    #[serde(default)]
    pub is_over_65: bool,
    /// Deductions entered by hand.
    #[serde(default)]
    pub manual_deductions: Vec<ManualDeduction>,
    /// Date whose rate table applies; today when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,
}

impl PayrollRequest {
    /// A request with a plain gross salary.
    pub fn with_gross(gross_salary: Decimal, tax_class: TaxClass) -> Self {
        Self {
            gross_salary: Some(gross_salary),
            gross_components: None,
            tax_class,
            has_children: false,
            is_over_65: false,
            manual_deductions: Vec::new(),
            effective_date: None,
        }
    }

    /// Builds the tax input, summing components when given.
    pub fn tax_input(&self) -> Result<TaxInput, ApiErrorResponse> {
        let gross = match (&self.gross_salary, &self.gross_components) {
            (Some(gross), None) => *gross,
            (None, Some(components)) => components.total()?,
            (Some(_), Some(_)) => {
                return Err(ApiErrorResponse::bad_request(ApiError::validation_error(
                    "Provide either gross_salary or gross_components, not both",
                )));
            }
            (None, None) => {
                return Err(ApiErrorResponse::bad_request(ApiError::missing_field(
                    "gross_salary",
                )));
            }
        };

        Ok(TaxInput::new(gross, self.tax_class)
            .with_children(self.has_children)
            .over_65(self.is_over_65))
    }
}

/// Request body for the `/formula/evaluate` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulaRequest {
    /// The formula, with or without a leading `=`.
    pub formula: String,
    /// Values of the references the formula may use.
    #[serde(default)]
    pub values: BTreeMap<String, Decimal>,
}

/// Request body for the `/fields/resolve` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldsRequest {
    /// The payroll to compute.
    pub payroll: PayrollRequest,
    /// The template fields to fill.
    pub fields: Vec<TemplateField>,
    /// Values the user typed in, by field id.
    #[serde(default)]
    pub manual_values: BTreeMap<String, Decimal>,
}
