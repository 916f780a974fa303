//! Response types for the payslip engine API.
//!
//! This module defines the success bodies, the error response structure and
//! the mapping from engine errors to HTTP statuses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::binding::ResolvedField;
use crate::calculation::BracketSlice;
use crate::error::{EngineError, FormulaError};
use crate::models::{AuditTrace, PayrollResult};

/// Response body for the `/payroll` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayslipResponse {
    /// Unique identifier for this calculation.
    pub calculation_id: Uuid,
    /// When the calculation was performed.
    pub timestamp: DateTime<Utc>,
    /// The engine version that produced the payslip.
    pub engine_version: String,
    /// Currency of every amount.
    pub currency: String,
    /// Effective date of the rate table used.
    pub rate_table_date: NaiveDate,
    /// The payslip figures.
    pub result: PayrollResult,
    /// Income tax by bracket (annual amounts).
    pub tax_breakdown: Vec<BracketSlice>,
    /// How every figure was obtained.
    pub audit_trace: AuditTrace,
}

/// Response body for the `/formula/evaluate` endpoint.
///
/// A formula that fails is still a successful request: `value` is `None`
/// and `error` says why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaResponse {
    /// The result, if the formula evaluated.
    pub value: Option<Decimal>,
    /// References the formula reads, in order of appearance.
    #[serde(default)]
    pub references: Vec<String>,
    /// Why the formula failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<FormulaErrorBody>,
}

/// A formula failure as reported over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaErrorBody {
    /// Stable code, e.g. `DIVISION_BY_ZERO`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl From<&FormulaError> for FormulaErrorBody {
    fn from(error: &FormulaError) -> Self {
        Self {
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

/// Response body for the `/fields/resolve` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldsResponse {
    /// Unique identifier for this calculation.
    pub calculation_id: Uuid,
    /// The payslip figures the fields were bound to.
    pub result: PayrollResult,
    /// One entry per template field, in template order.
    pub fields: Vec<ResolvedField>,
}

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }

    /// Creates a missing field error response.
    pub fn missing_field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::with_details(
            "MISSING_FIELD",
            format!("missing field: {}", field),
            format!("Required field '{}' was not provided in the request", field),
        )
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// A 400 response.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        match error {
            EngineError::ConfigNotFound { .. }
            | EngineError::ConfigParseError { .. }
            | EngineError::InvalidRateTable { .. } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
            },
            EngineError::RateTableNotFound { date } => ApiErrorResponse {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                error: ApiError::with_details(
                    "RATE_TABLE_NOT_FOUND",
                    message,
                    format!("No configured rate table starts on or before {}", date),
                ),
            },
            EngineError::UnsupportedTaxClass { .. } => {
                ApiErrorResponse::bad_request(ApiError::new("UNSUPPORTED_TAX_CLASS", message))
            }
            EngineError::NegativeInput { field, .. } => {
                ApiErrorResponse::bad_request(ApiError::with_details(
                    "NEGATIVE_INPUT",
                    message,
                    format!("'{}' must be zero or positive", field),
                ))
            }
            EngineError::CalculationError { .. } => ApiErrorResponse {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                error: ApiError::with_details("CALCULATION_ERROR", "Calculation failed", message),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("TEST_ERROR", "Test message");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"code\":\"TEST_ERROR\""));
        assert!(json.contains("\"message\":\"Test message\""));
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_rate_table_not_found_is_unprocessable() {
        let error = EngineError::RateTableNotFound {
            date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        };
        let response: ApiErrorResponse = error.into();
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.error.code, "RATE_TABLE_NOT_FOUND");
    }

    #[test]
    fn test_input_errors_are_bad_requests() {
        let response: ApiErrorResponse = EngineError::UnsupportedTaxClass { class: 9 }.into();
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error.code, "UNSUPPORTED_TAX_CLASS");

        let response: ApiErrorResponse = EngineError::NegativeInput {
            field: "bonus".to_string(),
            value: Decimal::NEGATIVE_ONE,
        }
        .into();
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error.details.as_deref(), Some("'bonus' must be zero or positive"));
    }

    #[test]
    fn test_formula_error_body() {
        let body = FormulaErrorBody::from(&FormulaError::DivisionByZero);
        assert_eq!(body.code, "DIVISION_BY_ZERO");
        assert_eq!(body.message, "Division by zero");
    }
}
