//! HTTP request handlers for the payslip engine API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::binding::resolve_template;
use crate::calculation::{PayrollCalculation, compute_payroll};
use crate::formula::Formula;

use super::request::{FieldsRequest, FormulaRequest, PayrollRequest};
use super::response::{
    ApiError, ApiErrorResponse, FieldsResponse, FormulaErrorBody, FormulaResponse,
    PayslipResponse,
};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/payroll", post(payroll_handler))
        .route("/formula/evaluate", post(formula_handler))
        .route("/fields/resolve", post(fields_handler))
        .with_state(state)
}

/// Handler for POST /payroll.
///
/// Computes a payslip and returns it with its audit trace.
async fn payroll_handler(
    State(state): State<AppState>,
    payload: Result<Json<PayrollRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing payroll request");

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(rejection, correlation_id),
    };

    let start_time = Instant::now();
    match run_payroll(&state, &request) {
        Ok(calculation) => {
            info!(
                correlation_id = %correlation_id,
                net_salary = %calculation.result.net_salary,
                duration_us = start_time.elapsed().as_micros(),
                "Payroll completed successfully"
            );
            let body = PayslipResponse {
                calculation_id: Uuid::new_v4(),
                timestamp: Utc::now(),
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                currency: state.config().metadata().currency.clone(),
                rate_table_date: calculation.rate_table_date,
                result: calculation.result,
                tax_breakdown: calculation.tax_breakdown,
                audit_trace: calculation.audit_trace,
            };
            json_response(StatusCode::OK, body)
        }
        Err(err) => error_response(err, correlation_id),
    }
}

/// Handler for POST /formula/evaluate.
///
/// Formula failures are reported in the body with status 200; only an
/// unreadable request is an HTTP error.
async fn formula_handler(payload: Result<Json<FormulaRequest>, JsonRejection>) -> Response {
    let correlation_id = Uuid::new_v4();

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(rejection, correlation_id),
    };

    let body = match Formula::parse(&request.formula) {
        Ok(formula) => {
            let references = formula.references().into_iter().map(str::to_string).collect();
            match formula.evaluate(&request.values) {
                Ok(value) => FormulaResponse {
                    value: Some(value),
                    references,
                    error: None,
                },
                Err(err) => FormulaResponse {
                    value: None,
                    references,
                    error: Some(FormulaErrorBody::from(&err)),
                },
            }
        }
        Err(err) => FormulaResponse {
            value: None,
            references: Vec::new(),
            error: Some(FormulaErrorBody::from(&err)),
        },
    };

    if let Some(error) = &body.error {
        info!(
            correlation_id = %correlation_id,
            code = %error.code,
            "Formula did not evaluate"
        );
    }
    json_response(StatusCode::OK, body)
}

/// Handler for POST /fields/resolve.
///
/// Computes the payslip, then fills the template fields from it.
async fn fields_handler(
    State(state): State<AppState>,
    payload: Result<Json<FieldsRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing field resolution request");

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(rejection, correlation_id),
    };

    let calculation = match run_payroll(&state, &request.payroll) {
        Ok(calculation) => calculation,
        Err(err) => return error_response(err, correlation_id),
    };

    let fields = resolve_template(&request.fields, &calculation.result, &request.manual_values);
    info!(
        correlation_id = %correlation_id,
        fields = fields.len(),
        "Fields resolved"
    );

    json_response(
        StatusCode::OK,
        FieldsResponse {
            calculation_id: Uuid::new_v4(),
            result: calculation.result,
            fields,
        },
    )
}

/// Picks the rate table for the request and runs the calculation.
fn run_payroll(
    state: &AppState,
    request: &PayrollRequest,
) -> Result<PayrollCalculation, ApiErrorResponse> {
    let input = request.tax_input()?;
    let date = request
        .effective_date
        .unwrap_or_else(|| Utc::now().date_naive());
    let table = state.config().rate_table_for(date)?;
    Ok(compute_payroll(&input, &request.manual_deductions, table)?)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

fn error_response(err: ApiErrorResponse, correlation_id: Uuid) -> Response {
    warn!(
        correlation_id = %correlation_id,
        status = err.status.as_u16(),
        code = %err.error.code,
        error = %err.error.message,
        "Request failed"
    );
    json_response(err.status, err.error)
}

/// Maps a body that could not be read into a 400.
fn rejection_response(rejection: JsonRejection, correlation_id: Uuid) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::new("VALIDATION_ERROR", body_text)
            } else if body_text.contains("Unsupported tax class") {
                ApiError::new("UNSUPPORTED_TAX_CLASS", body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    json_response(StatusCode::BAD_REQUEST, error)
}
