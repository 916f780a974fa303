//! HTTP API module for the payslip engine.
//!
//! This module exposes payroll calculation, formula evaluation and template
//! field resolution as JSON endpoints.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{FieldsRequest, FormulaRequest, PayrollRequest};
pub use response::{
    ApiError, ApiErrorResponse, FieldsResponse, FormulaErrorBody, FormulaResponse,
    PayslipResponse,
};
pub use state::AppState;
