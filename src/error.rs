//! Error types for the payslip engine.
//!
//! Two families of errors exist. [`FormulaError`] describes why a single
//! formula could not produce a value; it is always returned as a value so one
//! bad formula never aborts its siblings. [`EngineError`] covers payroll
//! calculation and configuration failures.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The reason a formula failed to evaluate.
///
/// # Example
///
/// ```
/// use payslip_engine::error::FormulaError;
///
/// let error = FormulaError::UnknownToken { token: '$', position: 3 };
/// assert_eq!(error.to_string(), "Unknown token '$' at position 3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormulaError {
    /// The formula is not well formed.
    #[error("Syntax error at position {position}: {message}")]
    Syntax {
        /// Character offset in the formula body where the problem was found.
        position: usize,
        /// A description of what was expected.
        message: String,
    },

    /// The formula contains a character outside the arithmetic grammar.
    #[error("Unknown token '{token}' at position {position}")]
    UnknownToken {
        /// The offending character.
        token: char,
        /// Character offset in the formula body.
        position: usize,
    },

    /// A division had a zero divisor.
    #[error("Division by zero")]
    DivisionByZero,

    /// The value of a recalculated target never settled.
    #[error("Circular reference involving '{target}'")]
    CircularReference {
        /// The target whose value kept changing.
        target: String,
    },

    /// An intermediate value exceeded the representable range.
    #[error("Arithmetic overflow")]
    Overflow,
}

impl FormulaError {
    /// A stable machine-readable code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            FormulaError::Syntax { .. } => "SYNTAX_ERROR",
            FormulaError::UnknownToken { .. } => "UNKNOWN_TOKEN",
            FormulaError::DivisionByZero => "DIVISION_BY_ZERO",
            FormulaError::CircularReference { .. } => "CIRCULAR_REFERENCE",
            FormulaError::Overflow => "OVERFLOW",
        }
    }
}

/// The main error type for payroll calculation and configuration.
///
/// # Example
///
/// ```
/// use payslip_engine::error::EngineError;
///
/// let error = EngineError::UnsupportedTaxClass { class: 3 };
/// assert_eq!(error.to_string(), "Unsupported tax class: 3");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A rate table violates its structural rules.
    #[error("Invalid rate table effective {effective_date}: {message}")]
    InvalidRateTable {
        /// The effective date of the offending table.
        effective_date: NaiveDate,
        /// What was wrong with it.
        message: String,
    },

    /// No rate table is effective on the requested date.
    #[error("No rate table effective on {date}")]
    RateTableNotFound {
        /// The date for which a table was requested.
        date: NaiveDate,
    },

    /// The tax class is not one the engine has bracket tables for.
    #[error("Unsupported tax class: {class}")]
    UnsupportedTaxClass {
        /// The rejected class number.
        class: u8,
    },

    /// A monetary input that must be non-negative was negative.
    #[error("Negative value for '{field}': {value}")]
    NegativeInput {
        /// The input field name.
        field: String,
        /// The rejected value.
        value: Decimal,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/rates".to_string(),
        };
        assert_eq!(error.to_string(), "Configuration file not found: /missing/rates");
    }

    #[test]
    fn test_rate_table_not_found_displays_date() {
        let error = EngineError::RateTableNotFound {
            date: NaiveDate::from_ymd_opt(2019, 5, 1).unwrap(),
        };
        assert_eq!(error.to_string(), "No rate table effective on 2019-05-01");
    }

    #[test]
    fn test_negative_input_displays_field_and_value() {
        let error = EngineError::NegativeInput {
            field: "monthly_gross_salary".to_string(),
            value: Decimal::from_str("-10.50").unwrap(),
        };
        assert_eq!(
            error.to_string(),
            "Negative value for 'monthly_gross_salary': -10.50"
        );
    }

    #[test]
    fn test_formula_error_messages() {
        assert_eq!(FormulaError::DivisionByZero.to_string(), "Division by zero");
        assert_eq!(
            FormulaError::CircularReference {
                target: "B15".to_string()
            }
            .to_string(),
            "Circular reference involving 'B15'"
        );
        assert_eq!(
            FormulaError::Syntax {
                position: 4,
                message: "expected ')'".to_string()
            }
            .to_string(),
            "Syntax error at position 4: expected ')'"
        );
    }

    #[test]
    fn test_formula_error_codes() {
        assert_eq!(FormulaError::DivisionByZero.code(), "DIVISION_BY_ZERO");
        assert_eq!(FormulaError::Overflow.code(), "OVERFLOW");
        assert_eq!(
            FormulaError::UnknownToken {
                token: '#',
                position: 0
            }
            .code(),
            "UNKNOWN_TOKEN"
        );
    }

    #[test]
    fn test_formula_error_serializes_with_kind_tag() {
        let json = serde_json::to_value(FormulaError::DivisionByZero).unwrap();
        assert_eq!(json["kind"], "division_by_zero");
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
        assert_error::<FormulaError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_unsupported_class() -> EngineResult<()> {
            Err(EngineError::UnsupportedTaxClass { class: 7 })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_unsupported_class()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
