//! Audit trail models.
//!
//! Every calculation step records its inputs, outputs and a human-readable
//! explanation, so a payslip figure can always be traced back to the rates
//! that produced it.

use serde::{Deserialize, Serialize};

/// A single step in the audit trace recording a calculation decision.
///
/// # Example
///
/// ```
/// use payslip_engine::models::AuditStep;
///
/// let step = AuditStep {
///     step_number: 1,
///     rule_id: "income_tax".to_string(),
///     rule_name: "Income Tax".to_string(),
///     rate_source: "rates 2024-01-01, class 1".to_string(),
///     input: serde_json::json!({ "monthly_gross_salary": "5000" }),
///     output: serde_json::json!({ "tax": "712.34" }),
///     reasoning: "Marginal brackets applied to annualized income".to_string(),
/// };
/// assert_eq!(step.rule_id, "income_tax");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The rate table entry the rule used.
    pub rate_source: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during calculation.
///
/// Warnings indicate potential issues that don't prevent calculation
/// but may require attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level (e.g., "low", "medium", "high").
    pub severity: String,
}

impl AuditWarning {
    /// Creates a warning.
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        severity: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity: severity.into(),
        }
    }
}

/// The complete audit trace for a calculation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during calculation.
    pub warnings: Vec<AuditWarning>,
    /// The total calculation duration in microseconds.
    pub duration_us: u64,
}

impl AuditTrace {
    /// The number the next pushed step should carry.
    pub fn next_step_number(&self) -> u32 {
        self.steps.len() as u32 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_trace_serialization() {
        let trace = AuditTrace {
            steps: vec![],
            warnings: vec![AuditWarning::new("CODE", "message", "low")],
            duration_us: 42,
        };
        let json = serde_json::to_value(&trace).unwrap();
        assert_eq!(json["duration_us"], 42);
        assert_eq!(json["warnings"][0]["code"], "CODE");
    }

    #[test]
    fn test_next_step_number_starts_at_one() {
        let mut trace = AuditTrace::default();
        assert_eq!(trace.next_step_number(), 1);
        trace.steps.push(AuditStep {
            step_number: 1,
            rule_id: "r".to_string(),
            rule_name: "R".to_string(),
            rate_source: "s".to_string(),
            input: serde_json::Value::Null,
            output: serde_json::Value::Null,
            reasoning: String::new(),
        });
        assert_eq!(trace.next_step_number(), 2);
    }
}
