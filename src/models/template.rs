//! Template field descriptions supplied by the template editor.

use serde::{Deserialize, Serialize};

/// How a template field is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// A number bound by label or typed in by the user.
    Number,
    /// A computed value from a formula.
    Formula,
    /// Free text; never bound to a payroll value.
    Text,
}

/// One field of a payslip template. Read-only to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateField {
    /// Stable field identifier.
    pub id: String,
    /// Label shown on the payslip.
    pub label: String,
    /// How the field is filled.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Formula source for [`FieldType::Formula`] fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

impl TemplateField {
    /// A number field.
    pub fn number(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            field_type: FieldType::Number,
            formula: None,
        }
    }

    /// A formula field.
    pub fn formula(
        id: impl Into<String>,
        label: impl Into<String>,
        formula: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            field_type: FieldType::Formula,
            formula: Some(formula.into()),
        }
    }
}
