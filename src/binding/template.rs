//! Projecting a payroll result onto template fields.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::error::FormulaError;
use crate::formula::{LayeredRegistry, RecalculationEngine};
use crate::models::{FieldType, PayrollField, PayrollResult, TemplateField};

use super::rules::FieldBindingResolver;

/// Where a resolved field's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldSource {
    /// Bound by label to a payroll value.
    Computed {
        /// The bound payroll field.
        field: PayrollField,
    },
    /// Kept from the value the user entered.
    Manual,
    /// Evaluated from the field's formula.
    Formula,
    /// Nothing bound and nothing entered.
    Empty,
}

/// The value a template field ends up with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedField {
    /// Field identifier.
    pub id: String,
    /// The value, if any.
    pub value: Option<Decimal>,
    /// Where it came from.
    pub source: FieldSource,
    /// Why a formula failed. The value is then zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<FormulaError>,
}

/// Fills every template field.
///
/// - Number fields take the payroll value their label binds to, or keep
///   their manual value.
/// - Formula fields are evaluated against the named payroll values
///   (`netSalary`, `grossSalary`, ...) layered over the other fields'
///   values keyed by field id. Formulas may reference each other.
/// - Text fields are never bound; they keep their manual value.
///
/// # Example
///
/// ```
/// use payslip_engine::binding::{FieldSource, resolve_template};
/// use payslip_engine::models::{PayrollResult, TemplateField};
/// use rust_decimal::Decimal;
/// use std::collections::BTreeMap;
///
/// let result = PayrollResult { net_salary: Decimal::from(3200), ..Default::default() };
/// let fields = vec![
///     TemplateField::number("f1", "Net Pay"),
///     TemplateField::formula("f2", "Hourly net", "=netSalary/160"),
/// ];
///
/// let resolved = resolve_template(&fields, &result, &BTreeMap::new());
/// assert_eq!(resolved[0].value, Some(Decimal::from(3200)));
/// assert_eq!(resolved[1].value, Some(Decimal::from(20)));
/// assert_eq!(resolved[1].source, FieldSource::Formula);
/// ```
pub fn resolve_template(
    fields: &[TemplateField],
    result: &PayrollResult,
    manual_values: &BTreeMap<String, Decimal>,
) -> Vec<ResolvedField> {
    resolve_template_with(&FieldBindingResolver::default(), fields, result, manual_values)
}

/// [`resolve_template`] with a custom rule table.
pub fn resolve_template_with(
    resolver: &FieldBindingResolver,
    fields: &[TemplateField],
    result: &PayrollResult,
    manual_values: &BTreeMap<String, Decimal>,
) -> Vec<ResolvedField> {
    let mut resolved: Vec<ResolvedField> = fields
        .iter()
        .map(|field| bind_field(resolver, field, result, manual_values))
        .collect();

    let mut engine = RecalculationEngine::new();
    for field in fields.iter().filter(|f| f.field_type == FieldType::Formula) {
        engine.declare(field.id.clone(), field.formula.as_deref().unwrap_or_default());
    }
    if engine.is_empty() {
        return resolved;
    }

    let mut field_values = manual_values.clone();
    for field in &resolved {
        if let Some(value) = field.value {
            field_values.insert(field.id.clone(), value);
        }
    }

    let outcome = engine.recalculate(&LayeredRegistry::new(result, &field_values));
    debug!(
        formulas = engine.len(),
        passes = outcome.passes,
        failures = outcome.failures.len(),
        "Evaluated template formulas"
    );

    for field in resolved.iter_mut().filter(|f| f.source == FieldSource::Formula) {
        field.value = outcome.value(&field.id);
        field.error = outcome.failure(&field.id).cloned();
        if let Some(error) = &field.error {
            warn!(
                field = %field.id,
                code = error.code(),
                error = %error,
                "Template formula failed"
            );
        }
    }

    resolved
}

fn bind_field(
    resolver: &FieldBindingResolver,
    field: &TemplateField,
    result: &PayrollResult,
    manual_values: &BTreeMap<String, Decimal>,
) -> ResolvedField {
    let manual = manual_values.get(&field.id).copied();
    let (value, source) = match field.field_type {
        FieldType::Formula => (None, FieldSource::Formula),
        FieldType::Number => match resolver.match_label(&field.label) {
            Some(bound) => (Some(result.get(bound)), FieldSource::Computed { field: bound }),
            None => keep_manual(manual),
        },
        FieldType::Text => keep_manual(manual),
    };

    ResolvedField {
        id: field.id.clone(),
        value,
        source,
        error: None,
    }
}

fn keep_manual(manual: Option<Decimal>) -> (Option<Decimal>, FieldSource) {
    match manual {
        Some(value) => (Some(value), FieldSource::Manual),
        None => (None, FieldSource::Empty),
    }
}
