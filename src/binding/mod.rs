//! Label-driven field binding.
//!
//! Decides which computed payroll value goes into which template field,
//! using an ordered keyword rule table over the field label, and evaluates
//! template formulas against the named result values.

mod rules;
mod template;

pub use rules::{
    BindingRule, DEFAULT_RULES, FieldBindingResolver, LabelPredicate, normalize_label,
    resolve_field_value,
};
pub use template::{FieldSource, ResolvedField, resolve_template, resolve_template_with};
