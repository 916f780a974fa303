//! Ordered keyword rules mapping field labels to payroll values.
//!
//! Labels are free text typed by whoever designed the template ("Net Pay",
//! "Impôt sur le revenu / Income tax", "Employer cost"). A label is trimmed
//! and lowercased, then tested against the rules in order; the first rule
//! that matches decides the field.
//!
//! Keywords match whole words, singular or plural, so "Internet allowance"
//! is not net pay and "Career bonus" is not long-term care.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{PayrollField, PayrollResult};

/// A keyword test on a normalized label.
///
/// A label matches when it has every `all_of` keyword, at least one
/// `any_of` keyword (if any are listed) and none of the `none_of` keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LabelPredicate {
    /// Keywords that must all appear.
    pub all_of: &'static [&'static str],
    /// Keywords of which one must appear; ignored when empty.
    pub any_of: &'static [&'static str],
    /// Keywords that must not appear.
    pub none_of: &'static [&'static str],
}

impl LabelPredicate {
    /// Tests an already-normalized label.
    pub fn matches(&self, normalized: &str) -> bool {
        let words: Vec<&str> = label_words(normalized).collect();
        let has = |keyword: &&str| words.iter().any(|word| word_matches(word, keyword));

        self.all_of.iter().all(has)
            && (self.any_of.is_empty() || self.any_of.iter().any(has))
            && !self.none_of.iter().any(has)
    }
}

/// Splits a label on anything that is not a letter or digit.
fn label_words(normalized: &str) -> impl Iterator<Item = &str> {
    normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
}

/// `word` is `keyword` or its plural ("deductions", "taxes").
fn word_matches(word: &str, keyword: &str) -> bool {
    if word == keyword {
        return true;
    }
    match word.strip_suffix('s') {
        Some(stem) => stem == keyword || stem.strip_suffix('e') == Some(keyword),
        None => false,
    }
}

/// One entry of the binding table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BindingRule {
    /// Short name for logs and diagnostics.
    pub name: &'static str,
    /// The label test.
    pub predicate: LabelPredicate,
    /// The field bound when the test passes.
    pub field: PayrollField,
}

const fn rule(
    name: &'static str,
    all_of: &'static [&'static str],
    any_of: &'static [&'static str],
    none_of: &'static [&'static str],
    field: PayrollField,
) -> BindingRule {
    BindingRule {
        name,
        predicate: LabelPredicate {
            all_of,
            any_of,
            none_of,
        },
        field,
    }
}

/// The standard binding table. Order matters: "Employer cost" must reach
/// the cost rule before the employer rule, "Gross salary" must not be read
/// as a cost, and "Other deductions" must win over "Total deductions".
pub const DEFAULT_RULES: [BindingRule; 11] = [
    rule("cost", &["cost"], &[], &[], PayrollField::EmployerCost),
    rule("gross", &["gross"], &[], &["cost"], PayrollField::GrossSalary),
    rule("net", &["net"], &[], &[], PayrollField::NetSalary),
    rule("employer", &["employer"], &[], &[], PayrollField::EmployerContributions),
    rule("tax", &["tax"], &[], &["social"], PayrollField::IncomeTax),
    rule("sickness", &[], &["sickness", "health"], &[], PayrollField::Sickness),
    rule("pension", &["pension"], &[], &[], PayrollField::Pension),
    rule("dependency", &[], &["dependency", "care"], &[], PayrollField::Dependency),
    rule("social", &[], &["social", "contribution"], &[], PayrollField::SocialSecurityTotal),
    rule(
        "other_deductions",
        &["deduction"],
        &["other", "manual"],
        &[],
        PayrollField::OtherDeductions,
    ),
    rule("total_deductions", &["deduction"], &[], &[], PayrollField::TotalDeductions),
];

/// Matches labels against an ordered rule table.
///
/// # Example
///
/// ```
/// use payslip_engine::binding::FieldBindingResolver;
/// use payslip_engine::models::PayrollField;
///
/// let resolver = FieldBindingResolver::default();
/// assert_eq!(resolver.match_label("  Net Pay "), Some(PayrollField::NetSalary));
/// assert_eq!(resolver.match_label("Employer cost"), Some(PayrollField::EmployerCost));
/// assert_eq!(resolver.match_label("Random Label"), None);
/// ```
#[derive(Debug, Clone)]
pub struct FieldBindingResolver {
    rules: Vec<BindingRule>,
}

impl Default for FieldBindingResolver {
    fn default() -> Self {
        Self::new(DEFAULT_RULES.to_vec())
    }
}

impl FieldBindingResolver {
    /// Creates a resolver over a custom rule table.
    pub fn new(rules: Vec<BindingRule>) -> Self {
        Self { rules }
    }

    /// The rules, in evaluation order.
    pub fn rules(&self) -> &[BindingRule] {
        &self.rules
    }

    /// The first rule matching `label`, if any.
    pub fn match_rule(&self, label: &str) -> Option<&BindingRule> {
        first_match(&self.rules, label)
    }

    /// The field bound to `label`, if any.
    pub fn match_label(&self, label: &str) -> Option<PayrollField> {
        self.match_rule(label).map(|rule| rule.field)
    }

    /// The value bound to `label`, read from `result`.
    pub fn resolve(&self, label: &str, result: &PayrollResult) -> Option<Decimal> {
        self.match_label(label).map(|field| result.get(field))
    }
}

/// The first rule in `rules` matching `label`.
fn first_match<'r>(rules: &'r [BindingRule], label: &str) -> Option<&'r BindingRule> {
    let normalized = normalize_label(label);
    if normalized.is_empty() {
        return None;
    }
    rules.iter().find(|rule| rule.predicate.matches(&normalized))
}

/// Trims and lowercases a label.
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Resolves a label with the standard rule table.
///
/// Returns `None` when no rule matches; the caller keeps whatever value the
/// field already had.
///
/// # Example
///
/// ```
/// use payslip_engine::binding::resolve_field_value;
/// use payslip_engine::models::PayrollResult;
/// use rust_decimal::Decimal;
///
/// let result = PayrollResult { net_salary: Decimal::from(3200), ..Default::default() };
/// assert_eq!(resolve_field_value("Net Pay", &result), Some(Decimal::from(3200)));
/// assert_eq!(resolve_field_value("Random Label", &result), None);
/// ```
pub fn resolve_field_value(label: &str, result: &PayrollResult) -> Option<Decimal> {
    first_match(&DEFAULT_RULES, label).map(|rule| result.get(rule.field))
}
