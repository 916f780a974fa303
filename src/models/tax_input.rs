//! Inputs to a payroll calculation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EngineError, EngineResult};

/// Filing status that selects a bracket table.
///
/// Serialized as its class number, `1` or `2`.
///
/// # Example
///
/// ```
/// use payslip_engine::models::TaxClass;
///
/// assert_eq!(TaxClass::try_from(2).unwrap(), TaxClass::Married);
/// assert!(TaxClass::try_from(3).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TaxClass {
    /// Class 1: single.
    Single,
    /// Class 2: married or partnered.
    Married,
}

impl TaxClass {
    /// The class number as printed on a tax card.
    pub fn number(self) -> u8 {
        match self {
            TaxClass::Single => 1,
            TaxClass::Married => 2,
        }
    }
}

impl TryFrom<u8> for TaxClass {
    type Error = EngineError;

    fn try_from(class: u8) -> EngineResult<Self> {
        match class {
            1 => Ok(TaxClass::Single),
            2 => Ok(TaxClass::Married),
            class => Err(EngineError::UnsupportedTaxClass { class }),
        }
    }
}

impl From<TaxClass> for u8 {
    fn from(class: TaxClass) -> Self {
        class.number()
    }
}

impl fmt::Display for TaxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Everything the tax calculation needs about one monthly payslip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxInput {
    /// Gross salary for the month.
    pub monthly_gross_salary: Decimal,
    /// Filing class.
    pub tax_class: TaxClass,
    /// Whether the taxpayer is entitled to the child credit.
    #[serde(default)]
    pub has_children: bool,
    /// Accepted for a future age-based table; currently has no effect.
    #[serde(default)]
    pub is_over_65: bool,
}

impl TaxInput {
    /// Creates an input with no children and under 65.
    pub fn new(monthly_gross_salary: Decimal, tax_class: TaxClass) -> Self {
        Self {
            monthly_gross_salary,
            tax_class,
            has_children: false,
            is_over_65: false,
        }
    }

    /// Sets the child credit flag.
    pub fn with_children(mut self, has_children: bool) -> Self {
        self.has_children = has_children;
        self
    }

    /// Sets the over-65 flag.
    pub fn over_65(mut self, is_over_65: bool) -> Self {
        self.is_over_65 = is_over_65;
        self
    }

    /// Rejects a negative gross salary.
    pub fn validate(&self) -> EngineResult<()> {
        ensure_non_negative("monthly_gross_salary", self.monthly_gross_salary)
    }
}

/// The parts a gross salary is made of.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrossComponents {
    /// Basic salary.
    #[serde(default)]
    pub basic_salary: Decimal,
    /// Allowances.
    #[serde(default)]
    pub allowances: Decimal,
    /// Overtime pay.
    #[serde(default)]
    pub overtime: Decimal,
    /// Bonus.
    #[serde(default)]
    pub bonus: Decimal,
    /// Sales commission.
    #[serde(default)]
    pub commission: Decimal,
}

impl GrossComponents {
    /// The gross salary: the sum of all components.
    ///
    /// ```
    /// use payslip_engine::models::GrossComponents;
    /// use rust_decimal::Decimal;
    ///
    /// let components = GrossComponents {
    ///     basic_salary: Decimal::from(4000),
    ///     allowances: Decimal::from(300),
    ///     overtime: Decimal::from(200),
    ///     bonus: Decimal::from(400),
    ///     commission: Decimal::from(100),
    /// };
    /// assert_eq!(components.total().unwrap(), Decimal::from(5000));
    /// ```
    pub fn total(&self) -> EngineResult<Decimal> {
        for (field, value) in self.named() {
            ensure_non_negative(field, value)?;
        }
        self.named()
            .iter()
            .try_fold(Decimal::ZERO, |sum, (_, value)| sum.checked_add(*value))
            .ok_or_else(|| EngineError::CalculationError {
                message: "gross components overflow".to_string(),
            })
    }

    /// Components by their formula identifiers.
    pub fn named(&self) -> [(&'static str, Decimal); 5] {
        [
            ("basicSalary", self.basic_salary),
            ("allowances", self.allowances),
            ("overtime", self.overtime),
            ("bonus", self.bonus),
            ("commission", self.commission),
        ]
    }
}

/// A deduction typed in by the user, such as a salary advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualDeduction {
    /// What the deduction is for.
    pub label: String,
    /// Amount withheld; must not be negative.
    pub amount: Decimal,
}

impl ManualDeduction {
    /// Creates a deduction.
    pub fn new(label: impl Into<String>, amount: Decimal) -> Self {
        Self {
            label: label.into(),
            amount,
        }
    }
}

pub(crate) fn ensure_non_negative(field: &str, value: Decimal) -> EngineResult<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(EngineError::NegativeInput {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}
