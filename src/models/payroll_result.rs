//! The assembled payslip figures.
//!
//! A [`PayrollResult`] is produced once by the assembler and never mutated.
//! Its values are reachable by name through [`PayrollField`], which is how
//! template formulas and label bindings read them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::formula::CellRegistry;

/// Employee social security deductions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialSecurity {
    /// Sickness insurance.
    pub sickness: Decimal,
    /// Pension insurance.
    pub pension: Decimal,
    /// Dependency insurance.
    pub dependency: Decimal,
    /// Sum of the three.
    pub total: Decimal,
}

/// Employer-side contributions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployerContributions {
    /// Sum of the breakdown.
    pub total: Decimal,
    /// Amount per named employer rate.
    pub breakdown: BTreeMap<String, Decimal>,
}

/// The finished payslip.
///
/// Invariants, exact after rounding:
/// - `net_salary == gross_salary - total_deductions`
/// - `total_deductions == income_tax + social_security.total + other_deductions`
/// - `employer_cost == gross_salary + employer_contributions.total`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollResult {
    /// Gross salary.
    pub gross_salary: Decimal,
    /// Income tax withheld.
    pub income_tax: Decimal,
    /// Employee social contributions.
    pub social_security: SocialSecurity,
    /// Manually entered deductions.
    pub other_deductions: Decimal,
    /// Everything withheld from gross.
    pub total_deductions: Decimal,
    /// Take-home pay.
    pub net_salary: Decimal,
    /// Employer contributions on top of gross.
    pub employer_contributions: EmployerContributions,
    /// Total cost to the employer.
    pub employer_cost: Decimal,
}

/// A named slot of a [`PayrollResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PayrollField {
    /// `grossSalary`
    GrossSalary,
    /// `incomeTax`
    IncomeTax,
    /// `sickness`
    Sickness,
    /// `pension`
    Pension,
    /// `dependency`
    Dependency,
    /// `socialSecurityTotal`
    SocialSecurityTotal,
    /// `otherDeductions`
    OtherDeductions,
    /// `totalDeductions`
    TotalDeductions,
    /// `netSalary`
    NetSalary,
    /// `employerContributions`
    EmployerContributions,
    /// `employerCost`
    EmployerCost,
}

impl PayrollField {
    /// Every field, in payslip order.
    pub const ALL: [PayrollField; 11] = [
        PayrollField::GrossSalary,
        PayrollField::IncomeTax,
        PayrollField::Sickness,
        PayrollField::Pension,
        PayrollField::Dependency,
        PayrollField::SocialSecurityTotal,
        PayrollField::OtherDeductions,
        PayrollField::TotalDeductions,
        PayrollField::NetSalary,
        PayrollField::EmployerContributions,
        PayrollField::EmployerCost,
    ];

    /// The identifier formulas use for this field.
    pub fn key(self) -> &'static str {
        match self {
            PayrollField::GrossSalary => "grossSalary",
            PayrollField::IncomeTax => "incomeTax",
            PayrollField::Sickness => "sickness",
            PayrollField::Pension => "pension",
            PayrollField::Dependency => "dependency",
            PayrollField::SocialSecurityTotal => "socialSecurityTotal",
            PayrollField::OtherDeductions => "otherDeductions",
            PayrollField::TotalDeductions => "totalDeductions",
            PayrollField::NetSalary => "netSalary",
            PayrollField::EmployerContributions => "employerContributions",
            PayrollField::EmployerCost => "employerCost",
        }
    }

    /// Looks a field up by its formula identifier.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }
}

impl PayrollResult {
    /// Reads one field.
    pub fn get(&self, field: PayrollField) -> Decimal {
        match field {
            PayrollField::GrossSalary => self.gross_salary,
            PayrollField::IncomeTax => self.income_tax,
            PayrollField::Sickness => self.social_security.sickness,
            PayrollField::Pension => self.social_security.pension,
            PayrollField::Dependency => self.social_security.dependency,
            PayrollField::SocialSecurityTotal => self.social_security.total,
            PayrollField::OtherDeductions => self.other_deductions,
            PayrollField::TotalDeductions => self.total_deductions,
            PayrollField::NetSalary => self.net_salary,
            PayrollField::EmployerContributions => self.employer_contributions.total,
            PayrollField::EmployerCost => self.employer_cost,
        }
    }
}

/// Exposes result fields to formulas by their keys, e.g. `=netSalary/160`.
impl CellRegistry for PayrollResult {
    fn get(&self, reference: &str) -> Option<Decimal> {
        PayrollField::from_key(reference).map(|field| PayrollResult::get(self, field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::evaluate;

    fn sample() -> PayrollResult {
        PayrollResult {
            gross_salary: Decimal::from(5000),
            income_tax: Decimal::from(700),
            social_security: SocialSecurity {
                sickness: Decimal::from(150),
                pension: Decimal::from(400),
                dependency: Decimal::from(60),
                total: Decimal::from(610),
            },
            other_deductions: Decimal::from(40),
            total_deductions: Decimal::from(1350),
            net_salary: Decimal::from(3650),
            employer_contributions: EmployerContributions {
                total: Decimal::from(630),
                breakdown: BTreeMap::new(),
            },
            employer_cost: Decimal::from(5630),
        }
    }

    #[test]
    fn test_keys_round_trip() {
        for field in PayrollField::ALL {
            assert_eq!(PayrollField::from_key(field.key()), Some(field));
        }
        assert_eq!(PayrollField::from_key("NetSalary"), None);
    }

    #[test]
    fn test_serde_names_match_keys() {
        for field in PayrollField::ALL {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.key()));
        }
    }

    #[test]
    fn test_result_is_a_registry() {
        let result = sample();
        assert_eq!(
            evaluate("=netSalary + otherDeductions", &result),
            Ok(Decimal::from(3690))
        );
        assert_eq!(CellRegistry::get(&result, "unknownKey"), None);
    }

    #[test]
    fn test_get_reads_nested_fields() {
        let result = sample();
        assert_eq!(result.get(PayrollField::Pension), Decimal::from(400));
        assert_eq!(result.get(PayrollField::SocialSecurityTotal), Decimal::from(610));
        assert_eq!(result.get(PayrollField::EmployerContributions), Decimal::from(630));
    }

    #[test]
    fn test_serializes_amounts_as_strings() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["net_salary"], "3650");
        assert_eq!(json["social_security"]["pension"], "400");
    }
}
