//! Rate table types.
//!
//! These structures are deserialized from the YAML files of a jurisdiction
//! configuration directory. Every table carries the date from which it is
//! effective so that a payslip can always be recomputed with the rates of
//! its own period.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::TaxClass;

/// Metadata about the jurisdiction the tables belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JurisdictionMetadata {
    /// Short code (e.g., "LU").
    pub code: String,
    /// Human-readable name.
    pub name: String,
    /// ISO currency code of every monetary amount.
    pub currency: String,
    /// Where the published rates can be checked.
    pub source_url: String,
}

/// One marginal income tax bracket.
///
/// Bounds are annual taxable income. A missing `upper_bound` means the
/// bracket is unbounded; only the last bracket may omit it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// Upper bound of the bracket, `None` for the top bracket.
    #[serde(default)]
    pub upper_bound: Option<Decimal>,
    /// Marginal rate as a fraction.
    pub rate: Decimal,
}

/// Bracket tables by tax class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketTables {
    /// Class 1: single.
    pub class_1: Vec<TaxBracket>,
    /// Class 2: married or partnered.
    pub class_2: Vec<TaxBracket>,
}

/// Employee-side social contribution rates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionRates {
    /// Sickness insurance rate.
    pub sickness: Decimal,
    /// Pension insurance rate.
    pub pension: Decimal,
    /// Dependency (long-term care) insurance rate.
    pub dependency: Decimal,
    /// Monthly amount subtracted from gross before the dependency rate applies.
    pub dependency_abatement: Decimal,
}

/// Employer-side contribution rates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployerRates {
    /// Sickness insurance rate.
    pub sickness: Decimal,
    /// Pension insurance rate.
    pub pension: Decimal,
    /// Accident insurance rate.
    pub accident_insurance: Decimal,
    /// Occupational health service rate.
    pub health_at_work: Decimal,
    /// Employer mutual insurance rate.
    pub mutuality: Decimal,
}

impl EmployerRates {
    /// Named rates, in a stable order.
    pub fn named(&self) -> [(&'static str, Decimal); 5] {
        [
            ("sickness", self.sickness),
            ("pension", self.pension),
            ("accident_insurance", self.accident_insurance),
            ("health_at_work", self.health_at_work),
            ("mutuality", self.mutuality),
        ]
    }
}

/// All rates in force from one effective date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    /// The date from which these rates apply.
    pub effective_date: NaiveDate,
    /// Income tax brackets.
    pub brackets: BracketTables,
    /// Monthly tax credit for taxpayers with children.
    pub child_credit_monthly: Decimal,
    /// Employee contribution rates.
    pub employee: ContributionRates,
    /// Employer contribution rates.
    pub employer: EmployerRates,
}

impl RateTable {
    /// The bracket table for a tax class.
    pub fn brackets_for(&self, class: TaxClass) -> &[TaxBracket] {
        match class {
            TaxClass::Single => &self.brackets.class_1,
            TaxClass::Married => &self.brackets.class_2,
        }
    }

    /// Checks the structural rules every table must follow.
    ///
    /// Brackets must have strictly increasing bounds, end with exactly one
    /// unbounded bracket and have non-decreasing rates. All rates must be
    /// fractions in `[0, 1]`; credits and abatements must not be negative.
    pub fn validate(&self) -> EngineResult<()> {
        let invalid = |message: String| EngineError::InvalidRateTable {
            effective_date: self.effective_date,
            message,
        };

        let tables = [
            ("class_1", &self.brackets.class_1),
            ("class_2", &self.brackets.class_2),
        ];
        for (name, brackets) in tables {
            validate_brackets(brackets).map_err(|m| invalid(format!("{}: {}", name, m)))?;
        }

        let employee = [
            ("employee.sickness", self.employee.sickness),
            ("employee.pension", self.employee.pension),
            ("employee.dependency", self.employee.dependency),
        ];
        for (name, rate) in employee.into_iter().chain(self.employer.named()) {
            if !is_fraction(rate) {
                return Err(invalid(format!(
                    "rate '{}' must be within [0, 1], got {}",
                    name, rate
                )));
            }
        }

        if self.child_credit_monthly.is_sign_negative() {
            return Err(invalid("child_credit_monthly must not be negative".to_string()));
        }
        if self.employee.dependency_abatement.is_sign_negative() {
            return Err(invalid("dependency_abatement must not be negative".to_string()));
        }

        Ok(())
    }
}

fn is_fraction(rate: Decimal) -> bool {
    rate >= Decimal::ZERO && rate <= Decimal::ONE
}

fn validate_brackets(brackets: &[TaxBracket]) -> Result<(), String> {
    let Some((last, rest)) = brackets.split_last() else {
        return Err("no brackets".to_string());
    };
    if last.upper_bound.is_some() {
        return Err("last bracket must be unbounded".to_string());
    }

    let mut previous_bound = Decimal::ZERO;
    let mut previous_rate = Decimal::ZERO;
    for (index, bracket) in brackets.iter().enumerate() {
        if !is_fraction(bracket.rate) {
            return Err(format!("bracket {} rate {} outside [0, 1]", index, bracket.rate));
        }
        if bracket.rate < previous_rate {
            return Err(format!("bracket {} rate decreases", index));
        }
        previous_rate = bracket.rate;

        if index < rest.len() {
            match bracket.upper_bound {
                Some(bound) if bound > previous_bound => previous_bound = bound,
                Some(bound) => {
                    return Err(format!(
                        "bracket {} bound {} is not above {}",
                        index, bound, previous_bound
                    ));
                }
                None => return Err(format!("bracket {} is unbounded but not last", index)),
            }
        }
    }

    Ok(())
}

/// The complete payroll configuration: metadata plus every rate table.
#[derive(Debug, Clone)]
pub struct PayrollConfig {
    metadata: JurisdictionMetadata,
    /// Rate tables sorted oldest first.
    rates: Vec<RateTable>,
}

impl PayrollConfig {
    /// Creates a configuration, sorting tables by effective date.
    pub fn new(metadata: JurisdictionMetadata, rates: Vec<RateTable>) -> Self {
        let mut sorted_rates = rates;
        sorted_rates.sort_by(|a, b| a.effective_date.cmp(&b.effective_date));
        Self {
            metadata,
            rates: sorted_rates,
        }
    }

    /// Returns the jurisdiction metadata.
    pub fn metadata(&self) -> &JurisdictionMetadata {
        &self.metadata
    }

    /// Returns all rate tables, oldest first.
    pub fn rates(&self) -> &[RateTable] {
        &self.rates
    }

    /// The most recent table effective on or before `date`.
    pub fn rate_table_for(&self, date: NaiveDate) -> EngineResult<&RateTable> {
        self.rates
            .iter()
            .rfind(|table| table.effective_date <= date)
            .ok_or(EngineError::RateTableNotFound { date })
    }

    /// The most recent table overall.
    pub fn latest(&self) -> Option<&RateTable> {
        self.rates.last()
    }
}
