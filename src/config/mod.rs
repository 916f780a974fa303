//! Rate table configuration for the payslip engine.
//!
//! Income tax brackets, credits and contribution rates are data, not code.
//! They are loaded from YAML files, one per effective date, so a new tax year
//! is a new file rather than a code change.
//!
//! # Example
//!
//! ```no_run
//! use payslip_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/lu").unwrap();
//! println!("Loaded jurisdiction: {}", config.metadata().name);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    BracketTables, ContributionRates, EmployerRates, JurisdictionMetadata, PayrollConfig,
    RateTable, TaxBracket,
};
