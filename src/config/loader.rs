//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading rate tables
//! from YAML files, or from the copy of the Luxembourg tables compiled into
//! the crate.

use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};

use super::types::{JurisdictionMetadata, PayrollConfig, RateTable};

const EMBEDDED_JURISDICTION: &str = include_str!("../../config/lu/jurisdiction.yaml");
const EMBEDDED_RATES: &[(&str, &str)] = &[(
    "config/lu/rates/2024-01-01.yaml",
    include_str!("../../config/lu/rates/2024-01-01.yaml"),
)];

/// Loads and provides access to payroll configuration.
///
/// # Directory Structure
///
/// ```text
/// config/lu/
/// ├── jurisdiction.yaml    # Jurisdiction metadata
/// └── rates/
///     └── 2024-01-01.yaml  # Rates effective from this date
/// ```
///
/// # Example
///
/// ```no_run
/// use payslip_engine::config::ConfigLoader;
/// use chrono::NaiveDate;
///
/// let loader = ConfigLoader::load("./config/lu")?;
/// let table = loader.rate_table_for(NaiveDate::from_ymd_opt(2024, 8, 1).unwrap())?;
/// println!("Dependency rate: {}", table.employee.dependency);
/// # Ok::<(), payslip_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: PayrollConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns an error if a required file is missing, a file contains
    /// invalid YAML, the rates directory holds no tables, or a table fails
    /// validation.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let metadata_path = path.join("jurisdiction.yaml");
        let metadata = Self::load_yaml::<JurisdictionMetadata>(&metadata_path)?;

        let rates_dir = path.join("rates");
        let rates = Self::load_rates(&rates_dir)?;

        info!(
            jurisdiction = %metadata.code,
            tables = rates.len(),
            path = %path.display(),
            "Loaded payroll configuration"
        );

        Ok(Self {
            config: PayrollConfig::new(metadata, rates),
        })
    }

    /// Loads the rate tables compiled into the crate.
    ///
    /// ```
    /// use payslip_engine::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::embedded().unwrap();
    /// assert_eq!(loader.config().metadata().code, "LU");
    /// ```
    pub fn embedded() -> EngineResult<Self> {
        let metadata = Self::parse_yaml::<JurisdictionMetadata>(
            "config/lu/jurisdiction.yaml",
            EMBEDDED_JURISDICTION,
        )?;

        let rates = EMBEDDED_RATES
            .iter()
            .map(|(name, content)| Self::parse_rate_table(name, content))
            .collect::<EngineResult<Vec<_>>>()?;

        Ok(Self {
            config: PayrollConfig::new(metadata, rates),
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        Self::parse_yaml(&path_str, &content)
    }

    fn parse_yaml<T: serde::de::DeserializeOwned>(path: &str, content: &str) -> EngineResult<T> {
        serde_yaml::from_str(content).map_err(|e| EngineError::ConfigParseError {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    fn parse_rate_table(path: &str, content: &str) -> EngineResult<RateTable> {
        let table = Self::parse_yaml::<RateTable>(path, content)?;
        table.validate()?;
        debug!(path, effective_date = %table.effective_date, "Parsed rate table");
        Ok(table)
    }

    /// Loads all rate files from the rates directory.
    fn load_rates(rates_dir: &Path) -> EngineResult<Vec<RateTable>> {
        let rates_dir_str = rates_dir.display().to_string();

        if !rates_dir.exists() {
            return Err(EngineError::ConfigNotFound {
                path: rates_dir_str,
            });
        }

        let entries = fs::read_dir(rates_dir).map_err(|_| EngineError::ConfigNotFound {
            path: rates_dir_str.clone(),
        })?;

        let mut rates = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: rates_dir_str.clone(),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                let path_str = path.display().to_string();
                let content = fs::read_to_string(&path).map_err(|_| EngineError::ConfigNotFound {
                    path: path_str.clone(),
                })?;
                rates.push(Self::parse_rate_table(&path_str, &content)?);
            }
        }

        if rates.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no rate files found)", rates_dir_str),
            });
        }

        Ok(rates)
    }

    /// Returns the underlying payroll configuration.
    pub fn config(&self) -> &PayrollConfig {
        &self.config
    }

    /// Returns the jurisdiction metadata.
    pub fn metadata(&self) -> &JurisdictionMetadata {
        self.config.metadata()
    }

    /// Gets the rate table in force on `date`.
    pub fn rate_table_for(&self, date: NaiveDate) -> EngineResult<&RateTable> {
        self.config.rate_table_for(date)
    }
}
