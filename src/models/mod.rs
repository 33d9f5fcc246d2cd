use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ValuationError;

/// Number of historical multiples kept per company unless configured otherwise
pub const DEFAULT_HISTORY_LEN: usize = 5;

/// Safety margins applied to the target price unless configured otherwise
pub const DEFAULT_MARGINS: [f64; 2] = [0.30, 0.40];

/// A company as entered by the user; the unit of storage and evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub name: String,
    pub current_price: f64,
    pub pe_history: Vec<f64>,
    pub ps_history: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peg_history: Option<Vec<f64>>,
    pub earnings_this_year: f64,
    pub earnings_next_year: f64,
    /// Revenue growth in percent, may be negative
    pub growth_this_year: f64,
    pub growth_next_year: f64,
}

impl CompanyRecord {
    /// Check a record before it is written to a store.
    ///
    /// Unlike evaluation, a zero current price is accepted here: such a
    /// record is stored but skipped by the filters.
    pub fn validate_for_save(&self, history_len: usize) -> Result<(), ValuationError> {
        if self.name.trim().is_empty() {
            return Err(ValuationError::InvalidInput(
                "company name must not be empty".to_string(),
            ));
        }

        if !self.current_price.is_finite() || self.current_price < 0.0 {
            return Err(ValuationError::InvalidInput(format!(
                "{}: current price must be a non-negative number, got {}",
                self.name, self.current_price
            )));
        }

        check_history(&self.name, "P/E", &self.pe_history, history_len)?;
        check_history(&self.name, "P/S", &self.ps_history, history_len)?;
        if let Some(peg) = &self.peg_history {
            check_history(&self.name, "PEG", peg, history_len)?;
        }

        self.check_estimates_finite()
    }

    pub(crate) fn check_estimates_finite(&self) -> Result<(), ValuationError> {
        let estimates = [
            ("earnings this year", self.earnings_this_year),
            ("earnings next year", self.earnings_next_year),
            ("growth this year", self.growth_this_year),
            ("growth next year", self.growth_next_year),
        ];
        for (label, value) in estimates {
            if !value.is_finite() {
                return Err(ValuationError::InvalidInput(format!(
                    "{}: {} is not a finite number",
                    self.name, label
                )));
            }
        }
        Ok(())
    }
}

fn check_history(
    name: &str,
    label: &str,
    values: &[f64],
    history_len: usize,
) -> Result<(), ValuationError> {
    if values.len() != history_len {
        return Err(ValuationError::InvalidInput(format!(
            "{}: expected {} {} values, got {}",
            name,
            history_len,
            label,
            values.len()
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ValuationError::InvalidInput(format!(
            "{}: {} history contains a non-finite value",
            name, label
        )));
    }
    Ok(())
}

/// How a history of multiples is reduced to one number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Mean,
    Median,
}

impl FromStr for Aggregation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mean" | "average" => Ok(Aggregation::Mean),
            "median" => Ok(Aggregation::Median),
            _ => Err(format!("unknown aggregation '{}', expected mean or median", s)),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::Mean => write!(f, "mean"),
            Aggregation::Median => write!(f, "median"),
        }
    }
}

/// Denominator of the undervaluation percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PercentBasis {
    /// (target - price) / target
    #[default]
    Target,
    /// (target - price) / price
    Current,
}

impl FromStr for PercentBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "target" => Ok(PercentBasis::Target),
            "current" | "price" => Ok(PercentBasis::Current),
            _ => Err(format!("unknown percent basis '{}', expected target or current", s)),
        }
    }
}

/// Tunables of the valuation engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationConfig {
    pub aggregation: Aggregation,
    /// Safety margins as fractions, ascending and unique
    pub margins: Vec<f64>,
    pub percent_basis: PercentBasis,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            aggregation: Aggregation::Mean,
            margins: DEFAULT_MARGINS.to_vec(),
            percent_basis: PercentBasis::Target,
        }
    }
}

impl ValuationConfig {
    /// Build a config, normalizing the margins to an ascending set
    pub fn new(
        aggregation: Aggregation,
        margins: Vec<f64>,
        percent_basis: PercentBasis,
    ) -> Result<Self, ValuationError> {
        if let Some(bad) = margins.iter().find(|m| !(m.is_finite() && **m > 0.0 && **m < 1.0)) {
            return Err(ValuationError::InvalidInput(format!(
                "safety margin {} must lie strictly between 0 and 1",
                bad
            )));
        }

        let mut margins = margins;
        margins.sort_by(|a, b| a.total_cmp(b));
        margins.dedup();

        Ok(Self {
            aggregation,
            margins,
            percent_basis,
        })
    }
}

/// Parse a comma separated list such as "0.30,0.40" or "30,40" (percent).
///
/// Values below 1 are fractions, values of 2 or more are percentages.
/// Anything in between could be either and is refused.
pub fn parse_margins(s: &str) -> Result<Vec<f64>, String> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let value: f64 = part
                .parse()
                .map_err(|_| format!("'{}' is not a valid margin", part))?;
            if value < 1.0 {
                Ok(value)
            } else if value >= 2.0 {
                Ok(value / 100.0)
            } else {
                Err(format!(
                    "margin '{}' is ambiguous: write a fraction below 1 (e.g. 0.01) or a percentage of 2 or more",
                    part
                ))
            }
        })
        .collect()
}

/// Supported record store formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Json,
    Csv,
}

impl StoreBackend {
    /// Guess the backend from a file extension, defaulting to SQLite
    pub fn infer(path: &std::path::Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("json") => StoreBackend::Json,
            Some("csv") => StoreBackend::Csv,
            _ => StoreBackend::Sqlite,
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" | "db" => Ok(StoreBackend::Sqlite),
            "json" => Ok(StoreBackend::Json),
            "csv" => Ok(StoreBackend::Csv),
            _ => Err(format!("unknown store backend '{}', expected sqlite, json or csv", s)),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Sqlite => write!(f, "sqlite"),
            StoreBackend::Json => write!(f, "json"),
            StoreBackend::Csv => write!(f, "csv"),
        }
    }
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub backend: StoreBackend,
    pub history_len: usize,
    pub valuation: ValuationConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let database_path = PathBuf::from(
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| "companies.db".to_string()),
        );

        let backend = match std::env::var("STORE_BACKEND") {
            Ok(value) => value.parse().map_err(anyhow::Error::msg)?,
            Err(_) => StoreBackend::infer(&database_path),
        };

        let history_len: usize = match std::env::var("HISTORY_LENGTH") {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("HISTORY_LENGTH must be a positive integer, got '{}'", value))?,
            Err(_) => DEFAULT_HISTORY_LEN,
        };
        if history_len == 0 {
            anyhow::bail!("HISTORY_LENGTH must be at least 1");
        }

        let aggregation = match std::env::var("VALUATION_AGGREGATION") {
            Ok(value) => value.parse().map_err(anyhow::Error::msg)?,
            Err(_) => Aggregation::default(),
        };

        let margins = match std::env::var("SAFETY_MARGINS") {
            Ok(value) => parse_margins(&value).map_err(anyhow::Error::msg)?,
            Err(_) => DEFAULT_MARGINS.to_vec(),
        };

        let percent_basis = match std::env::var("PERCENT_BASIS") {
            Ok(value) => value.parse().map_err(anyhow::Error::msg)?,
            Err(_) => PercentBasis::default(),
        };

        Ok(Config {
            database_path,
            backend,
            history_len,
            valuation: ValuationConfig::new(aggregation, margins, percent_basis)?,
        })
    }
}
