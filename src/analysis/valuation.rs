// Target price valuation from historical multiples and forward estimates

use serde::{Deserialize, Serialize};

use crate::analysis::classifier::{classify, Bucket};
use crate::error::ValuationError;
use crate::models::{Aggregation, CompanyRecord, PercentBasis, ValuationConfig};

/// Buy-below price for one safety margin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginPrice {
    pub margin: f64,
    pub price: f64,
}

/// Full-precision outcome of a valuation; rounding is left to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub avg_pe: f64,
    pub avg_ps: f64,
    pub avg_peg: Option<f64>,
    pub avg_earnings: f64,
    pub growth_factor: f64,
    pub target_via_pe: f64,
    pub target_via_ps: f64,
    pub target_price: f64,
    pub undervaluation_pct: f64,
    /// One entry per configured margin, ascending by margin
    pub buy_prices: Vec<MarginPrice>,
}

impl ValuationResult {
    /// Buy-below price for a configured margin
    pub fn buy_price(&self, margin: f64) -> Option<f64> {
        self.buy_prices
            .iter()
            .find(|mp| (mp.margin - margin).abs() < 1e-9)
            .map(|mp| mp.price)
    }

    pub fn buy_price_30(&self) -> Option<f64> {
        self.buy_price(0.30)
    }

    pub fn buy_price_40(&self) -> Option<f64> {
        self.buy_price(0.40)
    }

    pub fn bucket(&self) -> Bucket {
        classify(self.undervaluation_pct)
    }
}

/// Reduce a history of multiples to a single value.
///
/// Callers guarantee a non-empty slice.
pub fn aggregate(values: &[f64], aggregation: Aggregation) -> f64 {
    match aggregation {
        Aggregation::Mean => values.iter().sum::<f64>() / values.len() as f64,
        Aggregation::Median => {
            let mut sorted = values.to_vec();
            sorted.sort_by(|a, b| a.total_cmp(b));

            let len = sorted.len();
            if len % 2 == 0 {
                (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
            } else {
                sorted[len / 2]
            }
        }
    }
}

/// Stateless valuation engine; holds only its configuration
#[derive(Debug, Clone, Default)]
pub struct ValuationEngine {
    config: ValuationConfig,
}

impl ValuationEngine {
    pub fn new(config: ValuationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValuationConfig {
        &self.config
    }

    /// Compute target price, undervaluation and buy-below prices for a record
    pub fn evaluate(&self, record: &CompanyRecord) -> Result<ValuationResult, ValuationError> {
        validate_for_evaluation(record)?;

        let avg_pe = aggregate(&record.pe_history, self.config.aggregation);
        let avg_ps = aggregate(&record.ps_history, self.config.aggregation);
        let avg_peg = record
            .peg_history
            .as_deref()
            .filter(|peg| !peg.is_empty())
            .map(|peg| aggregate(peg, self.config.aggregation));

        let avg_earnings = (record.earnings_this_year + record.earnings_next_year) / 2.0;
        let growth_factor = 1.0 + (record.growth_this_year + record.growth_next_year) / 200.0;

        let target_via_pe = avg_pe * avg_earnings;
        let target_via_ps = avg_ps * growth_factor * avg_earnings;
        let target_price = (target_via_pe + target_via_ps) / 2.0;

        if target_price <= 0.0 {
            return Err(ValuationError::UndefinedValuation {
                name: record.name.clone(),
                target: target_price,
            });
        }

        let denominator = match self.config.percent_basis {
            PercentBasis::Target => target_price,
            PercentBasis::Current => record.current_price,
        };
        let undervaluation_pct = (target_price - record.current_price) / denominator * 100.0;

        let buy_prices = self
            .config
            .margins
            .iter()
            .map(|&margin| MarginPrice {
                margin,
                price: target_price * (1.0 - margin),
            })
            .collect();

        Ok(ValuationResult {
            avg_pe,
            avg_ps,
            avg_peg,
            avg_earnings,
            growth_factor,
            target_via_pe,
            target_via_ps,
            target_price,
            undervaluation_pct,
            buy_prices,
        })
    }
}

fn validate_for_evaluation(record: &CompanyRecord) -> Result<(), ValuationError> {
    if record.pe_history.is_empty() {
        return Err(ValuationError::InvalidInput(format!(
            "{}: P/E history is empty",
            record.name
        )));
    }
    if record.ps_history.is_empty() {
        return Err(ValuationError::InvalidInput(format!(
            "{}: P/S history is empty",
            record.name
        )));
    }
    if record.pe_history.len() != record.ps_history.len() {
        return Err(ValuationError::InvalidInput(format!(
            "{}: P/E and P/S histories differ in length ({} vs {})",
            record.name,
            record.pe_history.len(),
            record.ps_history.len()
        )));
    }
    if let Some(peg) = &record.peg_history {
        if !peg.is_empty() && peg.len() != record.pe_history.len() {
            return Err(ValuationError::InvalidInput(format!(
                "{}: PEG history has {} values, expected {}",
                record.name,
                peg.len(),
                record.pe_history.len()
            )));
        }
    }

    let multiples = record
        .pe_history
        .iter()
        .chain(&record.ps_history)
        .chain(record.peg_history.iter().flatten());
    if multiples.into_iter().any(|v| !v.is_finite()) {
        return Err(ValuationError::InvalidInput(format!(
            "{}: multiple history contains a non-finite value",
            record.name
        )));
    }

    record.check_estimates_finite()?;

    // NaN fails this comparison too
    if !(record.current_price > 0.0) || record.current_price.is_infinite() {
        return Err(ValuationError::InvalidInput(format!(
            "{}: current price must be greater than zero, got {}",
            record.name, record.current_price
        )));
    }

    Ok(())
}
