use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::analysis::valuation::{ValuationEngine, ValuationResult};
use crate::models::CompanyRecord;

/// Lower bound (inclusive) of the 30–39.99% bucket
pub const MID_THRESHOLD: f64 = 30.0;
/// Lower bound (inclusive) of the top bucket
pub const HIGH_THRESHOLD: f64 = 40.0;

/// Undervaluation bucket of a company
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Bucket {
    /// pct <= 0
    Overvalued,
    /// 0 < pct < 30
    UndervaluedLow,
    /// 30 <= pct < 40
    UndervaluedMid,
    /// pct >= 40
    UndervaluedHigh,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [
        Bucket::Overvalued,
        Bucket::UndervaluedLow,
        Bucket::UndervaluedMid,
        Bucket::UndervaluedHigh,
    ];

    pub fn is_undervalued(self) -> bool {
        self != Bucket::Overvalued
    }
}

/// Place an undervaluation percentage in its bucket; first match wins
pub fn classify(pct: f64) -> Bucket {
    // Written so that NaN lands in Overvalued
    if !(pct > 0.0) {
        Bucket::Overvalued
    } else if pct < MID_THRESHOLD {
        Bucket::UndervaluedLow
    } else if pct < HIGH_THRESHOLD {
        Bucket::UndervaluedMid
    } else {
        Bucket::UndervaluedHigh
    }
}

/// Which records a listing should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BucketSelector {
    #[default]
    All,
    AnyUndervalued,
    Only(Bucket),
}

impl BucketSelector {
    /// Selectors offered by the interactive filter, in display order
    pub const MENU: [BucketSelector; 4] = [
        BucketSelector::All,
        BucketSelector::AnyUndervalued,
        BucketSelector::Only(Bucket::UndervaluedMid),
        BucketSelector::Only(Bucket::UndervaluedHigh),
    ];

    pub fn matches(self, bucket: Bucket) -> bool {
        match self {
            BucketSelector::All => true,
            BucketSelector::AnyUndervalued => bucket.is_undervalued(),
            BucketSelector::Only(wanted) => bucket == wanted,
        }
    }
}

impl FromStr for BucketSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(BucketSelector::All),
            "undervalued" | "any" => Ok(BucketSelector::AnyUndervalued),
            "overvalued" | "none" => Ok(BucketSelector::Only(Bucket::Overvalued)),
            "low" | "0-30" => Ok(BucketSelector::Only(Bucket::UndervaluedLow)),
            "mid" | "30-40" => Ok(BucketSelector::Only(Bucket::UndervaluedMid)),
            "high" | "40+" => Ok(BucketSelector::Only(Bucket::UndervaluedHigh)),
            _ => Err(format!(
                "unknown filter '{}', expected one of: all, undervalued, overvalued, low, 30-40, 40+",
                s
            )),
        }
    }
}

impl fmt::Display for BucketSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketSelector::All => write!(f, "all"),
            BucketSelector::AnyUndervalued => write!(f, "undervalued"),
            BucketSelector::Only(Bucket::Overvalued) => write!(f, "overvalued"),
            BucketSelector::Only(Bucket::UndervaluedLow) => write!(f, "low"),
            BucketSelector::Only(Bucket::UndervaluedMid) => write!(f, "30-40"),
            BucketSelector::Only(Bucket::UndervaluedHigh) => write!(f, "40+"),
        }
    }
}

/// A record that passed a filter, with its valuation
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenedCompany {
    pub record: CompanyRecord,
    pub valuation: ValuationResult,
}

impl ValuationEngine {
    /// Evaluate every record and keep those the selector accepts.
    ///
    /// Records that fail evaluation are skipped, never reported as errors.
    /// The result is ordered by company name.
    pub fn screen(&self, records: &[CompanyRecord], selector: BucketSelector) -> Vec<ScreenedCompany> {
        let mut screened: Vec<ScreenedCompany> = records
            .iter()
            .filter_map(|record| match self.evaluate(record) {
                Ok(valuation) => Some(ScreenedCompany {
                    record: record.clone(),
                    valuation,
                }),
                Err(e) => {
                    debug!("Skipping {} in filter: {}", record.name, e);
                    None
                }
            })
            .filter(|company| selector.matches(company.valuation.bucket()))
            .collect();

        screened.sort_by(|a, b| a.record.name.cmp(&b.record.name));
        screened
    }

    /// Records whose undervaluation satisfies the selector, ordered by name
    pub fn filter_records(&self, records: &[CompanyRecord], selector: BucketSelector) -> Vec<CompanyRecord> {
        self.screen(records, selector)
            .into_iter()
            .map(|company| company.record)
            .collect()
    }
}
