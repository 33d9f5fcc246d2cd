use crate::analysis::{Bucket, BucketSelector};
use crate::error::ValuationError;

/// Presentation rounding to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn money(value: f64) -> String {
    format!("{:.2}", round2(value))
}

pub fn percent(value: f64) -> String {
    format!("{:.2}%", round2(value))
}

/// Margin fraction as a whole percentage, e.g. 0.3 -> "30%"
pub fn margin_label(margin: f64) -> String {
    let pct = margin * 100.0;
    if (pct - pct.round()).abs() < 1e-9 {
        format!("{:.0}%", pct)
    } else {
        format!("{:.1}%", pct)
    }
}

pub fn bucket_label(bucket: Bucket) -> &'static str {
    match bucket {
        Bucket::Overvalued => "Not undervalued",
        Bucket::UndervaluedLow => "Undervalued 0–29.99%",
        Bucket::UndervaluedMid => "Undervalued 30–39.99%",
        Bucket::UndervaluedHigh => "Undervalued ≥40%",
    }
}

pub fn selector_label(selector: BucketSelector) -> &'static str {
    match selector {
        BucketSelector::All => "Show all",
        BucketSelector::AnyUndervalued => "All undervalued",
        BucketSelector::Only(bucket) => bucket_label(bucket),
    }
}

/// User-facing message for a record that cannot be valued
pub fn valuation_error(error: &ValuationError) -> String {
    match error {
        ValuationError::InvalidInput(msg) => format!("Cannot value this company: {}", msg),
        ValuationError::UndefinedValuation { target, .. } => format!(
            "Valuation undefined: target price {} is not positive",
            money(*target)
        ),
    }
}
