pub mod classifier;
pub mod valuation;

pub use classifier::{classify, Bucket, BucketSelector, ScreenedCompany};
pub use valuation::{aggregate, MarginPrice, ValuationEngine, ValuationResult};
