mod classifier;
mod valuation;
