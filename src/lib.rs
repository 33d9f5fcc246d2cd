pub mod analysis;
pub mod commands;
pub mod database;
pub mod error;
pub mod models;
pub mod ui;
pub mod utils;

pub use analysis::{classify, Bucket, BucketSelector, ValuationEngine, ValuationResult};
pub use database::{open_store, RecordStore};
pub use error::{StoreError, ValuationError};
pub use models::{CompanyRecord, Config, ValuationConfig};
