use thiserror::Error;

/// Failures of the valuation engine. Both are surfaced to the user; neither
/// is ever coalesced into a zero result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValuationError {
    /// The record cannot be evaluated as entered.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The target price came out zero or negative (e.g. loss-making
    /// estimates), so neither a percentage nor buy prices exist.
    #[error("valuation undefined for {name}: target price {target} is not positive")]
    UndefinedValuation { name: String, target: f64 },
}

/// Failures of a record store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no company named '{0}' in the store")]
    RecordNotFound(String),

    /// The store was created with a different multiple-history arity.
    #[error("store holds histories of length {found}, expected {expected}")]
    HistoryLengthMismatch { expected: usize, found: usize },

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data that cannot be mapped back onto a company record.
    #[error("corrupt store: {0}")]
    Corrupt(String),
}

impl From<ValuationError> for StoreError {
    fn from(e: ValuationError) -> Self {
        match e {
            ValuationError::InvalidInput(msg) => StoreError::InvalidInput(msg),
            other => StoreError::InvalidInput(other.to_string()),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
