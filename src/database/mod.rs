//! Record stores for saved companies.
//!
//! Every backend keeps one record per company name and enforces a single
//! history length for the whole store.

mod csv_store;
mod json_store;
mod sqlite;

pub use csv_store::CsvStore;
pub use json_store::JsonStore;
pub use sqlite::SqliteStore;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::path::Path;
use tracing::info;

use crate::error::{StoreError, StoreResult};
use crate::models::{CompanyRecord, StoreBackend};

/// Persistence contract for company records
#[cfg_attr(test, mockall::automock)]
pub trait RecordStore {
    /// All records, ordered by name
    fn load(&self) -> StoreResult<Vec<CompanyRecord>>;

    /// Insert or replace the record with the same name
    fn save(&mut self, record: &CompanyRecord) -> StoreResult<()>;

    /// Remove a record; `RecordNotFound` when the name is absent
    fn delete(&mut self, name: &str) -> StoreResult<()>;

    /// Multiple-history arity enforced by this store
    fn history_len(&self) -> usize;

    /// Single record by exact name
    fn get(&self, name: &str) -> StoreResult<Option<CompanyRecord>> {
        Ok(self.load()?.into_iter().find(|r| r.name == name))
    }

    fn names(&self) -> StoreResult<Vec<String>> {
        Ok(self.load()?.into_iter().map(|r| r.name).collect())
    }
}

/// Open the store at `path` with the requested backend
pub fn open_store(
    backend: StoreBackend,
    path: &Path,
    history_len: usize,
) -> StoreResult<Box<dyn RecordStore>> {
    if history_len == 0 {
        return Err(StoreError::InvalidInput(
            "history length must be at least 1".to_string(),
        ));
    }

    let store: Box<dyn RecordStore> = match backend {
        StoreBackend::Sqlite => Box::new(SqliteStore::open(path, history_len)?),
        StoreBackend::Json => Box::new(JsonStore::open(path, history_len)?),
        StoreBackend::Csv => Box::new(CsvStore::open(path, history_len)?),
    };
    info!("Opened {} store at {}", backend, path.display());
    Ok(store)
}

/// Validate a record against the store's arity before writing it
pub(crate) fn check_record(record: &CompanyRecord, history_len: usize) -> StoreResult<()> {
    record.validate_for_save(history_len)?;
    Ok(())
}

/// Saved names resembling `query`, best match first
pub fn find_similar_names(names: &[String], query: &str) -> Vec<String> {
    let matcher = SkimMatcherV2::default().ignore_case();
    let mut scored: Vec<(i64, &String)> = names
        .iter()
        .filter_map(|name| matcher.fuzzy_match(name, query).map(|score| (score, name)))
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored.into_iter().map(|(_, name)| name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_similar_names() {
        let names = vec![
            "Atlas Copco".to_string(),
            "Evolution".to_string(),
            "Investor AB".to_string(),
        ];

        let hits = find_similar_names(&names, "atlas");
        assert_eq!(hits.first().map(String::as_str), Some("Atlas Copco"));

        assert!(find_similar_names(&names, "zzzz").is_empty());
    }

    #[test]
    fn test_open_store_rejects_zero_history() {
        let dir = tempfile::tempdir().unwrap();
        let result = open_store(StoreBackend::Json, &dir.path().join("c.json"), 0);
        assert!(matches!(result, Err(StoreError::InvalidInput(_))));
    }
}
