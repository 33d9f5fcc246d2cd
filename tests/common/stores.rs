//! Throwaway stores for tests, one per backend

use std::path::PathBuf;
use stock_valuator::database::{open_store, RecordStore};
use stock_valuator::models::StoreBackend;
use tempfile::TempDir;

pub const ALL_BACKENDS: [StoreBackend; 3] = [StoreBackend::Sqlite, StoreBackend::Json, StoreBackend::Csv];

/// A store in a temporary directory; the directory lives as long as this value
pub struct TestStore {
    pub dir: TempDir,
    pub backend: StoreBackend,
    pub store: Box<dyn RecordStore>,
}

impl TestStore {
    pub fn path(&self) -> PathBuf {
        store_path(&self.dir, self.backend)
    }

    /// Open the same file again, as a fresh process would
    pub fn reopen(&self, history_len: usize) -> Box<dyn RecordStore> {
        open_store(self.backend, &self.path(), history_len).expect("Failed to reopen store")
    }
}

fn store_path(dir: &TempDir, backend: StoreBackend) -> PathBuf {
    let file = match backend {
        StoreBackend::Sqlite => "companies.db",
        StoreBackend::Json => "companies.json",
        StoreBackend::Csv => "companies.csv",
    };
    dir.path().join(file)
}

/// Create an empty store of the given backend
pub fn init_fresh_test_store(backend: StoreBackend, history_len: usize) -> TestStore {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = open_store(backend, &store_path(&dir, backend), history_len).expect("Failed to open store");
    TestStore { dir, backend, store }
}
