use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use super::{check_record, RecordStore};
use crate::error::{StoreError, StoreResult};
use crate::models::CompanyRecord;

const HISTORY_LEN_KEY: &str = "history_len";

/// System metadata row
#[derive(Debug, Clone)]
pub struct SystemMetadata {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// SQLite-backed store: one `companies` row per company, multiples in a child table
#[derive(Debug)]
pub struct SqliteStore {
    connection: Connection,
    history_len: usize,
}

impl SqliteStore {
    /// Open (or create) the database at `path`
    pub fn open(path: &Path, history_len: usize) -> StoreResult<Self> {
        let connection = Connection::open(path)?;
        let store = Self::init(connection, history_len)?;
        info!("Database initialized at {}", path.display());
        Ok(store)
    }

    /// Throwaway store, mainly for tests
    pub fn open_in_memory(history_len: usize) -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?, history_len)
    }

    fn init(connection: Connection, history_len: usize) -> StoreResult<Self> {
        let mut store = SqliteStore {
            connection,
            history_len,
        };
        store.run_migrations()?;
        store.check_history_len()?;
        Ok(store)
    }

    fn run_migrations(&self) -> StoreResult<()> {
        self.connection.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS companies (
                name TEXT PRIMARY KEY NOT NULL,
                current_price REAL NOT NULL,
                earnings_this_year REAL NOT NULL,
                earnings_next_year REAL NOT NULL,
                growth_this_year REAL NOT NULL,
                growth_next_year REAL NOT NULL,
                has_peg INTEGER NOT NULL DEFAULT 0,
                updated_at DATETIME
            );

            CREATE TABLE IF NOT EXISTS company_multiples (
                company_name TEXT NOT NULL,
                kind TEXT NOT NULL CHECK (kind IN ('pe', 'ps', 'peg')),
                position INTEGER NOT NULL,
                value REAL NOT NULL,
                PRIMARY KEY (company_name, kind, position),
                FOREIGN KEY (company_name) REFERENCES companies(name) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS metadata (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME
            );

            CREATE INDEX IF NOT EXISTS idx_company_multiples_name
                ON company_multiples(company_name);",
        )?;

        debug!("Database migrations completed successfully");
        Ok(())
    }

    /// Record the arity on first use and refuse a mismatching one afterwards
    fn check_history_len(&mut self) -> StoreResult<()> {
        match self.get_metadata(HISTORY_LEN_KEY)? {
            Some(meta) => {
                let found: usize = meta.value.parse().map_err(|_| {
                    StoreError::Corrupt(format!("history_len metadata is '{}'", meta.value))
                })?;
                if found != self.history_len {
                    return Err(StoreError::HistoryLengthMismatch {
                        expected: self.history_len,
                        found,
                    });
                }
            }
            None => self.set_metadata(HISTORY_LEN_KEY, &self.history_len.to_string())?,
        }
        Ok(())
    }

    pub fn get_metadata(&self, key: &str) -> StoreResult<Option<SystemMetadata>> {
        let meta = self
            .connection
            .query_row(
                "SELECT key, value, updated_at FROM metadata WHERE key = ?1",
                params![key],
                |row| {
                    Ok(SystemMetadata {
                        key: row.get(0)?,
                        value: row.get(1)?,
                        updated_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(meta)
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> StoreResult<()> {
        self.connection.execute(
            "INSERT OR REPLACE INTO metadata (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, Utc::now()],
        )?;
        Ok(())
    }

    /// When a company was last saved
    pub fn last_saved(&self, name: &str) -> StoreResult<Option<DateTime<Utc>>> {
        let saved = self
            .connection
            .query_row(
                "SELECT updated_at FROM companies WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(saved)
    }

    fn load_multiples(&self) -> StoreResult<HashMap<(String, String), Vec<f64>>> {
        let mut stmt = self.connection.prepare(
            "SELECT company_name, kind, value FROM company_multiples
             ORDER BY company_name, kind, position",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?;

        let mut multiples: HashMap<(String, String), Vec<f64>> = HashMap::new();
        for row in rows {
            let (name, kind, value) = row?;
            multiples.entry((name, kind)).or_default().push(value);
        }
        Ok(multiples)
    }
}

impl RecordStore for SqliteStore {
    fn load(&self) -> StoreResult<Vec<CompanyRecord>> {
        let mut multiples = self.load_multiples()?;

        let mut stmt = self.connection.prepare(
            "SELECT name, current_price, earnings_this_year, earnings_next_year,
                    growth_this_year, growth_next_year, has_peg
             FROM companies
             ORDER BY name",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                CompanyRecord {
                    name: row.get(0)?,
                    current_price: row.get(1)?,
                    pe_history: Vec::new(),
                    ps_history: Vec::new(),
                    peg_history: None,
                    earnings_this_year: row.get(2)?,
                    earnings_next_year: row.get(3)?,
                    growth_this_year: row.get(4)?,
                    growth_next_year: row.get(5)?,
                },
                row.get::<_, bool>(6)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (mut record, has_peg) = row?;
            let mut take = |kind: &str| {
                multiples
                    .remove(&(record.name.clone(), kind.to_string()))
                    .unwrap_or_default()
            };
            record.pe_history = take("pe");
            record.ps_history = take("ps");
            let peg = take("peg");
            if has_peg {
                record.peg_history = Some(peg);
            }

            let arity_ok = record.pe_history.len() == self.history_len
                && record.ps_history.len() == self.history_len
                && record
                    .peg_history
                    .as_ref()
                    .map_or(true, |p| p.len() == self.history_len);
            if !arity_ok {
                return Err(StoreError::Corrupt(format!(
                    "multiples for '{}' do not have {} entries",
                    record.name, self.history_len
                )));
            }
            records.push(record);
        }

        Ok(records)
    }

    fn get(&self, name: &str) -> StoreResult<Option<CompanyRecord>> {
        let exists: Option<i64> = self
            .connection
            .query_row(
                "SELECT 1 FROM companies WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Ok(None);
        }
        Ok(self.load()?.into_iter().find(|r| r.name == name))
    }

    fn save(&mut self, record: &CompanyRecord) -> StoreResult<()> {
        check_record(record, self.history_len)?;

        let tx = self.connection.transaction()?;
        tx.execute(
            "INSERT INTO companies (
                name, current_price, earnings_this_year, earnings_next_year,
                growth_this_year, growth_next_year, has_peg, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(name) DO UPDATE SET
                current_price = excluded.current_price,
                earnings_this_year = excluded.earnings_this_year,
                earnings_next_year = excluded.earnings_next_year,
                growth_this_year = excluded.growth_this_year,
                growth_next_year = excluded.growth_next_year,
                has_peg = excluded.has_peg,
                updated_at = excluded.updated_at",
            params![
                record.name,
                record.current_price,
                record.earnings_this_year,
                record.earnings_next_year,
                record.growth_this_year,
                record.growth_next_year,
                record.peg_history.is_some(),
                Utc::now(),
            ],
        )?;

        tx.execute(
            "DELETE FROM company_multiples WHERE company_name = ?1",
            params![record.name],
        )?;

        {
            let mut insert = tx.prepare(
                "INSERT INTO company_multiples (company_name, kind, position, value)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            let histories = [
                ("pe", Some(&record.pe_history)),
                ("ps", Some(&record.ps_history)),
                ("peg", record.peg_history.as_ref()),
            ];
            for (kind, values) in histories {
                for (position, value) in values.into_iter().flatten().enumerate() {
                    insert.execute(params![record.name, kind, position as i64, value])?;
                }
            }
        }

        tx.commit()?;
        info!("Saved {}", record.name);
        Ok(())
    }

    fn delete(&mut self, name: &str) -> StoreResult<()> {
        let tx = self.connection.transaction()?;
        tx.execute(
            "DELETE FROM company_multiples WHERE company_name = ?1",
            params![name],
        )?;
        let removed = tx.execute("DELETE FROM companies WHERE name = ?1", params![name])?;
        if removed == 0 {
            return Err(StoreError::RecordNotFound(name.to_string()));
        }
        tx.commit()?;

        info!("Deleted {}", name);
        Ok(())
    }

    fn history_len(&self) -> usize {
        self.history_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    fn record(name: &str, price: f64) -> CompanyRecord {
        CompanyRecord {
            name: name.to_string(),
            current_price: price,
            pe_history: vec![20.0, 22.0, 19.0, 25.0, 21.0],
            ps_history: vec![4.0, 4.2, 3.9, 4.5, 4.1],
            peg_history: Some(vec![1.2, 1.3, 1.1, 1.4, 1.0]),
            earnings_this_year: 7.5,
            earnings_next_year: 8.25,
            growth_this_year: 12.0,
            growth_next_year: -3.5,
        }
    }

    #[test]
    fn test_save_load_roundtrip_and_upsert() {
        let mut store = SqliteStore::open_in_memory(5).unwrap();
        store.save(&record("Volvo", 280.0)).unwrap();
        store.save(&record("Atlas Copco", 160.0)).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].name, "Atlas Copco");
        assert_eq!(loaded[1], record("Volvo", 280.0));

        let mut updated = record("Volvo", 300.0);
        updated.peg_history = None;
        store.save(&updated).unwrap();
        assert_eq!(store.get("Volvo").unwrap(), Some(updated));
        assert_eq!(store.load().unwrap().len(), 2);
        assert!(store.last_saved("Volvo").unwrap().is_some());
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let mut store = SqliteStore::open_in_memory(5).unwrap();
        store.save(&record("Volvo", 280.0)).unwrap();

        store.delete("Volvo").unwrap();
        assert_eq!(store.get("Volvo").unwrap(), None);
        assert_matches!(store.delete("Volvo"), Err(StoreError::RecordNotFound(name)) if name == "Volvo");
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut store = SqliteStore::open_in_memory(5).unwrap();
        store.save(&record("abb", 10.0)).unwrap();
        store.save(&record("ABB", 20.0)).unwrap();
        assert_eq!(store.load().unwrap().len(), 2);
    }

    #[test]
    fn test_history_len_is_pinned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("companies.db");

        SqliteStore::open(&path, 5).unwrap();
        assert_matches!(
            SqliteStore::open(&path, 4),
            Err(StoreError::HistoryLengthMismatch { expected: 4, found: 5 })
        );

        let store = SqliteStore::open(&path, 5).unwrap();
        assert_eq!(store.get_metadata(HISTORY_LEN_KEY).unwrap().unwrap().value, "5");
    }

    #[test]
    fn test_rejects_invalid_record() {
        let mut store = SqliteStore::open_in_memory(5).unwrap();
        let mut bad = record("", 1.0);
        assert_matches!(store.save(&bad), Err(StoreError::InvalidInput(_)));

        bad.name = "Short".to_string();
        bad.pe_history.pop();
        assert_matches!(store.save(&bad), Err(StoreError::InvalidInput(_)));
        assert!(store.load().unwrap().is_empty());
    }
}
