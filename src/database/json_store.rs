use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{check_record, RecordStore};
use crate::error::{StoreError, StoreResult};
use crate::models::CompanyRecord;

/// Per-company entry in the JSON document; the name is the object key
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredCompany {
    pe: Vec<f64>,
    ps: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    peg: Option<Vec<f64>>,
    earnings_this_year: f64,
    earnings_next_year: f64,
    growth_this_year: f64,
    growth_next_year: f64,
    current_price: f64,
}

impl StoredCompany {
    fn from_record(record: &CompanyRecord) -> Self {
        Self {
            pe: record.pe_history.clone(),
            ps: record.ps_history.clone(),
            peg: record.peg_history.clone(),
            earnings_this_year: record.earnings_this_year,
            earnings_next_year: record.earnings_next_year,
            growth_this_year: record.growth_this_year,
            growth_next_year: record.growth_next_year,
            current_price: record.current_price,
        }
    }

    fn into_record(self, name: String) -> CompanyRecord {
        CompanyRecord {
            name,
            current_price: self.current_price,
            pe_history: self.pe,
            ps_history: self.ps,
            peg_history: self.peg,
            earnings_this_year: self.earnings_this_year,
            earnings_next_year: self.earnings_next_year,
            growth_this_year: self.growth_this_year,
            growth_next_year: self.growth_next_year,
        }
    }
}

/// JSON document keyed by company name, rewritten on every change
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    history_len: usize,
    companies: BTreeMap<String, StoredCompany>,
}

impl JsonStore {
    pub fn open(path: &Path, history_len: usize) -> StoreResult<Self> {
        let companies: BTreeMap<String, StoredCompany> = if path.exists() {
            let text = fs::read_to_string(path)?;
            if text.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&text)?
            }
        } else {
            BTreeMap::new()
        };

        for stored in companies.values() {
            let lengths = [Some(stored.pe.len()), Some(stored.ps.len()), stored.peg.as_ref().map(Vec::len)];
            if let Some(found) = lengths.into_iter().flatten().find(|&len| len != history_len) {
                return Err(StoreError::HistoryLengthMismatch {
                    expected: history_len,
                    found,
                });
            }
        }

        info!("Loaded {} companies from {}", companies.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            history_len,
            companies,
        })
    }

    fn flush(&self) -> StoreResult<()> {
        let text = serde_json::to_string_pretty(&self.companies)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl RecordStore for JsonStore {
    fn load(&self) -> StoreResult<Vec<CompanyRecord>> {
        Ok(self
            .companies
            .iter()
            .map(|(name, stored)| stored.clone().into_record(name.clone()))
            .collect())
    }

    fn get(&self, name: &str) -> StoreResult<Option<CompanyRecord>> {
        Ok(self
            .companies
            .get(name)
            .map(|stored| stored.clone().into_record(name.to_string())))
    }

    fn save(&mut self, record: &CompanyRecord) -> StoreResult<()> {
        check_record(record, self.history_len)?;

        let previous = self
            .companies
            .insert(record.name.clone(), StoredCompany::from_record(record));
        if let Err(e) = self.flush() {
            // keep memory in step with the file
            match previous {
                Some(old) => self.companies.insert(record.name.clone(), old),
                None => self.companies.remove(&record.name),
            };
            return Err(e);
        }

        info!("Saved {}", record.name);
        Ok(())
    }

    fn delete(&mut self, name: &str) -> StoreResult<()> {
        let removed = self
            .companies
            .remove(name)
            .ok_or_else(|| StoreError::RecordNotFound(name.to_string()))?;
        if let Err(e) = self.flush() {
            self.companies.insert(name.to_string(), removed);
            return Err(e);
        }

        info!("Deleted {}", name);
        Ok(())
    }

    fn history_len(&self) -> usize {
        self.history_len
    }
}
