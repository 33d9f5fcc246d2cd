use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{check_record, RecordStore};
use crate::error::{StoreError, StoreResult};
use crate::models::CompanyRecord;

const SCALAR_COLUMNS: [&str; 6] = [
    "name",
    "current_price",
    "earnings_this_year",
    "earnings_next_year",
    "growth_this_year",
    "growth_next_year",
];

/// Spreadsheet-style store: one row per company, numbered multiple columns
#[derive(Debug)]
pub struct CsvStore {
    path: PathBuf,
    history_len: usize,
    companies: BTreeMap<String, CompanyRecord>,
}

fn header(history_len: usize) -> Vec<String> {
    let mut columns: Vec<String> = SCALAR_COLUMNS.iter().map(|c| c.to_string()).collect();
    for prefix in ["pe", "ps", "peg"] {
        columns.extend((1..=history_len).map(|i| format!("{}{}", prefix, i)));
    }
    columns
}

/// Count numbered columns such as pe1, pe2, ...
fn numbered_columns(headers: &StringRecord, prefix: &str) -> usize {
    headers
        .iter()
        .filter(|h| {
            h.strip_prefix(prefix)
                .map_or(false, |rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
        })
        .count()
}

fn column_index(headers: &StringRecord, column: &str) -> StoreResult<usize> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| StoreError::Corrupt(format!("missing column '{}'", column)))
}

fn parse_cell(row: &StringRecord, index: usize, column: &str, line: usize) -> StoreResult<f64> {
    let cell = row.get(index).unwrap_or("").trim();
    cell.parse().map_err(|_| {
        StoreError::Corrupt(format!("line {}: column '{}' holds '{}'", line, column, cell))
    })
}

impl CsvStore {
    pub fn open(path: &Path, history_len: usize) -> StoreResult<Self> {
        let mut companies = BTreeMap::new();

        if path.exists() && std::fs::metadata(path)?.len() > 0 {
            let mut reader = ReaderBuilder::new().from_path(path)?;
            let headers = reader.headers()?.clone();

            let found = numbered_columns(&headers, "pe");
            if found != history_len {
                return Err(StoreError::HistoryLengthMismatch {
                    expected: history_len,
                    found,
                });
            }

            for (i, row) in reader.records().enumerate() {
                let row = row?;
                let record = Self::parse_row(&headers, &row, history_len, i + 2)?;
                companies.insert(record.name.clone(), record);
            }
        }

        info!("Loaded {} companies from {}", companies.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            history_len,
            companies,
        })
    }

    fn parse_row(
        headers: &StringRecord,
        row: &StringRecord,
        history_len: usize,
        line: usize,
    ) -> StoreResult<CompanyRecord> {
        let scalar = |column: &str| -> StoreResult<f64> {
            parse_cell(row, column_index(headers, column)?, column, line)
        };
        let history = |prefix: &str| -> StoreResult<Vec<f64>> {
            (1..=history_len)
                .map(|i| {
                    let column = format!("{}{}", prefix, i);
                    parse_cell(row, column_index(headers, &column)?, &column, line)
                })
                .collect()
        };

        let name = row
            .get(column_index(headers, "name")?)
            .unwrap_or("")
            .to_string();

        let peg_cells: Vec<&str> = (1..=history_len)
            .map(|i| {
                let column = format!("peg{}", i);
                headers
                    .iter()
                    .position(|h| h == column)
                    .and_then(|idx| row.get(idx))
                    .unwrap_or("")
                    .trim()
            })
            .collect();
        let peg_history = if peg_cells.iter().all(|c| c.is_empty()) {
            None
        } else {
            Some(history("peg")?)
        };

        Ok(CompanyRecord {
            name,
            current_price: scalar("current_price")?,
            pe_history: history("pe")?,
            ps_history: history("ps")?,
            peg_history,
            earnings_this_year: scalar("earnings_this_year")?,
            earnings_next_year: scalar("earnings_next_year")?,
            growth_this_year: scalar("growth_this_year")?,
            growth_next_year: scalar("growth_next_year")?,
        })
    }

    fn flush(&self) -> StoreResult<()> {
        let tmp = self.path.with_extension("csv.tmp");
        {
            let mut writer = WriterBuilder::new().from_path(&tmp)?;
            writer.write_record(header(self.history_len))?;

            for record in self.companies.values() {
                let mut row = vec![
                    record.name.clone(),
                    record.current_price.to_string(),
                    record.earnings_this_year.to_string(),
                    record.earnings_next_year.to_string(),
                    record.growth_this_year.to_string(),
                    record.growth_next_year.to_string(),
                ];
                row.extend(record.pe_history.iter().map(f64::to_string));
                row.extend(record.ps_history.iter().map(f64::to_string));
                match &record.peg_history {
                    Some(peg) => row.extend(peg.iter().map(f64::to_string)),
                    None => row.extend(std::iter::repeat(String::new()).take(self.history_len)),
                }
                writer.write_record(&row)?;
            }
            writer.flush()?;
        }
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl RecordStore for CsvStore {
    fn load(&self) -> StoreResult<Vec<CompanyRecord>> {
        Ok(self.companies.values().cloned().collect())
    }

    fn get(&self, name: &str) -> StoreResult<Option<CompanyRecord>> {
        Ok(self.companies.get(name).cloned())
    }

    fn save(&mut self, record: &CompanyRecord) -> StoreResult<()> {
        check_record(record, self.history_len)?;

        let previous = self.companies.insert(record.name.clone(), record.clone());
        if let Err(e) = self.flush() {
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
