//! Store-level operations behind the command line and the TUI.
//!
//! Each function takes the store as a trait object so that any backend,
//! or a mock, can sit underneath.

use tracing::{info, warn};

use crate::analysis::{BucketSelector, ScreenedCompany, ValuationEngine, ValuationResult};
use crate::database::{find_similar_names, RecordStore};
use crate::error::{StoreError, StoreResult, ValuationError};
use crate::models::CompanyRecord;
use crate::ui::CompanyForm;

/// Result of looking a company up for display
#[derive(Debug)]
pub enum ShowOutcome {
    Valued {
        record: CompanyRecord,
        valuation: ValuationResult,
    },
    /// Stored, but the engine refused it; the error is shown instead of figures
    Unvalued {
        record: CompanyRecord,
        error: ValuationError,
    },
    NotFound {
        suggestions: Vec<String>,
    },
}

#[derive(Debug, PartialEq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound { suggestions: Vec<String> },
}

/// Companies matching a filter, plus those that could not be valued at all
#[derive(Debug)]
pub struct Listing {
    pub shown: Vec<ScreenedCompany>,
    pub unvalued: Vec<(String, ValuationError)>,
}

fn suggestions_for(store: &dyn RecordStore, name: &str) -> StoreResult<Vec<String>> {
    let names = store.names()?;
    Ok(find_similar_names(&names, name).into_iter().take(3).collect())
}

/// Coerce a filled form and upsert it
pub fn save_company(store: &mut dyn RecordStore, form: &CompanyForm) -> StoreResult<CompanyRecord> {
    let record = form.to_record(store.history_len())?;
    store.save(&record)?;
    Ok(record)
}

/// Load a company into a form, let `edit` change it, then save it back.
///
/// Changing the name moves the company: the new name is saved and the old
/// one removed. Moving onto a name that is already stored is refused.
/// Whitespace around the name is not a change, so a stored name such as
/// " Volvo " keeps its key.
pub fn edit_company<F>(store: &mut dyn RecordStore, name: &str, edit: F) -> StoreResult<CompanyRecord>
where
    F: FnOnce(&mut CompanyForm),
{
    let existing = store
        .get(name)?
        .ok_or_else(|| StoreError::RecordNotFound(name.to_string()))?;

    let mut form = CompanyForm::from_record(&existing);
    edit(&mut form);

    let mut updated = form.to_record(store.history_len())?;
    let renamed = updated.name != existing.name.trim();
    if !renamed {
        updated.name = existing.name.clone();
    } else if store.get(&updated.name)?.is_some() {
        return Err(StoreError::InvalidInput(format!(
            "cannot rename {} to {}: a company with that name already exists",
            existing.name, updated.name
        )));
    }

    store.save(&updated)?;
    if renamed {
        store.delete(&existing.name)?;
        info!("Renamed {} to {}", existing.name, updated.name);
    }
    Ok(updated)
}

pub fn show_company(
    store: &dyn RecordStore,
    engine: &ValuationEngine,
    name: &str,
) -> StoreResult<ShowOutcome> {
    let Some(record) = store.get(name)? else {
        return Ok(ShowOutcome::NotFound {
            suggestions: suggestions_for(store, name)?,
        });
    };

    Ok(match engine.evaluate(&record) {
        Ok(valuation) => ShowOutcome::Valued { record, valuation },
        Err(error) => ShowOutcome::Unvalued { record, error },
    })
}

/// Delete by name; a missing name is reported, not treated as a failure
pub fn delete_company(store: &mut dyn RecordStore, name: &str) -> StoreResult<DeleteOutcome> {
    match store.delete(name) {
        Ok(()) => Ok(DeleteOutcome::Deleted),
        Err(StoreError::RecordNotFound(_)) => {
            warn!("Nothing to delete for {}", name);
            Ok(DeleteOutcome::NotFound {
                suggestions: suggestions_for(store, name)?,
            })
        }
        Err(e) => Err(e),
    }
}

pub fn list_companies(
    store: &dyn RecordStore,
    engine: &ValuationEngine,
    selector: BucketSelector,
) -> StoreResult<Listing> {
    let records = store.load()?;

    let unvalued = records
        .iter()
        .filter_map(|r| engine.evaluate(r).err().map(|e| (r.name.clone(), e)))
        .collect();

    Ok(Listing {
        shown: engine.screen(&records, selector),
        unvalued,
    })
}

/// Counts from copying one store into another
#[derive(Debug, Default, PartialEq)]
pub struct CopyReport {
    pub copied: usize,
    /// Already present in the target and left alone
    pub kept: Vec<String>,
    /// Rejected by the target, with the reason
    pub rejected: Vec<(String, String)>,
}

/// Copy every record from `source` into `target`.
///
/// Records the target refuses (for example a different history length) are
/// reported rather than aborting the copy.
pub fn copy_records(
    source: &dyn RecordStore,
    target: &mut dyn RecordStore,
    overwrite: bool,
) -> StoreResult<CopyReport> {
    let mut report = CopyReport::default();

    for record in source.load()? {
        if !overwrite && target.get(&record.name)?.is_some() {
            report.kept.push(record.name);
            continue;
        }
        match target.save(&record) {
            Ok(()) => report.copied += 1,
            Err(StoreError::InvalidInput(reason)) => {
                warn!("Not copying {}: {}", record.name, reason);
                report.rejected.push((record.name, reason));
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "Copied {} companies ({} kept, {} rejected)",
        report.copied,
        report.kept.len(),
        report.rejected.len()
    );
    Ok(report)
}
