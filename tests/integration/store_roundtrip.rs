//! Store behaviour shared by every backend

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use test_log::test;

use crate::common::stores::{init_fresh_test_store, ALL_BACKENDS};
use crate::common::{logging, test_data};
use stock_valuator::error::StoreError;

#[test]
fn test_save_then_load_returns_equal_record() {
    for backend in ALL_BACKENDS {
        logging::log_test_step(&format!("Round trip on {}", backend));
        let mut ts = init_fresh_test_store(backend, 5);

        let mut record = test_data::create_test_company("Nibe Industrier", 61.42);
        record.peg_history = Some(vec![1.1, 0.95, 1.3, 2.05, 1.0]);
        record.growth_next_year = -4.25;
        ts.store.save(&record).expect("save");

        assert_eq!(ts.store.get("Nibe Industrier").unwrap(), Some(record.clone()));

        // and from disk, as a fresh process would see it
        let reopened = ts.reopen(5);
        assert_eq!(reopened.load().unwrap(), vec![record]);
    }
}

#[test]
fn test_resave_overwrites_by_name() {
    for backend in ALL_BACKENDS {
        let mut ts = init_fresh_test_store(backend, 5);

        ts.store.save(&test_data::create_test_company("Alfa Laval", 400.0)).unwrap();
        let replacement = test_data::create_round_company("Alfa Laval", 410.0);
        ts.store.save(&replacement).unwrap();

        let loaded = ts.reopen(5).load().unwrap();
        assert_eq!(loaded, vec![replacement], "backend {}", backend);
    }
}

#[test]
fn test_load_is_ordered_by_name() {
    for backend in ALL_BACKENDS {
        let mut ts = init_fresh_test_store(backend, 5);
        for name in ["Volvo", "ABB", "Essity", "Boliden"] {
            ts.store.save(&test_data::create_test_company(name, 100.0)).unwrap();
        }

        let names: Vec<String> = ts.store.load().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["ABB", "Boliden", "Essity", "Volvo"], "backend {}", backend);
    }
}

#[test]
fn test_delete_and_missing_delete() {
    for backend in ALL_BACKENDS {
        let mut ts = init_fresh_test_store(backend, 5);
        ts.store.save(&test_data::create_test_company("Saab", 500.0)).unwrap();

        ts.store.delete("Saab").unwrap();
        assert!(ts.reopen(5).load().unwrap().is_empty());
        assert_matches!(ts.store.delete("Saab"), Err(StoreError::RecordNotFound(name)) if name == "Saab");
    }
}

#[test]
fn test_invalid_records_are_refused() {
    for backend in ALL_BACKENDS {
        let mut ts = init_fresh_test_store(backend, 5);

        let blank = test_data::create_test_company("  ", 10.0);
        assert_matches!(ts.store.save(&blank), Err(StoreError::InvalidInput(_)));

        let mut short = test_data::create_test_company("Short", 10.0);
        short.ps_history.truncate(4);
        assert_matches!(ts.store.save(&short), Err(StoreError::InvalidInput(_)));

        // zero price is storable, just not valuable
        ts.store.save(&test_data::create_test_company("Zero", 0.0)).unwrap();
        assert_eq!(ts.store.load().unwrap().len(), 1, "backend {}", backend);
    }
}

#[test]
fn test_reopen_with_other_history_len_fails() {
    for backend in ALL_BACKENDS {
        let mut ts = init_fresh_test_store(backend, 5);
        ts.store.save(&test_data::create_test_company("Ericsson", 70.0)).unwrap();

        let error = stock_valuator::database::open_store(backend, &ts.path(), 4).err();
        assert_matches!(
            error,
            Some(StoreError::HistoryLengthMismatch { expected: 4, found: 5 })
        );
    }
}
