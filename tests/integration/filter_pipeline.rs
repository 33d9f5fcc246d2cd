//! Store -> engine -> filter, end to end

use pretty_assertions::assert_eq;
use test_log::test;

use crate::common::stores::init_fresh_test_store;
use crate::common::test_data;
use stock_valuator::analysis::{Bucket, BucketSelector, ValuationEngine};
use stock_valuator::commands::{self, CopyReport, DeleteOutcome};
use stock_valuator::error::ValuationError;
use stock_valuator::models::StoreBackend;

fn names(records: &[stock_valuator::models::CompanyRecord]) -> Vec<&str> {
    records.iter().map(|r| r.name.as_str()).collect()
}

#[test]
fn test_unevaluable_record_is_skipped() {
    let mut ts = init_fresh_test_store(StoreBackend::Sqlite, 5);
    ts.store.save(&test_data::create_round_company("Cheap", 50.0)).unwrap();
    ts.store.save(&test_data::create_round_company("Also Cheap", 90.0)).unwrap();
    ts.store.save(&test_data::create_round_company("No Price", 0.0)).unwrap();

    let records = ts.store.load().unwrap();
    let engine = ValuationEngine::default();

    let undervalued = engine.filter_records(&records, BucketSelector::AnyUndervalued);
    assert_eq!(names(&undervalued), vec!["Also Cheap", "Cheap"]);

    let all = engine.filter_records(&records, BucketSelector::All);
    assert_eq!(names(&all), vec!["Also Cheap", "Cheap"]);
}

#[test]
fn test_loss_making_company_is_in_no_bucket() {
    let mut ts = init_fresh_test_store(StoreBackend::Sqlite, 5);
    ts.store.save(&test_data::create_loss_making_company("Loss Maker", 50.0)).unwrap();
    ts.store.save(&test_data::create_round_company("Cheap", 50.0)).unwrap();

    let records = ts.store.load().unwrap();
    let engine = ValuationEngine::default();

    let selectors = [
        BucketSelector::All,
        BucketSelector::AnyUndervalued,
        BucketSelector::Only(Bucket::Overvalued),
        BucketSelector::Only(Bucket::UndervaluedLow),
        BucketSelector::Only(Bucket::UndervaluedMid),
        BucketSelector::Only(Bucket::UndervaluedHigh),
    ];
    for selector in selectors {
        let shown = engine.filter_records(&records, selector);
        assert!(
            shown.iter().all(|r| r.name != "Loss Maker"),
            "loss maker listed under {}",
            selector
        );
    }

    let listing = commands::list_companies(ts.store.as_ref(), &engine, BucketSelector::All).unwrap();
    assert_eq!(listing.unvalued.len(), 1);
    assert_eq!(listing.unvalued[0].0, "Loss Maker");
    assert!(matches!(
        listing.unvalued[0].1,
        ValuationError::UndefinedValuation { .. }
    ));
}

#[test]
fn test_bucket_filters() {
    let mut ts = init_fresh_test_store(StoreBackend::Json, 5);
    // target price is 100 for all of these
    for (name, price) in [("A", 120.0), ("B", 100.0), ("C", 80.0), ("D", 70.0), ("E", 60.01), ("F", 60.0), ("G", 10.0)] {
        ts.store.save(&test_data::create_round_company(name, price)).unwrap();
    }

    let records = ts.store.load().unwrap();
    let engine = ValuationEngine::default();

    let mid = engine.filter_records(&records, BucketSelector::Only(Bucket::UndervaluedMid));
    assert_eq!(names(&mid), vec!["D", "E"]);

    let high = engine.filter_records(&records, BucketSelector::Only(Bucket::UndervaluedHigh));
    assert_eq!(names(&high), vec!["F", "G"]);

    let any = engine.filter_records(&records, BucketSelector::AnyUndervalued);
    assert_eq!(names(&any), vec!["C", "D", "E", "F", "G"]);

    let over = engine.filter_records(&records, BucketSelector::Only(Bucket::Overvalued));
    assert_eq!(names(&over), vec!["A", "B"]);
}

#[test]
fn test_commands_over_real_store() {
    let mut ts = init_fresh_test_store(StoreBackend::Csv, 5);
    ts.store.save(&test_data::create_round_company("Hexagon", 110.0)).unwrap();

    let updated = commands::edit_company(ts.store.as_mut(), "Hexagon", |form| {
        form.current_price = "65".to_string();
    })
    .unwrap();
    assert_eq!(updated.current_price, 65.0);

    let listing = commands::list_companies(
        ts.store.as_ref(),
        &ValuationEngine::default(),
        BucketSelector::Only(Bucket::UndervaluedMid),
    )
    .unwrap();
    assert_eq!(listing.shown.len(), 1);

    assert_eq!(commands::delete_company(ts.store.as_mut(), "Hexagon").unwrap(), DeleteOutcome::Deleted);
    assert!(matches!(
        commands::delete_company(ts.store.as_mut(), "Hexagon").unwrap(),
        DeleteOutcome::NotFound { .. }
    ));
}

#[test]
fn test_copy_between_backends() {
    let mut csv = init_fresh_test_store(StoreBackend::Csv, 5);
    csv.store.save(&test_data::create_round_company("Investor", 250.0)).unwrap();
    csv.store.save(&test_data::create_test_company("Kinnevik", 90.0)).unwrap();

    let mut sqlite = init_fresh_test_store(StoreBackend::Sqlite, 5);
    let report = commands::copy_records(csv.store.as_ref(), sqlite.store.as_mut(), false).unwrap();
    assert_eq!(
        report,
        CopyReport {
            copied: 2,
            kept: vec![],
            rejected: vec![],
        }
    );
    assert_eq!(sqlite.store.load().unwrap(), csv.store.load().unwrap());

    let again = commands::copy_records(csv.store.as_ref(), sqlite.store.as_mut(), false).unwrap();
    assert_eq!(again.copied, 0);
    assert_eq!(again.kept.len(), 2);
}
