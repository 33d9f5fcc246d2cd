//! Valuation engine tests against the public API

use assert_matches::assert_matches;
use test_log::test;

use crate::common::{approx_eq, logging, test_data};
use stock_valuator::analysis::ValuationEngine;
use stock_valuator::error::ValuationError;
use stock_valuator::models::{Aggregation, PercentBasis, ValuationConfig};

#[test]
fn test_valuation_breakdown() {
    logging::log_test_step("Evaluating the reference company");

    let record = test_data::create_test_company("Example", 80.0);
    let result = ValuationEngine::default().evaluate(&record).expect("valuation");
    logging::log_test_data("Valuation", &result);

    assert!(approx_eq(result.avg_pe, 11.0));
    assert!(approx_eq(result.avg_ps, 2.4));
    assert!(approx_eq(result.avg_earnings, 5.5));
    assert!(approx_eq(result.growth_factor, 1.125));
    assert!(approx_eq(result.target_via_pe, 60.5));
    assert!(approx_eq(result.target_via_ps, 14.85));
    assert!(approx_eq(result.target_price, 37.675));
    assert!(result.undervaluation_pct < 0.0);
}

#[test]
fn test_buy_prices_below_target() {
    let record = test_data::create_round_company("Round", 50.0);
    let result = ValuationEngine::default().evaluate(&record).unwrap();

    let p30 = result.buy_price_30().unwrap();
    let p40 = result.buy_price_40().unwrap();
    assert!(approx_eq(result.target_price, 100.0));
    assert!(approx_eq(p30, 70.0));
    assert!(approx_eq(p40, 60.0));
    assert!(p40 < p30 && p30 < result.target_price);
    assert!(approx_eq(result.undervaluation_pct, 50.0));
}

#[test]
fn test_custom_margins() {
    let config = ValuationConfig::new(Aggregation::Mean, vec![0.5, 0.2], PercentBasis::Target).unwrap();
    let record = test_data::create_round_company("Round", 50.0);
    let result = ValuationEngine::new(config).evaluate(&record).unwrap();

    let margins: Vec<f64> = result.buy_prices.iter().map(|mp| mp.margin).collect();
    assert_eq!(margins, vec![0.2, 0.5]);
    assert!(approx_eq(result.buy_price(0.5).unwrap(), 50.0));
    assert_eq!(result.buy_price_30(), None);
}

#[test]
fn test_zero_price_never_yields_a_percentage() {
    let record = test_data::create_test_company("Zero", 0.0);
    assert_matches!(
        ValuationEngine::default().evaluate(&record),
        Err(ValuationError::InvalidInput(_))
    );
}

#[test]
fn test_negative_growth_is_allowed() {
    let mut record = test_data::create_round_company("Shrinking", 50.0);
    record.growth_this_year = -20.0;
    record.growth_next_year = -10.0;

    let result = ValuationEngine::default().evaluate(&record).unwrap();
    assert!(approx_eq(result.growth_factor, 0.85));
    assert!(approx_eq(result.target_price, (100.0 + 85.0) / 2.0));
}

#[test]
fn test_repeated_evaluation_is_identical() {
    let engine = ValuationEngine::default();
    let record = test_data::create_test_company("Example", 30.0);
    let first = engine.evaluate(&record).unwrap();
    for _ in 0..10 {
        assert_eq!(engine.evaluate(&record).unwrap(), first);
    }
}
