//! Common test utilities and helpers

pub mod stores;

/// Test data utilities
pub mod test_data {
    use stock_valuator::models::CompanyRecord;

    /// Target price 37.675 at these inputs
    pub fn create_test_company(name: &str, current_price: f64) -> CompanyRecord {
        CompanyRecord {
            name: name.to_string(),
            current_price,
            pe_history: vec![10.0, 12.0, 11.0, 13.0, 9.0],
            ps_history: vec![2.0, 2.5, 2.0, 3.0, 2.5],
            peg_history: None,
            earnings_this_year: 5.0,
            earnings_next_year: 6.0,
            growth_this_year: 10.0,
            growth_next_year: 15.0,
        }
    }

    /// A company whose target price is exactly 100
    pub fn create_round_company(name: &str, current_price: f64) -> CompanyRecord {
        CompanyRecord {
            name: name.to_string(),
            current_price,
            pe_history: vec![10.0; 5],
            ps_history: vec![10.0; 5],
            peg_history: Some(vec![1.0, 1.2, 0.8, 1.1, 0.9]),
            earnings_this_year: 9.0,
            earnings_next_year: 11.0,
            growth_this_year: 0.0,
            growth_next_year: 0.0,
        }
    }

    /// Negative earnings estimates; the target price comes out at -12
    pub fn create_loss_making_company(name: &str, current_price: f64) -> CompanyRecord {
        CompanyRecord {
            name: name.to_string(),
            current_price,
            pe_history: vec![10.0; 5],
            ps_history: vec![2.0; 5],
            peg_history: None,
            earnings_this_year: -3.0,
            earnings_next_year: -1.0,
            growth_this_year: 0.0,
            growth_next_year: 0.0,
        }
    }
}

/// Logging utilities for tests
pub mod logging {
    use tracing::{debug, info};

    /// Log test step
    pub fn log_test_step(step: &str) {
        info!("🧪 Test Step: {}", step);
    }

    /// Log test data
    pub fn log_test_data<T: std::fmt::Debug>(label: &str, data: &T) {
        debug!("📊 {}: {:?}", label, data);
    }
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
