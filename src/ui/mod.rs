//! Presentation layer: text form coercion, display formatting and the TUI.

pub mod app;
pub mod form;
pub mod format;
pub mod state;
pub mod view;

pub use app::{run_app, ValuatorApp};
pub use form::CompanyForm;
