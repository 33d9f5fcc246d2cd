use ratatui::widgets::ListState;

use crate::analysis::{BucketSelector, ScreenedCompany, ValuationEngine};
use crate::models::CompanyRecord;
use crate::ui::format;

/// What the keyboard currently drives
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Browse,
    /// Waiting for y/n before deleting the named company
    ConfirmDelete(String),
}

/// Log levels for status messages
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub level: LogLevel,
    pub text: String,
}

/// One row of the company list
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Valued(ScreenedCompany),
    /// Stored but refused by the engine; `reason` is shown in the detail panel
    Unvalued { record: CompanyRecord, reason: String },
}

impl Entry {
    pub fn record(&self) -> &CompanyRecord {
        match self {
            Entry::Valued(company) => &company.record,
            Entry::Unvalued { record, .. } => record,
        }
    }

    pub fn name(&self) -> &str {
        &self.record().name
    }
}

/// Everything the TUI renders, rebuilt whenever the store or the filter changes
#[derive(Debug)]
pub struct AppState {
    pub records: Vec<CompanyRecord>,
    /// Rows for the current filter; unvalued companies only appear under "Show all"
    pub visible: Vec<Entry>,
    /// Companies that cannot be valued, with the reason shown to the user
    pub unvalued: Vec<(String, String)>,
    pub selector_index: usize,
    pub list_state: ListState,
    pub mode: Mode,
    pub status: Option<StatusMessage>,
}

impl AppState {
    pub fn new(records: Vec<CompanyRecord>, engine: &ValuationEngine) -> Self {
        let mut state = Self {
            records: Vec::new(),
            visible: Vec::new(),
            unvalued: Vec::new(),
            selector_index: 0,
            list_state: ListState::default(),
            mode: Mode::Browse,
            status: None,
        };
        state.set_records(records, engine);
        state
    }

    pub fn selector(&self) -> BucketSelector {
        BucketSelector::MENU[self.selector_index]
    }

    /// Replace the records and recompute the visible list, keeping the
    /// selection on the same company when it is still shown
    pub fn set_records(&mut self, records: Vec<CompanyRecord>, engine: &ValuationEngine) {
        self.unvalued = records
            .iter()
            .filter_map(|r| {
                engine
                    .evaluate(r)
                    .err()
                    .map(|e| (r.name.clone(), format::valuation_error(&e)))
            })
            .collect();
        self.records = records;
        self.apply_filter(engine);
    }

    pub fn next_filter(&mut self, engine: &ValuationEngine) {
        self.selector_index = (self.selector_index + 1) % BucketSelector::MENU.len();
        self.apply_filter(engine);
    }

    pub fn previous_filter(&mut self, engine: &ValuationEngine) {
        self.selector_index = if self.selector_index == 0 {
            BucketSelector::MENU.len() - 1
        } else {
            self.selector_index - 1
        };
        self.apply_filter(engine);
    }

    fn apply_filter(&mut self, engine: &ValuationEngine) {
        let previous = self.selected().map(|entry| entry.name().to_string());
        let selector = self.selector();

        let mut visible: Vec<Entry> = engine
            .screen(&self.records, selector)
            .into_iter()
            .map(Entry::Valued)
            .collect();
        if selector == BucketSelector::All {
            visible.extend(self.records.iter().filter_map(|record| {
                self.unvalued
                    .iter()
                    .find(|(name, _)| *name == record.name)
                    .map(|(_, reason)| Entry::Unvalued {
                        record: record.clone(),
                        reason: reason.clone(),
                    })
            }));
            visible.sort_by(|a, b| a.name().cmp(b.name()));
        }
        self.visible = visible;

        let index = previous
            .and_then(|name| self.visible.iter().position(|entry| entry.name() == name))
            .or(if self.visible.is_empty() { None } else { Some(0) });
        self.list_state.select(index);
    }

    pub fn selected(&self) -> Option<&Entry> {
        self.list_state.selected().and_then(|i| self.visible.get(i))
    }

    pub fn select_next(&mut self) {
        if self.visible.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < self.visible.len() => i + 1,
            Some(_) => 0,
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_previous(&mut self) {
        if self.visible.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => self.visible.len() - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    pub fn set_status(&mut self, level: LogLevel, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            level,
            text: text.into(),
        });
    }
}
