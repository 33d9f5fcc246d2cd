use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use std::io;
use tracing::{error, warn};

use crate::analysis::ValuationEngine;
use crate::database::RecordStore;
use crate::error::StoreError;
use crate::ui::state::{AppState, LogLevel, Mode};
use crate::ui::view;

pub struct ValuatorApp {
    store: Box<dyn RecordStore>,
    engine: ValuationEngine,
    pub state: AppState,
    pub should_quit: bool,
}

impl ValuatorApp {
    pub fn new(store: Box<dyn RecordStore>, engine: ValuationEngine) -> Result<Self> {
        let records = store.load()?;
        let state = AppState::new(records, &engine);
        Ok(Self {
            store,
            engine,
            state,
            should_quit: false,
        })
    }

    pub fn draw(&mut self, f: &mut Frame) {
        view::render(f, &mut self.state);
    }

    /// Apply one key press. Store failures end up in the status bar and
    /// leave the browser running.
    pub fn handle_key_event(&mut self, key: KeyCode) {
        if let Mode::ConfirmDelete(name) = self.state.mode.clone() {
            self.state.mode = Mode::Browse;
            match key {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.delete_company(&name),
                _ => self.state.set_status(LogLevel::Info, "Delete cancelled"),
            }
            return;
        }

        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab | KeyCode::Right => {
                self.state.next_filter(&self.engine);
            }
            KeyCode::BackTab | KeyCode::Left => {
                self.state.previous_filter(&self.engine);
            }
            KeyCode::Down | KeyCode::Char('j') => self.state.select_next(),
            KeyCode::Up | KeyCode::Char('k') => self.state.select_previous(),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if self.reload() {
                    self.state.set_status(LogLevel::Info, "Reloaded");
                }
            }
            KeyCode::Char('d') | KeyCode::Char('D') => {
                if let Some(entry) = self.state.selected() {
                    self.state.mode = Mode::ConfirmDelete(entry.name().to_string());
                }
            }
            _ => {}
        }
    }

    /// Reload from the store; false (with an error status) when that fails
    fn reload(&mut self) -> bool {
        match self.store.load() {
            Ok(records) => {
                self.state.set_records(records, &self.engine);
                true
            }
            Err(e) => {
                error!("Reload failed: {}", e);
                self.state
                    .set_status(LogLevel::Error, format!("Reload failed: {}", e));
                false
            }
        }
    }

    fn delete_company(&mut self, name: &str) {
        match self.store.delete(name) {
            Ok(()) => {
                if self.reload() {
                    self.state
                        .set_status(LogLevel::Success, format!("{} deleted", name));
                }
            }
            Err(StoreError::RecordNotFound(_)) => {
                warn!("Delete of missing company {}", name);
                if self.reload() {
                    self.state
                        .set_status(LogLevel::Warning, format!("{} was already removed", name));
                }
            }
            Err(e) => {
                error!("Delete of {} failed: {}", name, e);
                self.state
                    .set_status(LogLevel::Error, format!("Could not delete {}: {}", name, e));
            }
        }
    }
}

/// Run the interactive browser until the user quits
pub fn run_app(store: Box<dyn RecordStore>, engine: ValuationEngine) -> Result<()> {
    let mut app = ValuatorApp::new(store, engine)?;

    // Setup terminal
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = loop {
        if let Err(e) = terminal.draw(|f| app.draw(f)) {
            break Err(e.into());
        }

        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                app.handle_key_event(key.code);
                if app.should_quit {
                    break Ok(());
                }
            }
            Ok(_) => {}
            Err(e) => break Err(e.into()),
        }
    };

    // Cleanup terminal
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    result
}
