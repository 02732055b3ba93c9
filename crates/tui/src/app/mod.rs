use std::{path::PathBuf, sync::Arc};

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::layout::Rect;
use tracing::{error, info, warn};
use webline_core::{EditEvent, HistoryStore, LineEditor, Outcome};

pub mod history;
pub mod input;

use history::HistoryPane;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Address,
    History,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmAction {
    ClearHistory,
}

/// Receives every committed address. Fetching and rendering the response is
/// left to whatever sits behind it; this one only remembers what was asked for.
#[derive(Default)]
pub struct Viewer {
    pub current: Option<String>,
    pub requested_at: Option<DateTime<Local>>,
    pub visits: usize,
}

impl Viewer {
    pub fn visit(&mut self, address: String) {
        info!(target: "tui", "visiting: {}", address);
        self.current = Some(address);
        self.requested_at = Some(Local::now());
        self.visits += 1;
    }
}

pub struct App {
    store: Arc<HistoryStore>,
    editor: LineEditor<Arc<HistoryStore>>,
    pub viewer: Viewer,
    pub history: HistoryPane,
    pub focus: Focus,
    pub confirm: Option<ConfirmAction>,
    pub show_help: bool,
    pub status: Option<String>,
    pub should_quit: bool,
    pub dirty: bool,
    pub history_area: Option<Rect>,
    pub history_file: Option<PathBuf>,
}

impl App {
    pub fn new(store: Arc<HistoryStore>) -> Self {
        let editor = LineEditor::new(Arc::clone(&store));
        let history_file = store.path();
        let mut status = None;
        if !store.is_persistent() {
            status = Some("incognito: history is not saved".to_string());
        }
        Self {
            store,
            editor,
            viewer: Viewer::default(),
            history: HistoryPane::default(),
            focus: Focus::Address,
            confirm: None,
            show_help: false,
            status,
            should_quit: false,
            dirty: true,
            history_area: None,
            history_file,
        }
    }

    pub fn editor(&self) -> &LineEditor<Arc<HistoryStore>> {
        &self.editor
    }

    pub fn incognito(&self) -> bool {
        !self.store.is_persistent()
    }

    pub fn history_len(&self) -> usize {
        self.store.count().map(|c| c as usize).unwrap_or(0)
    }

    fn new_session(&mut self) {
        self.editor = LineEditor::new(Arc::clone(&self.store));
    }

    // Feed one event to the editor and act on a terminal outcome.
    pub fn dispatch(&mut self, event: EditEvent) {
        self.dirty = true;
        match self.editor.handle(event) {
            Ok(None) => {}
            Ok(Some(Outcome::Committed { address, warning })) => {
                self.status = match warning {
                    Some(e) => {
                        warn!(target: "tui", "adding \"{}\" to history failed: {}", address, e);
                        Some(format!("not saved to history: {}", e))
                    }
                    None => None,
                };
                self.viewer.visit(address);
                self.new_session();
                if self.history.visible {
                    self.history.refresh(&self.store);
                }
            }
            Ok(Some(Outcome::Cancelled)) => {
                self.status = None;
                self.new_session();
            }
            Err(e) => {
                error!(target: "tui", "editor rejected event: {}", e);
                self.new_session();
            }
        }
    }

    pub fn paste(&mut self, text: &str) {
        for ch in text.chars().filter(|c| *c != '\n' && *c != '\r') {
            self.dispatch(EditEvent::Input(ch));
        }
    }

    pub fn toggle_history(&mut self) {
        self.history.visible = !self.history.visible;
        if self.history.visible {
            self.history.refresh(&self.store);
            self.focus = Focus::History;
        } else {
            self.focus = Focus::Address;
        }
    }

    pub fn history_inner_height(&self) -> u16 {
        self.history_area
            .map(|a| a.height.saturating_sub(2))
            .unwrap_or(1)
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        self.dirty = true;

        if let Some(action) = self.confirm {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.confirm = None;
                    match action {
                        ConfirmAction::ClearHistory => {
                            self.status = match self.history.clear(&self.store) {
                                Ok(()) => Some("history cleared".to_string()),
                                Err(e) => Some(format!("clear failed: {}", e)),
                            };
                        }
                    }
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.confirm = None;
                }
                _ => {}
            }
            return;
        }

        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::F(1)) {
                self.show_help = false;
            }
            return;
        }

        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q')
                if key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                info!(target: "tui", "on_key: quit");
                self.should_quit = true;
                return;
            }
            KeyCode::F(1) => {
                self.show_help = true;
                return;
            }
            KeyCode::F(2) => {
                self.toggle_history();
                return;
            }
            _ => {}
        }

        match self.focus {
            Focus::History => self.on_history_key(key),
            Focus::Address => {
                if let Some(ev) = input::edit_event(&key) {
                    self.dispatch(ev);
                }
            }
        }
    }

    fn on_history_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Tab => self.focus = Focus::Address,
            KeyCode::Up => self.history.select_up(),
            KeyCode::Down => self.history.select_down(),
            KeyCode::Home => self.history.selected = 0,
            KeyCode::End => self.history.selected = self.history.entries.len().saturating_sub(1),
            KeyCode::Delete | KeyCode::Backspace => {
                if let Err(e) = self.history.delete_selected(&self.store) {
                    self.status = Some(format!("delete failed: {}", e));
                }
            }
            KeyCode::Char('D') | KeyCode::Char('d') => {
                if !self.history.entries.is_empty() {
                    self.confirm = Some(ConfirmAction::ClearHistory);
                }
            }
            _ => {}
        }
        let h = self.history_inner_height();
        self.history.ensure_visible(h);
    }
}
