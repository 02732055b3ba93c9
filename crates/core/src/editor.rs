//! Single-line address editor with history recall and prefix completion.
//!
//! Cursor positions count extended grapheme clusters, not bytes.

use chrono::Local;
use thiserror::Error;
use tracing::{debug, warn};
use unicode_segmentation::UnicodeSegmentation;

use crate::history::{HistoryError, HistoryLog, HistoryRecord};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Editing,
    Committed,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditEvent {
    Commit,
    DeleteBackward,
    DeleteForward,
    MoveLeft,
    MoveRight,
    MoveHome,
    MoveEnd,
    /// Towards lower indices, starting at the newest entry.
    RecallOlder,
    RecallNewer,
    Autocomplete,
    Input(char),
    Cancel,
}

#[derive(Debug)]
pub enum Outcome {
    /// `warning` carries a persistence failure; the address is valid either way.
    Committed {
        address: String,
        warning: Option<HistoryError>,
    },
    Cancelled,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EditorError {
    #[error("editor session already ended ({0:?})")]
    InvalidState(Mode),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Draft {
    buffer: String,
    cursor: usize,
}

#[derive(Clone, Debug, Default)]
pub struct EditorState {
    buffer: String,
    cursor: usize,
    history_cursor: Option<i32>,
    draft: Option<Draft>,
    mode: Mode,
}

impl EditorState {
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn history_cursor(&self) -> Option<i32> {
        self.history_cursor
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.buffer.graphemes(true).count()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn insert_text(&mut self, s: &str) {
        let parts: Vec<&str> = self.buffer.graphemes(true).collect();
        let idx = self.cursor.min(parts.len());
        let mut new_buffer = String::with_capacity(self.buffer.len() + s.len());
        for g in &parts[..idx] {
            new_buffer.push_str(g);
        }
        new_buffer.push_str(s);
        // A combining mark joins the grapheme on its left, so count the new
        // prefix rather than adding the inserted graphemes.
        let cursor = new_buffer.graphemes(true).count();
        for g in &parts[idx..] {
            new_buffer.push_str(g);
        }
        self.buffer = new_buffer;
        self.cursor = cursor.min(self.len());
    }

    fn delete_left_grapheme(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let mut parts: Vec<&str> = self.buffer.graphemes(true).collect();
        let idx = self.cursor.min(parts.len());
        parts.remove(idx - 1);
        self.buffer = parts.concat();
        self.cursor = idx - 1;
        true
    }

    fn delete_right_grapheme(&mut self) -> bool {
        let mut parts: Vec<&str> = self.buffer.graphemes(true).collect();
        let idx = self.cursor.min(parts.len());
        if idx >= parts.len() {
            return false;
        }
        parts.remove(idx);
        self.buffer = parts.concat();
        true
    }

    fn replace(&mut self, text: String) {
        self.buffer = text;
        self.cursor = self.len();
    }

    // Any direct edit detaches the buffer from the recalled entry.
    fn diverge(&mut self) {
        self.history_cursor = None;
        self.draft = None;
    }
}

/// Drives one input session. Create a fresh editor per session; once a
/// terminal mode is reached every further event is rejected.
pub struct LineEditor<S> {
    store: S,
    state: EditorState,
}

impl<S: HistoryLog> LineEditor<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: EditorState::default(),
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn buffer(&self) -> &str {
        self.state.buffer()
    }

    pub fn cursor(&self) -> usize {
        self.state.cursor()
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn handle(&mut self, event: EditEvent) -> Result<Option<Outcome>, EditorError> {
        if self.state.mode != Mode::Editing {
            return Err(EditorError::InvalidState(self.state.mode));
        }
        match event {
            EditEvent::Commit => return Ok(self.commit()),
            EditEvent::Cancel => {
                self.state = EditorState {
                    mode: Mode::Cancelled,
                    ..EditorState::default()
                };
                debug!(target: "editor", "session cancelled");
                return Ok(Some(Outcome::Cancelled));
            }
            EditEvent::DeleteBackward => {
                if self.state.delete_left_grapheme() {
                    self.state.diverge();
                }
            }
            EditEvent::DeleteForward => {
                if self.state.delete_right_grapheme() {
                    self.state.diverge();
                }
            }
            EditEvent::MoveLeft => {
                self.state.cursor = self.state.cursor.saturating_sub(1);
            }
            EditEvent::MoveRight => {
                if self.state.cursor < self.state.len() {
                    self.state.cursor += 1;
                }
            }
            EditEvent::MoveHome => self.state.cursor = 0,
            EditEvent::MoveEnd => self.state.cursor = self.state.len(),
            EditEvent::RecallOlder => self.recall_older(),
            EditEvent::RecallNewer => self.recall_newer(),
            EditEvent::Autocomplete => self.autocomplete(),
            EditEvent::Input(ch) => {
                if !ch.is_control() {
                    let mut buf = [0u8; 4];
                    self.state.insert_text(ch.encode_utf8(&mut buf));
                    self.state.diverge();
                }
            }
        }
        Ok(None)
    }

    fn commit(&mut self) -> Option<Outcome> {
        let address = self.state.buffer.trim();
        if address.is_empty() {
            return None;
        }
        let address = address.to_string();
        let warning = match self.store.add(&address, Local::now()) {
            Ok(index) => {
                debug!(target: "editor", index, "committed address");
                None
            }
            Err(e) => {
                warn!(target: "editor", error = %e, "address committed without being saved to history");
                Some(e)
            }
        };
        self.state.mode = Mode::Committed;
        self.state.history_cursor = None;
        self.state.draft = None;
        Some(Outcome::Committed { address, warning })
    }

    fn show(&mut self, record: HistoryRecord) {
        self.state.history_cursor = Some(record.index);
        self.state.replace(record.address);
    }

    fn recall_older(&mut self) {
        match self.store.record_before(self.state.history_cursor) {
            Ok(Some(record)) => {
                if self.state.history_cursor.is_none() {
                    self.state.draft = Some(Draft {
                        buffer: self.state.buffer.clone(),
                        cursor: self.state.cursor,
                    });
                }
                self.show(record);
            }
            Ok(None) => {}
            Err(e) => warn!(target: "editor", error = %e, "history recall skipped"),
        }
    }

    fn recall_newer(&mut self) {
        let Some(current) = self.state.history_cursor else {
            return;
        };
        match self.store.record_after(current) {
            Ok(Some(record)) => self.show(record),
            Ok(None) => {
                let draft = self.state.draft.take().unwrap_or_default();
                self.state.history_cursor = None;
                self.state.buffer = draft.buffer;
                self.state.cursor = draft.cursor.min(self.state.len());
            }
            Err(e) => warn!(target: "editor", error = %e, "history recall skipped"),
        }
    }

    fn autocomplete(&mut self) {
        match self.store.match_prefix(&self.state.buffer) {
            Ok(matches) => {
                if let Some(first) = matches.into_iter().next() {
                    self.state.replace(first);
                    self.state.diverge();
                }
            }
            Err(e) => warn!(target: "editor", error = %e, "autocomplete skipped"),
        }
    }
}
