use tracing::{error, info};
use webline_core::{HistoryError, HistoryRecord, HistoryStore};

/// Read-only snapshot of the store plus a selection, for the history pane.
#[derive(Default)]
pub struct HistoryPane {
    pub visible: bool,
    pub entries: Vec<HistoryRecord>,
    pub selected: usize,
    pub scroll: u16,
}

impl HistoryPane {
    pub fn refresh(&mut self, store: &HistoryStore) {
        match store.get_all() {
            Ok(entries) => {
                self.entries = entries;
                // Newest first reads better in a pane.
                self.entries.reverse();
            }
            Err(e) => {
                error!(target: "tui", "history refresh failed: {}", e);
                self.entries.clear();
            }
        }
        self.clamp();
    }

    pub fn select_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_down(&mut self) {
        if self.selected + 1 < self.entries.len() {
            self.selected += 1;
        }
    }

    pub fn selected_record(&self) -> Option<&HistoryRecord> {
        self.entries.get(self.selected)
    }

    pub fn delete_selected(&mut self, store: &HistoryStore) -> Result<(), HistoryError> {
        let Some(index) = self.selected_record().map(|r| r.index) else {
            return Ok(());
        };
        store.delete(index)?;
        info!(target: "tui", index, "removed history entry");
        self.refresh(store);
        Ok(())
    }

    pub fn clear(&mut self, store: &HistoryStore) -> Result<(), HistoryError> {
        store.delete_all()?;
        info!(target: "tui", "cleared history");
        self.refresh(store);
        Ok(())
    }

    /// Keep the selection inside the list and scrolled into a viewport of `height` rows.
    pub fn ensure_visible(&mut self, height: u16) {
        let h = height.max(1) as usize;
        let scroll = self.scroll as usize;
        if self.selected < scroll {
            self.scroll = self.selected as u16;
        } else if self.selected >= scroll + h {
            self.scroll = (self.selected + 1 - h) as u16;
        }
    }

    fn clamp(&mut self) {
        if self.entries.is_empty() {
            self.selected = 0;
            self.scroll = 0;
        } else if self.selected >= self.entries.len() {
            self.selected = self.entries.len() - 1;
        }
    }
}
