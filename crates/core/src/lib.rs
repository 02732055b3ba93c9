pub mod editor;
pub mod history;

pub use editor::{EditEvent, EditorError, EditorState, LineEditor, Mode, Outcome};
pub use history::{HistoryError, HistoryLog, HistoryRecord, HistoryStore};
