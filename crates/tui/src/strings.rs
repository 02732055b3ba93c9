// Centralized UI strings and labels. ASCII-friendly by default.

use std::path::Path;

pub const ADDRESS_HINT: &str = "Type an address, Enter to visit / Up,Down for history / Tab to complete";

// UI block titles (keep surrounding spaces for visual padding)
pub const TITLE_ADDRESS: &str = " Address ";
pub const TITLE_VIEWER: &str = " Viewer ";
pub const TITLE_HELP: &str = " Help / Shortcuts ";
pub const TITLE_CONFIRM: &str = " Confirm ";

pub const CONFIRM_CLEAR_HISTORY: &str =
    "Delete every history entry? Press Y to confirm, N/Esc to cancel.";

// Pane title names the backing file so it is clear where deletions land.
pub fn history_title(file: Option<&Path>) -> String {
    match file.and_then(|p| p.file_name()) {
        Some(name) => format!(" History ({}) ", name.to_string_lossy()),
        None => " History (not saved) ".to_string(),
    }
}

pub fn history_row(index: i32, address: &str, when: &str) -> String {
    format!("{:>4}  {}  {}", index, when, address)
}

pub fn viewer_lines(address: Option<&str>, when: Option<&str>, visits: usize) -> Vec<String> {
    match address {
        Some(a) => vec![
            format!("Visiting: {}", a),
            format!("Requested at {}", when.unwrap_or("-")),
            String::new(),
            "Fetching and rendering happen outside the address bar.".to_string(),
            format!("Visits this session: {}", visits),
        ],
        None => vec![
            "Nothing visited yet.".to_string(),
            "Press F1 for shortcuts.".to_string(),
        ],
    }
}

// Compose the one-line status bar and trim it to the available width.
pub fn build_status_line(
    focus: &str,
    col_disp: usize,
    history_len: usize,
    incognito: bool,
    message: Option<&str>,
    max_width: u16,
) -> String {
    let mut segments: Vec<String> = Vec::new();
    if let Some(m) = message {
        segments.push(m.to_string());
    }
    segments.push(format!("[{}] C{}", focus, col_disp));
    if incognito {
        segments.push("Hist:off (incognito)".to_string());
    } else {
        segments.push(format!("Hist:{}", history_len));
    }
    segments.push("F1 help  F2 history  Ctrl-C quit".to_string());
    let line = segments.join("  ");
    line.chars().take(max_width as usize).collect()
}

pub fn help_lines_ascii() -> &'static [&'static str] {
    &[
        "Basic",
        "  Enter: Visit address    Esc: Clear the bar    Ctrl-C: Quit",
        "Address Editing",
        "  Left/Right: Cursor move    Backspace/Delete: Delete prev/next char",
        "  Home/End: Line start/end    Ctrl+A/E: Line start/end",
        "History",
        "  Up/Ctrl+P: Older entry    Down/Ctrl+N: Newer entry    Tab: Complete from history",
        "  F2: Show/hide history pane",
        "  Pane focus: Up/Down select / Delete remove / D clear all / Esc back",
        "Help",
        "  F1: Open/close this panel",
    ]
}
