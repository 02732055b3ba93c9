mod app;
mod config;
mod events;
mod logging;
mod strings;
mod terminal;
mod theme;
mod ui;

use std::sync::Arc;

use anyhow::Result;
use terminal::TerminalGuard;
use tracing::{error, info, warn};
use webline_core::HistoryStore;

use config::Settings;

// Without a usable history file the address bar still works, it just
// forgets everything on exit.
fn open_store(settings: &Settings) -> HistoryStore {
    if settings.incognito {
        info!(target: "tui", "incognito requested");
        return HistoryStore::ephemeral();
    }
    let opened = match &settings.history_path {
        Some(path) => HistoryStore::open(path),
        None => HistoryStore::open_default(),
    };
    match opened {
        Ok(store) => store,
        Err(e) => {
            warn!(target: "tui", "history unavailable, continuing in incognito mode: {}", e);
            HistoryStore::ephemeral()
        }
    }
}

fn main() -> Result<()> {
    let settings = Settings::from_env();
    let _log_guard = logging::init(&settings)?;
    info!(target: "tui", "starting webline");

    let store = Arc::new(open_store(&settings));
    let mut app = app::App::new(Arc::clone(&store));
    let res = {
        let mut term = TerminalGuard::new()?;
        events::run(&mut term.terminal, &mut app)
    };
    drop(app);

    if let Err(e) = store.flush() {
        error!(target: "tui", "flushing history failed: {}", e);
    }
    info!(target: "tui", "shutting down");
    res
}
