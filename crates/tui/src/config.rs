use std::{env, path::PathBuf};

use directories::BaseDirs;

/// Runtime settings, read from the environment only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Settings {
    pub history_path: Option<PathBuf>,
    pub incognito: bool,
    pub log_level: Option<String>,
    pub log_path: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| env::var(k).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |k: &str| get(k).filter(|v| !v.trim().is_empty());
        Settings {
            history_path: non_empty("WEBLINE_HISTORY").map(PathBuf::from),
            incognito: non_empty("WEBLINE_INCOGNITO")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(false),
            log_level: non_empty("LOG_LEVEL"),
            log_path: non_empty("WEBLINE_LOG").map(PathBuf::from),
        }
    }

    /// Filter directive for the log file. Unknown or missing levels fall
    /// back to warn; fatal and panic have no tracing equivalent and map to error.
    pub fn log_filter(&self) -> &'static str {
        match self
            .log_level
            .as_deref()
            .map(|l| l.trim().to_lowercase())
            .as_deref()
        {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("error") | Some("fatal") | Some("panic") => "error",
            _ => "warn",
        }
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        if let Some(p) = &self.log_path {
            return Some(p.clone());
        }
        let base = BaseDirs::new()?;
        Some(base.data_dir().join("webline").join("webline.log"))
    }
}
