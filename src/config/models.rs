use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use ts_rs::TS;

pub const MIN_LINES_PER_PAGE: usize = 1;
pub const MAX_LINES_PER_PAGE: usize = 1000;

/// Read-only view of the reader settings, injected into the reader and the
/// settings handler.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ReaderConfig {
    #[serde(default)]
    pub library_dir: Option<PathBuf>,
    #[serde(default = "crate::config::defaults::default_lines_per_page")]
    pub lines_per_page: usize,
    #[serde(default)]
    pub default_book: Option<PathBuf>,
    #[serde(default = "crate::config::defaults::default_font_size")]
    pub font_size: u32,
    #[serde(default = "crate::config::defaults::default_font_color")]
    pub font_color: String,
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            library_dir: None,
            lines_per_page: crate::config::defaults::default_lines_per_page(),
            default_book: None,
            font_size: crate::config::defaults::default_font_size(),
            font_color: crate::config::defaults::default_font_color(),
            log_level: crate::config::defaults::default_log_level(),
        }
    }
}

impl ReaderConfig {
    /// Page size actually used for navigation.
    pub fn effective_lines_per_page(&self) -> usize {
        self.lines_per_page
            .clamp(MIN_LINES_PER_PAGE, MAX_LINES_PER_PAGE)
    }

    pub fn library_dir(&self) -> Option<&Path> {
        self.library_dir
            .as_deref()
            .filter(|dir| !dir.as_os_str().is_empty())
    }

    pub fn default_book(&self) -> Option<&Path> {
        self.default_book
            .as_deref()
            .filter(|book| !book.as_os_str().is_empty())
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
