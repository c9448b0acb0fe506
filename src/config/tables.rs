use super::defaults;
use super::models::{LogLevel, ReaderConfig};
use serde::Deserialize;
use std::path::PathBuf;

/// On-disk layout of the config file, one table per concern.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    library: LibraryConfig,
    #[serde(default)]
    reading: ReadingConfig,
    #[serde(default)]
    appearance: AppearanceConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl From<ConfigTables> for ReaderConfig {
    fn from(tables: ConfigTables) -> Self {
        ReaderConfig {
            library_dir: non_empty(tables.library.dir),
            default_book: non_empty(tables.library.default_book),
            lines_per_page: tables.reading.lines_per_page,
            font_size: tables.appearance.font_size,
            font_color: tables.appearance.font_color,
            log_level: tables.logging.log_level,
        }
    }
}

impl From<&ReaderConfig> for ConfigTables {
    fn from(config: &ReaderConfig) -> Self {
        ConfigTables {
            library: LibraryConfig {
                dir: config.library_dir.clone(),
                default_book: config.default_book.clone(),
            },
            reading: ReadingConfig {
                lines_per_page: config.lines_per_page,
            },
            appearance: AppearanceConfig {
                font_size: config.font_size,
                font_color: config.font_color.clone(),
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
        }
    }
}

fn non_empty(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty())
}

#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
struct LibraryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_book: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ReadingConfig {
    #[serde(default = "defaults::default_lines_per_page")]
    lines_per_page: usize,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            lines_per_page: defaults::default_lines_per_page(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct AppearanceConfig {
    #[serde(default = "defaults::default_font_size")]
    font_size: u32,
    #[serde(default = "defaults::default_font_color")]
    font_color: String,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            font_size: defaults::default_font_size(),
            font_color: defaults::default_font_color(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::default_log_level(),
        }
    }
}
