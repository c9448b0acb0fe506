//! Configuration for the reader.
//!
//! Settings live in a sectioned TOML file (`conf/config.toml` by default).
//! Missing or invalid entries fall back to defaults so reading can always
//! start; the settings panel is the only writer.

mod defaults;
mod io;
mod models;
mod tables;

pub use io::{load_config, parse_config, save_config, serialize_config};
pub use models::{LogLevel, MAX_LINES_PER_PAGE, MIN_LINES_PER_PAGE, ReaderConfig};

pub const DEFAULT_CONFIG_PATH: &str = "conf/config.toml";
