//! Settings-panel messages.
//!
//! The panel sends JSON objects tagged by `command`; each is applied to the
//! reader and its config, and answered with a file list, a settings snapshot,
//! an opened-book notice or an error. Book paths travel as plain UTF-8
//! strings.

use crate::config::{self, ReaderConfig};
use crate::error::{ErrorReply, ReaderError, ReaderResult};
use crate::library::{self, LibraryEntry};
use crate::session::Reader;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use ts_rs::TS;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, TS)]
#[serde(tag = "command", rename_all = "camelCase")]
#[ts(export)]
pub enum SettingsMessage {
    SelectDirectory {
        path: String,
    },
    RequestFileList,
    SaveSettings {
        #[serde(rename = "linesPerPage")]
        lines_per_page: usize,
        #[serde(rename = "fontSize")]
        font_size: u32,
        #[serde(rename = "fontColor")]
        font_color: String,
    },
    SelectFile {
        file: String,
        #[serde(default, rename = "startLine")]
        #[ts(optional)]
        start_line: Option<usize>,
    },
    SetProgress {
        file: String,
        #[ts(type = "number")]
        line: i64,
    },
    SetDefaultBook {
        file: String,
    },
    ClearDefaultBook,
}

impl SettingsMessage {
    pub fn action(&self) -> &'static str {
        match self {
            Self::SelectDirectory { .. } => "select_directory",
            Self::RequestFileList => "request_file_list",
            Self::SaveSettings { .. } => "save_settings",
            Self::SelectFile { .. } => "select_file",
            Self::SetProgress { .. } => "set_progress",
            Self::SetDefaultBook { .. } => "set_default_book",
            Self::ClearDefaultBook => "clear_default_book",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SettingsSnapshot {
    pub default_book: Option<String>,
    pub lines_per_page: usize,
    pub font_size: u32,
    pub font_color: String,
    pub book_folder_path: Option<String>,
}

impl From<&ReaderConfig> for SettingsSnapshot {
    fn from(config: &ReaderConfig) -> Self {
        SettingsSnapshot {
            default_book: config.default_book().map(path_string),
            lines_per_page: config.lines_per_page,
            font_size: config.font_size,
            font_color: config.font_color.clone(),
            book_folder_path: config.library_dir().map(path_string),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(tag = "command", rename_all = "camelCase")]
#[ts(export)]
pub enum SettingsReply {
    UpdateFileList {
        #[serde(rename = "currentFolder")]
        current_folder: Option<String>,
        files: Vec<LibraryEntry>,
    },
    UpdateSettings {
        settings: SettingsSnapshot,
    },
    Opened {
        path: String,
        line: usize,
    },
    Error(ErrorReply),
}

/// Decode one raw panel message.
pub fn parse_message(raw: &str) -> ReaderResult<SettingsMessage> {
    serde_json::from_str(raw).map_err(|err| ReaderError::InvalidRequest {
        message: err.to_string(),
    })
}

pub fn file_list(config: &ReaderConfig) -> SettingsReply {
    SettingsReply::UpdateFileList {
        current_folder: config.library_dir().map(path_string),
        files: library::list(config.library_dir()),
    }
}

/// Apply `message` and persist any settings change to `config_path`.
pub fn handle_message(
    reader: &mut Reader,
    config_path: &Path,
    message: SettingsMessage,
) -> SettingsReply {
    let action = message.action();
    match apply(reader, config_path, message) {
        Ok(reply) => {
            info!(action, "Handled settings message");
            reply
        }
        Err(err) => {
            error!(action, code = err.code(), "Settings message failed: {err}");
            SettingsReply::Error(err.to_reply())
        }
    }
}

fn apply(
    reader: &mut Reader,
    config_path: &Path,
    message: SettingsMessage,
) -> ReaderResult<SettingsReply> {
    match message {
        SettingsMessage::SelectDirectory { path } => {
            let dir = non_empty_path(&path)?;
            update_config(reader, config_path, |cfg| cfg.library_dir = Some(dir))?;
            Ok(file_list(reader.config()))
        }
        SettingsMessage::RequestFileList => Ok(file_list(reader.config())),
        SettingsMessage::SaveSettings {
            lines_per_page,
            font_size,
            font_color,
        } => {
            update_config(reader, config_path, |cfg| {
                cfg.lines_per_page =
                    lines_per_page.clamp(config::MIN_LINES_PER_PAGE, config::MAX_LINES_PER_PAGE);
                cfg.font_size = font_size;
                cfg.font_color = font_color;
            })?;
            Ok(settings_reply(reader.config()))
        }
        SettingsMessage::SelectFile { file, start_line } => {
            let book = non_empty_path(&file)?;
            let session = match start_line {
                Some(line) => reader.open_session_at(&book, line)?,
                None => reader.open_session(&book)?,
            };
            Ok(SettingsReply::Opened {
                path: path_string(session.book_path()),
                line: session.current_line(),
            })
        }
        SettingsMessage::SetProgress { file, line } => {
            let book = non_empty_path(&file)?;
            reader.set_progress(&book, line)?;
            Ok(file_list(reader.config()))
        }
        SettingsMessage::SetDefaultBook { file } => {
            let book = non_empty_path(&file)?;
            update_config(reader, config_path, |cfg| cfg.default_book = Some(book))?;
            Ok(settings_reply(reader.config()))
        }
        SettingsMessage::ClearDefaultBook => {
            // Only the setting is cleared; the book's progress file stays.
            update_config(reader, config_path, |cfg| cfg.default_book = None)?;
            Ok(settings_reply(reader.config()))
        }
    }
}

fn settings_reply(config: &ReaderConfig) -> SettingsReply {
    SettingsReply::UpdateSettings {
        settings: SettingsSnapshot::from(config),
    }
}

fn update_config(
    reader: &mut Reader,
    config_path: &Path,
    edit: impl FnOnce(&mut ReaderConfig),
) -> ReaderResult<()> {
    let mut updated = reader.config().clone();
    edit(&mut updated);
    config::save_config(config_path, &updated).map_err(|err| ReaderError::Config {
        path: config_path.to_path_buf(),
        message: format!("{err:#}"),
    })?;
    reader.set_config(updated);
    Ok(())
}

fn non_empty_path(raw: &str) -> ReaderResult<PathBuf> {
    if raw.trim().is_empty() {
        return Err(ReaderError::InvalidRequest {
            message: "Path cannot be empty".to_string(),
        });
    }
    Ok(PathBuf::from(raw))
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(name: &str) -> PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be after epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("ttt-eye-settings-{name}-{nonce}"));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    fn send(reader: &mut Reader, config_path: &Path, raw: &str) -> SettingsReply {
        let message = parse_message(raw).expect("message parses");
        handle_message(reader, config_path, message)
    }

    #[test]
    fn parses_camel_case_payloads() {
        let message = parse_message(
            r##"{"command":"saveSettings","linesPerPage":3,"fontSize":16,"fontColor":"#fff"}"##,
        )
        .expect("parses");
        assert_eq!(
            message,
            SettingsMessage::SaveSettings {
                lines_per_page: 3,
                font_size: 16,
                font_color: "#fff".to_string(),
            }
        );
        assert_eq!(
            parse_message(r#"{"command":"clearDefaultBook"}"#).expect("parses"),
            SettingsMessage::ClearDefaultBook
        );
    }

    #[test]
    fn unknown_command_is_invalid_request() {
        let err = parse_message(r#"{"command":"selfDestruct"}"#).expect_err("unknown command");
        assert_eq!(err.code(), "invalid_request");
    }

    #[test]
    fn select_directory_persists_and_lists_books() {
        let dir = unique_temp_dir("select-dir");
        let library = dir.join("books");
        fs::create_dir_all(&library).expect("create library");
        fs::write(library.join("a.txt"), "one\n").expect("write book");
        let config_path = dir.join("conf").join("config.toml");
        let mut reader = Reader::new(ReaderConfig::default());

        let raw = serde_json::json!({
            "command": "selectDirectory",
            "path": library.to_string_lossy(),
        })
        .to_string();
        match send(&mut reader, &config_path, &raw) {
            SettingsReply::UpdateFileList {
                current_folder,
                files,
            } => {
                assert_eq!(current_folder, Some(library.to_string_lossy().to_string()));
                assert_eq!(files.len(), 1);
                assert_eq!(files[0].name, "a.txt");
            }
            other => panic!("expected file list, got {other:?}"),
        }
        assert_eq!(
            config::load_config(&config_path).library_dir,
            Some(library.clone())
        );

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn set_progress_replies_with_updated_list() {
        let dir = unique_temp_dir("jump");
        let book = dir.join("a.txt");
        fs::write(&book, "one\ntwo\nthree\n").expect("write book");
        let mut reader = Reader::new(ReaderConfig {
            library_dir: Some(dir.clone()),
            ..ReaderConfig::default()
        });

        let raw = serde_json::json!({
            "command": "setProgress",
            "file": book.to_string_lossy(),
            "line": 42,
        })
        .to_string();
        let reply = send(&mut reader, &dir.join("config.toml"), &raw);
        let SettingsReply::UpdateFileList { files, .. } = reply else {
            panic!("expected file list");
        };
        let record = files[0].progress.record().expect("progress saved");
        assert_eq!(record.current_line, 2);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn set_progress_on_missing_book_replies_error() {
        let dir = unique_temp_dir("jump-missing");
        let mut reader = Reader::new(ReaderConfig::default());
        let reply = send(
            &mut reader,
            &dir.join("config.toml"),
            r#"{"command":"setProgress","file":"/no/such/book.txt","line":1}"#,
        );
        match reply {
            SettingsReply::Error(err) => assert_eq!(err.code, "book_not_found"),
            other => panic!("expected error, got {other:?}"),
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn clearing_default_book_keeps_progress() {
        let dir = unique_temp_dir("default");
        let book = dir.join("fav.txt");
        fs::write(&book, "one\ntwo\n").expect("write book");
        assert!(progress::save_progress(&book, 1, 2));
        let config_path = dir.join("config.toml");
        let mut reader = Reader::new(ReaderConfig::default());

        let raw = serde_json::json!({
            "command": "setDefaultBook",
            "file": book.to_string_lossy(),
        })
        .to_string();
        let SettingsReply::UpdateSettings { settings } = send(&mut reader, &config_path, &raw)
        else {
            panic!("expected settings");
        };
        assert_eq!(settings.default_book, Some(book.to_string_lossy().to_string()));

        let reply = send(&mut reader, &config_path, r#"{"command":"clearDefaultBook"}"#);
        let SettingsReply::UpdateSettings { settings } = reply else {
            panic!("expected settings");
        };
        assert_eq!(settings.default_book, None);
        assert_eq!(config::load_config(&config_path).default_book, None);
        assert!(progress::sidecar_path(&book).exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn save_settings_updates_open_session_page_size() {
        let dir = unique_temp_dir("save");
        let book = dir.join("a.txt");
        fs::write(&book, "1\n2\n3\n4\n5\n6\n").expect("write book");
        let config_path = dir.join("config.toml");
        let mut reader = Reader::new(ReaderConfig::default());
        reader.open_session(&book).expect("opens");

        let reply = send(
            &mut reader,
            &config_path,
            r##"{"command":"saveSettings","linesPerPage":0,"fontSize":18,"fontColor":"#333"}"##,
        );
        let SettingsReply::UpdateSettings { settings } = reply else {
            panic!("expected settings");
        };
        assert_eq!(settings.lines_per_page, 1);
        assert_eq!(settings.font_size, 18);

        send(
            &mut reader,
            &config_path,
            r##"{"command":"saveSettings","linesPerPage":3,"fontSize":18,"fontColor":"#333"}"##,
        );
        assert_eq!(reader.next_page().expect("open").line, 3);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn select_file_opens_at_requested_line() {
        let dir = unique_temp_dir("select-file");
        let book = dir.join("a.txt");
        fs::write(&book, "1\n2\n3\n").expect("write book");
        let mut reader = Reader::new(ReaderConfig::default());

        let raw = serde_json::json!({
            "command": "selectFile",
            "file": book.to_string_lossy(),
            "startLine": 2,
        })
        .to_string();
        let reply = send(&mut reader, &dir.join("config.toml"), &raw);
        assert_eq!(
            reply,
            SettingsReply::Opened {
                path: book.to_string_lossy().to_string(),
                line: 2,
            }
        );
        assert!(reader.is_open());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_path_is_rejected() {
        let dir = unique_temp_dir("empty");
        let mut reader = Reader::new(ReaderConfig::default());
        let reply = send(
            &mut reader,
            &dir.join("config.toml"),
            r#"{"command":"setDefaultBook","file":"  "}"#,
        );
        match reply {
            SettingsReply::Error(err) => assert_eq!(err.code, "invalid_request"),
            other => panic!("expected error, got {other:?}"),
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn surrounding_whitespace_is_part_of_the_path() {
        let dir = unique_temp_dir("padded");
        let book = dir.join(" padded.txt ");
        fs::write(&book, "1\n2\n").expect("write book");
        let mut reader = Reader::new(ReaderConfig::default());

        let raw = serde_json::json!({
            "command": "selectFile",
            "file": book.to_string_lossy(),
        })
        .to_string();
        let reply = send(&mut reader, &dir.join("config.toml"), &raw);
        assert_eq!(
            reply,
            SettingsReply::Opened {
                path: book.to_string_lossy().to_string(),
                line: 0,
            }
        );

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn reply_is_tagged_by_command() {
        let reply = settings_reply(&ReaderConfig::default());
        let json = serde_json::to_value(&reply).expect("serializes");
        assert_eq!(json["command"], "updateSettings");
        assert_eq!(json["settings"]["linesPerPage"], 1);
        assert_eq!(json["settings"]["fontColor"], "#A8A8A8");
    }
}
