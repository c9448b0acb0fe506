//! Per-book reading progress, stored as a JSON sidecar next to the book.
//!
//! The sidecar for `/books/a.txt` is `/books/a.txt.进度.json`. It is created on
//! the first save and overwritten wholesale on every later save; nothing here
//! ever deletes it. Saving is best-effort: failures are logged and reported as
//! `false`, never raised, so a persistence hiccup cannot interrupt reading.

use crate::error::{ReaderError, ReaderResult};
use crate::library;
use crate::line_store::{self, LineSequence};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};
use ts_rs::TS;

/// Literal suffix appended to the book path, independent of UI language.
pub const SIDECAR_SUFFIX: &str = ".进度.json";
/// Lines taken on each side of the current line for the context snippet.
pub const CONTEXT_RADIUS: usize = 10;
pub const CONTEXT_MAX_CHARS: usize = 200;
pub const TRUNCATION_MARKER: &str = "...";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProgressRecord {
    pub current_line: usize,
    /// Epoch milliseconds at save time.
    #[ts(type = "number")]
    pub timestamp: i64,
    pub total_lines: usize,
    pub context: String,
    pub progress_percent: String,
    /// ISO-8601 form of `timestamp`.
    pub last_time: String,
}

pub fn sidecar_path(book_path: &Path) -> PathBuf {
    let mut raw = OsString::from(book_path.as_os_str());
    raw.push(SIDECAR_SUFFIX);
    PathBuf::from(raw)
}

/// Text around `current_line` so a reader can recognise the spot in a picker.
/// Has no role in resuming; that only uses the line index.
pub fn build_context(lines: &LineSequence, current_line: usize) -> String {
    let start = current_line.saturating_sub(CONTEXT_RADIUS);
    let end = current_line
        .saturating_add(CONTEXT_RADIUS)
        .min(lines.last_index());

    let mut assembled = String::new();
    if !lines.is_empty() && start <= end {
        for line in lines.window(start, end) {
            assembled.push_str(line);
            assembled.push('\n');
        }
    }

    if assembled.chars().count() <= CONTEXT_MAX_CHARS {
        return assembled;
    }
    let mut cut: String = assembled.chars().take(CONTEXT_MAX_CHARS).collect();
    cut.push_str(TRUNCATION_MARKER);
    cut
}

/// Percentage through the book with exactly three decimals.
pub fn format_percent(current_line: usize, total_lines: usize) -> String {
    if total_lines <= 1 {
        return "0.000".to_string();
    }
    let pct = current_line as f64 / (total_lines - 1) as f64 * 100.0;
    // Ties at the third decimal round up, not to even.
    let rounded = (pct * 1000.0).round() / 1000.0;
    format!("{rounded:.3}")
}

pub fn build_record(
    lines: &LineSequence,
    current_line: usize,
    total_lines: usize,
    now: DateTime<Utc>,
) -> ProgressRecord {
    let current_line = current_line.min(total_lines.saturating_sub(1));
    ProgressRecord {
        current_line,
        timestamp: now.timestamp_millis(),
        total_lines,
        context: build_context(lines, current_line),
        progress_percent: format_percent(current_line, total_lines),
        last_time: now.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

/// Re-read the book, rebuild the record and overwrite the sidecar.
pub fn try_save_progress(
    book_path: &Path,
    current_line: usize,
    total_lines: usize,
) -> ReaderResult<ProgressRecord> {
    let lines = line_store::load(book_path)?;
    let record = build_record(&lines, current_line, total_lines, Utc::now());
    let target = sidecar_path(book_path);
    let json = serde_json::to_string_pretty(&record).map_err(|source| {
        ReaderError::Serialization {
            path: target.clone(),
            source,
        }
    })?;
    fs::write(&target, json).map_err(|source| ReaderError::Io {
        path: target.clone(),
        source,
    })?;
    debug!(
        path = %book_path.display(),
        line = record.current_line,
        total_lines,
        percent = %record.progress_percent,
        "Saved reading progress"
    );
    Ok(record)
}

/// Best-effort save. Returns whether the sidecar was written.
pub fn save_progress(book_path: &Path, current_line: usize, total_lines: usize) -> bool {
    match try_save_progress(book_path, current_line, total_lines) {
        Ok(_) => true,
        Err(err) => {
            error!(path = %book_path.display(), code = err.code(), "Failed to save reading progress: {err}");
            false
        }
    }
}

/// Read the sidecar for one book. A missing sidecar is `Ok(None)`.
pub fn load_progress(book_path: &Path) -> ReaderResult<Option<ProgressRecord>> {
    let path = sidecar_path(book_path);
    let data = match fs::read_to_string(&path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(ReaderError::Io { path, source }),
    };
    serde_json::from_str(&data)
        .map(Some)
        .map_err(|source| ReaderError::Serialization { path, source })
}

/// Saved progress for every book in `library_dir`, keyed by book path.
/// Books without a sidecar are absent; unreadable sidecars are logged and
/// skipped. An unset or missing directory yields an empty map.
pub fn load_all(library_dir: Option<&Path>) -> HashMap<PathBuf, ProgressRecord> {
    let mut progress = HashMap::new();
    let Some(dir) = library_dir else {
        return progress;
    };
    let books = match library::scan_books(dir) {
        Ok(books) => books,
        Err(err) => {
            warn!(dir = %dir.display(), "Skipping progress scan: {err}");
            return progress;
        }
    };

    for book in books {
        match load_progress(&book) {
            Ok(Some(record)) => {
                progress.insert(book, record);
            }
            Ok(None) => {}
            Err(err) => {
                error!(path = %book.display(), code = err.code(), "Failed to read progress file: {err}");
            }
        }
    }
    progress
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(name: &str) -> PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be after epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("ttt-eye-progress-{name}-{nonce}"));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    fn sample_book_text() -> String {
        let numerals = [
            "一", "二", "三", "四", "五", "六", "七", "八", "九", "十", "十一", "十二",
            "十三", "十四", "十五", "十六", "十七", "十八", "十九", "二十",
        ];
        let mut text = String::from("测试内容");
        for n in numerals {
            text.push_str(&format!("\n这是第{n}行"));
        }
        text
    }

    #[test]
    fn sidecar_uses_literal_suffix() {
        assert_eq!(
            sidecar_path(Path::new("/books/a.txt")),
            PathBuf::from("/books/a.txt.进度.json")
        );
    }

    #[test]
    fn percent_has_three_decimals() {
        assert_eq!(format_percent(0, 1), "0.000");
        assert_eq!(format_percent(3, 0), "0.000");
        assert_eq!(format_percent(10, 21), "50.000");
        assert_eq!(format_percent(5, 20), "26.316");
        assert_eq!(format_percent(19, 20), "100.000");
    }

    #[test]
    fn percent_ties_round_up() {
        assert_eq!(format_percent(1, 65), "1.563");
        assert_eq!(format_percent(5, 65), "7.813");
        assert_eq!(format_percent(9, 65), "14.063");
    }

    #[test]
    fn short_context_is_verbatim() {
        let lines = LineSequence::from_text("a\nb\nc");
        assert_eq!(build_context(&lines, 1), "a\nb\nc\n");
    }

    #[test]
    fn long_context_is_cut_with_marker() {
        let text = (0..30)
            .map(|i| format!("line number {i:02} with some padding"))
            .collect::<Vec<_>>()
            .join("\n");
        let lines = LineSequence::from_text(&text);
        let context = build_context(&lines, 15);
        assert!(context.ends_with(TRUNCATION_MARKER));
        assert_eq!(
            context.chars().count(),
            CONTEXT_MAX_CHARS + TRUNCATION_MARKER.len()
        );
        assert!(context.starts_with("line number 05"));
    }

    #[test]
    fn context_counts_characters_not_bytes() {
        let text = (0..21).map(|_| "汉字汉字汉字汉字汉字").collect::<Vec<_>>().join("\n");
        let lines = LineSequence::from_text(&text);
        let context = build_context(&lines, 10);
        assert_eq!(context.chars().count(), 203);
    }

    #[test]
    fn record_clamps_line_into_range() {
        let lines = LineSequence::from_text("a\nb\nc");
        let record = build_record(&lines, 9, 3, Utc::now());
        assert_eq!(record.current_line, 2);
        assert_eq!(record.progress_percent, "100.000");
    }

    #[test]
    fn record_timestamps_describe_same_instant() {
        let lines = LineSequence::from_text("a");
        let now = DateTime::parse_from_rfc3339("2024-03-01T08:30:00.250Z")
            .expect("valid timestamp")
            .with_timezone(&Utc);
        let record = build_record(&lines, 0, 1, now);
        assert_eq!(record.timestamp, 1_709_281_800_250);
        assert_eq!(record.last_time, "2024-03-01T08:30:00.250Z");
    }

    #[test]
    fn save_writes_expected_sidecar() {
        let dir = unique_temp_dir("scenario");
        let book = dir.join("test-book.txt");
        fs::write(&book, sample_book_text()).expect("write book");

        assert!(save_progress(&book, 5, 20));

        let raw = fs::read_to_string(sidecar_path(&book)).expect("sidecar should exist");
        let json: serde_json::Value = serde_json::from_str(&raw).expect("sidecar is json");
        assert_eq!(json["currentLine"], 5);
        assert_eq!(json["totalLines"], 20);
        assert_eq!(json["progressPercent"], "26.316");
        assert!(json["timestamp"].is_i64());
        assert!(json["lastTime"].is_string());

        let context = json["context"].as_str().expect("context is a string");
        assert!(context.starts_with("测试内容\n"));
        assert!(context.contains("这是第十五行\n"));
        assert!(!context.contains("这是第十六行"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn save_then_load_roundtrips_position() {
        let dir = unique_temp_dir("roundtrip");
        let book = dir.join("book.txt");
        fs::write(&book, sample_book_text()).expect("write book");

        for line in [0, 7, 20] {
            assert!(save_progress(&book, line, 21));
            let record = load_progress(&book)
                .expect("sidecar readable")
                .expect("sidecar present");
            assert_eq!(record.current_line, line);
            assert_eq!(record.total_lines, 21);
        }

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn save_reports_failure_when_book_vanished() {
        let dir = unique_temp_dir("vanished");
        let book = dir.join("gone.txt");
        assert!(!save_progress(&book, 0, 1));
        assert!(!sidecar_path(&book).exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_all_skips_missing_and_malformed_sidecars() {
        let dir = unique_temp_dir("scan");
        let saved = dir.join("saved.txt");
        let fresh = dir.join("fresh.epub");
        let broken = dir.join("broken.TXT");
        fs::write(&saved, "one\ntwo\n").expect("write saved");
        fs::write(&fresh, "not really an epub").expect("write fresh");
        fs::write(&broken, "x\n").expect("write broken");
        fs::write(sidecar_path(&broken), "{not json").expect("write broken sidecar");
        assert!(save_progress(&saved, 1, 2));

        let all = load_all(Some(&dir));
        assert_eq!(all.len(), 1);
        assert_eq!(all[&saved].current_line, 1);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_all_tolerates_unset_or_missing_dir() {
        assert!(load_all(None).is_empty());
        assert!(load_all(Some(Path::new("/no/such/library"))).is_empty());
    }

    #[test]
    fn load_progress_flags_malformed_json() {
        let dir = unique_temp_dir("malformed");
        let book = dir.join("a.txt");
        fs::write(sidecar_path(&book), "[]").expect("write sidecar");
        let err = load_progress(&book).expect_err("array is not a record");
        assert_eq!(err.code(), "serialization_error");
        let _ = fs::remove_dir_all(&dir);
    }
}
