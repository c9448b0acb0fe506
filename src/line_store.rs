//! Line store: turns a book file into the sequence of lines navigation
//! works on.
//!
//! Only `\n` separates lines. Carriage returns stay part of the line and
//! empty lines are dropped. The sequence is rebuilt from the file bytes on
//! every call; nothing is cached between sessions.

use crate::error::{ReaderError, ReaderResult};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Ordered, non-empty lines of a book. Index 0 is the first line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineSequence {
    lines: Vec<String>,
}

impl LineSequence {
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: split_lines(text),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.lines.get(idx).map(String::as_str)
    }

    /// Index of the last line, 0 for an empty book.
    pub fn last_index(&self) -> usize {
        self.lines.len().saturating_sub(1)
    }

    pub fn clamp_index(&self, idx: usize) -> usize {
        idx.min(self.last_index())
    }

    /// Lines `start..=end`, with both ends clamped to the sequence.
    pub fn window(&self, start: usize, end: usize) -> &[String] {
        if self.lines.is_empty() {
            return &[];
        }
        let end = end.min(self.last_index());
        let start = start.min(end);
        &self.lines[start..=end]
    }

    pub fn as_slice(&self) -> &[String] {
        &self.lines
    }
}

/// Read `path` as UTF-8 and split it into lines.
pub fn load(path: &Path) -> ReaderResult<LineSequence> {
    let bytes = fs::read(path).map_err(|err| ReaderError::io(path, err))?;
    let text = String::from_utf8(bytes).map_err(|source| ReaderError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let sequence = LineSequence::from_text(&text);
    debug!(path = %path.display(), lines = sequence.len(), "Loaded book lines");
    Ok(sequence)
}

fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_book(name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be after epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("ttt-eye-lines-{name}-{nonce}.txt"));
        fs::write(&path, bytes).expect("write temp book");
        path
    }

    #[test]
    fn drops_empty_lines_and_keeps_carriage_returns() {
        let seq = LineSequence::from_text("one\r\n\n\ntwo\nthree\n");
        assert_eq!(seq.as_slice(), &["one\r", "two", "three"]);
        assert_eq!(seq.last_index(), 2);
    }

    #[test]
    fn whitespace_only_lines_are_kept() {
        let seq = LineSequence::from_text("a\n \nb");
        assert_eq!(seq.len(), 3);
    }

    #[test]
    fn window_clamps_to_bounds() {
        let seq = LineSequence::from_text("a\nb\nc\nd");
        assert_eq!(seq.window(2, 99), &["c", "d"]);
        assert_eq!(seq.window(0, 0), &["a"]);
        assert!(LineSequence::default().window(0, 5).is_empty());
        assert_eq!(LineSequence::default().clamp_index(7), 0);
    }

    #[test]
    fn load_reads_utf8_book() {
        let path = temp_book("utf8", "测试内容\n这是第一行\n".as_bytes());
        let seq = load(&path).expect("book should load");
        assert_eq!(seq.get(0), Some("测试内容"));
        assert_eq!(seq.len(), 2);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_rejects_invalid_utf8() {
        let path = temp_book("latin1", &[0x66, 0x6f, 0xff, 0x0a]);
        let err = load(&path).expect_err("invalid utf-8 should fail");
        assert_eq!(err.code(), "decode_error");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let err = load(Path::new("/definitely/not/here.txt")).expect_err("missing file");
        assert_eq!(err.code(), "book_not_found");
    }
}
