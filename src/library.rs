//! Library scanner: the books in the configured directory, each joined with
//! its saved progress, ready for a picker.

use crate::progress::{self, ProgressRecord};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};
use ts_rs::TS;

/// Saved progress for a listed book; serializes to `{}` when none exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum BookProgress {
    Saved(ProgressRecord),
    Empty {},
}

impl BookProgress {
    pub fn record(&self) -> Option<&ProgressRecord> {
        match self {
            Self::Saved(record) => Some(record),
            Self::Empty {} => None,
        }
    }
}

impl From<Option<ProgressRecord>> for BookProgress {
    fn from(record: Option<ProgressRecord>) -> Self {
        record.map_or(Self::Empty {}, Self::Saved)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export)]
pub struct LibraryEntry {
    pub name: String,
    #[ts(type = "string")]
    pub path: PathBuf,
    #[ts(type = "ProgressRecord | Record<string, never>")]
    pub progress: BookProgress,
}

pub fn is_book_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase()),
        Some(ext) if ext == "txt" || ext == "epub"
    )
}

pub fn is_epub(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase()),
        Some(ext) if ext == "epub"
    )
}

/// Book files directly inside `dir`, in directory-listing order.
pub fn scan_books(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut books = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && is_book_file(&path) {
            books.push(path);
        }
    }
    Ok(books)
}

/// List the library. Unset or missing directories give an empty list.
pub fn list(library_dir: Option<&Path>) -> Vec<LibraryEntry> {
    let Some(dir) = library_dir else {
        return Vec::new();
    };
    let books = match scan_books(dir) {
        Ok(books) => books,
        Err(err) => {
            warn!(dir = %dir.display(), "Cannot list library: {err}");
            return Vec::new();
        }
    };

    let entries: Vec<LibraryEntry> = books
        .into_iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();
            let progress = match progress::load_progress(&path) {
                Ok(record) => record.into(),
                Err(err) => {
                    error!(path = %path.display(), code = err.code(), "Failed to read progress file: {err}");
                    BookProgress::Empty {}
                }
            };
            LibraryEntry {
                name,
                path,
                progress,
            }
        })
        .collect();
    debug!(dir = %dir.display(), books = entries.len(), "Listed library");
    entries
}
