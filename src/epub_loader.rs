//! EPUB to plain-text conversion.
//!
//! The reader only ever paginates text. An `.epub` book is resolved to the
//! `.txt` sibling with the same stem; when that sibling is missing, an
//! [`EpubConverter`] produces it first.

use crate::error::{ReaderError, ReaderResult};
use crate::library::is_epub;
use anyhow::{Context, Result};
use epub::doc::EpubDoc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub trait EpubConverter {
    /// Write the text of `epub_path` to `txt_path`.
    fn convert(&self, epub_path: &Path, txt_path: &Path) -> Result<()>;
}

/// Spine-order extraction with a light HTML-to-text pass per chapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpineTextConverter;

impl EpubConverter for SpineTextConverter {
    fn convert(&self, epub_path: &Path, txt_path: &Path) -> Result<()> {
        let text = load_epub_text(epub_path)?;
        fs::write(txt_path, text)
            .with_context(|| format!("Failed to write {}", txt_path.display()))?;
        info!(
            epub = %epub_path.display(),
            txt = %txt_path.display(),
            "Converted EPUB to text"
        );
        Ok(())
    }
}

pub fn text_sibling(epub_path: &Path) -> PathBuf {
    epub_path.with_extension("txt")
}

/// Path of the text the reader should open for `book_path`.
pub fn resolve_text_path(
    book_path: &Path,
    converter: &dyn EpubConverter,
) -> ReaderResult<PathBuf> {
    if !is_epub(book_path) {
        return Ok(book_path.to_path_buf());
    }

    let txt_path = text_sibling(book_path);
    if txt_path.exists() {
        debug!(path = %txt_path.display(), "Using existing text sibling");
        return Ok(txt_path);
    }
    if !book_path.exists() {
        return Err(ReaderError::BookNotFound {
            path: book_path.to_path_buf(),
        });
    }

    converter
        .convert(book_path, &txt_path)
        .map_err(|err| ReaderError::Conversion {
            path: book_path.to_path_buf(),
            message: format!("{err:#}"),
        })?;
    Ok(txt_path)
}

/// Open an EPUB and return its chapters as text, one blank line apart.
pub fn load_epub_text(path: &Path) -> Result<String> {
    info!(path = %path.display(), "Loading EPUB content");
    let mut doc =
        EpubDoc::new(path).with_context(|| format!("Failed to open EPUB at {}", path.display()))?;

    let mut combined = String::new();
    let mut chapters = 0usize;

    loop {
        if let Some((chapter, _mime)) = doc.get_current_str() {
            chapters += 1;
            if !combined.is_empty() {
                combined.push_str("\n\n");
            }
            // Wide columns so html2text does not hard-wrap paragraphs into
            // several reader lines.
            let plain = match html2text::from_read(chapter.as_bytes(), 10_000) {
                Ok(clean) => clean,
                Err(err) => {
                    warn!(chapter = chapters, "html2text failed: {err}");
                    chapter
                }
            };
            debug!(
                chapter = chapters,
                added_chars = plain.len(),
                "Parsed chapter"
            );
            combined.push_str(&plain);
        }

        if !doc.go_next() {
            break;
        }
    }

    info!(
        chapters,
        total_chars = combined.len(),
        "Finished loading EPUB content"
    );
    Ok(combined)
}
