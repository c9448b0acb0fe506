//! Reading session and the controller that owns it.
//!
//! At most one [`ReadingSession`] is alive at a time. [`Reader::open_session`]
//! replaces any prior session without saving it, and every page turn writes
//! the new position through the progress store before returning.

use crate::config::{MAX_LINES_PER_PAGE, MIN_LINES_PER_PAGE, ReaderConfig};
use crate::epub_loader::{self, EpubConverter, SpineTextConverter};
use crate::error::{ReaderError, ReaderResult};
use crate::library::{self, LibraryEntry};
use crate::line_store::{self, LineSequence};
use crate::progress::{self, ProgressRecord};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Result of a page turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTurn {
    pub line: usize,
    /// False at the first/last line, where the turn is a no-op.
    pub moved: bool,
    /// Whether the progress sidecar was written.
    pub saved: bool,
}

#[derive(Debug, Clone)]
pub struct ReadingSession {
    book_path: PathBuf,
    lines: LineSequence,
    current_line: usize,
    lines_per_page: usize,
}

impl ReadingSession {
    /// Load `book_path` and seed the position from its saved progress.
    pub fn open(book_path: &Path, lines_per_page: usize) -> ReaderResult<Self> {
        let lines = line_store::load(book_path)?;
        let saved_line = match progress::load_progress(book_path) {
            Ok(record) => record.map(|r| r.current_line).unwrap_or(0),
            Err(err) => {
                warn!(path = %book_path.display(), "Ignoring unreadable progress: {err}");
                0
            }
        };
        Ok(Self::from_lines(
            book_path.to_path_buf(),
            lines,
            saved_line,
            lines_per_page,
        ))
    }

    pub fn from_lines(
        book_path: PathBuf,
        lines: LineSequence,
        start_line: usize,
        lines_per_page: usize,
    ) -> Self {
        let current_line = lines.clamp_index(start_line);
        Self {
            book_path,
            lines,
            current_line,
            lines_per_page: lines_per_page.clamp(MIN_LINES_PER_PAGE, MAX_LINES_PER_PAGE),
        }
    }

    pub fn book_path(&self) -> &Path {
        &self.book_path
    }

    pub fn current_line(&self) -> usize {
        self.current_line
    }

    pub fn total_lines(&self) -> usize {
        self.lines.len()
    }

    pub fn lines_per_page(&self) -> usize {
        self.lines_per_page
    }

    pub fn set_lines_per_page(&mut self, lines_per_page: usize) {
        self.lines_per_page = lines_per_page.clamp(MIN_LINES_PER_PAGE, MAX_LINES_PER_PAGE);
    }

    /// Lines shown for the current page.
    pub fn page_lines(&self) -> &[String] {
        if self.lines.is_empty() {
            return &[];
        }
        let end = self
            .current_line
            .saturating_add(self.lines_per_page - 1);
        self.lines.window(self.current_line, end)
    }

    pub fn page_index(&self) -> usize {
        self.current_line / self.lines_per_page
    }

    pub fn total_pages(&self) -> usize {
        self.lines.len().div_ceil(self.lines_per_page)
    }

    pub fn next_page(&mut self) -> PageTurn {
        let target = self.current_line.saturating_add(self.lines_per_page);
        self.move_to(target)
    }

    pub fn previous_page(&mut self) -> PageTurn {
        let target = self.current_line.saturating_sub(self.lines_per_page);
        self.move_to(target)
    }

    // A turn at the boundary still re-saves the unchanged position.
    fn move_to(&mut self, target: usize) -> PageTurn {
        let previous = self.current_line;
        self.current_line = self.lines.clamp_index(target);
        let saved = progress::save_progress(&self.book_path, self.current_line, self.lines.len());
        debug!(
            path = %self.book_path.display(),
            from = previous,
            to = self.current_line,
            saved,
            "Turned page"
        );
        PageTurn {
            line: self.current_line,
            moved: previous != self.current_line,
            saved,
        }
    }
}

/// What `start_reading` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// The default book was opened.
    Opened(PathBuf),
    /// No usable default book; the host should let the user pick one.
    Choose(Vec<LibraryEntry>),
}

/// Owning controller for the single active reading session.
pub struct Reader {
    config: ReaderConfig,
    converter: Box<dyn EpubConverter>,
    session: Option<ReadingSession>,
}

impl Reader {
    pub fn new(config: ReaderConfig) -> Self {
        Self::with_converter(config, Box::new(SpineTextConverter))
    }

    pub fn with_converter(config: ReaderConfig, converter: Box<dyn EpubConverter>) -> Self {
        Self {
            config,
            converter,
            session: None,
        }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Swap in new settings; an open session picks up the new page size.
    pub fn set_config(&mut self, config: ReaderConfig) {
        if let Some(session) = self.session.as_mut() {
            session.set_lines_per_page(config.effective_lines_per_page());
        }
        self.config = config;
    }

    pub fn session(&self) -> Option<&ReadingSession> {
        self.session.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Open `book_path`, resuming from its saved position. On failure the
    /// previous session, if any, is left untouched.
    pub fn open_session(&mut self, book_path: &Path) -> ReaderResult<&ReadingSession> {
        let text_path = self.resolve(book_path)?;
        let session = ReadingSession::open(&text_path, self.config.effective_lines_per_page())?;
        Ok(self.install(session))
    }

    /// Open `book_path` at an explicit line instead of the saved one.
    pub fn open_session_at(
        &mut self,
        book_path: &Path,
        start_line: usize,
    ) -> ReaderResult<&ReadingSession> {
        let text_path = self.resolve(book_path)?;
        let lines = line_store::load(&text_path)?;
        let session = ReadingSession::from_lines(
            text_path,
            lines,
            start_line,
            self.config.effective_lines_per_page(),
        );
        Ok(self.install(session))
    }

    fn install(&mut self, session: ReadingSession) -> &ReadingSession {
        if let Some(prior) = self.session.take() {
            debug!(path = %prior.book_path.display(), "Closing prior session");
        }
        info!(
            path = %session.book_path.display(),
            line = session.current_line,
            total_lines = session.total_lines(),
            "Opened book"
        );
        self.session.insert(session)
    }

    /// End the active session without saving; the last page turn already did.
    pub fn close_session(&mut self) -> Option<ReadingSession> {
        let closed = self.session.take();
        if let Some(session) = &closed {
            info!(
                path = %session.book_path.display(),
                line = session.current_line,
                "Stopped reading"
            );
        }
        closed
    }

    pub fn stop(&mut self) {
        self.close_session();
    }

    pub fn next_page(&mut self) -> ReaderResult<PageTurn> {
        self.session
            .as_mut()
            .map(ReadingSession::next_page)
            .ok_or(ReaderError::NoSession)
    }

    pub fn previous_page(&mut self) -> ReaderResult<PageTurn> {
        self.session
            .as_mut()
            .map(ReadingSession::previous_page)
            .ok_or(ReaderError::NoSession)
    }

    /// Open the default book if it exists, otherwise hand back the library
    /// listing for the user to choose from.
    pub fn start_reading(&mut self) -> ReaderResult<StartOutcome> {
        if let Some(book) = self.config.default_book().map(Path::to_path_buf) {
            if book.exists() {
                let opened = self.open_session(&book)?.book_path().to_path_buf();
                return Ok(StartOutcome::Opened(opened));
            }
            warn!(path = %book.display(), "Default book is missing; falling back to library");
        }

        let dir = self.config.library_dir().ok_or(ReaderError::NoLibrary)?;
        let entries = library::list(Some(dir));
        if entries.is_empty() {
            return Err(ReaderError::EmptyLibrary {
                dir: dir.to_path_buf(),
            });
        }
        Ok(StartOutcome::Choose(entries))
    }

    /// Jump-to-progress from outside a reading session.
    pub fn set_progress(&self, book_path: &Path, line: i64) -> ReaderResult<ProgressRecord> {
        set_progress(book_path, line, self.converter.as_ref())
    }

    fn resolve(&self, book_path: &Path) -> ReaderResult<PathBuf> {
        epub_loader::resolve_text_path(book_path, self.converter.as_ref())
    }
}

/// Clamp `line` into the book and save it. Unlike page turns, every failure
/// here is returned to the caller.
pub fn set_progress(
    book_path: &Path,
    line: i64,
    converter: &dyn EpubConverter,
) -> ReaderResult<ProgressRecord> {
    let text_path = epub_loader::resolve_text_path(book_path, converter)?;
    let lines = line_store::load(&text_path)?;
    let total_lines = lines.len();
    let clamped = usize::try_from(line.max(0))
        .unwrap_or(usize::MAX)
        .min(lines.last_index());
    let record = progress::try_save_progress(&text_path, clamped, total_lines)?;
    info!(
        path = %text_path.display(),
        requested = line,
        line = record.current_line,
        "Updated reading progress"
    );
    Ok(record)
}
