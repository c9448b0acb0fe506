//! Line-by-line book reader with resumable progress.
//!
//! A book is a plain-text file split into non-empty lines. The reader pages
//! through those lines and records where the reader left off in a JSON
//! sidecar next to the book, together with a short snippet of surrounding
//! text for the library picker.

pub mod bindings;
pub mod config;
pub mod epub_loader;
pub mod error;
pub mod library;
pub mod line_store;
pub mod progress;
pub mod session;
pub mod settings;

pub use error::{ReaderError, ReaderResult};
pub use session::{PageTurn, Reader, ReadingSession, StartOutcome};
