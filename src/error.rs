//! Error taxonomy shared by the line store, progress store and reader.
//!
//! Every variant carries a stable string code so callers on the other side of
//! the settings bridge can branch on it without parsing messages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::PathBuf;
use ts_rs::TS;

#[derive(Debug)]
pub enum ReaderError {
    /// The book path does not exist on disk.
    BookNotFound { path: PathBuf },
    Io { path: PathBuf, source: io::Error },
    /// The book is not valid UTF-8.
    Decode {
        path: PathBuf,
        source: std::string::FromUtf8Error,
    },
    Serialization {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// The epub collaborator could not produce a text sibling.
    Conversion { path: PathBuf, message: String },
    /// Settings could not be written back to the config file.
    Config { path: PathBuf, message: String },
    NoSession,
    NoLibrary,
    EmptyLibrary { dir: PathBuf },
    InvalidRequest { message: String },
}

impl ReaderError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::BookNotFound { .. } => "book_not_found",
            Self::Io { .. } => "io_error",
            Self::Decode { .. } => "decode_error",
            Self::Serialization { .. } => "serialization_error",
            Self::Conversion { .. } => "conversion_failed",
            Self::Config { .. } => "config_error",
            Self::NoSession => "no_session",
            Self::NoLibrary => "no_library",
            Self::EmptyLibrary { .. } => "empty_library",
            Self::InvalidRequest { .. } => "invalid_request",
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            return Self::BookNotFound { path };
        }
        Self::Io { path, source }
    }

    pub fn to_reply(&self) -> ErrorReply {
        ErrorReply {
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }
}

impl fmt::Display for ReaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BookNotFound { path } => write!(f, "Book not found: {}", path.display()),
            Self::Io { path, source } => write!(f, "Failed to access {}: {source}", path.display()),
            Self::Decode { path, source } => {
                write!(f, "{} is not valid UTF-8 text: {source}", path.display())
            }
            Self::Serialization { path, source } => {
                write!(f, "Malformed progress file {}: {source}", path.display())
            }
            Self::Conversion { path, message } => {
                write!(f, "Failed to convert {}: {message}", path.display())
            }
            Self::Config { path, message } => {
                write!(f, "Failed to save settings to {}: {message}", path.display())
            }
            Self::NoSession => write!(f, "No book is open"),
            Self::NoLibrary => write!(f, "Library directory is not set"),
            Self::EmptyLibrary { dir } => {
                write!(f, "No .txt or .epub books found in {}", dir.display())
            }
            Self::InvalidRequest { message } => write!(f, "Invalid request: {message}"),
        }
    }
}

impl std::error::Error for ReaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Decode { source, .. } => Some(source),
            Self::Serialization { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Serializable error form sent back to the settings panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export)]
pub struct ErrorReply {
    pub code: String,
    pub message: String,
}

pub type ReaderResult<T> = Result<T, ReaderError>;
