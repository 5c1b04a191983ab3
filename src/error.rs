//! Error types shared by the catalog, filter and telemetry modules

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// No recognizable drone media at the given root or its conventional subdirectories
    #[error("no drone media found in {}", .0.display())]
    NotFound(PathBuf),

    /// Malformed date filter or index selector
    #[error("syntax error at '{token}': {reason}")]
    Syntax { token: String, reason: String },

    /// Malformed subtitle block
    #[error("format error on line {line}: {message}")]
    Format { line: usize, message: String },

    /// Date and index filters were both requested
    #[error("date and index filters cannot be combined")]
    ConflictingFilter,

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn syntax(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Syntax {
            token: token.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn format(line: usize, message: impl Into<String>) -> Self {
        Error::Format {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
